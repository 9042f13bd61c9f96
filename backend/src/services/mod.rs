//! Business logic services
//!
//! Services sit between routes and repositories: they validate input,
//! call the analysis gateway where needed, and express mutations as the
//! repository's atomic operations. Handlers stay thin.

pub mod ledger;
pub mod onboarding;

pub use ledger::LedgerService;
pub use onboarding::OnboardingService;
