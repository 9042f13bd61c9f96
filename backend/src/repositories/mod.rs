//! Repository layer
//!
//! Repositories own collection paths and stored field names and translate
//! between typed documents and the JSON the store holds. All access is
//! scoped by uid; no repository method reads outside the calling user's
//! namespace.

pub mod daily_log;
pub mod profile;

pub use daily_log::{DailyLogRepository, DailyLogWatch};
pub use profile::ProfileRepository;
