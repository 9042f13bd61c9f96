//! Shared domain types and calculations for Nutrilens
//!
//! This crate contains the pure core of the application: persisted document
//! shapes, nutrition arithmetic, the calorie-budget calculator, and the
//! daily-ledger semantics. Everything here is side-effect free; persistence
//! and external model calls live in the backend crate.

pub mod budget;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod nutrition;
pub mod types;
pub mod validation;

pub use errors::DomainError;
