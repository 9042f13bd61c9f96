//! Nutrilens backend library
//!
//! Exposes the backend modules for integration tests and binaries.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
