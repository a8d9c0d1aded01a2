// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod league;
pub mod lineup;
pub mod manager;
pub mod models;
pub mod valuation;
