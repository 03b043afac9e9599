// src/models/mod.rs

//! Domain models for the generator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod record;
mod search;
mod selectors;
mod site;

// Re-export all public types
pub use config::{CacheBackend, CacheConfig, Config, HttpConfig, ServerConfig, TelemetryConfig};
pub use record::{Credit, CrossRef, Rating, Record, Role};
pub use search::{SearchOutcome, SearchResult};
pub use selectors::{Field, SelectorTable, Strategy, rule_for};
pub use site::{Site, UnknownSite};

#[cfg(test)]
pub(crate) use selectors::SAMPLE_TABLE;
