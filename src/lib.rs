//! Profile Harvester
//!
//! A configuration-driven scraper that extracts person/profile records from
//! heterogeneous web and JSON-API sources and merges them into one CSV with
//! a dynamically unioned column set.

pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod schema;
pub mod storage;

// Re-exports for convenience
pub use client::HttpClient;
pub use config::TargetConfig;
pub use error::HarvestError;
pub use extract::{Extractor, SourceType, get_extractor};
pub use schema::{RawValue, Record, collect_all_columns};
pub use storage::CsvWriter;
