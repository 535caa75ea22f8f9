// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod catalog;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod page;
pub mod publish;
pub mod registry;
pub mod retention;
pub mod stats;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::catalog::{Catalog, Entry};
pub use crate::config::AppConfig;
pub use crate::ingest::materialize::{ItemOutcome, Materializer};
pub use crate::ingest::Harvester;
