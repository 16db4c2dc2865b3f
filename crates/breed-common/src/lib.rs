//! Breed Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types and logging for the breed inquiry workspace.
//!
//! # Overview
//!
//! - **Types**: the `Breed` record and the `BreedQuery` filter exchanged over HTTP
//! - **Logging**: centralized `tracing` subscriber setup driven by environment
//!
//! # Example
//!
//! ```no_run
//! use breed_common::logging::{init_logging, LogConfig};
//! use breed_common::types::BreedQuery;
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!
//!     let query: BreedQuery = serde_json::from_str(r#"{"keyword":"Poodle"}"#)?;
//!     tracing::info!(keyword = %query.keyword, "Parsed query");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod types;

// Re-export commonly used types
pub use types::{Breed, BreedQuery};
