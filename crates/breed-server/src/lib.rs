//! Breed Inquiry Server Library
//!
//! HTTP service answering filtered lookups against a read-only catalog of
//! animal breeds stored in PostgreSQL.
//!
//! # Overview
//!
//! - **API Endpoints**: `POST /v1/breed-inquiry` and `GET /_healthz`
//! - **Database Management**: PostgreSQL integration with SQLx
//! - **Configuration**: Environment-based configuration management
//! - **Middleware**: CORS, request logging, security headers and rate limiting
//!
//! # Architecture
//!
//! A request body is decoded into a [`breed_common::BreedQuery`], turned into a
//! [`features::breeds::Predicate`], rendered to a parameterized `WHERE`
//! clause and run as a single `SELECT` against the `breed` table. Handlers
//! reach the database only through the [`features::breeds::BreedStore`]
//! trait, so the whole HTTP surface can be exercised against
//! [`features::breeds::MemoryBreedStore`].
//!
//! ## Framework Stack
//!
//! - **Axum**: Web framework
//! - **SQLx**: Async PostgreSQL driver and pool
//! - **Tower**: Middleware and service abstractions
//!
//! # Example
//!
//! ```no_run
//! use std::{net::SocketAddr, sync::Arc};
//! use breed_server::{api, config::Config, db, features::breeds::PgBreedStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let app = api::create_router(Arc::new(PgBreedStore::new(pool)), &config)?;
//!     let listener = tokio::net::TcpListener::bind(config.server.socket_addr()?).await?;
//!     axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;

// Re-export commonly used types
pub use error::AppError;
