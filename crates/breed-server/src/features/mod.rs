//! Feature modules implementing the breed API
//!
//! Each feature is a vertical slice with its own queries and routes.
//!
//! # Features
//!
//! - **breeds**: Filtered lookup of the read-only breed catalog

pub mod breeds;

use axum::Router;

use breeds::SharedBreedStore;

/// Creates the versioned API router with all feature routes mounted
///
/// - `/breed-inquiry` - Breed lookup
pub fn router() -> Router<SharedBreedStore> {
    Router::new().nest("/breed-inquiry", breeds::breeds_routes())
}
