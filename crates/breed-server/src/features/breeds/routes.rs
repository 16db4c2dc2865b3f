//! Breed inquiry API routes
//!
//! # Route Structure
//!
//! - `POST /v1/breed-inquiry` - List breeds matching a JSON filter
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axum::Router;
//! use breed_server::features::breeds::{breeds_routes, PgBreedStore};
//!
//! let app = Router::new()
//!     .nest("/v1/breed-inquiry", breeds_routes())
//!     .with_state(Arc::new(PgBreedStore::new(pool)));
//! ```

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use breed_common::{Breed, BreedQuery};

use super::store::SharedBreedStore;
use crate::{api::method_not_allowed, error::AppError};

pub fn breeds_routes() -> Router<SharedBreedStore> {
    Router::new().route("/", post(list_breeds).fallback(method_not_allowed))
}

/// List breeds matching a filter
///
/// # Endpoint
///
/// `POST /v1/breed-inquiry`
///
/// # Request Body
///
/// ```json
/// {
///   "ids": ["1", "2"],
///   "shortNames": ["PDL"],
///   "keyword": "Poodle"
/// }
/// ```
///
/// Every field is optional; `{}` lists the whole catalog.
///
/// # Response
///
/// - `200 OK` - JSON array of breeds, possibly empty
/// - `400 Bad Request` - Body is not valid JSON
/// - `405 Method Not Allowed` - Any method other than `POST`
/// - `500 Internal Server Error` - Query could not be built, run or decoded
#[tracing::instrument(skip(store, payload))]
async fn list_breeds(
    State(store): State<SharedBreedStore>,
    payload: Result<Json<BreedQuery>, JsonRejection>,
) -> Result<Json<Vec<Breed>>, AppError> {
    let Json(query) = payload?;

    let breeds = store.list_breeds(&query).await?;

    tracing::debug!(count = breeds.len(), "Breeds listed via API");

    Ok(Json(breeds))
}
