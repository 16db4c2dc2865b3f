//! HTTP application assembly
//!
//! [`build_app`] returns the complete service: routes, fallbacks and the
//! middleware stack, with trailing slashes trimmed before routing.

pub mod response;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use std::time::Duration;
use tower::Layer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
};

use crate::config::Config;
use crate::error::AppError;
use crate::features::{self, breeds::SharedBreedStore};
use crate::middleware;
use response::HealthResponse;

/// Upper bound on the database ping behind `/_healthz`.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the router with every route and layer attached
///
/// Fails only when the rate limiter cannot be configured.
pub fn create_router(store: SharedBreedStore, config: &Config) -> anyhow::Result<Router> {
    let routes = Router::new()
        .route("/_healthz", get(health_check).fallback(method_not_allowed))
        .nest("/v1", features::router())
        .fallback(not_found)
        .with_state(store);

    let routes = middleware::apply_rate_limit(routes, &config.rate_limit)?;

    // Layers run outermost last: panics are caught before anything else sees them.
    Ok(middleware::security_headers(routes)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
        .layer(CatchPanicLayer::custom(handle_panic)))
}

/// [`create_router`] wrapped so `/v1/breed-inquiry/` routes like `/v1/breed-inquiry`
pub fn build_app(store: SharedBreedStore, config: &Config) -> anyhow::Result<NormalizePath<Router>> {
    let router = create_router(store, config)?;
    Ok(NormalizePathLayer::trim_trailing_slash().layer(router))
}

#[tracing::instrument(skip(store))]
async fn health_check(State(store): State<SharedBreedStore>) -> Result<HealthResponse, AppError> {
    tokio::time::timeout(HEALTH_CHECK_TIMEOUT, store.ping())
        .await
        .map_err(|_| AppError::HealthTimeout(HEALTH_CHECK_TIMEOUT))??;

    Ok(HealthResponse::available())
}

async fn not_found() -> AppError {
    AppError::NotFound
}

pub(crate) async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("Handler panicked: {}", detail)).into_response()
}
