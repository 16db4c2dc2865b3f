//! Test helpers for breed server integration tests
//!
//! This module provides utilities for:
//! - Building the full application over an in-memory store
//! - The two-breed catalog used across the scenario tests
//! - Sending requests and decoding JSON responses

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use breed_common::Breed;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

use breed_server::{
    api,
    config::{Config, DatabaseConfig},
    features::breeds::{MemoryBreedStore, SharedBreedStore},
    middleware::RateLimitConfig,
};

pub type TestApp = NormalizePath<Router>;

pub const INQUIRY_URI: &str = "/v1/breed-inquiry";

pub fn breed(id: &str, name_th: &str, name_en: &str, short_name: &str, remark: Option<&str>) -> Breed {
    Breed {
        id: id.to_string(),
        name_th: name_th.to_string(),
        name_en: name_en.to_string(),
        short_name: short_name.to_string(),
        remark: remark.map(str::to_string),
    }
}

/// `{1, Mixed, MIX}` and `{2, Poodle, PDL, "fluffy"}`
pub fn scenario_breeds() -> Vec<Breed> {
    vec![
        breed("1", "สุนัขพันธุ์ผสม", "Mixed", "MIX", None),
        breed("2", "พุดเดิ้ล", "Poodle", "PDL", Some("fluffy")),
    ]
}

/// Valid configuration with rate limiting off
///
/// The limiter needs a peer address, which `oneshot` requests lack unless a
/// test adds one.
pub fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: "postgres://localhost/breeds_test".to_string(),
            ..Default::default()
        },
        rate_limit: RateLimitConfig::disabled(),
        ..Default::default()
    }
}

pub fn app_with(store: SharedBreedStore, config: &Config) -> TestApp {
    api::build_app(store, config).expect("Failed to build app")
}

pub fn scenario_app() -> TestApp {
    app_with(
        Arc::new(MemoryBreedStore::new(scenario_breeds())),
        &test_config(),
    )
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Value::Null` when the body is empty
    pub json: Value,
}

pub async fn send(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("Response body is not JSON")
    };

    TestResponse {
        status,
        headers,
        json,
    }
}

pub fn post_json_request(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

pub async fn post_json(app: &TestApp, uri: &str, body: impl Into<String>) -> TestResponse {
    send(app, post_json_request(uri, body)).await
}

pub async fn get(app: &TestApp, uri: &str) -> TestResponse {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

/// Ids of a JSON array of breeds, in response order
pub fn ids(json: &Value) -> Vec<String> {
    json.as_array()
        .expect("Expected a JSON array")
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect()
}
