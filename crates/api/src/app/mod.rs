//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and engine wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and extractor helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use leadflow_infra::{EngineConfig, LeadStore};

use crate::config::ServerConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Connects to Postgres and applies the schema when `DATABASE_URL` is set.
pub async fn build_app(config: &ServerConfig) -> anyhow::Result<Router> {
    let store = services::open_store(config)
        .await
        .context("failed to open lead store")?;
    Ok(build_app_with_store(store, config.engine.clone()))
}

/// Build the router over an already opened store.
pub fn build_app_with_store(store: Arc<dyn LeadStore>, engine: EngineConfig) -> Router {
    let services = Arc::new(services::AppServices::new(store, engine));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router().layer(Extension(services)))
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
}
