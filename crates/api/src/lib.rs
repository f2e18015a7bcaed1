//! HTTP API server for donation submissions.
//!
//! Exposes the submission write protocol over REST, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::DonationService;
use metrics_exporter_prometheus::PrometheusHandle;
use row_store::RowStore;
use saga::DonationWriter;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::donations::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RowStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/donate", post(routes::donations::donate::<S>))
        .route("/api/donor/donate", post(routes::donations::donate::<S>))
        .route("/api/donations/{id}", get(routes::donations::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store`.
pub fn create_default_state<S: RowStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        writer: DonationWriter::new(store.clone()),
        donations: DonationService::new(store),
    })
}
