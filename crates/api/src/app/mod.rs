//! HTTP application wiring for the gateway (Axum router + shared services).
//!
//! - `services.rs`: collaborators handed to every handler
//! - `routes/`: HTTP handlers (one file per area)
//! - `dto.rs`: gateway-side request checks and response envelopes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::guard::EdgeGuard;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Every route sits behind the edge guard; public paths are let through by
/// its prefix list.
pub fn build_app(services: AppServices, guard: EdgeGuard) -> Router {
    let http_metrics = services.metrics.http().clone();
    let auth_state = middleware::AuthState {
        guard: Arc::new(guard),
        metrics: http_metrics.clone(),
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/metrics", get(routes::system::metrics))
        .nest("/api/v1", routes::router())
        .layer(Extension(Arc::new(services)))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(
                    http_metrics,
                    middleware::track_metrics,
                )),
        )
}
