//! HTTP wiring for the Auth Service.
//!
//! - `routes.rs`: handlers, one per operation of the Credential Service boundary
//! - `errors.rs`: `AuthError` to status code and JSON body

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::AuthService;

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .nest("/v1", routes::router())
        .layer(Extension(service))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
