use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use taskmanager_observability::HttpMetrics;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;
use crate::guard::{EdgeGuard, GuardDecision};

#[derive(Clone)]
pub struct AuthState {
    pub guard: Arc<EdgeGuard>,
    pub metrics: HttpMetrics,
}

/// Runs the edge guard for every request and attaches the principal on
/// protected routes.
pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    match state.guard.authorize(req.uri().path(), req.headers()) {
        Ok(GuardDecision::Public) => next.run(req).await,
        Ok(GuardDecision::Authenticated(principal)) => {
            req.extensions_mut().insert(PrincipalContext::new(principal));
            next.run(req).await
        }
        Err(rejection) => {
            state.metrics.auth_rejected(rejection.reason());
            tracing::debug!(
                path = %req.uri().path(),
                reason = rejection.reason(),
                "request rejected at the edge"
            );
            json_error(StatusCode::UNAUTHORIZED, rejection.code(), rejection.message())
        }
    }
}

/// Counts finished requests by method and status. The in-flight slot is
/// released on drop, so a disconnected client does not leak it.
pub async fn track_metrics(State(metrics): State<HttpMetrics>, req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_owned();

    let _in_flight = metrics.request_started();
    let response = next.run(req).await;
    metrics.request_finished(&method, response.status().as_u16());

    response
}
