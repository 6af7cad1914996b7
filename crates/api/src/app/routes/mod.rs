use axum::{Router, routing::get};

pub mod auth;
pub mod system;
pub mod tasks;

/// Router for everything under `/api/v1`. Which of these need a token is
/// decided by the edge guard, not here.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/whoami", get(system::whoami))
        .nest("/auth", auth::router())
        .nest("/task", tasks::router())
}
