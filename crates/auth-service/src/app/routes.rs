use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use taskmanager_auth::protocol::{
    LoginRequest, RefreshRequest, RegisterRequest, ValidateTokenRequest, ValidateTokenResponse,
};
use taskmanager_core::UserId;

use crate::AuthService;
use crate::app::errors;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/validate", post(validate))
        .route("/users/:id", get(get_user))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn register(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match service.register(&body).await {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn login(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match service.login(&body).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn refresh(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match service.refresh(&body.refresh_token).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// Always 200. An unreadable body is just another invalid token.
pub async fn validate(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Result<Json<ValidateTokenRequest>, JsonRejection>,
) -> Response {
    let answer = match payload {
        Ok(Json(body)) => service.validate(&body.token).await,
        Err(_) => ValidateTokenResponse::invalid(),
    };
    Json(answer).into_response()
}

pub async fn get_user(
    Extension(service): Extension<Arc<AuthService>>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = id.parse::<UserId>() else {
        return errors::json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "user not found");
    };

    match service.profile(id).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
