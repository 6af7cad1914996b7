use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use taskmanager_auth::protocol::{LoginRequest, RefreshRequest, RegisterRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/registration", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/profile", get(profile))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    if let Err(msg) = dto::validate_registration(&body) {
        return errors::json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg);
    }

    match services.auth.register(&body).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "user registered");
            (StatusCode::CREATED, Json(session)).into_response()
        }
        Err(e) => errors::auth_client_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    if let Err(msg) = dto::validate_login(&body) {
        return errors::json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg);
    }

    match services.auth.login(&body).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => errors::auth_client_error_to_response(e),
    }
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    if let Err(msg) = dto::validate_refresh(&body) {
        return errors::json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg);
    }

    match services.auth.refresh(&body).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => errors::auth_client_error_to_response(e),
    }
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services.auth.profile(principal.subject()).await {
        Ok(user) => Json(serde_json::json!({ "user": user })).into_response(),
        Err(e) => errors::auth_client_error_to_response(e),
    }
}
