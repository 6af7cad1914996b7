use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use taskmanager_auth::protocol::ErrorBody;
use taskmanager_tasks::TaskError;

use crate::auth_client::AuthClientError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (status, axum::Json(ErrorBody::new(code, message))).into_response()
}

pub fn json_rejection(rejection: JsonRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", rejection.body_text())
}

/// Error bodies from the Auth Service pass through unchanged; a missing or
/// unreadable answer becomes a 502.
pub fn auth_client_error_to_response(err: AuthClientError) -> Response {
    match err {
        AuthClientError::Api { status, body } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, axum::Json(body)).into_response()
        }
        other => {
            tracing::error!(error = %other, "auth service call failed");
            json_error(
                StatusCode::BAD_GATEWAY,
                "AUTH_SERVICE_UNAVAILABLE",
                "authentication service unavailable",
            )
        }
    }
}

pub fn task_error_to_response(err: TaskError) -> Response {
    match err {
        TaskError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        TaskError::NotFound => json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "task not found"),
        TaskError::Unavailable(source) => {
            tracing::error!(error = %source, "task store failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "internal server error",
            )
        }
    }
}
