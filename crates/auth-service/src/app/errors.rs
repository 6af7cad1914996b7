use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use taskmanager_auth::AuthError;
use taskmanager_auth::protocol::ErrorBody;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (status, axum::Json(ErrorBody::new(code, message))).into_response()
}

pub fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::AlreadyExists => StatusCode::CONFLICT,
        AuthError::NotFound => StatusCode::NOT_FOUND,
        AuthError::InvalidCredentials
        | AuthError::TokenExpired
        | AuthError::TokenInvalid
        | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
        AuthError::Inactive => StatusCode::FORBIDDEN,
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        AuthError::Cancelled => StatusCode::REQUEST_TIMEOUT,
        AuthError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn auth_error_to_response(err: AuthError) -> Response {
    let status = status_for(&err);
    match err {
        AuthError::Internal { context, source } => {
            tracing::error!(context, error = ?source, "request failed");
            json_error(status, "INTERNAL", "internal server error")
        }
        AuthError::Validation(msg) => json_error(status, "VALIDATION_ERROR", msg),
        other => json_error(status, other.code(), other.to_string()),
    }
}

pub fn json_rejection(rejection: JsonRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_failures_get_distinct_statuses() {
        assert_eq!(status_for(&AuthError::AlreadyExists), StatusCode::CONFLICT);
        assert_eq!(status_for(&AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&AuthError::Inactive), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&AuthError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&AuthError::DeadlineExceeded), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn internal_detail_stays_in_the_logs() {
        let response = auth_error_to_response(AuthError::internal(
            "credential store",
            "password authentication failed for user postgres",
        ));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
