//! Authentication error taxonomy.
//!
//! Business failures (`AlreadyExists`, `InvalidCredentials`, `Inactive`, ...)
//! stay distinct so the network layer can pick a status code. Everything the
//! caller cannot act on (hashing, signing, store connectivity) collapses into
//! `Internal`, which keeps its source for logging but never for the client.

use thiserror::Error;

use crate::claims::TokenValidationError;
use crate::store::StoreError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity already exists")]
    AlreadyExists,

    #[error("identity not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("identity is inactive")]
    Inactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("token is invalid")]
    TokenInvalid,

    /// Missing or malformed authorization header.
    #[error("authorization required")]
    Unauthorized,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {context}")]
    Internal {
        context: &'static str,
        #[source]
        source: Option<BoxError>,
    },
}

impl AuthError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            context,
            source: Some(source.into()),
        }
    }

    /// Machine-readable code used in error bodies on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::AlreadyExists => "ALREADY_EXISTS",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Inactive => "ACCOUNT_INACTIVE",
            AuthError::TokenExpired | AuthError::TokenInvalid => "INVALID_TOKEN",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::DeadlineExceeded => "DEADLINE_EXCEEDED",
            AuthError::Cancelled => "CANCELLED",
            AuthError::Internal { .. } => "INTERNAL",
        }
    }

    /// Collapse the login-time failures that must look identical from
    /// outside (unknown email vs wrong password) into one variant.
    pub fn into_public_login_error(self) -> Self {
        match self {
            AuthError::NotFound | AuthError::InvalidCredentials => AuthError::InvalidCredentials,
            other => other,
        }
    }

    pub fn is_token_failure(&self) -> bool {
        matches!(self, AuthError::TokenExpired | AuthError::TokenInvalid)
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AuthError::NotFound,
            // The only write is `create`; a uniqueness conflict there means
            // another registration won the race for the same email.
            StoreError::Conflict(_) => AuthError::AlreadyExists,
            StoreError::Unavailable(source) => AuthError::Internal {
                context: "credential store",
                source: Some(source),
            },
        }
    }
}

impl From<TokenValidationError> for AuthError {
    fn from(err: TokenValidationError) -> Self {
        match err {
            TokenValidationError::Expired => AuthError::TokenExpired,
            TokenValidationError::NotYetValid
            | TokenValidationError::InvalidTimeWindow
            | TokenValidationError::WrongKind { .. }
            | TokenValidationError::IssuerMismatch => AuthError::TokenInvalid,
        }
    }
}
