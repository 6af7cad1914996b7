//! Edge Authorization Guard.
//!
//! Classifies a request path as public or protected and, for protected
//! paths, turns the bearer token into a [`Principal`] using only the local
//! [`TokenVerifier`]. Nothing here calls the Auth Service or reads the
//! credential store, so a deactivated identity keeps working until its
//! access token expires.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use taskmanager_auth::{AuthError, Principal, TokenKind, TokenVerifier};

/// Paths reachable without a token.
pub const DEFAULT_PUBLIC_PREFIXES: &[&str] = &[
    "/health",
    "/metrics",
    "/api/v1/health",
    "/api/v1/auth/registration",
    "/api/v1/auth/login",
    "/api/v1/auth/refresh",
];

/// Statically configured public-route prefixes.
///
/// Matching is per path segment: `/health` covers `/health` and
/// `/health/live` but not `/healthz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicRoutes {
    prefixes: Vec<String>,
}

impl PublicRoutes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.into().trim_end_matches('/').to_string())
            .collect();
        Self { prefixes }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| match path.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        })
    }
}

impl Default for PublicRoutes {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PREFIXES.iter().copied())
    }
}

/// Why a protected request was turned away.
///
/// The variants exist for logs and metrics; on the wire they collapse into
/// two generic bodies (see [`Rejection::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("authorization header missing")]
    MissingToken,
    #[error("authorization header malformed")]
    MalformedHeader,
    #[error("access token expired")]
    Expired,
    #[error("access token invalid")]
    Invalid,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::MissingToken | Rejection::MalformedHeader => "UNAUTHORIZED",
            Rejection::Expired | Rejection::Invalid => "INVALID_TOKEN",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Rejection::MissingToken | Rejection::MalformedHeader => "Authorization token required",
            Rejection::Expired | Rejection::Invalid => "Invalid or expired token",
        }
    }

    /// Label for the `auth_rejections_total` metric.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingToken => "missing_token",
            Rejection::MalformedHeader => "malformed_header",
            Rejection::Expired => "expired_token",
            Rejection::Invalid => "invalid_token",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Public route; no principal is attached.
    Public,
    Authenticated(Principal),
}

#[derive(Debug, Clone)]
pub struct EdgeGuard {
    public: PublicRoutes,
    verifier: TokenVerifier,
}

impl EdgeGuard {
    pub fn new(public: PublicRoutes, verifier: TokenVerifier) -> Self {
        Self { public, verifier }
    }

    pub fn public_routes(&self) -> &PublicRoutes {
        &self.public
    }

    pub fn authorize(&self, path: &str, headers: &HeaderMap) -> Result<GuardDecision, Rejection> {
        self.authorize_at(path, headers, Utc::now())
    }

    pub fn authorize_at(
        &self,
        path: &str,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<GuardDecision, Rejection> {
        if self.public.is_public(path) {
            return Ok(GuardDecision::Public);
        }

        let token = extract_bearer(headers)?;

        let claims = self
            .verifier
            .verify_kind_at(token, TokenKind::Access, now)
            .map_err(|e| match e {
                AuthError::TokenExpired => Rejection::Expired,
                _ => Rejection::Invalid,
            })?;

        let principal = Principal::try_from(claims).map_err(|_| Rejection::Invalid)?;
        Ok(GuardDecision::Authenticated(principal))
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Rejection> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(Rejection::MissingToken)?;

    let header = header.to_str().map_err(|_| Rejection::MalformedHeader)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(Rejection::MalformedHeader)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(Rejection::MalformedHeader);
    }

    Ok(token)
}
