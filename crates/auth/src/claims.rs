use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use taskmanager_core::UserId;

use crate::Role;

/// Tolerated clock difference between the issuing and verifying processes,
/// applied to `notBefore` only. Expiry is never stretched.
const NOT_BEFORE_LEEWAY_SECS: i64 = 30;

/// Which half of a session pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session token claims.
///
/// The field names are the wire contract between the Auth Service and the
/// gateway. Every field is required: a token missing one fails to decode
/// instead of defaulting to an empty value. Timestamps are whole seconds
/// since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub subject: UserId,
    pub email: String,
    pub role: Role,
    pub token_kind: TokenKind,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub not_before: DateTime<Utc>,

    pub token_id: Uuid,
    pub issuer: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("invalid token time window")]
    InvalidTimeWindow,

    #[error("expected a {expected} token, got {actual}")]
    WrongKind { expected: TokenKind, actual: TokenKind },

    #[error("token issuer mismatch")]
    IssuerMismatch,
}

/// Deterministically validate the time window of decoded claims.
///
/// Only `expiresAt` is compared against `now`; no TTL is recomputed here.
/// Signature, algorithm and issuer checks belong to [`crate::TokenVerifier`].
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at || claims.not_before >= claims.expires_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    if now + Duration::seconds(NOT_BEFORE_LEEWAY_SECS) < claims.not_before {
        return Err(TokenValidationError::NotYetValid);
    }
    Ok(())
}

impl TokenClaims {
    pub fn require_kind(&self, expected: TokenKind) -> Result<(), TokenValidationError> {
        if self.token_kind == expected {
            Ok(())
        } else {
            Err(TokenValidationError::WrongKind {
                expected,
                actual: self.token_kind,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn claims(issued: i64, expires: i64) -> TokenClaims {
        TokenClaims {
            subject: UserId::new(),
            email: "a@x.com".to_string(),
            role: Role::User,
            token_kind: TokenKind::Access,
            expires_at: at(expires),
            issued_at: at(issued),
            not_before: at(issued),
            token_id: Uuid::now_v7(),
            issuer: "taskmanager-auth".to_string(),
        }
    }

    fn at(s: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(s, 0).unwrap()
    }

    #[test]
    fn window_is_checked_against_embedded_instants() {
        let c = claims(1_000, 1_900);
        assert_eq!(validate_claims(&c, at(1_000)), Ok(()));
        assert_eq!(validate_claims(&c, at(1_899)), Ok(()));
        assert_eq!(validate_claims(&c, at(1_900)), Err(TokenValidationError::Expired));
        assert_eq!(validate_claims(&c, at(5_000)), Err(TokenValidationError::Expired));
    }

    #[test]
    fn not_before_has_small_leeway() {
        let c = claims(1_000, 1_900);
        assert_eq!(validate_claims(&c, at(990)), Ok(()));
        assert_eq!(validate_claims(&c, at(900)), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let c = claims(2_000, 1_000);
        assert_eq!(
            validate_claims(&c, at(1_500)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn wire_names_are_stable() {
        let value = serde_json::to_value(claims(1_000, 1_900)).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "subject",
            "email",
            "role",
            "tokenKind",
            "expiresAt",
            "issuedAt",
            "notBefore",
            "tokenId",
            "issuer",
        ] {
            assert!(obj.contains_key(key), "missing claim {key}");
        }
        assert_eq!(obj["tokenKind"], "access");
        assert_eq!(obj["expiresAt"], 1_900);
    }

    #[test]
    fn missing_claims_fail_to_decode() {
        let mut value = serde_json::to_value(claims(1_000, 1_900)).unwrap();
        value.as_object_mut().unwrap().remove("email");
        assert!(serde_json::from_value::<TokenClaims>(value).is_err());
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let c = claims(1_000, 1_900);
        assert_eq!(c.require_kind(TokenKind::Access), Ok(()));
        assert_eq!(
            c.require_kind(TokenKind::Refresh),
            Err(TokenValidationError::WrongKind {
                expected: TokenKind::Refresh,
                actual: TokenKind::Access,
            })
        );
    }
}
