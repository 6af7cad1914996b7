use serde::{Deserialize, Serialize};

use taskmanager_core::UserId;

use crate::claims::TokenClaims;
use crate::error::AuthError;
use crate::roles::Role;

/// The verified caller of a single request.
///
/// Built at the edge from access-token claims and dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub subject: UserId,
    pub email: String,
    pub role: Role,
}

impl TryFrom<TokenClaims> for Principal {
    type Error = AuthError;

    /// Signed tokens with an empty subject or email are still refused.
    fn try_from(claims: TokenClaims) -> Result<Self, Self::Error> {
        if claims.subject.is_nil() || claims.email.trim().is_empty() {
            return Err(AuthError::TokenInvalid);
        }
        Ok(Self {
            subject: claims.subject,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::TokenKind;

    fn claims(subject: UserId, email: &str) -> TokenClaims {
        let now = Utc::now();
        TokenClaims {
            subject,
            email: email.to_string(),
            role: Role::User,
            token_kind: TokenKind::Access,
            expires_at: now + Duration::minutes(5),
            issued_at: now,
            not_before: now,
            token_id: Uuid::now_v7(),
            issuer: "taskmanager-auth".to_string(),
        }
    }

    #[test]
    fn copies_identity_fields() {
        let id = UserId::new();
        let principal = Principal::try_from(claims(id, "a@x.com")).unwrap();
        assert_eq!(principal.subject, id);
        assert_eq!(principal.email, "a@x.com");
        assert_eq!(principal.role, Role::User);
    }

    #[test]
    fn empty_identity_fields_are_rejected() {
        let nil = UserId::from_uuid(Uuid::nil());
        assert!(Principal::try_from(claims(nil, "a@x.com")).is_err());
        assert!(Principal::try_from(claims(UserId::new(), "  ")).is_err());
    }
}
