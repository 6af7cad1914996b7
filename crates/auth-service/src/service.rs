//! Session operations exposed on the network boundary.
//!
//! Composes the Credential Service with the token issuer and applies the
//! per-call deadline.

use std::time::Duration;

use taskmanager_auth::protocol::{
    IdentityView, LoginRequest, RegisterRequest, SessionResponse, ValidateTokenResponse,
};
use taskmanager_auth::{
    AuthError, AuthResult, CallContext, CredentialService, Principal, TokenIssuer, TokenKind,
};
use taskmanager_core::UserId;

#[derive(Debug, Clone)]
pub struct AuthService {
    credentials: CredentialService,
    issuer: TokenIssuer,
    request_timeout: Duration,
}

impl AuthService {
    pub fn new(credentials: CredentialService, issuer: TokenIssuer, request_timeout: Duration) -> Self {
        Self {
            credentials,
            issuer,
            request_timeout,
        }
    }

    fn context(&self) -> CallContext {
        CallContext::with_timeout(self.request_timeout)
    }

    pub async fn register(&self, req: &RegisterRequest) -> AuthResult<SessionResponse> {
        let identity = self
            .credentials
            .register(&self.context(), &req.email, &req.password, &req.display_name)
            .await?;
        let pair = self.issuer.issue_pair(&identity)?;
        Ok(SessionResponse::new(pair, &identity))
    }

    /// Unknown email and wrong password come back as the same error.
    pub async fn login(&self, req: &LoginRequest) -> AuthResult<SessionResponse> {
        let identity = self
            .credentials
            .login(&self.context(), &req.email, &req.password)
            .await
            .map_err(AuthError::into_public_login_error)?;
        let pair = self.issuer.issue_pair(&identity)?;
        tracing::info!(user_id = %identity.id, "session issued");
        Ok(SessionResponse::new(pair, &identity))
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The identity is re-read so deactivated accounts cannot keep
    /// refreshing.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionResponse> {
        let claims = self
            .issuer
            .verifier()
            .verify_kind(refresh_token, TokenKind::Refresh)?;

        let identity = self
            .credentials
            .get_by_id(&self.context(), claims.subject)
            .await
            .map_err(|err| match err {
                AuthError::NotFound => AuthError::TokenInvalid,
                other => other,
            })?;
        if !identity.active {
            return Err(AuthError::Inactive);
        }

        let pair = self.issuer.refresh_pair(refresh_token, &identity)?;
        tracing::info!(user_id = %identity.id, "session refreshed");
        Ok(SessionResponse::new(pair, &identity))
    }

    /// Remote validation for callers that cannot verify locally.
    ///
    /// Never fails: any problem yields `valid = false`.
    pub async fn validate(&self, token: &str) -> ValidateTokenResponse {
        match self.validate_inner(token).await {
            Ok(principal) => ValidateTokenResponse {
                valid: true,
                subject_id: Some(principal.subject),
                email: Some(principal.email),
                role: Some(principal.role),
            },
            Err(err) => {
                tracing::debug!(error = %err, "remote token validation failed");
                ValidateTokenResponse::invalid()
            }
        }
    }

    async fn validate_inner(&self, token: &str) -> AuthResult<Principal> {
        let claims = self.issuer.verifier().verify_kind(token, TokenKind::Access)?;
        let principal = Principal::try_from(claims)?;
        let identity = self
            .credentials
            .get_by_id(&self.context(), principal.subject)
            .await?;
        if !identity.active {
            return Err(AuthError::Inactive);
        }
        Ok(principal)
    }

    pub async fn profile(&self, id: UserId) -> AuthResult<IdentityView> {
        let identity = self.credentials.get_by_id(&self.context(), id).await?;
        Ok(IdentityView::from(&identity))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use taskmanager_auth::{IdentityStore, InMemoryIdentityStore, PasswordHasher, TokenConfig};

    use super::*;

    fn service(store: Arc<InMemoryIdentityStore>) -> AuthService {
        let config = TokenConfig::new("service-test-secret".to_string().into());
        AuthService::new(
            CredentialService::new(store, PasswordHasher::new(4).unwrap()),
            TokenIssuer::new(&config).unwrap(),
            Duration::from_secs(5),
        )
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "password1".to_string(),
            display_name: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn register_returns_a_bearer_session() {
        let svc = service(InMemoryIdentityStore::arc());
        let session = svc.register(&register_req("alice@example.com")).await.unwrap();

        assert_eq!(session.token_type, "Bearer");
        assert_eq!(session.user.email, "alice@example.com");
        assert!(session.refresh_expires_at > session.expires_at);
    }

    #[tokio::test]
    async fn login_hides_which_part_was_wrong() {
        let svc = service(InMemoryIdentityStore::arc());
        svc.register(&register_req("alice@example.com")).await.unwrap();

        let wrong_password = svc
            .login(&LoginRequest {
                email: "alice@example.com".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        let unknown_email = svc
            .login(&LoginRequest {
                email: "nobody@example.com".into(),
                password: "password1".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn refresh_requires_refresh_token_and_active_identity() {
        let store = InMemoryIdentityStore::arc();
        let svc = service(store.clone());
        let session = svc.register(&register_req("alice@example.com")).await.unwrap();

        assert!(matches!(
            svc.refresh(&session.access_token).await,
            Err(AuthError::TokenInvalid)
        ));
        let refreshed = svc.refresh(&session.refresh_token).await.unwrap();
        assert_eq!(refreshed.user.id, session.user.id);

        let mut identity = store.find_by_id(session.user.id).await.unwrap();
        identity.active = false;
        store.replace(identity).unwrap();
        assert!(matches!(
            svc.refresh(&session.refresh_token).await,
            Err(AuthError::Inactive)
        ));
    }

    #[tokio::test]
    async fn validate_reports_identity_or_bare_false() {
        let svc = service(InMemoryIdentityStore::arc());
        let session = svc.register(&register_req("alice@example.com")).await.unwrap();

        let ok = svc.validate(&session.access_token).await;
        assert!(ok.valid);
        assert_eq!(ok.subject_id, Some(session.user.id));
        assert_eq!(ok.email.as_deref(), Some("alice@example.com"));

        assert_eq!(svc.validate(&session.refresh_token).await, ValidateTokenResponse::invalid());
        assert_eq!(svc.validate("garbage").await, ValidateTokenResponse::invalid());
    }

    #[tokio::test]
    async fn profile_lookup() {
        let svc = service(InMemoryIdentityStore::arc());
        let session = svc.register(&register_req("alice@example.com")).await.unwrap();

        assert_eq!(svc.profile(session.user.id).await.unwrap(), session.user);
        assert!(matches!(svc.profile(UserId::new()).await, Err(AuthError::NotFound)));
    }
}
