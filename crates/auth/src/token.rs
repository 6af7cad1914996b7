//! Token issuance and stateless verification.
//!
//! Both halves are built from one [`TokenConfig`]. The Auth Service holds a
//! [`TokenIssuer`] (which embeds its own verifier for refresh); the gateway
//! only ever builds a [`TokenVerifier`].

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

pub use jsonwebtoken::Algorithm;

use crate::claims::{TokenClaims, TokenKind, TokenValidationError, validate_claims};
use crate::error::{AuthError, AuthResult};
use crate::identity::Identity;

pub const DEFAULT_ISSUER: &str = "taskmanager-auth";

/// Signing material and lifetime policy shared by issuer and verifier.
pub struct TokenConfig {
    pub secret: SecretString,
    pub algorithm: Algorithm,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: String,
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenConfig {
    /// HS256, 15 minute access tokens, 30 day refresh tokens.
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            algorithm: Algorithm::HS256,
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(30),
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_ttls(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_ttl = access;
        self.refresh_ttl = refresh;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    fn validate(&self) -> AuthResult<()> {
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::validation("token algorithm must be HS256, HS384 or HS512"));
        }
        if self.secret.expose_secret().is_empty() {
            return Err(AuthError::validation("token secret must not be empty"));
        }
        if self.access_ttl <= Duration::zero() || self.refresh_ttl <= Duration::zero() {
            return Err(AuthError::validation("token lifetimes must be positive"));
        }
        if self.issuer.trim().is_empty() {
            return Err(AuthError::validation("token issuer must not be empty"));
        }
        Ok(())
    }
}

/// A signed token together with the instants the caller needs to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub kind: TokenKind,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Local, read-only token verification.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    issuer: String,
}

impl core::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(config: &TokenConfig) -> AuthResult<Self> {
        config.validate()?;

        // Only the configured algorithm is accepted; the time window and
        // issuer are checked against our own claim names after decoding.
        let mut validation = Validation::new(config.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Ok(Self {
            key: DecodingKey::from_secret(config.secret.expose_secret().as_bytes()),
            validation,
            issuer: config.issuer.clone(),
        })
    }

    pub fn verify(&self, token: &str) -> AuthResult<TokenClaims> {
        self.verify_at(token, Utc::now())
    }

    /// Check signature, algorithm, structure, time window and issuer.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.key, &self.validation)
            .map_err(|err| {
                tracing::debug!(error = %err, "token rejected while decoding");
                AuthError::TokenInvalid
            })?;
        let claims = data.claims;

        validate_claims(&claims, now)?;
        if claims.issuer != self.issuer {
            return Err(TokenValidationError::IssuerMismatch.into());
        }
        Ok(claims)
    }

    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> AuthResult<TokenClaims> {
        self.verify_kind_at(token, kind, Utc::now())
    }

    pub fn verify_kind_at(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> AuthResult<TokenClaims> {
        let claims = self.verify_at(token, now)?;
        claims.require_kind(kind)?;
        Ok(claims)
    }
}

/// Mints signed session tokens. Owns the signing key.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    header: Header,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: String,
    verifier: TokenVerifier,
}

impl core::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.header.alg)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> AuthResult<Self> {
        let verifier = TokenVerifier::new(config)?;
        Ok(Self {
            key: EncodingKey::from_secret(config.secret.expose_secret().as_bytes()),
            header: Header::new(config.algorithm),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            issuer: config.issuer.clone(),
            verifier,
        })
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn issue_access(&self, identity: &Identity) -> AuthResult<IssuedToken> {
        self.issue_access_at(identity, Utc::now())
    }

    pub fn issue_access_at(&self, identity: &Identity, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        self.issue(identity, TokenKind::Access, self.access_ttl, now)
    }

    pub fn issue_refresh(&self, identity: &Identity) -> AuthResult<IssuedToken> {
        self.issue_refresh_at(identity, Utc::now())
    }

    pub fn issue_refresh_at(&self, identity: &Identity, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        self.issue(identity, TokenKind::Refresh, self.refresh_ttl, now)
    }

    pub fn issue_pair(&self, identity: &Identity) -> AuthResult<TokenPair> {
        self.issue_pair_at(identity, Utc::now())
    }

    /// Both tokens or neither.
    pub fn issue_pair_at(&self, identity: &Identity, now: DateTime<Utc>) -> AuthResult<TokenPair> {
        let access = self.issue_access_at(identity, now)?;
        let refresh = self.issue_refresh_at(identity, now)?;
        Ok(TokenPair { access, refresh })
    }

    pub fn refresh_pair(&self, refresh_token: &str, identity: &Identity) -> AuthResult<TokenPair> {
        self.refresh_pair_at(refresh_token, identity, Utc::now())
    }

    /// Exchange a refresh token for a brand-new pair.
    ///
    /// The token must be refresh-kind and name `identity` as its subject.
    /// The presented token is not invalidated.
    pub fn refresh_pair_at(
        &self,
        refresh_token: &str,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AuthResult<TokenPair> {
        let claims = self
            .verifier
            .verify_kind_at(refresh_token, TokenKind::Refresh, now)?;
        if claims.subject != identity.id {
            tracing::warn!(
                token_subject = %claims.subject,
                identity = %identity.id,
                "refresh token presented for a different identity"
            );
            return Err(AuthError::TokenInvalid);
        }
        self.issue_pair_at(identity, now)
    }

    fn issue(
        &self,
        identity: &Identity,
        kind: TokenKind,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedToken> {
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::internal("token expiry", "token lifetime overflows the calendar"))?;
        let token_id = Uuid::now_v7();
        let claims = TokenClaims {
            subject: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            token_kind: kind,
            expires_at,
            issued_at,
            not_before: issued_at,
            token_id,
            issuer: self.issuer.clone(),
        };

        let token = jsonwebtoken::encode(&self.header, &claims, &self.key)
            .map_err(|e| AuthError::internal("token signing", e))?;

        Ok(IssuedToken {
            token,
            kind,
            token_id,
            expires_at,
        })
    }
}
