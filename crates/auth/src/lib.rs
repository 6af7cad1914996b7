//! `taskmanager-auth`: credential issuance and stateless token verification.
//!
//! This crate is intentionally decoupled from HTTP and storage engines. The
//! Auth Service uses the issuing half; the API Gateway links only the
//! verifying half and never calls back into the issuer.

pub mod claims;
pub mod context;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod password;
pub mod principal;
pub mod protocol;
pub mod roles;
pub mod store;
pub mod token;

pub use claims::{TokenClaims, TokenKind, TokenValidationError, validate_claims};
pub use context::CallContext;
pub use credentials::{CredentialService, LogNotifier, RegistrationNotifier};
pub use error::{AuthError, AuthResult};
pub use identity::{Identity, PasswordHash, normalize_email};
pub use password::PasswordHasher;
pub use principal::Principal;
pub use roles::Role;
pub use store::{IdentityStore, InMemoryIdentityStore, StoreError};
pub use token::{Algorithm, IssuedToken, TokenConfig, TokenIssuer, TokenPair, TokenVerifier};
