//! Identity record owned by the Credential Service.

use chrono::{DateTime, Utc};

use taskmanager_core::UserId;

use crate::Role;
use crate::error::{AuthError, AuthResult};

const MAX_EMAIL_LEN: usize = 254;
const MAX_DISPLAY_NAME_LEN: usize = 100;
/// bcrypt only looks at the first 72 bytes; longer inputs are refused rather
/// than silently truncated.
const MAX_PASSWORD_BYTES: usize = 72;

/// Output of the password hasher.
///
/// Deliberately not `Serialize` and redacted in `Debug`: the hash travels
/// between the hasher and the credential store and nowhere else.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash read back from the credential store.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}

/// A registered user's durable record.
///
/// # Invariants
/// - `email` is normalized (trimmed, lowercase) and unique across identities.
/// - Identities are never deleted; `active = false` deactivates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub password_hash: PasswordHash,
    pub display_name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Case-normalize an email for storage and lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(crate) fn validate_email(email: &str) -> AuthResult<()> {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(AuthError::validation("email length out of range"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(AuthError::validation("email must not contain whitespace"));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::validation("email must contain '@'"));
    };
    if local.is_empty() || domain.contains('@') {
        return Err(AuthError::validation("malformed email"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(AuthError::validation("malformed email domain"));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> AuthResult<()> {
    if password.is_empty() {
        return Err(AuthError::validation("password must not be empty"));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::validation("password longer than 72 bytes"));
    }
    Ok(())
}

pub(crate) fn validate_display_name(name: &str) -> AuthResult<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_DISPLAY_NAME_LEN {
        return Err(AuthError::validation("display name must be 1..=100 characters"));
    }
    Ok(())
}
