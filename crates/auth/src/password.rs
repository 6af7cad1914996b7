//! bcrypt password hashing.
//!
//! Hashing and verification are CPU-bound and run on the blocking pool so
//! they never stall the async workers serving other requests.

use std::sync::Arc;

use crate::error::{AuthError, AuthResult};
use crate::identity::PasswordHash;

pub use bcrypt::DEFAULT_COST;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;
const DUMMY_PASSWORD: &str = "timing-equalisation-placeholder";

/// Salted adaptive hasher with constant-shape failure paths.
///
/// A dummy hash at the configured cost is computed once at construction.
/// Every "no match" outcome that would otherwise return early (malformed
/// stored hash, unknown email) spends one verification against it.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy: Arc<str>,
}

impl core::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PasswordHasher").field("cost", &self.cost).finish()
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> AuthResult<Self> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(AuthError::validation(format!(
                "bcrypt cost must be within {MIN_COST}..={MAX_COST}, got {cost}"
            )));
        }
        let dummy = bcrypt::hash(DUMMY_PASSWORD, cost)
            .map_err(|e| AuthError::internal("password hashing", e))?;
        Ok(Self {
            cost,
            dummy: Arc::from(dummy),
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, plaintext: &str) -> AuthResult<PasswordHash> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| AuthError::internal("password hashing task", e))?
            .map_err(|e| AuthError::internal("password hashing", e))?;
        Ok(PasswordHash::from_stored(hashed))
    }

    /// `true` only when `plaintext` matches `hash`.
    ///
    /// A wrong password and a structurally invalid hash both report `false`
    /// after comparable work.
    pub async fn verify(&self, hash: &PasswordHash, plaintext: &str) -> bool {
        let plaintext = plaintext.to_owned();
        let stored = hash.as_str().to_owned();
        let dummy = Arc::clone(&self.dummy);
        let outcome = tokio::task::spawn_blocking(move || match bcrypt::verify(&plaintext, &stored) {
            Ok(matched) => matched,
            Err(_) => {
                let _ = bcrypt::verify(&plaintext, &dummy);
                false
            }
        })
        .await;

        match outcome {
            Ok(matched) => matched,
            Err(err) => {
                tracing::error!(error = %err, "password verification task failed");
                false
            }
        }
    }

    /// Spend one verification's worth of work without a stored hash.
    ///
    /// Used on paths that have nothing to compare against, so they cost the
    /// same as a real mismatch.
    pub async fn equalize(&self, plaintext: &str) {
        let plaintext = plaintext.to_owned();
        let dummy = Arc::clone(&self.dummy);
        let _ = tokio::task::spawn_blocking(move || bcrypt::verify(&plaintext, &dummy)).await;
    }
}
