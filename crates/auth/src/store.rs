//! Credential Store contract and the in-memory implementation used by
//! tests and `STORAGE_BACKEND=memory` deployments.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use taskmanager_core::UserId;

use crate::error::BoxError;
use crate::identity::Identity;

/// Credential store failure.
///
/// "No such row" is a normal outcome and is kept apart from connectivity
/// failures so callers never mistake an outage for an unknown user.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity not found")]
    NotFound,

    #[error("identity conflict: {0}")]
    Conflict(String),

    #[error("credential store unavailable: {0}")]
    Unavailable(#[source] BoxError),
}

impl StoreError {
    pub fn unavailable(err: impl Into<BoxError>) -> Self {
        Self::Unavailable(err.into())
    }
}

/// Persistence boundary for identities.
///
/// Lookups by email expect an already-normalized address.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Identity, StoreError>;

    /// Persist a new identity. Fails with `Conflict` if the id or email is
    /// already taken.
    async fn create(&self, identity: &Identity) -> Result<(), StoreError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
}

#[async_trait]
impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Identity, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn create(&self, identity: &Identity) -> Result<(), StoreError> {
        (**self).create(identity).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        (**self).exists_by_email(email).await
    }
}

/// In-memory identity store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<UserId, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.identities.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a stored identity (role/active administration).
    pub fn replace(&self, identity: Identity) -> Result<(), StoreError> {
        let mut identities = self.identities.write().map_err(|_| poisoned())?;
        match identities.get_mut(&identity.id) {
            Some(slot) => {
                *slot = identity;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("identity store lock poisoned")
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError> {
        let identities = self.identities.read().map_err(|_| poisoned())?;
        identities
            .values()
            .find(|i| i.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Identity, StoreError> {
        let identities = self.identities.read().map_err(|_| poisoned())?;
        identities.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn create(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut identities = self.identities.write().map_err(|_| poisoned())?;
        if identities.contains_key(&identity.id) {
            return Err(StoreError::Conflict(format!("id {}", identity.id)));
        }
        if identities.values().any(|i| i.email == identity.email) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }
        identities.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let identities = self.identities.read().map_err(|_| poisoned())?;
        Ok(identities.values().any(|i| i.email == email))
    }
}
