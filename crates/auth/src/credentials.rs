//! Credential Service: the trust boundary where identity is established.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use taskmanager_core::UserId;

use crate::context::CallContext;
use crate::error::{AuthError, AuthResult, BoxError};
use crate::identity::{
    Identity, normalize_email, validate_display_name, validate_email, validate_password,
};
use crate::password::PasswordHasher;
use crate::roles::Role;
use crate::store::{IdentityStore, StoreError};

/// Side channel fired after a registration has been persisted.
///
/// Failures are logged and never undo or fail the registration.
#[async_trait]
pub trait RegistrationNotifier: Send + Sync {
    async fn identity_registered(&self, identity: &Identity) -> Result<(), BoxError>;
}

/// Default notifier: records the event in the log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl RegistrationNotifier for LogNotifier {
    async fn identity_registered(&self, identity: &Identity) -> Result<(), BoxError> {
        tracing::info!(user_id = %identity.id, "welcome notification queued");
        Ok(())
    }
}

/// Registration, login and lookup over an [`IdentityStore`].
///
/// Errors keep `NotFound` and `InvalidCredentials` apart for logging; the
/// network layer is responsible for collapsing them
/// (see [`AuthError::into_public_login_error`]).
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn IdentityStore>,
    hasher: PasswordHasher,
    notifier: Arc<dyn RegistrationNotifier>,
}

impl core::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialService")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl CredentialService {
    pub fn new(store: Arc<dyn IdentityStore>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            hasher,
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn RegistrationNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub async fn register(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<Identity> {
        let email = normalize_email(email);
        let display_name = display_name.trim();
        validate_email(&email)?;
        validate_password(password)?;
        validate_display_name(display_name)?;

        let identity = ctx
            .run(self.create_identity(&email, password, display_name))
            .await?;

        tracing::info!(user_id = %identity.id, "identity registered");

        if let Err(err) = self.notifier.identity_registered(&identity).await {
            tracing::warn!(user_id = %identity.id, error = %err, "registration notification failed");
        }

        Ok(identity)
    }

    pub async fn login(&self, ctx: &CallContext, email: &str, password: &str) -> AuthResult<Identity> {
        let email = normalize_email(email);

        ctx.run(self.check_credentials(&email, password)).await
    }

    pub async fn get_by_id(&self, ctx: &CallContext, id: UserId) -> AuthResult<Identity> {
        ctx.run(async { self.store.find_by_id(id).await.map_err(AuthError::from) })
            .await
    }

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<Identity> {
        if self.store.exists_by_email(email).await? {
            tracing::info!("registration rejected: email already registered");
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = self.hasher.hash(password).await?;
        let now = Utc::now();
        let identity = Identity {
            id: UserId::new(),
            email: email.to_string(),
            password_hash,
            display_name: display_name.to_string(),
            role: Role::User,
            active: true,
            created_at: now,
            updated_at: now,
        };

        // A concurrent registration can still win between the check and
        // here; the store's uniqueness conflict maps to AlreadyExists too.
        self.store.create(&identity).await?;
        Ok(identity)
    }

    async fn check_credentials(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let identity = match self.store.find_by_email(email).await {
            Ok(identity) => identity,
            Err(StoreError::NotFound) => {
                self.hasher.equalize(password).await;
                tracing::warn!(reason = "not_found", "login failed");
                return Err(AuthError::NotFound);
            }
            Err(other) => return Err(other.into()),
        };

        if !self.hasher.verify(&identity.password_hash, password).await {
            tracing::warn!(user_id = %identity.id, reason = "invalid_password", "login failed");
            return Err(AuthError::InvalidCredentials);
        }

        if !identity.active {
            tracing::warn!(user_id = %identity.id, reason = "inactive", "login failed");
            return Err(AuthError::Inactive);
        }

        tracing::debug!(user_id = %identity.id, "login succeeded");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::store::InMemoryIdentityStore;

    fn service(store: Arc<InMemoryIdentityStore>) -> CredentialService {
        CredentialService::new(store, PasswordHasher::new(4).unwrap())
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<UserId>>);

    #[async_trait]
    impl RegistrationNotifier for Recording {
        async fn identity_registered(&self, identity: &Identity) -> Result<(), BoxError> {
            self.0.lock().unwrap().push(identity.id);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl RegistrationNotifier for Failing {
        async fn identity_registered(&self, _: &Identity) -> Result<(), BoxError> {
            Err("mail relay down".into())
        }
    }

    #[tokio::test]
    async fn register_creates_active_user() {
        let store = InMemoryIdentityStore::arc();
        let svc = service(store.clone());
        let ctx = CallContext::background();

        let identity = svc.register(&ctx, "A@X.com", "pw", "A").await.unwrap();
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.role, Role::User);
        assert!(identity.active);
        assert_ne!(identity.password_hash.as_str(), "pw");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let store = InMemoryIdentityStore::arc();
        let svc = service(store.clone());
        let ctx = CallContext::background();

        svc.register(&ctx, "a@x.com", "pw", "A").await.unwrap();
        let err = svc.register(&ctx, "a@x.com", "pw2", "B").await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));

        // Case variants of the same address collide too.
        let err = svc.register(&ctx, " A@x.COM", "pw3", "C").await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let svc = service(InMemoryIdentityStore::arc());
        let ctx = CallContext::background();

        for (email, password, name) in [
            ("not-an-email", "pw", "A"),
            ("a@x.com", "", "A"),
            ("a@x.com", "pw", "   "),
        ] {
            let err = svc.register(&ctx, email, password, name).await.unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)), "{email}/{name}: {err:?}");
        }
    }

    #[tokio::test]
    async fn login_success_returns_identity_unchanged() {
        let svc = service(InMemoryIdentityStore::arc());
        let ctx = CallContext::background();
        let registered = svc.register(&ctx, "a@x.com", "pw", "A").await.unwrap();

        let logged_in = svc.login(&ctx, "A@x.com", "pw").await.unwrap();
        assert_eq!(logged_in, registered);
    }

    #[tokio::test]
    async fn login_failures_are_distinct_internally_uniform_externally() {
        let svc = service(InMemoryIdentityStore::arc());
        let ctx = CallContext::background();
        svc.register(&ctx, "a@x.com", "pw", "A").await.unwrap();

        let wrong = svc.login(&ctx, "a@x.com", "wrong").await.unwrap_err();
        let unknown = svc.login(&ctx, "nosuch@x.com", "pw").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::NotFound));

        let wrong = wrong.into_public_login_error();
        let unknown = unknown.into_public_login_error();
        assert_eq!(wrong.code(), unknown.code());
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn inactive_identity_cannot_log_in() {
        let store = InMemoryIdentityStore::arc();
        let svc = service(store.clone());
        let ctx = CallContext::background();
        let mut identity = svc.register(&ctx, "a@x.com", "pw", "A").await.unwrap();
        identity.active = false;
        store.replace(identity).unwrap();

        assert!(matches!(
            svc.login(&ctx, "a@x.com", "pw").await,
            Err(AuthError::Inactive)
        ));
        // A wrong password still reports as such, not as inactive.
        assert!(matches!(
            svc.login(&ctx, "a@x.com", "nope").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn get_by_id() {
        let svc = service(InMemoryIdentityStore::arc());
        let ctx = CallContext::background();
        let identity = svc.register(&ctx, "a@x.com", "pw", "A").await.unwrap();

        assert_eq!(svc.get_by_id(&ctx, identity.id).await.unwrap(), identity);
        assert!(matches!(
            svc.get_by_id(&ctx, UserId::new()).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn notifier_runs_after_write_and_cannot_fail_registration() {
        let store = InMemoryIdentityStore::arc();
        let recording = Arc::new(Recording::default());
        let svc = service(store.clone()).with_notifier(recording.clone());
        let ctx = CallContext::background();

        let identity = svc.register(&ctx, "a@x.com", "pw", "A").await.unwrap();
        assert_eq!(*recording.0.lock().unwrap(), vec![identity.id]);

        let svc = service(store.clone()).with_notifier(Arc::new(Failing));
        assert!(svc.register(&ctx, "b@x.com", "pw", "B").await.is_ok());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn cancelled_registration_writes_nothing() {
        let store = InMemoryIdentityStore::arc();
        let svc = service(store.clone());
        let ctx = CallContext::background();
        ctx.cancellation().cancel();

        assert!(matches!(
            svc.register(&ctx, "a@x.com", "pw", "A").await,
            Err(AuthError::Cancelled)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expired_deadline_is_reported() {
        let svc = service(InMemoryIdentityStore::arc());
        let ctx = CallContext::with_timeout(Duration::ZERO);

        assert!(matches!(
            svc.login(&ctx, "a@x.com", "pw").await,
            Err(AuthError::DeadlineExceeded)
        ));
    }
}
