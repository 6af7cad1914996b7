use taskmanager_auth::{Principal, Role};
use taskmanager_core::UserId;

/// Principal context for a request (verified caller of a protected route).
///
/// Inserted by the auth middleware; absent on public routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn subject(&self) -> UserId {
        self.principal.subject
    }

    pub fn email(&self) -> &str {
        &self.principal.email
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
