//! Gateway-side request checks and response envelopes.
//!
//! The Auth Service enforces its own minimums; the gateway applies the
//! stricter public-facing rules before forwarding.

use serde::Serialize;

use taskmanager_auth::protocol::{LoginRequest, RefreshRequest, RegisterRequest};
use taskmanager_tasks::Task;

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MIN_DISPLAY_NAME_CHARS: usize = 2;
pub const MAX_DISPLAY_NAME_CHARS: usize = 100;

#[derive(Debug, Serialize)]
pub struct TaskEnvelope {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub total: usize,
}

impl From<Vec<Task>> for TaskList {
    fn from(tasks: Vec<Task>) -> Self {
        Self {
            total: tasks.len(),
            tasks,
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

pub fn validate_registration(req: &RegisterRequest) -> Result<(), String> {
    if !looks_like_email(&req.email) {
        return Err("email must be a valid email address".into());
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(format!("password must be at least {MIN_PASSWORD_CHARS} characters"));
    }
    let name_len = req.display_name.trim().chars().count();
    if !(MIN_DISPLAY_NAME_CHARS..=MAX_DISPLAY_NAME_CHARS).contains(&name_len) {
        return Err(format!(
            "display_name must be {MIN_DISPLAY_NAME_CHARS}..={MAX_DISPLAY_NAME_CHARS} characters"
        ));
    }
    Ok(())
}

pub fn validate_login(req: &LoginRequest) -> Result<(), String> {
    if !looks_like_email(&req.email) {
        return Err("email must be a valid email address".into());
    }
    if req.password.is_empty() {
        return Err("password is required".into());
    }
    Ok(())
}

pub fn validate_refresh(req: &RefreshRequest) -> Result<(), String> {
    if req.refresh_token.trim().is_empty() {
        return Err("refresh_token is required".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str, password: &str, name: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            display_name: name.into(),
        }
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration(&registration("a@x.com", "secret", "Al")).is_ok());
        assert!(validate_registration(&registration("a@x.com", "pw", "Al")).is_err());
        assert!(validate_registration(&registration("a@x.com", "secret", "A")).is_err());
        assert!(validate_registration(&registration("a@x.com", "secret", &"n".repeat(101))).is_err());
        assert!(validate_registration(&registration("not-an-email", "secret", "Al")).is_err());
        assert!(validate_registration(&registration("a@b@x.com", "secret", "Al")).is_err());
        assert!(validate_registration(&registration("a@localhost", "secret", "Al")).is_err());
    }

    #[test]
    fn login_only_needs_a_password() {
        let ok = LoginRequest {
            email: "a@x.com".into(),
            password: "x".into(),
        };
        assert!(validate_login(&ok).is_ok());
        let empty = LoginRequest {
            password: String::new(),
            ..ok
        };
        assert!(validate_login(&empty).is_err());
    }

    #[test]
    fn task_list_counts_its_items() {
        let list = TaskList::from(Vec::new());
        assert_eq!(list.total, 0);
        assert_eq!(
            serde_json::to_value(&list).unwrap(),
            serde_json::json!({ "tasks": [], "total": 0 })
        );
    }
}
