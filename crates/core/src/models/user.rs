//! Account types.

use serde::{Deserialize, Serialize};

use crate::types::{UserId, UserRole};

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

impl CurrentUser {
    /// Whether the user may use the admin API.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Body for `POST /auth/login`.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Response of `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: CurrentUser,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_debug_redacts_secrets() {
        let request = LoginRequest {
            email: "asha@example.com".to_string(),
            password: "hunter2-but-longer".to_string(),
        };
        let debug_output = format!("{request:?}");
        assert!(debug_output.contains("asha@example.com"));
        assert!(!debug_output.contains("hunter2-but-longer"));
    }

    #[test]
    fn test_user_accepts_either_id_key() {
        let user: CurrentUser =
            serde_json::from_str(r#"{"id": "u1", "email": "a@b.c", "role": "admin"}"#)
                .unwrap_or_else(|e| panic!("{e}"));
        assert!(user.is_admin());
    }
}
