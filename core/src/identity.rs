//! Request and response bodies of the identity service.

use crate::model::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Login email
    pub email: String,
    /// Plain-text password, sent once over the transport
    pub password: String,
    /// Requested role
    pub role: Role,
}

/// Answer to a registration request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterResponse {
    /// Whether the account was created
    pub success: bool,
    /// Server message
    #[serde(default)]
    pub message: String,
    /// Identifier of the new account, as text
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Login request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials<'a> {
    /// Login email
    pub email: &'a str,
    /// Password
    pub password: &'a str,
}

/// Answer to a login request.
///
/// The identity service reports bad credentials with `success: false` and a
/// 2xx status, so callers must check the flag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    /// Whether the credentials were accepted
    pub success: bool,
    /// Bearer token, present on success
    #[serde(default)]
    pub token: Option<String>,
    /// Server message
    #[serde(default)]
    pub message: String,
    /// User identifier, as text
    #[serde(default)]
    pub user_id: Option<String>,
    /// Role name
    #[serde(default)]
    pub role: Option<String>,
    /// Login email
    #[serde(default)]
    pub email: Option<String>,
}

/// Token request body shared by verify and revoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRequest<'a> {
    /// Bearer token
    pub token: &'a str,
}

/// Answer to a token check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenStatus {
    /// Token is usable
    pub valid: bool,
    /// Server message
    #[serde(default)]
    pub message: String,
    /// Subject email
    #[serde(default)]
    pub email: Option<String>,
    /// Subject identifier, as text
    #[serde(default)]
    pub user_id: Option<String>,
    /// Subject role
    #[serde(default)]
    pub role: Option<String>,
    /// Issuing authority
    #[serde(default)]
    pub issuer: Option<String>,
    /// Expiry as Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Token has expired
    #[serde(default)]
    pub expired: bool,
    /// Token was revoked
    #[serde(default)]
    pub blacklisted: bool,
}

impl TokenStatus {
    /// Expiry instant, when reported.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }

    /// Whether the token may keep backing a session.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.valid && !self.expired && !self.blacklisted
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failed_login_deserializes_without_token() {
        let response: LoginResponse = serde_json::from_value(json!({
            "success": false,
            "token": null,
            "message": "Invalid credentials"
        }))
        .unwrap();

        assert!(!response.success);
        assert_eq!(response.token, None);
        assert_eq!(response.message, "Invalid credentials");
    }

    #[test]
    fn blacklisted_token_is_not_usable() {
        let status: TokenStatus = serde_json::from_value(json!({
            "valid": true,
            "message": "Token revoked",
            "expires_at": 1_700_000_000,
            "expired": false,
            "blacklisted": true
        }))
        .unwrap();

        assert!(!status.is_usable());
        assert_eq!(status.expires_at().map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn registration_serializes_role_name() {
        let body = serde_json::to_value(Registration {
            email: "a@b.c".to_string(),
            password: "pw".to_string(),
            role: Role::Owner,
        })
        .unwrap();

        assert_eq!(body, json!({ "email": "a@b.c", "password": "pw", "role": "owner" }));
    }
}
