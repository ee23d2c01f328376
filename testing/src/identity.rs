//! In-memory identity service.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use ticketdesk_core::error::{Result, ServiceError};
use ticketdesk_core::identity::{LoginResponse, RegisterResponse, Registration, TokenStatus};
use ticketdesk_core::model::{Role, UserId};
use ticketdesk_core::services::IdentityService;

const ISSUER: &str = "ticketdesk-testing";

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    password: String,
    role: Role,
}

#[derive(Debug, Clone)]
struct Grant {
    email: String,
    id: UserId,
    role: Role,
}

#[derive(Debug, Default)]
struct IdentityState {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, Grant>,
    revoked: HashSet<String>,
    expired: HashSet<String>,
    fail_revoke: Option<ServiceError>,
    next_id: i64,
}

/// Identity service issuing opaque `token-<n>` tokens.
///
/// Mirrors the real gateway's habits: refused credentials and duplicate
/// registrations answer `success: false` with a 2xx status, and ids travel as
/// text.
#[derive(Clone, Debug, Default)]
pub struct InMemoryIdentity {
    state: Arc<RwLock<IdentityState>>,
}

impl InMemoryIdentity {
    /// Create a service without accounts
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account with a fixed id
    #[must_use]
    pub fn with_account(self, id: UserId, email: &str, password: &str, role: Role) -> Self {
        {
            let mut state = self.state.write().unwrap();
            state.next_id = state.next_id.max(id.get());
            state.accounts.insert(
                email.to_string(),
                Account {
                    id,
                    password: password.to_string(),
                    role,
                },
            );
        }
        self
    }

    /// Make every revoke call fail with `error`
    pub fn fail_revoke(&self, error: ServiceError) {
        self.state.write().unwrap().fail_revoke = Some(error);
    }

    /// Mark a token as expired
    pub fn expire(&self, token: &str) {
        self.state.write().unwrap().expired.insert(token.to_string());
    }

    /// Whether `token` was revoked
    #[must_use]
    pub fn is_revoked(&self, token: &str) -> bool {
        self.state.read().unwrap().revoked.contains(token)
    }
}

impl IdentityService for InMemoryIdentity {
    async fn register(&self, registration: &Registration) -> Result<RegisterResponse> {
        let mut state = self.state.write().unwrap();
        if state.accounts.contains_key(&registration.email) {
            return Ok(RegisterResponse {
                success: false,
                message: "User already exists".to_string(),
                user_id: None,
            });
        }

        state.next_id += 1;
        let id = UserId::new(state.next_id);
        state.accounts.insert(
            registration.email.clone(),
            Account {
                id,
                password: registration.password.clone(),
                role: registration.role,
            },
        );
        Ok(RegisterResponse {
            success: true,
            message: "User registered successfully".to_string(),
            user_id: Some(id.get().to_string()),
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let mut state = self.state.write().unwrap();
        let Some(account) = state
            .accounts
            .get(email)
            .filter(|account| account.password == password)
            .cloned()
        else {
            return Ok(LoginResponse {
                success: false,
                token: None,
                message: "Invalid credentials".to_string(),
                user_id: None,
                role: None,
                email: None,
            });
        };

        let token = format!("token-{}", state.tokens.len() + 1);
        state.tokens.insert(
            token.clone(),
            Grant {
                email: email.to_string(),
                id: account.id,
                role: account.role,
            },
        );
        Ok(LoginResponse {
            success: true,
            token: Some(token),
            message: "Login successful".to_string(),
            user_id: Some(account.id.get().to_string()),
            role: Some(account.role.as_str().to_string()),
            email: Some(email.to_string()),
        })
    }

    async fn verify(&self, token: &str) -> Result<TokenStatus> {
        let state = self.state.read().unwrap();
        let Some(grant) = state.tokens.get(token) else {
            return Ok(TokenStatus {
                valid: false,
                message: "Invalid token".to_string(),
                email: None,
                user_id: None,
                role: None,
                issuer: None,
                expires_at: None,
                expired: false,
                blacklisted: false,
            });
        };

        let blacklisted = state.revoked.contains(token);
        let expired = state.expired.contains(token);
        Ok(TokenStatus {
            valid: !blacklisted && !expired,
            message: if blacklisted {
                "Token has been revoked".to_string()
            } else if expired {
                "Token has expired".to_string()
            } else {
                "Token is valid".to_string()
            },
            email: Some(grant.email.clone()),
            user_id: Some(grant.id.get().to_string()),
            role: Some(grant.role.as_str().to_string()),
            issuer: Some(ISSUER.to_string()),
            expires_at: Some((Utc::now() + Duration::hours(1)).timestamp()),
            expired,
            blacklisted,
        })
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if let Some(error) = &state.fail_revoke {
            return Err(error.clone());
        }
        state.revoked.insert(token.to_string());
        Ok(())
    }
}
