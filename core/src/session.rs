//! Session context: the identity, role and bearer token of the logged-in user.
//!
//! There is no ambient session. Every service call receives a
//! [`SessionContext`] explicitly, and operations that need an identity call
//! [`SessionContext::require`] before touching the network.

use crate::classify::{clean_message, ClassifyContext};
use crate::error::{ClassifiedError, ErrorKind, ServiceError};
use crate::identity::{LoginResponse, RegisterResponse, Registration};
use crate::model::{Role, UserId};
use crate::services::IdentityService;
use chrono::{DateTime, Utc};

const LOGIN_FAILED: &str = "Login failed.";
const REGISTER_FAILED: &str = "Registration failed.";

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user_id: UserId,
    role: Role,
    email: String,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Create a session for an already-issued token.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        user_id: UserId,
        role: Role,
        email: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            user_id,
            role,
            email: email.into(),
            started_at: Utc::now(),
        }
    }

    /// Bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Logged-in user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Role of the logged-in user.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Login email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// When the session was installed.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the user organizes events.
    #[must_use]
    pub const fn is_owner(&self) -> bool {
        matches!(self.role, Role::Owner)
    }

    fn from_login(response: LoginResponse) -> Result<Self, ServiceError> {
        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ServiceError::Decode("login response carries no token".to_string()))?;
        let user_id = response
            .user_id
            .as_deref()
            .and_then(|id| id.trim().parse::<i64>().ok())
            .map(UserId::new)
            .ok_or_else(|| ServiceError::Decode("login response carries no user id".to_string()))?;
        let role = response
            .role
            .as_deref()
            .and_then(Role::parse)
            .ok_or_else(|| {
                ServiceError::Decode("login response carries no known role".to_string())
            })?;

        Ok(Self::new(token, user_id, role, response.email.unwrap_or_default()))
    }
}

/// The session passed to every service call; empty when nobody is logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    current: Option<Session>,
}

impl SessionContext {
    /// A context without a session.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { current: None }
    }

    /// A context holding `session`.
    #[must_use]
    pub const fn authenticated(session: Session) -> Self {
        Self {
            current: Some(session),
        }
    }

    /// The active session, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Whether a session is active.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Bearer token of the active session.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.current.as_ref().map(Session::token)
    }

    /// The active session, or [`ServiceError::MissingSession`].
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::MissingSession` when nobody is logged in.
    pub fn require(&self) -> Result<&Session, ServiceError> {
        self.current.as_ref().ok_or(ServiceError::MissingSession)
    }

    /// Install a session, replacing any previous one.
    pub fn begin(&mut self, session: Session) {
        tracing::info!(user = %session.user_id, role = %session.role, "Session started");
        self.current = Some(session);
    }

    /// Drop the active session and return it.
    pub fn end(&mut self) -> Option<Session> {
        let ended = self.current.take();
        if let Some(session) = &ended {
            tracing::info!(user = %session.user_id, "Session ended");
        }
        ended
    }

    /// Log in and install the resulting session.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthenticated` error carrying the service's message when
    /// the credentials are refused, or the classified transport failure.
    pub async fn login<I: IdentityService>(
        &mut self,
        identity: &I,
        email: &str,
        password: &str,
    ) -> Result<&Session, ClassifiedError> {
        let context = ClassifyContext::new(LOGIN_FAILED);
        let response = identity
            .login(email, password)
            .await
            .map_err(|e| e.classify(&context))?;

        if !response.success {
            tracing::warn!(email, message = %response.message, "Login refused");
            let message = clean_message(&response.message);
            let message = if message.is_empty() {
                LOGIN_FAILED.to_string()
            } else {
                message
            };
            return Err(ClassifiedError::new(ErrorKind::Unauthenticated, message));
        }

        let session = Session::from_login(response).map_err(|e| {
            tracing::warn!(error = %e, "Malformed login response");
            e.classify(&context)
        })?;
        self.begin(session);
        self.require().map_err(|e| e.classify(&context))
    }

    /// End the session and revoke its token.
    ///
    /// Revocation is best effort: a failure is logged and the local session is
    /// cleared regardless.
    pub async fn logout<I: IdentityService>(&mut self, identity: &I) {
        let Some(session) = self.end() else {
            return;
        };
        if let Err(e) = identity.revoke(session.token()).await {
            tracing::warn!(user = %session.user_id(), error = %e, "Token revocation failed");
        }
    }

    /// Check the active token with the identity service.
    ///
    /// Returns `Ok(false)` and tears the session down when the token is no
    /// longer usable, and `Ok(false)` when no session is active.
    ///
    /// # Errors
    ///
    /// Returns the classified failure when the check itself could not be made;
    /// the session is kept in that case.
    pub async fn verify<I: IdentityService>(
        &mut self,
        identity: &I,
    ) -> Result<bool, ClassifiedError> {
        let Some(token) = self.bearer_token().map(str::to_string) else {
            return Ok(false);
        };

        let status = identity
            .verify(&token)
            .await
            .map_err(|e| e.classify(&ClassifyContext::new("Unable to verify session.")))?;

        if status.is_usable() {
            return Ok(true);
        }

        tracing::info!(
            expired = status.expired,
            blacklisted = status.blacklisted,
            message = %status.message,
            "Token no longer valid"
        );
        self.end();
        Ok(false)
    }
}

/// Create an account.
///
/// # Errors
///
/// Returns the classified failure, or a `BadRequest` error with the service's
/// message when the account was refused.
pub async fn register<I: IdentityService>(
    identity: &I,
    registration: &Registration,
) -> Result<RegisterResponse, ClassifiedError> {
    let response = identity
        .register(registration)
        .await
        .map_err(|e| e.classify(&ClassifyContext::new(REGISTER_FAILED)))?;

    if response.success {
        tracing::info!(
            email = %registration.email,
            role = %registration.role,
            "Account registered"
        );
        Ok(response)
    } else {
        let message = clean_message(&response.message);
        Err(ClassifiedError::new(
            ErrorKind::BadRequest,
            if message.is_empty() {
                REGISTER_FAILED.to_string()
            } else {
                message
            },
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::identity::TokenStatus;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeIdentity {
        login: Option<LoginResponse>,
        verify: Option<TokenStatus>,
        revoke_fails: bool,
        revoked: Mutex<Vec<String>>,
    }

    impl IdentityService for FakeIdentity {
        async fn register(&self, registration: &Registration) -> Result<RegisterResponse> {
            if registration.email.contains('@') {
                Ok(RegisterResponse {
                    success: true,
                    message: "User registered successfully".to_string(),
                    user_id: Some("12".to_string()),
                })
            } else {
                Ok(RegisterResponse {
                    success: false,
                    message: "email is not valid".to_string(),
                    user_id: None,
                })
            }
        }

        async fn login(&self, _email: &str, _password: &str) -> Result<LoginResponse> {
            self.login
                .clone()
                .ok_or_else(|| ServiceError::Network("connection refused".to_string()))
        }

        async fn verify(&self, _token: &str) -> Result<TokenStatus> {
            self.verify
                .clone()
                .ok_or_else(|| ServiceError::status(503, "down"))
        }

        async fn revoke(&self, token: &str) -> Result<()> {
            self.revoked.lock().unwrap().push(token.to_string());
            if self.revoke_fails {
                Err(ServiceError::status(500, "boom"))
            } else {
                Ok(())
            }
        }
    }

    fn accepted_login() -> LoginResponse {
        LoginResponse {
            success: true,
            token: Some("tok-1".to_string()),
            message: "Login successful".to_string(),
            user_id: Some("7".to_string()),
            role: Some("Owner-Event".to_string()),
            email: Some("org@example.com".to_string()),
        }
    }

    fn token_status(valid: bool, expired: bool) -> TokenStatus {
        TokenStatus {
            valid,
            message: String::new(),
            email: None,
            user_id: None,
            role: None,
            issuer: None,
            expires_at: None,
            expired,
            blacklisted: false,
        }
    }

    #[test]
    fn require_without_session_fails_fast() {
        let context = SessionContext::anonymous();
        assert_eq!(context.require(), Err(ServiceError::MissingSession));
        assert_eq!(context.bearer_token(), None);
    }

    #[tokio::test]
    async fn login_installs_session() {
        let identity = FakeIdentity {
            login: Some(accepted_login()),
            ..FakeIdentity::default()
        };
        let mut context = SessionContext::anonymous();

        let session = context.login(&identity, "org@example.com", "pw").await.unwrap();
        assert_eq!(session.user_id(), UserId::new(7));
        assert!(session.is_owner());
        assert_eq!(context.bearer_token(), Some("tok-1"));
    }

    #[tokio::test]
    async fn refused_login_surfaces_server_message() {
        let identity = FakeIdentity {
            login: Some(LoginResponse {
                success: false,
                token: None,
                message: "invalid credentials".to_string(),
                user_id: None,
                role: None,
                email: None,
            }),
            ..FakeIdentity::default()
        };
        let mut context = SessionContext::anonymous();

        let error = context.login(&identity, "x@y.z", "bad").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Unauthenticated);
        assert_eq!(error.message, "Invalid credentials.");
        assert!(!context.is_authenticated());
    }

    #[tokio::test]
    async fn unreachable_identity_is_classified() {
        let mut context = SessionContext::anonymous();
        let error = context
            .login(&FakeIdentity::default(), "x@y.z", "pw")
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::NetworkUnreachable);
    }

    #[tokio::test]
    async fn logout_clears_session_even_when_revoke_fails() {
        let identity = FakeIdentity {
            revoke_fails: true,
            ..FakeIdentity::default()
        };
        let mut context =
            SessionContext::authenticated(Session::new(
                "tok-9",
                UserId::new(1),
                Role::Client,
                "c@x.y",
            ));

        context.logout(&identity).await;
        assert!(!context.is_authenticated());
        assert_eq!(*identity.revoked.lock().unwrap(), vec!["tok-9".to_string()]);
    }

    #[tokio::test]
    async fn expired_token_ends_session() {
        let identity = FakeIdentity {
            verify: Some(token_status(true, true)),
            ..FakeIdentity::default()
        };
        let mut context =
            SessionContext::authenticated(Session::new(
                "tok",
                UserId::new(1),
                Role::Client,
                "c@x.y",
            ));

        assert!(!context.verify(&identity).await.unwrap());
        assert!(!context.is_authenticated());
    }

    #[tokio::test]
    async fn failed_verification_keeps_session() {
        let mut context =
            SessionContext::authenticated(Session::new(
                "tok",
                UserId::new(1),
                Role::Client,
                "c@x.y",
            ));

        let error = context.verify(&FakeIdentity::default()).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Unavailable);
        assert!(context.is_authenticated());
    }

    #[tokio::test]
    async fn refused_registration_is_bad_request() {
        let registration = Registration {
            email: "nope".to_string(),
            password: "pw".to_string(),
            role: Role::Client,
        };
        let error = register(&FakeIdentity::default(), &registration).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::BadRequest);
        assert_eq!(error.message, "Email is not valid.");
    }
}
