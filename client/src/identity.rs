//! HTTP adapter for the identity service.

use crate::client::HttpClient;
use ticketdesk_core::error::{Result, ServiceError};
use ticketdesk_core::identity::{
    Credentials, LoginResponse, RegisterResponse, Registration, TokenRequest, TokenStatus,
};
use ticketdesk_core::services::IdentityService;

/// Identity service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpIdentity {
    http: HttpClient,
}

impl HttpIdentity {
    /// Create an adapter over `http`, bound to the identity base URL.
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ServiceError::Decode(e.to_string()))
}

impl IdentityService for HttpIdentity {
    async fn register(&self, registration: &Registration) -> Result<RegisterResponse> {
        decode(self.http.post(&["register"], registration, None).await?)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let credentials = Credentials { email, password };
        decode(self.http.post(&["login"], &credentials, None).await?)
    }

    async fn verify(&self, token: &str) -> Result<TokenStatus> {
        decode(self.http.post(&["verify"], &TokenRequest { token }, None).await?)
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        self.http.post(&["revoke"], &TokenRequest { token }, None).await?;
        Ok(())
    }
}
