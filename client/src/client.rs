//! Shared HTTP transport for the service adapters.
//!
//! Every adapter owns an [`HttpClient`] bound to its service's base URL. The
//! transport attaches the bearer token when one is given, and reduces every
//! outcome to either a JSON value or a [`ServiceError`]: transport failures
//! become `Network`, non-success statuses become `Status` with whatever body
//! the service sent, and unreadable success bodies become `Decode`.

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use ticketdesk_core::error::{ErrorBody, Result, ServiceError};
use url::Url;

/// A reqwest client bound to one service base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base: Url,
}

impl HttpClient {
    /// Bind `client` to `base`.
    #[must_use]
    pub const fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// The service base URL.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Build the URL of `segments` below the base. Segments are
    /// percent-encoded individually.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Rejected` if the base cannot carry a path
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::Rejected(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET` with optional query parameters.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, error statuses or unreadable bodies
    pub async fn get(
        &self,
        segments: &[&str],
        query: &[(String, String)],
        token: Option<&str>,
    ) -> Result<Value> {
        let request = self.request(Method::GET, segments, token)?.query(query);
        self.execute(request).await
    }

    /// `POST` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, error statuses or unreadable bodies
    pub async fn post<B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
        token: Option<&str>,
    ) -> Result<Value> {
        let request = self.request(Method::POST, segments, token)?.json(body);
        self.execute(request).await
    }

    /// `DELETE` without a body.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, error statuses or unreadable bodies
    pub async fn delete(&self, segments: &[&str], token: Option<&str>) -> Result<Value> {
        let request = self.request(Method::DELETE, segments, token)?;
        self.execute(request).await
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&str>,
    ) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        tracing::debug!(%method, %url, authenticated = token.is_some(), "Sending request");

        let request = self.client.request(method, url);
        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Request failed");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: (!text.trim().is_empty()).then(|| ErrorBody::from_text(text)),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpClient {
        HttpClient::new(Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn url_appends_segments_below_base() {
        let http = client("http://localhost:12345/api/event-manager");
        let url = http.url(&["event-packet-inclusions", "event", "3", "packet", "5"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:12345/api/event-manager/event-packet-inclusions/event/3/packet/5"
        );
    }

    #[test]
    fn url_tolerates_trailing_slash_and_encodes() {
        let http = client("http://localhost:12345/api/event-manager/");
        let url = http.url(&["tickets", "AB/12 x"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:12345/api/event-manager/tickets/AB%2F12%20x"
        );
    }
}
