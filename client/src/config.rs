//! Client configuration: service base URLs and the default page size.
//!
//! Values come from built-in defaults, overridden by environment variables
//! (a `.env` file is honored):
//!
//! | Variable                  | Default                                      |
//! |---------------------------|----------------------------------------------|
//! | `TICKETDESK_IDENTITY_URL` | `http://localhost:8000/api/idm/auth`         |
//! | `TICKETDESK_CATALOG_URL`  | `http://localhost:12345/api/event-manager`   |
//! | `TICKETDESK_USERS_URL`    | `http://localhost:12346/api/user-manager`    |
//! | `TICKETDESK_PER_PAGE`     | `10`                                         |
//!
//! # Example
//!
//! ```no_run
//! use ticketdesk_client::config::ClientConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! println!("Catalog at {}", config.urls.catalog);
//! # Ok(())
//! # }
//! ```

use crate::error::ConfigError;
use url::Url;

/// Identity service base URL variable
pub const IDENTITY_URL_VAR: &str = "TICKETDESK_IDENTITY_URL";
/// Catalog service base URL variable
pub const CATALOG_URL_VAR: &str = "TICKETDESK_CATALOG_URL";
/// User service base URL variable
pub const USERS_URL_VAR: &str = "TICKETDESK_USERS_URL";
/// Default page size variable
pub const PER_PAGE_VAR: &str = "TICKETDESK_PER_PAGE";

const DEFAULT_IDENTITY_URL: &str = "http://localhost:8000/api/idm/auth";
const DEFAULT_CATALOG_URL: &str = "http://localhost:12345/api/event-manager";
const DEFAULT_USERS_URL: &str = "http://localhost:12346/api/user-manager";
const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 100;

/// Base URLs of the three services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrls {
    /// Identity service (`/register`, `/login`, `/verify`, `/revoke`)
    pub identity: Url,
    /// Catalog service (events, packets, inclusions, tickets)
    pub catalog: Url,
    /// User service (users, purchases, customers)
    pub users: Url,
}

impl ServiceUrls {
    /// Parse three base URLs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` or `ConfigError::NotABase` for an
    /// unusable value.
    pub fn parse(identity: &str, catalog: &str, users: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            identity: parse_base(IDENTITY_URL_VAR, identity)?,
            catalog: parse_base(CATALOG_URL_VAR, catalog)?,
            users: parse_base(USERS_URL_VAR, users)?,
        })
    }

    /// The local development endpoints.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the built-in URLs are valid.
    pub fn local() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_IDENTITY_URL, DEFAULT_CATALOG_URL, DEFAULT_USERS_URL)
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base URLs
    pub urls: ServiceUrls,
    /// Page size requested when the caller does not pick one
    pub per_page: u32,
}

impl ClientConfig {
    /// Configuration pointing at the local development endpoints.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the built-in URLs are valid.
    pub fn local() -> Result<Self, ConfigError> {
        Ok(Self {
            urls: ServiceUrls::local()?,
            per_page: DEFAULT_PER_PAGE,
        })
    }

    /// Load configuration from the process environment and `.env`.
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an invalid value
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Unset or blank variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an invalid value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::local()?;
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = value(IDENTITY_URL_VAR) {
            config.urls.identity = parse_base(IDENTITY_URL_VAR, &raw)?;
        }
        if let Some(raw) = value(CATALOG_URL_VAR) {
            config.urls.catalog = parse_base(CATALOG_URL_VAR, &raw)?;
        }
        if let Some(raw) = value(USERS_URL_VAR) {
            config.urls.users = parse_base(USERS_URL_VAR, &raw)?;
        }
        if let Some(raw) = value(PER_PAGE_VAR) {
            config.per_page = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPageSize(raw.clone()))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if the page size is outside `1..=100`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ConfigError::InvalidPageSize(self.per_page.to_string()));
        }
        Ok(())
    }
}

fn parse_base(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        var,
        value: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase {
            var,
            value: raw.to_string(),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_parse() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.urls.catalog.as_str(), DEFAULT_CATALOG_URL);
        assert_eq!(config.urls.identity.port(), Some(8000));
        assert_eq!(config.per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (CATALOG_URL_VAR, "https://catalog.example.com/api/event-manager"),
            (PER_PAGE_VAR, "25"),
            (USERS_URL_VAR, "  "),
        ]))
        .unwrap();

        assert_eq!(config.urls.catalog.host_str(), Some("catalog.example.com"));
        assert_eq!(config.per_page, 25);
        assert_eq!(config.urls.users.as_str(), DEFAULT_USERS_URL);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(IDENTITY_URL_VAR, "not a url")])),
            Err(ConfigError::InvalidUrl { var: IDENTITY_URL_VAR, .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(CATALOG_URL_VAR, "mailto:ops@example.com")])),
            Err(ConfigError::NotABase { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(PER_PAGE_VAR, "0")])),
            Err(ConfigError::InvalidPageSize(_))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(PER_PAGE_VAR, "ten")])),
            Err(ConfigError::InvalidPageSize(_))
        ));
    }
}
