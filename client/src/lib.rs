//! # Ticketdesk HTTP Client
//!
//! reqwest-based adapters implementing the `ticketdesk-core` service
//! contracts against the identity, catalog and user services.
//!
//! ## Example
//!
//! ```no_run
//! use ticketdesk_client::{ClientConfig, Services};
//! use ticketdesk_core::{CatalogService, EventId, SessionContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URLs from TICKETDESK_* variables, or the local defaults
//!     let config = ClientConfig::from_env()?;
//!     let services = Services::connect(&config)?;
//!
//!     let session = SessionContext::anonymous();
//!     let event = services.catalog.event(&session, EventId::new(1)).await?;
//!
//!     println!("{}", event.name);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Bearer-token authentication from an explicit session context
//! - Envelope and list-shape normalization at the boundary
//! - Error bodies preserved for classification

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod shape;
pub mod users;

// Re-export main types for convenience
pub use catalog::HttpCatalog;
pub use client::HttpClient;
pub use config::{ClientConfig, ServiceUrls};
pub use error::ConfigError;
pub use identity::HttpIdentity;
pub use users::HttpUsers;

/// The three adapters, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct Services {
    /// Identity service
    pub identity: HttpIdentity,
    /// Catalog service
    pub catalog: HttpCatalog,
    /// User service
    pub users: HttpUsers,
}

impl Services {
    /// Build the adapters for `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Http` if the HTTP client cannot be constructed
    pub fn connect(config: &ClientConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ticketdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            identity: HttpIdentity::new(HttpClient::new(
                client.clone(),
                config.urls.identity.clone(),
            )),
            catalog: HttpCatalog::new(HttpClient::new(client.clone(), config.urls.catalog.clone())),
            users: HttpUsers::new(HttpClient::new(client, config.urls.users.clone())),
        })
    }
}
