//! Ticketdesk console: browse the catalog, manage packet inclusions and buy
//! tickets from the command line.
//!
//! # Example Usage
//!
//! ```bash
//! # Browse events anonymously, two pages of five
//! TICKETDESK_PER_PAGE=5 ticketdesk events --location paris --pages 2
//!
//! # Show your tickets
//! ticketdesk --email ada@example.com --password secret tickets
//!
//! # Add event 3 to packet 5 (organizers only)
//! TICKETDESK_EMAIL=org@example.com TICKETDESK_PASSWORD=secret ticketdesk bind --event 3 --packet 5
//! ```
//!
//! Service URLs default to the local development ports and can be set with
//! flags, `TICKETDESK_*_URL` variables or a `.env` file.

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Backend, Command, Credentials};
use ticketdesk_client::config::{CATALOG_URL_VAR, IDENTITY_URL_VAR, PER_PAGE_VAR, USERS_URL_VAR};
use ticketdesk_client::{ClientConfig, Services};
use tracing_subscriber::EnvFilter;

/// Ticketdesk console
#[derive(Parser, Debug)]
#[command(
    name = "ticketdesk",
    version,
    about = "Command-line front end for the Ticketdesk services"
)]
struct Args {
    /// Identity service base URL
    #[arg(long, env = IDENTITY_URL_VAR, global = true)]
    identity_url: Option<String>,

    /// Catalog service base URL
    #[arg(long, env = CATALOG_URL_VAR, global = true)]
    catalog_url: Option<String>,

    /// User service base URL
    #[arg(long, env = USERS_URL_VAR, global = true)]
    users_url: Option<String>,

    /// Catalog page size
    #[arg(long, env = PER_PAGE_VAR, global = true)]
    per_page: Option<String>,

    /// Login email
    #[arg(long, env = "TICKETDESK_EMAIL", global = true)]
    email: Option<String>,

    /// Password
    #[arg(long, env = "TICKETDESK_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Log filter (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn config(&self) -> Result<ClientConfig> {
        let config = ClientConfig::from_lookup(|var| match var {
            IDENTITY_URL_VAR => self.identity_url.clone(),
            CATALOG_URL_VAR => self.catalog_url.clone(),
            USERS_URL_VAR => self.users_url.clone(),
            PER_PAGE_VAR => self.per_page.clone(),
            _ => None,
        })?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads its env fallbacks
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    let config = args.config().context("Invalid configuration")?;
    tracing::debug!(
        identity = %config.urls.identity,
        catalog = %config.urls.catalog,
        users = %config.urls.users,
        per_page = config.per_page,
        "Configuration loaded"
    );

    let services = Services::connect(&config).context("Failed to build HTTP client")?;
    let backend = Backend {
        identity: services.identity,
        catalog: services.catalog,
        users: services.users,
        per_page: config.per_page,
    };
    let credentials = Credentials {
        email: args.email.clone(),
        password: args.password.clone(),
    };

    backend
        .execute(&args.command, &credentials, &mut std::io::stdout().lock())
        .await
}
