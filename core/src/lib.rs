//! # Ticketdesk Core
//!
//! Domain records, service contracts and error classification for the
//! Ticketdesk event-ticketing client.
//!
//! The platform is split across three backend services: an identity service
//! issuing bearer tokens, a catalog service owning events, packets and their
//! inclusions, and a user service owning users and the tickets they hold.
//! This crate knows nothing about HTTP. It defines:
//!
//! - **Model**: events, packets, inclusions, tickets and users ([`model`])
//! - **Contracts**: one async trait per service ([`services`])
//! - **Session**: the explicit per-call session context ([`session`])
//! - **Feeds**: paginated catalog listings and their links ([`feed`])
//! - **Errors**: adapter failures and their classification for display
//!   ([`error`], [`classify`])
//!
//! ## Example
//!
//! ```
//! use ticketdesk_core::error::{ErrorKind, ServiceError};
//! use ticketdesk_core::classify::ClassifyContext;
//!
//! let error = ServiceError::status_json(404, "Event with ID 12 not found");
//! let shown = error.classify(&ClassifyContext::new("Failed to load event"));
//!
//! assert_eq!(shown.kind, ErrorKind::NotFound);
//! assert_eq!(shown.message, "Event not found.");
//! ```

pub mod classify;
pub mod error;
pub mod feed;
pub mod identity;
pub mod model;
pub mod services;
pub mod session;

pub use classify::{classify, ClassifyContext};
pub use error::{ClassifiedError, ErrorKind, RawFailure, Result, ServiceError};
pub use feed::{CatalogFilters, Feed, FeedQuery, Link};
pub use model::{
    Event, EventId, Inclusion, Packet, PacketId, Role, Ticket, TicketTarget, User, UserId,
};
pub use services::{CatalogService, IdentityService, UserService};
pub use session::{Session, SessionContext};
