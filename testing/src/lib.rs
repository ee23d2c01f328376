//! # Ticketdesk Testing
//!
//! In-memory fakes of the Ticketdesk services and fixtures for building
//! records and sessions.
//!
//! This crate provides:
//! - [`InMemoryCatalog`]: events, packets, inclusions and ticket records, with
//!   paging links shaped like the real catalog's
//! - [`InMemoryUsers`]: users, purchases and customer queries
//! - [`InMemoryIdentity`]: accounts and opaque tokens
//! - Failure injection and call counters on every fake
//!
//! ## Example
//!
//! ```ignore
//! use ticketdesk_testing::{fixtures, InMemoryCatalog};
//! use ticketdesk_projections::TicketResolver;
//!
//! #[tokio::test]
//! async fn resolves_event_ticket() {
//!     let catalog = InMemoryCatalog::new().with_event(fixtures::event(1, 7, "Jazz Night"));
//!     let resolver = TicketResolver::new(catalog);
//!
//!     let resolved = resolver
//!         .resolve(&fixtures::client_session(3), fixtures::ticket_for_event("TK-1", 1))
//!         .await;
//!     assert_eq!(resolved.event_details().unwrap().name, "Jazz Night");
//! }
//! ```

pub mod catalog;
pub mod identity;
pub mod users;

pub use catalog::{CatalogOp, InMemoryCatalog};
pub use identity::InMemoryIdentity;
pub use users::{InMemoryUsers, UsersOp};

/// Builders for records and sessions.
pub mod fixtures {
    use ticketdesk_core::model::{Event, EventId, Packet, PacketId, Role, Ticket, User, UserId};
    use ticketdesk_core::session::{Session, SessionContext};

    /// An event owned by `owner` with 100 seats.
    #[must_use]
    pub fn event(id: i64, owner: i64, name: &str) -> Event {
        Event {
            id: EventId::new(id),
            owner_id: UserId::new(owner),
            name: name.to_string(),
            location: Some("Main Hall".to_string()),
            description: None,
            seats: Some(100),
        }
    }

    /// A packet owned by `owner` with 20 allocated seats.
    #[must_use]
    pub fn packet(id: i64, owner: i64, name: &str) -> Packet {
        Packet {
            id: PacketId::new(id),
            owner_id: UserId::new(owner),
            name: name.to_string(),
            location: Some("Main Hall".to_string()),
            description: None,
            allocated_seats: Some(20),
        }
    }

    /// A client without tickets.
    #[must_use]
    pub fn user(id: i64, first_name: &str, last_name: &str) -> User {
        User {
            id: UserId::new(id),
            email: format!("{}@example.com", first_name.to_lowercase()),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            first_name_private: false,
            last_name_private: false,
            social_media_links: None,
            role: Some(Role::Client),
            ticket_list: Vec::new(),
        }
    }

    /// A ticket for a single event.
    #[must_use]
    pub fn ticket_for_event(code: &str, event: i64) -> Ticket {
        Ticket {
            code: code.to_string(),
            event_id: Some(EventId::new(event)),
            packet_id: None,
        }
    }

    /// A ticket for a packet.
    #[must_use]
    pub fn ticket_for_packet(code: &str, packet: i64) -> Ticket {
        Ticket {
            code: code.to_string(),
            event_id: None,
            packet_id: Some(PacketId::new(packet)),
        }
    }

    /// A session for user `id` with `role`.
    #[must_use]
    pub fn session(id: i64, role: Role) -> SessionContext {
        SessionContext::authenticated(Session::new(
            format!("token-for-{id}"),
            UserId::new(id),
            role,
            format!("user{id}@example.com"),
        ))
    }

    /// A session for an organizer.
    #[must_use]
    pub fn owner_session(id: i64) -> SessionContext {
        session(id, Role::Owner)
    }

    /// A session for a ticket buyer.
    #[must_use]
    pub fn client_session(id: i64) -> SessionContext {
        session(id, Role::Client)
    }
}

/// Route `tracing` output to the test harness's captured writer.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
