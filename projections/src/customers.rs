//! Customer directory: who holds tickets for an organizer's events and
//! packets.
//!
//! One request per entity, issued concurrently. A failing entity is recorded
//! as a failed lookup on its own group and never fails the batch.

use crate::lookup::Lookup;
use futures::future::join_all;
use ticketdesk_core::classify::ClassifyContext;
use ticketdesk_core::error::ClassifiedError;
use ticketdesk_core::model::{Event, Packet, TicketTarget, User};
use ticketdesk_core::services::UserService;
use ticketdesk_core::session::SessionContext;

const CUSTOMERS_FAILED: &str = "Failed to load customers.";

/// Customers of one event or packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerGroup {
    /// The event or packet the tickets were bought for
    pub target: TicketTarget,
    /// Display name of the event or packet
    pub title: String,
    /// Ticket holders
    pub customers: Lookup<Vec<User>>,
}

/// Loads ticket holders through the user service.
#[derive(Debug, Clone)]
pub struct CustomerDirectory<U> {
    users: U,
}

impl<U: UserService> CustomerDirectory<U> {
    /// Create a directory over `users`.
    #[must_use]
    pub const fn new(users: U) -> Self {
        Self { users }
    }

    /// Customers of every given event and packet, events first, in input
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when no session is active. Per-entity
    /// failures are recorded on their groups instead.
    pub async fn collect(
        &self,
        session: &SessionContext,
        events: &[Event],
        packets: &[Packet],
    ) -> Result<Vec<CustomerGroup>, ClassifiedError> {
        session
            .require()
            .map_err(|e| e.classify(&ClassifyContext::new(CUSTOMERS_FAILED)))?;

        let targets = events
            .iter()
            .map(|event| (TicketTarget::Event(event.id), event.name.clone()))
            .chain(
                packets
                    .iter()
                    .map(|packet| (TicketTarget::Packet(packet.id), packet.name.clone())),
            );

        Ok(join_all(targets.map(|(target, title)| self.group(session, target, title))).await)
    }

    async fn group(
        &self,
        session: &SessionContext,
        target: TicketTarget,
        title: String,
    ) -> CustomerGroup {
        let result = match target {
            TicketTarget::Event(event) => self.users.event_customers(session, event).await,
            TicketTarget::Packet(packet) => self.users.packet_customers(session, packet).await,
        };
        if let Err(e) = &result {
            tracing::warn!(?target, error = %e, "Customer lookup failed");
        }

        CustomerGroup {
            target,
            title,
            customers: Lookup::settle(result, &ClassifyContext::new(CUSTOMERS_FAILED)),
        }
    }
}
