//! Ticket resolution: attach the referenced event or packet (and the packet's
//! included events) to ticket records the backend returns unjoined.
//!
//! # Overview
//!
//! A ticket names at most one of an event or a packet by id. Resolving it
//! means:
//!
//! ```text
//! Ticket ──event_id──▶ Event
//!        ──packet_id─▶ Packet ──▶ events included in the packet
//! ```
//!
//! Tickets in a batch resolve concurrently; the packet chain inside one ticket
//! is sequential. A failing lookup is recorded on its own ticket as
//! [`Lookup::Failed`] and never affects the rest of the batch.

use crate::lookup::Lookup;
use crate::scope::ViewScope;
use futures::future::join_all;
use ticketdesk_core::classify::ClassifyContext;
use ticketdesk_core::error::ClassifiedError;
use ticketdesk_core::model::{Event, EventId, Packet, PacketId, Ticket, TicketRef};
use ticketdesk_core::services::{CatalogService, UserService};
use ticketdesk_core::session::SessionContext;

/// Shown for tickets that reference neither an event nor a packet.
pub const NO_ASSOCIATION: &str = "No event or packet associated.";

const EVENT_FAILED: &str = "Failed to load event.";
const PACKET_FAILED: &str = "Failed to load packet.";
const PACKET_EVENTS_FAILED: &str = "Failed to load the events of this packet.";
const TICKETS_FAILED: &str = "Failed to load your tickets.";

/// A ticket enriched with the state of each dependent lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTicket {
    /// The ticket record
    pub ticket: Ticket,
    /// Referenced event
    pub event: Lookup<Event>,
    /// Referenced packet
    pub packet: Lookup<Packet>,
    /// Events included in the referenced packet
    pub packet_events: Lookup<Vec<Event>>,
}

impl ResolvedTicket {
    /// A ticket whose referenced lookups are all pending.
    #[must_use]
    pub fn pending(ticket: Ticket) -> Self {
        let (event, packet) = match ticket.reference() {
            TicketRef::Event(_) => (Lookup::Pending, Lookup::NotRequested),
            TicketRef::Packet(_) => (Lookup::NotRequested, Lookup::Pending),
            TicketRef::Both { .. } => (Lookup::Pending, Lookup::Pending),
            TicketRef::Unbound => (Lookup::NotRequested, Lookup::NotRequested),
        };
        let packet_events = if packet.is_pending() {
            Lookup::Pending
        } else {
            Lookup::NotRequested
        };
        Self {
            ticket,
            event,
            packet,
            packet_events,
        }
    }

    /// Event details, when loaded.
    #[must_use]
    pub const fn event_details(&self) -> Option<&Event> {
        self.event.loaded()
    }

    /// Packet details, when loaded.
    #[must_use]
    pub const fn packet_details(&self) -> Option<&Packet> {
        self.packet.loaded()
    }

    /// Events included in the packet; empty unless loaded.
    #[must_use]
    pub fn packet_events(&self) -> &[Event] {
        self.packet_events.loaded().map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether the ticket references nothing.
    #[must_use]
    pub const fn is_unbound(&self) -> bool {
        matches!(self.ticket.reference(), TicketRef::Unbound)
    }

    /// Failures recorded on this ticket, in lookup order.
    #[must_use]
    pub fn failures(&self) -> Vec<&ClassifiedError> {
        [
            self.event.failure(),
            self.packet.failure(),
            self.packet_events.failure(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Resolves ticket references against the catalog.
#[derive(Debug, Clone)]
pub struct TicketResolver<C> {
    catalog: C,
}

impl<C: CatalogService> TicketResolver<C> {
    /// Create a resolver over `catalog`.
    #[must_use]
    pub const fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Resolve one ticket. Never fails: lookup failures are recorded on the
    /// returned record.
    pub async fn resolve(&self, session: &SessionContext, ticket: Ticket) -> ResolvedTicket {
        let mut resolved = ResolvedTicket::pending(ticket);

        match resolved.ticket.reference() {
            TicketRef::Event(event) => {
                resolved.event = self.load_event(session, &resolved.ticket.code, event).await;
            }
            TicketRef::Packet(packet) => {
                let (packet, events) = self
                    .load_packet(session, &resolved.ticket.code, packet)
                    .await;
                resolved.packet = packet;
                resolved.packet_events = events;
            }
            TicketRef::Both { event, packet } => {
                tracing::warn!(
                    code = %resolved.ticket.code,
                    %event,
                    %packet,
                    "Ticket references both an event and a packet"
                );
                let code = resolved.ticket.code.clone();
                let (event, (packet, events)) = futures::join!(
                    self.load_event(session, &code, event),
                    self.load_packet(session, &code, packet)
                );
                resolved.event = event;
                resolved.packet = packet;
                resolved.packet_events = events;
            }
            TicketRef::Unbound => {
                tracing::debug!(code = %resolved.ticket.code, "Ticket has no reference");
            }
        }

        resolved
    }

    /// Resolve a batch concurrently. Output order equals input order and no
    /// ticket is dropped.
    pub async fn resolve_all(
        &self,
        session: &SessionContext,
        tickets: Vec<Ticket>,
    ) -> Vec<ResolvedTicket> {
        join_all(tickets.into_iter().map(|ticket| self.resolve(session, ticket))).await
    }

    async fn load_event(&self, session: &SessionContext, code: &str, id: EventId) -> Lookup<Event> {
        let result = self.catalog.event(session, id).await;
        if let Err(e) = &result {
            tracing::warn!(code, event = %id, error = %e, "Event lookup failed");
        }
        Lookup::settle(result, &ClassifyContext::new(EVENT_FAILED))
    }

    async fn load_packet(
        &self,
        session: &SessionContext,
        code: &str,
        id: PacketId,
    ) -> (Lookup<Packet>, Lookup<Vec<Event>>) {
        let packet = match self.catalog.packet(session, id).await {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(code, packet = %id, error = %e, "Packet lookup failed");
                return (
                    Lookup::Failed(e.classify(&ClassifyContext::new(PACKET_FAILED))),
                    Lookup::NotRequested,
                );
            }
        };

        let events = self.catalog.events_for_packet(session, id).await;
        if let Err(e) = &events {
            tracing::warn!(code, packet = %id, error = %e, "Included events lookup failed");
        }
        (
            Lookup::Loaded(packet),
            Lookup::settle(events, &ClassifyContext::new(PACKET_EVENTS_FAILED)),
        )
    }
}

/// The logged-in user's tickets, resolved and published as one batch.
#[derive(Debug)]
pub struct TicketBoard<C, U> {
    resolver: TicketResolver<C>,
    users: U,
    scope: ViewScope,
    tickets: Vec<ResolvedTicket>,
}

impl<C: CatalogService, U: UserService> TicketBoard<C, U> {
    /// Create an empty board.
    #[must_use]
    pub fn new(catalog: C, users: U) -> Self {
        Self {
            resolver: TicketResolver::new(catalog),
            users,
            scope: ViewScope::new(),
            tickets: Vec::new(),
        }
    }

    /// Scope handle for the navigation shell; call
    /// [`ViewScope::leave`] on it when the board is closed.
    #[must_use]
    pub const fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// The last published batch.
    #[must_use]
    pub fn tickets(&self) -> &[ResolvedTicket] {
        &self.tickets
    }

    /// Load the session user's tickets and resolve them.
    ///
    /// Returns `Ok(None)` when the board was left before the batch completed,
    /// whether the load succeeded or failed; the previous batch stays
    /// published in that case.
    ///
    /// # Errors
    ///
    /// Returns the classified failure when there is no session or the user
    /// record cannot be loaded. Individual ticket lookups never fail the load.
    pub async fn load(
        &mut self,
        session: &SessionContext,
    ) -> Result<Option<&[ResolvedTicket]>, ClassifiedError> {
        let context = ClassifyContext::new(TICKETS_FAILED);
        let user_id = session.require().map_err(|e| e.classify(&context))?.user_id();
        let visit = self.scope.enter();

        let user = match self.users.user(session, user_id).await {
            Ok(user) => user,
            Err(_) if !visit.is_current() => {
                tracing::debug!(user = %user_id, "Ticket board left; discarding failure");
                return Ok(None);
            }
            Err(e) => return Err(e.classify(&context)),
        };
        let resolved = self.resolver.resolve_all(session, user.ticket_list).await;

        if !visit.is_current() {
            tracing::debug!(count = resolved.len(), "Ticket board left; discarding batch");
            return Ok(None);
        }

        tracing::debug!(count = resolved.len(), "Publishing ticket batch");
        self.tickets = resolved;
        Ok(Some(&self.tickets))
    }
}
