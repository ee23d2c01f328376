//! HTTP adapter for the catalog service.

use crate::client::HttpClient;
use crate::shape;
use serde_json::{json, Value};
use ticketdesk_core::error::Result;
use ticketdesk_core::feed::{Feed, FeedQuery};
use ticketdesk_core::model::{Event, EventId, Inclusion, Packet, PacketId, Ticket};
use ticketdesk_core::services::CatalogService;
use ticketdesk_core::session::SessionContext;

const EVENTS: &str = "events";
const PACKETS: &str = "event-packets";
const INCLUSIONS: &str = "event-packet-inclusions";
const TICKETS: &str = "tickets";

/// Catalog service over HTTP.
///
/// Reads attach the bearer token when a session exists; inclusion mutations
/// require one.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    http: HttpClient,
}

impl HttpCatalog {
    /// Create an adapter over `http`, bound to the catalog base URL.
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

/// The inclusion echoed by a mutation, or the requested pair when the body
/// carries none.
fn inclusion_from(value: Value, event: EventId, packet: PacketId) -> Inclusion {
    shape::entity::<Inclusion>(value, "inclusion").unwrap_or_else(|_| Inclusion::new(event, packet))
}

impl CatalogService for HttpCatalog {
    async fn event(&self, session: &SessionContext, id: EventId) -> Result<Event> {
        let id = id.get().to_string();
        let value = self.http.get(&[EVENTS, &id], &[], session.bearer_token()).await?;
        shape::entity(value, "event")
    }

    async fn packet(&self, session: &SessionContext, id: PacketId) -> Result<Packet> {
        let id = id.get().to_string();
        let value = self.http.get(&[PACKETS, &id], &[], session.bearer_token()).await?;
        shape::entity(value, "event_packet")
    }

    async fn filter_events(
        &self,
        session: &SessionContext,
        query: &FeedQuery,
    ) -> Result<Feed<Event>> {
        let value = self
            .http
            .get(&[EVENTS], query.params(), session.bearer_token())
            .await?;
        Ok(shape::feed(value))
    }

    async fn filter_packets(
        &self,
        session: &SessionContext,
        query: &FeedQuery,
    ) -> Result<Feed<Packet>> {
        let value = self
            .http
            .get(&[PACKETS], query.params(), session.bearer_token())
            .await?;
        Ok(shape::feed(value))
    }

    async fn create_inclusion(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> Result<Inclusion> {
        let token = session.require()?.token();
        let (event_id, packet_id) = (event.get().to_string(), packet.get().to_string());
        let value = self
            .http
            .post(&[INCLUSIONS, "event", &event_id, "packet", &packet_id], &json!({}), Some(token))
            .await?;
        Ok(inclusion_from(value, event, packet))
    }

    async fn delete_inclusion(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> Result<Inclusion> {
        let token = session.require()?.token();
        let (event_id, packet_id) = (event.get().to_string(), packet.get().to_string());
        let value = self
            .http
            .delete(&[INCLUSIONS, "event", &event_id, "packet", &packet_id], Some(token))
            .await?;
        Ok(inclusion_from(value, event, packet))
    }

    async fn packets_for_event(
        &self,
        session: &SessionContext,
        event: EventId,
    ) -> Result<Vec<Packet>> {
        let id = event.get().to_string();
        let value = self
            .http
            .get(&[INCLUSIONS, "event", &id], &[], session.bearer_token())
            .await?;
        Ok(shape::list(value))
    }

    async fn events_for_packet(
        &self,
        session: &SessionContext,
        packet: PacketId,
    ) -> Result<Vec<Event>> {
        let id = packet.get().to_string();
        let value = self
            .http
            .get(&[INCLUSIONS, "packet", &id], &[], session.bearer_token())
            .await?;
        Ok(shape::list(value))
    }

    async fn ticket(&self, session: &SessionContext, code: &str) -> Result<Ticket> {
        let value = self.http.get(&[TICKETS, code], &[], session.bearer_token()).await?;
        shape::entity(value, "ticket")
    }
}
