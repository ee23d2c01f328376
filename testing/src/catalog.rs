//! In-memory catalog service.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Locks only panic after a test already failed

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use ticketdesk_core::error::{Result, ServiceError};
use ticketdesk_core::feed::{Feed, FeedMetadata, FeedQuery, Link, LinkSet};
use ticketdesk_core::model::{Event, EventId, Inclusion, Packet, PacketId, Ticket};
use ticketdesk_core::services::CatalogService;
use ticketdesk_core::session::SessionContext;
use url::form_urlencoded;

const DEFAULT_PER_PAGE: usize = 10;

/// Catalog operation a failure can be injected into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CatalogOp {
    /// `event(id)`
    Event(EventId),
    /// `packet(id)`
    Packet(PacketId),
    /// `events_for_packet(id)`
    EventsForPacket(PacketId),
    /// `packets_for_event(id)`
    PacketsForEvent(EventId),
    /// Any filter request
    Filter,
    /// Any inclusion mutation
    Mutation,
}

#[derive(Debug, Default)]
struct CatalogState {
    events: BTreeMap<EventId, Event>,
    packets: BTreeMap<PacketId, Packet>,
    inclusions: BTreeSet<(EventId, PacketId)>,
    tickets: HashMap<String, Ticket>,
    failures: HashMap<CatalogOp, ServiceError>,
    calls: HashMap<&'static str, usize>,
    queries: Vec<FeedQuery>,
}

/// Catalog service backed by maps, answering with the real service's error
/// shapes.
///
/// # Example
///
/// ```
/// use ticketdesk_testing::{fixtures, InMemoryCatalog};
/// use ticketdesk_core::{CatalogService, EventId, SessionContext};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = InMemoryCatalog::new().with_event(fixtures::event(1, 7, "Jazz Night"));
///
/// let event = catalog.event(&SessionContext::anonymous(), EventId::new(1)).await?;
/// assert_eq!(event.name, "Jazz Night");
/// assert_eq!(catalog.calls("event"), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event
    #[must_use]
    pub fn with_event(self, event: Event) -> Self {
        self.state.write().unwrap().events.insert(event.id, event);
        self
    }

    /// Add a packet
    #[must_use]
    pub fn with_packet(self, packet: Packet) -> Self {
        self.state.write().unwrap().packets.insert(packet.id, packet);
        self
    }

    /// Include an event in a packet
    #[must_use]
    pub fn with_inclusion(self, event: EventId, packet: PacketId) -> Self {
        self.state.write().unwrap().inclusions.insert((event, packet));
        self
    }

    /// Add a ticket record
    #[must_use]
    pub fn with_ticket(self, ticket: Ticket) -> Self {
        self.state
            .write()
            .unwrap()
            .tickets
            .insert(ticket.code.clone(), ticket);
        self
    }

    /// Make `op` fail with `error` until cleared
    pub fn fail(&self, op: CatalogOp, error: ServiceError) {
        self.state.write().unwrap().failures.insert(op, error);
    }

    /// Remove an injected failure
    pub fn clear_failure(&self, op: CatalogOp) {
        self.state.write().unwrap().failures.remove(&op);
    }

    /// Number of calls made to the named operation
    #[must_use]
    pub fn calls(&self, operation: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// Every filter query received, in order
    #[must_use]
    pub fn queries(&self) -> Vec<FeedQuery> {
        self.state.read().unwrap().queries.clone()
    }

    /// Whether the pair is currently bound
    #[must_use]
    pub fn is_bound(&self, event: EventId, packet: PacketId) -> bool {
        self.state.read().unwrap().inclusions.contains(&(event, packet))
    }

    fn record(&self, operation: &'static str, op: Option<CatalogOp>) -> Result<()> {
        let mut state = self.state.write().unwrap();
        *state.calls.entry(operation).or_insert(0) += 1;
        match op.and_then(|op| state.failures.get(&op)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn event_not_found(id: EventId) -> ServiceError {
    ServiceError::status_json(404, format!("Event with ID {} not found", id.get()))
}

fn packet_not_found(id: PacketId) -> ServiceError {
    ServiceError::status_json(404, format!("Packet with ID {} not found", id.get()))
}

impl CatalogState {
    fn require_pair(&self, event: EventId, packet: PacketId) -> Result<()> {
        if !self.events.contains_key(&event) {
            return Err(event_not_found(event));
        }
        if !self.packets.contains_key(&packet) {
            return Err(packet_not_found(packet));
        }
        Ok(())
    }
}

impl CatalogService for InMemoryCatalog {
    async fn event(&self, _session: &SessionContext, id: EventId) -> Result<Event> {
        self.record("event", Some(CatalogOp::Event(id)))?;
        let state = self.state.read().unwrap();
        state.events.get(&id).cloned().ok_or_else(|| event_not_found(id))
    }

    async fn packet(&self, _session: &SessionContext, id: PacketId) -> Result<Packet> {
        self.record("packet", Some(CatalogOp::Packet(id)))?;
        let state = self.state.read().unwrap();
        state.packets.get(&id).cloned().ok_or_else(|| packet_not_found(id))
    }

    async fn filter_events(
        &self,
        _session: &SessionContext,
        query: &FeedQuery,
    ) -> Result<Feed<Event>> {
        self.record("filter_events", Some(CatalogOp::Filter))?;
        let mut state = self.state.write().unwrap();
        state.queries.push(query.clone());
        let matching: Vec<Event> = state
            .events
            .values()
            .filter(|e| matches(query, &e.name, e.location.as_deref(), e.seats))
            .cloned()
            .collect();
        Ok(paginate(matching, query, "/events"))
    }

    async fn filter_packets(
        &self,
        _session: &SessionContext,
        query: &FeedQuery,
    ) -> Result<Feed<Packet>> {
        self.record("filter_packets", Some(CatalogOp::Filter))?;
        let mut state = self.state.write().unwrap();
        state.queries.push(query.clone());
        let matching: Vec<Packet> = state
            .packets
            .values()
            .filter(|p| matches(query, &p.name, p.location.as_deref(), p.allocated_seats))
            .cloned()
            .collect();
        Ok(paginate(matching, query, "/event-packets"))
    }

    async fn create_inclusion(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> Result<Inclusion> {
        session.require()?;
        self.record("create_inclusion", Some(CatalogOp::Mutation))?;
        let mut state = self.state.write().unwrap();
        state.require_pair(event, packet)?;
        if !state.inclusions.insert((event, packet)) {
            return Err(ServiceError::status_json(
                409,
                format!(
                    "inclusion of event {} in packet {} already exists",
                    event.get(),
                    packet.get()
                ),
            ));
        }
        Ok(Inclusion::new(event, packet))
    }

    async fn delete_inclusion(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> Result<Inclusion> {
        session.require()?;
        self.record("delete_inclusion", Some(CatalogOp::Mutation))?;
        let mut state = self.state.write().unwrap();
        if !state.inclusions.remove(&(event, packet)) {
            return Err(ServiceError::status_json(404, "inclusion not found"));
        }
        Ok(Inclusion::new(event, packet))
    }

    async fn packets_for_event(
        &self,
        _session: &SessionContext,
        event: EventId,
    ) -> Result<Vec<Packet>> {
        self.record("packets_for_event", Some(CatalogOp::PacketsForEvent(event)))?;
        let state = self.state.read().unwrap();
        if !state.events.contains_key(&event) {
            return Err(event_not_found(event));
        }
        Ok(state
            .inclusions
            .iter()
            .filter(|(e, _)| *e == event)
            .filter_map(|(_, p)| state.packets.get(p).cloned())
            .collect())
    }

    async fn events_for_packet(
        &self,
        _session: &SessionContext,
        packet: PacketId,
    ) -> Result<Vec<Event>> {
        self.record("events_for_packet", Some(CatalogOp::EventsForPacket(packet)))?;
        let state = self.state.read().unwrap();
        if !state.packets.contains_key(&packet) {
            return Err(packet_not_found(packet));
        }
        Ok(state
            .inclusions
            .iter()
            .filter(|(_, p)| *p == packet)
            .filter_map(|(e, _)| state.events.get(e).cloned())
            .collect())
    }

    async fn ticket(&self, _session: &SessionContext, code: &str) -> Result<Ticket> {
        self.record("ticket", None)?;
        let state = self.state.read().unwrap();
        state.tickets.get(code).cloned().ok_or_else(|| {
            ServiceError::status_json(404, format!("ticket with code {code} not found"))
        })
    }
}

fn matches(query: &FeedQuery, name: &str, location: Option<&str>, seats: Option<u32>) -> bool {
    let contains = |haystack: &str, needle: &str| {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    };
    let number = |key: &str| query.get(key).and_then(|v| v.parse::<u32>().ok());

    query.get("name").is_none_or(|needle| contains(name, needle))
        && query
            .get("location")
            .is_none_or(|needle| location.is_some_and(|loc| contains(loc, needle)))
        && number("min_seats").is_none_or(|min| seats.unwrap_or(0) >= min)
        && number("max_seats").is_none_or(|max| seats.unwrap_or(0) <= max)
}

fn paginate<T>(items: Vec<T>, query: &FeedQuery, path: &str) -> Feed<T> {
    let per_page = query
        .get("per_page")
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PER_PAGE);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = query
        .get("page")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, total_pages);

    let link = |target: usize, rel: &str| {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in query.params() {
            if key != "page" && key != "per_page" {
                serializer.append_pair(key, value);
            }
        }
        serializer.append_pair("page", &target.to_string());
        serializer.append_pair("per_page", &per_page.to_string());
        Link {
            href: format!("{path}?{}", serializer.finish()),
            rel: Some(rel.to_string()),
            method: Some("GET".to_string()),
            title: None,
        }
    };

    let links = LinkSet {
        current: Some(link(page, "self")),
        first: (page > 1).then(|| link(1, "first")),
        prev: (page > 1).then(|| link(page - 1, "prev")),
        next: (page < total_pages).then(|| link(page + 1, "next")),
        last: (page < total_pages).then(|| link(total_pages, "last")),
    };

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Feed {
        items,
        links,
        metadata: FeedMetadata {
            page: u32::try_from(page).unwrap_or(u32::MAX),
            per_page: u32::try_from(per_page).ok(),
            total_pages: u32::try_from(total_pages).ok(),
        },
    }
}
