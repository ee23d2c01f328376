//! Event↔packet inclusion bindings with per-entity cached lists.
//!
//! Lists are fetched lazily, one entity at a time, and cached per entity id.
//! A successful bind or unbind of `(event, packet)` invalidates exactly the
//! event's packet list and the packet's event list. The cache is written only
//! from service answers, never optimistically.

use crate::cache::{Cached, EpochCache};
use std::future::Future;
use std::hash::Hash;
use ticketdesk_core::classify::ClassifyContext;
use ticketdesk_core::error::{ClassifiedError, Result as ServiceResult};
use ticketdesk_core::model::{Event, EventId, Inclusion, Packet, PacketId};
use ticketdesk_core::services::CatalogService;
use ticketdesk_core::session::SessionContext;

const BIND_FAILED: &str = "Failed to add the event to the packet.";
const UNBIND_FAILED: &str = "Failed to remove the event from the packet.";
const LIST_FAILED: &str = "Failed to load inclusions.";

/// Attempts made to obtain a list that was not invalidated mid-flight.
const MAX_FETCH_ATTEMPTS: usize = 3;

/// Maintains inclusion bindings through the catalog service.
#[derive(Debug)]
pub struct InclusionManager<C> {
    catalog: C,
    packets_by_event: EpochCache<EventId, Vec<Packet>>,
    events_by_packet: EpochCache<PacketId, Vec<Event>>,
}

impl<C: CatalogService> InclusionManager<C> {
    /// Create a manager with empty caches.
    #[must_use]
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            packets_by_event: EpochCache::new(),
            events_by_packet: EpochCache::new(),
        }
    }

    /// Include `event` in `packet`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a session, `Conflict` when the pair is
    /// already bound and `NotFound` for unknown ids.
    pub async fn bind(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> Result<Inclusion, ClassifiedError> {
        let context = ClassifyContext::new(BIND_FAILED);
        session.require().map_err(|e| e.classify(&context))?;

        let inclusion = self
            .catalog
            .create_inclusion(session, event, packet)
            .await
            .map_err(|e| {
                tracing::warn!(%event, %packet, error = %e, "Bind failed");
                e.classify(&context)
            })?;

        self.invalidate(event, packet);
        tracing::info!(%event, %packet, "Event included in packet");
        Ok(inclusion)
    }

    /// Remove `event` from `packet`. Not idempotent: unbinding an absent pair
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a session and `NotFound` for a pair
    /// that is not bound.
    pub async fn unbind(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> Result<Inclusion, ClassifiedError> {
        let context = ClassifyContext::new(UNBIND_FAILED);
        session.require().map_err(|e| e.classify(&context))?;

        let inclusion = self
            .catalog
            .delete_inclusion(session, event, packet)
            .await
            .map_err(|e| {
                tracing::warn!(%event, %packet, error = %e, "Unbind failed");
                e.classify(&context)
            })?;

        self.invalidate(event, packet);
        tracing::info!(%event, %packet, "Event removed from packet");
        Ok(inclusion)
    }

    /// Packets including `event`, from cache when current.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a session, or the classified fetch
    /// failure.
    pub async fn packets_for_event(
        &self,
        session: &SessionContext,
        event: EventId,
    ) -> Result<Vec<Packet>, ClassifiedError> {
        cached_fetch(session, &self.packets_by_event, event, || {
            self.catalog.packets_for_event(session, event)
        })
        .await
    }

    /// Events included in `packet`, from cache when current.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a session, or the classified fetch
    /// failure.
    pub async fn events_for_packet(
        &self,
        session: &SessionContext,
        packet: PacketId,
    ) -> Result<Vec<Event>, ClassifiedError> {
        cached_fetch(session, &self.events_by_packet, packet, || {
            self.catalog.events_for_packet(session, packet)
        })
        .await
    }

    /// Cached packet list of `event` without fetching, stale values included.
    #[must_use]
    pub fn cached_packets_for_event(&self, event: EventId) -> Cached<Vec<Packet>> {
        self.packets_by_event.lookup(event)
    }

    /// Cached event list of `packet` without fetching, stale values included.
    #[must_use]
    pub fn cached_events_for_packet(&self, packet: PacketId) -> Cached<Vec<Event>> {
        self.events_by_packet.lookup(packet)
    }

    fn invalidate(&self, event: EventId, packet: PacketId) {
        self.packets_by_event.invalidate(event);
        self.events_by_packet.invalidate(packet);
    }
}

async fn cached_fetch<K, V, F, Fut>(
    session: &SessionContext,
    cache: &EpochCache<K, Vec<V>>,
    key: K,
    fetch: F,
) -> Result<Vec<V>, ClassifiedError>
where
    K: Eq + Hash + Copy + std::fmt::Display,
    V: Clone,
    F: Fn() -> Fut,
    Fut: Future<Output = ServiceResult<Vec<V>>>,
{
    let context = ClassifyContext::new(LIST_FAILED);
    session.require().map_err(|e| e.classify(&context))?;

    if let Some(list) = cache.get(key) {
        return Ok(list);
    }

    let mut attempt = 1;
    loop {
        let started = cache.epoch(key);
        let list = fetch().await.map_err(|e| {
            tracing::warn!(%key, error = %e, "Inclusion list fetch failed");
            e.classify(&context)
        })?;

        if cache.insert_if_epoch(key, started, list.clone()) || attempt == MAX_FETCH_ATTEMPTS {
            return Ok(list);
        }
        tracing::debug!(%key, attempt, "Inclusion list invalidated during fetch; refetching");
        attempt += 1;
    }
}
