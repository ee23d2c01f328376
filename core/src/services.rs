//! Contracts of the three backend services.
//!
//! Adapters implement these traits: `ticketdesk-client` over HTTP and
//! `ticketdesk-testing` in memory. Every call receives the
//! [`SessionContext`] explicitly; implementations attach its bearer token and
//! return [`ServiceError::MissingSession`](crate::error::ServiceError::MissingSession)
//! without issuing a request when an operation needs a session and none is
//! active.
//!
//! Implementations normalize response shapes before returning: callers always
//! see plain records and plain ordered lists.

use crate::error::Result;
use crate::feed::{Feed, FeedQuery};
use crate::identity::{LoginResponse, RegisterResponse, Registration, TokenStatus};
use crate::model::{Event, EventId, Inclusion, Packet, PacketId, Ticket, TicketTarget, User, UserId};
use crate::session::SessionContext;
use std::future::Future;
use std::sync::Arc;

/// Event-and-packet catalog service.
pub trait CatalogService: Send + Sync {
    /// Fetch one event.
    fn event(
        &self,
        session: &SessionContext,
        id: EventId,
    ) -> impl Future<Output = Result<Event>> + Send;

    /// Fetch one packet.
    fn packet(
        &self,
        session: &SessionContext,
        id: PacketId,
    ) -> impl Future<Output = Result<Packet>> + Send;

    /// List events through the filter endpoint.
    fn filter_events(
        &self,
        session: &SessionContext,
        query: &FeedQuery,
    ) -> impl Future<Output = Result<Feed<Event>>> + Send;

    /// List packets through the filter endpoint.
    fn filter_packets(
        &self,
        session: &SessionContext,
        query: &FeedQuery,
    ) -> impl Future<Output = Result<Feed<Packet>>> + Send;

    /// Create the inclusion of `event` in `packet`. Requires a session.
    fn create_inclusion(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> impl Future<Output = Result<Inclusion>> + Send;

    /// Remove the inclusion of `event` in `packet`. Requires a session.
    fn delete_inclusion(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> impl Future<Output = Result<Inclusion>> + Send;

    /// Packets that include `event`.
    fn packets_for_event(
        &self,
        session: &SessionContext,
        event: EventId,
    ) -> impl Future<Output = Result<Vec<Packet>>> + Send;

    /// Events included in `packet`.
    fn events_for_packet(
        &self,
        session: &SessionContext,
        packet: PacketId,
    ) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// Fetch a ticket by code.
    fn ticket(
        &self,
        session: &SessionContext,
        code: &str,
    ) -> impl Future<Output = Result<Ticket>> + Send;
}

/// User and ticket-record service. Every operation requires a session.
pub trait UserService: Send + Sync {
    /// Fetch a user, including the embedded ticket list.
    fn user(
        &self,
        session: &SessionContext,
        id: UserId,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Buy a ticket for `client`; returns the new ticket code.
    fn purchase_ticket(
        &self,
        session: &SessionContext,
        client: UserId,
        target: TicketTarget,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Users holding a ticket for `event`.
    fn event_customers(
        &self,
        session: &SessionContext,
        event: EventId,
    ) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Users holding a ticket for `packet`.
    fn packet_customers(
        &self,
        session: &SessionContext,
        packet: PacketId,
    ) -> impl Future<Output = Result<Vec<User>>> + Send;
}

/// Identity and token service. None of its operations need a session.
pub trait IdentityService: Send + Sync {
    /// Create an account.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<RegisterResponse>> + Send;

    /// Exchange credentials for a token.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginResponse>> + Send;

    /// Check a token.
    fn verify(&self, token: &str) -> impl Future<Output = Result<TokenStatus>> + Send;

    /// Revoke a token.
    fn revoke(&self, token: &str) -> impl Future<Output = Result<()>> + Send;
}

impl<T: CatalogService> CatalogService for Arc<T> {
    fn event(
        &self,
        session: &SessionContext,
        id: EventId,
    ) -> impl Future<Output = Result<Event>> + Send {
        (**self).event(session, id)
    }

    fn packet(
        &self,
        session: &SessionContext,
        id: PacketId,
    ) -> impl Future<Output = Result<Packet>> + Send {
        (**self).packet(session, id)
    }

    fn filter_events(
        &self,
        session: &SessionContext,
        query: &FeedQuery,
    ) -> impl Future<Output = Result<Feed<Event>>> + Send {
        (**self).filter_events(session, query)
    }

    fn filter_packets(
        &self,
        session: &SessionContext,
        query: &FeedQuery,
    ) -> impl Future<Output = Result<Feed<Packet>>> + Send {
        (**self).filter_packets(session, query)
    }

    fn create_inclusion(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> impl Future<Output = Result<Inclusion>> + Send {
        (**self).create_inclusion(session, event, packet)
    }

    fn delete_inclusion(
        &self,
        session: &SessionContext,
        event: EventId,
        packet: PacketId,
    ) -> impl Future<Output = Result<Inclusion>> + Send {
        (**self).delete_inclusion(session, event, packet)
    }

    fn packets_for_event(
        &self,
        session: &SessionContext,
        event: EventId,
    ) -> impl Future<Output = Result<Vec<Packet>>> + Send {
        (**self).packets_for_event(session, event)
    }

    fn events_for_packet(
        &self,
        session: &SessionContext,
        packet: PacketId,
    ) -> impl Future<Output = Result<Vec<Event>>> + Send {
        (**self).events_for_packet(session, packet)
    }

    fn ticket(
        &self,
        session: &SessionContext,
        code: &str,
    ) -> impl Future<Output = Result<Ticket>> + Send {
        (**self).ticket(session, code)
    }
}

impl<T: UserService> UserService for Arc<T> {
    fn user(
        &self,
        session: &SessionContext,
        id: UserId,
    ) -> impl Future<Output = Result<User>> + Send {
        (**self).user(session, id)
    }

    fn purchase_ticket(
        &self,
        session: &SessionContext,
        client: UserId,
        target: TicketTarget,
    ) -> impl Future<Output = Result<String>> + Send {
        (**self).purchase_ticket(session, client, target)
    }

    fn event_customers(
        &self,
        session: &SessionContext,
        event: EventId,
    ) -> impl Future<Output = Result<Vec<User>>> + Send {
        (**self).event_customers(session, event)
    }

    fn packet_customers(
        &self,
        session: &SessionContext,
        packet: PacketId,
    ) -> impl Future<Output = Result<Vec<User>>> + Send {
        (**self).packet_customers(session, packet)
    }
}

impl<T: IdentityService> IdentityService for Arc<T> {
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<RegisterResponse>> + Send {
        (**self).register(registration)
    }

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginResponse>> + Send {
        (**self).login(email, password)
    }

    fn verify(&self, token: &str) -> impl Future<Output = Result<TokenStatus>> + Send {
        (**self).verify(token)
    }

    fn revoke(&self, token: &str) -> impl Future<Output = Result<()>> + Send {
        (**self).revoke(token)
    }
}
