//! HTTP adapter for the user service. Every call requires a session.

use crate::client::HttpClient;
use crate::shape;
use ticketdesk_core::error::Result;
use ticketdesk_core::model::{EventId, PacketId, TicketTarget, User, UserId};
use ticketdesk_core::services::UserService;
use ticketdesk_core::session::SessionContext;

/// User service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUsers {
    http: HttpClient,
}

impl HttpUsers {
    /// Create an adapter over `http`, bound to the user service base URL.
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

impl UserService for HttpUsers {
    async fn user(&self, session: &SessionContext, id: UserId) -> Result<User> {
        let token = session.require()?.token();
        let id = id.get().to_string();
        let value = self.http.get(&["users", &id], &[], Some(token)).await?;
        shape::entity(value, "user")
    }

    async fn purchase_ticket(
        &self,
        session: &SessionContext,
        client: UserId,
        target: TicketTarget,
    ) -> Result<String> {
        let token = session.require()?.token();
        let id = client.get().to_string();
        let value = self
            .http
            .post(&["clients", &id, "tickets"], &target, Some(token))
            .await?;
        shape::string_field(&value, "ticket_code")
    }

    async fn event_customers(&self, session: &SessionContext, event: EventId) -> Result<Vec<User>> {
        let token = session.require()?.token();
        let id = event.get().to_string();
        let value = self.http.get(&["events", &id, "customers"], &[], Some(token)).await?;
        Ok(shape::list(value))
    }

    async fn packet_customers(
        &self,
        session: &SessionContext,
        packet: PacketId,
    ) -> Result<Vec<User>> {
        let token = session.require()?.token();
        let id = packet.get().to_string();
        let value = self.http.get(&["packets", &id, "customers"], &[], Some(token)).await?;
        Ok(shape::list(value))
    }
}
