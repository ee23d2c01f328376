//! Ticket purchase with client-side target validation.

use ticketdesk_core::classify::ClassifyContext;
use ticketdesk_core::error::{ClassifiedError, ServiceError};
use ticketdesk_core::model::{EventId, PacketId, TicketTarget};
use ticketdesk_core::services::UserService;
use ticketdesk_core::session::SessionContext;

const NOTHING_SELECTED: &str = "Please select an event or packet.";
const BOTH_SELECTED: &str = "Select either an event or a packet, not both.";
const PURCHASE_FAILED: &str = "Failed to purchase ticket.";

/// The buyer's selection. Exactly one field must be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurchaseRequest {
    /// Selected event
    pub event: Option<EventId>,
    /// Selected packet
    pub packet: Option<PacketId>,
}

impl PurchaseRequest {
    /// The single purchase target.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Rejected` when nothing or both are selected.
    pub fn target(&self) -> Result<TicketTarget, ServiceError> {
        match (self.event, self.packet) {
            (Some(event), None) => Ok(TicketTarget::Event(event)),
            (None, Some(packet)) => Ok(TicketTarget::Packet(packet)),
            (None, None) => Err(ServiceError::Rejected(NOTHING_SELECTED.to_string())),
            (Some(_), Some(_)) => Err(ServiceError::Rejected(BOTH_SELECTED.to_string())),
        }
    }
}

/// Buys tickets for the session user.
#[derive(Debug, Clone)]
pub struct TicketPurchase<U> {
    users: U,
}

impl<U: UserService> TicketPurchase<U> {
    /// Create a purchase flow over `users`.
    #[must_use]
    pub const fn new(users: U) -> Self {
        Self { users }
    }

    /// Validate `request` and buy the ticket. Returns the new ticket code.
    ///
    /// Invalid selections are rejected before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an invalid selection, `Unauthenticated` without
    /// a session, or the classified service failure.
    pub async fn purchase(
        &self,
        session: &SessionContext,
        request: PurchaseRequest,
    ) -> Result<String, ClassifiedError> {
        let context = ClassifyContext::new(PURCHASE_FAILED).for_ticket_creation();
        let target = request.target().map_err(|e| e.classify(&context))?;
        let buyer = session.require().map_err(|e| e.classify(&context))?.user_id();

        let code = self
            .users
            .purchase_ticket(session, buyer, target)
            .await
            .map_err(|e| {
                tracing::warn!(%buyer, ?target, error = %e, "Purchase failed");
                e.classify(&context)
            })?;

        tracing::info!(%buyer, ?target, code = %code, "Ticket purchased");
        Ok(code)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ticketdesk_core::error::ErrorKind;

    #[test]
    fn single_selection_becomes_target() {
        let request = PurchaseRequest {
            event: Some(EventId::new(3)),
            packet: None,
        };
        assert_eq!(request.target().unwrap(), TicketTarget::Event(EventId::new(3)));
    }

    #[test]
    fn invalid_selections_classify_as_bad_request() {
        let context = ClassifyContext::new(PURCHASE_FAILED).for_ticket_creation();

        let none = PurchaseRequest::default().target().unwrap_err().classify(&context);
        assert_eq!(none.kind, ErrorKind::BadRequest);
        assert_eq!(none.message, NOTHING_SELECTED);

        let both = PurchaseRequest {
            event: Some(EventId::new(3)),
            packet: Some(PacketId::new(5)),
        }
        .target()
        .unwrap_err()
        .classify(&context);
        assert_eq!(both.kind, ErrorKind::BadRequest);
        assert_eq!(both.message, BOTH_SELECTED);
    }
}
