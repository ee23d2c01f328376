//! In-memory user service.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use ticketdesk_core::error::{Result, ServiceError};
use ticketdesk_core::model::{EventId, PacketId, Ticket, TicketTarget, User, UserId};
use ticketdesk_core::services::UserService;
use ticketdesk_core::session::SessionContext;

/// User operation a failure can be injected into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UsersOp {
    /// `user(id)`
    User(UserId),
    /// `event_customers(id)`
    EventCustomers(EventId),
    /// `packet_customers(id)`
    PacketCustomers(PacketId),
    /// Any purchase
    Purchase,
}

#[derive(Debug, Default)]
struct UsersState {
    users: BTreeMap<UserId, User>,
    failures: HashMap<UsersOp, ServiceError>,
    purchases: Vec<(UserId, TicketTarget)>,
    calls: HashMap<&'static str, usize>,
    issued: u64,
}

/// User service backed by a map of users and their ticket lists.
///
/// Purchases append a `TK-<n>` ticket to the buyer's list, so a later
/// `user()` call or customer query sees it.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUsers {
    state: Arc<RwLock<UsersState>>,
}

impl InMemoryUsers {
    /// Create a service without users
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user
    #[must_use]
    pub fn with_user(self, user: User) -> Self {
        self.state.write().unwrap().users.insert(user.id, user);
        self
    }

    /// Make `op` fail with `error` until cleared
    pub fn fail(&self, op: UsersOp, error: ServiceError) {
        self.state.write().unwrap().failures.insert(op, error);
    }

    /// Remove an injected failure
    pub fn clear_failure(&self, op: UsersOp) {
        self.state.write().unwrap().failures.remove(&op);
    }

    /// Purchases made so far, in order
    #[must_use]
    pub fn purchases(&self) -> Vec<(UserId, TicketTarget)> {
        self.state.read().unwrap().purchases.clone()
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

    fn record(&self, operation: &'static str, session: &SessionContext, op: UsersOp) -> Result<()> {
        let mut state = self.state.write().unwrap();
        *state.calls.entry(operation).or_insert(0) += 1;
        session.require()?;
        match state.failures.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn holders(&self, holds: impl Fn(&Ticket) -> bool) -> Vec<User> {
        let state = self.state.read().unwrap();
        state
            .users
            .values()
            .filter(|user| user.ticket_list.iter().any(&holds))
            .cloned()
            .collect()
    }
}

fn user_not_found(id: UserId) -> ServiceError {
    ServiceError::status_json(404, format!("User with ID {} not found", id.get()))
}

impl UserService for InMemoryUsers {
    async fn user(&self, session: &SessionContext, id: UserId) -> Result<User> {
        self.record("user", session, UsersOp::User(id))?;
        let state = self.state.read().unwrap();
        state.users.get(&id).cloned().ok_or_else(|| user_not_found(id))
    }

    async fn purchase_ticket(
        &self,
        session: &SessionContext,
        client: UserId,
        target: TicketTarget,
    ) -> Result<String> {
        self.record("purchase_ticket", session, UsersOp::Purchase)?;
        let mut state = self.state.write().unwrap();
        state.issued += 1;
        let code = format!("TK-{}", state.issued);

        let user = state.users.get_mut(&client).ok_or_else(|| user_not_found(client))?;
        let (event_id, packet_id) = match target {
            TicketTarget::Event(event) => (Some(event), None),
            TicketTarget::Packet(packet) => (None, Some(packet)),
        };
        user.ticket_list.push(Ticket {
            code: code.clone(),
            event_id,
            packet_id,
        });
        state.purchases.push((client, target));
        Ok(code)
    }

    async fn event_customers(&self, session: &SessionContext, event: EventId) -> Result<Vec<User>> {
        self.record("event_customers", session, UsersOp::EventCustomers(event))?;
        Ok(self.holders(|ticket| ticket.event_id == Some(event)))
    }

    async fn packet_customers(
        &self,
        session: &SessionContext,
        packet: PacketId,
    ) -> Result<Vec<User>> {
        self.record("packet_customers", session, UsersOp::PacketCustomers(packet))?;
        Ok(self.holders(|ticket| ticket.packet_id == Some(packet)))
    }
}
