//! Subcommands and their execution against the service contracts.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use std::io::Write;
use ticketdesk_core::feed::CatalogFilters;
use ticketdesk_core::identity::Registration;
use ticketdesk_core::model::{Event, EventId, Packet, PacketId, Role, User};
use ticketdesk_core::services::{CatalogService, IdentityService, UserService};
use ticketdesk_core::session::{self, SessionContext};
use ticketdesk_projections::{
    CatalogPage, CatalogTab, CatalogView, CustomerDirectory, InclusionManager, Lookup, Ownership,
    PurchaseRequest, ResolvedTicket, TicketBoard, TicketPurchase, NO_ASSOCIATION,
};

/// Page size used when collecting every item an organizer owns.
const OWNED_PAGE_SIZE: u32 = 100;

/// What to do.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an account with the given credentials
    Register {
        /// Account role (owner or client)
        #[arg(long, value_parser = parse_role, default_value = "client")]
        role: Role,
    },

    /// Log in, check the token and show the session
    Whoami,

    /// Show your tickets with their events and packets
    Tickets,

    /// Browse events
    Events(ListArgs),

    /// Browse packets
    Packets(ListArgs),

    /// Include an event in a packet
    Bind(PairArgs),

    /// Remove an event from a packet
    Unbind(PairArgs),

    /// List the packets of an event, or the events of a packet
    Inclusions {
        /// Event whose packets to list
        #[arg(long, conflicts_with = "packet", required_unless_present = "packet")]
        event: Option<i64>,
        /// Packet whose events to list
        #[arg(long)]
        packet: Option<i64>,
    },

    /// Show who holds tickets for your events and packets
    Customers,

    /// Buy a ticket for an event or a packet
    Buy {
        /// Event to buy a ticket for
        #[arg(long)]
        event: Option<i64>,
        /// Packet to buy a ticket for
        #[arg(long)]
        packet: Option<i64>,
    },
}

/// Catalog listing options.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only show items you own
    #[arg(long)]
    pub mine: bool,
    /// Name contains
    #[arg(long)]
    pub name: Option<String>,
    /// Location contains
    #[arg(long)]
    pub location: Option<String>,
    /// Minimum seat count
    #[arg(long)]
    pub min_seats: Option<u32>,
    /// Maximum seat count
    #[arg(long)]
    pub max_seats: Option<u32>,
    /// First page to show
    #[arg(long)]
    pub page: Option<u32>,
    /// Number of pages to follow
    #[arg(long, default_value_t = 1)]
    pub pages: u32,
}

/// An event and a packet.
#[derive(Args, Debug, Clone, Copy)]
pub struct PairArgs {
    /// Event id
    #[arg(long)]
    pub event: i64,
    /// Packet id
    #[arg(long)]
    pub packet: i64,
}

fn parse_role(raw: &str) -> std::result::Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role '{raw}', expected owner or client"))
}

/// Login credentials, when supplied.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Login email
    pub email: Option<String>,
    /// Password
    pub password: Option<String>,
}

impl Credentials {
    fn pair(&self) -> Option<(&str, &str)> {
        Some((self.email.as_deref()?, self.password.as_deref()?))
    }
}

/// The three services a command runs against.
#[derive(Debug, Clone)]
pub struct Backend<I, C, U> {
    /// Identity service
    pub identity: I,
    /// Catalog service
    pub catalog: C,
    /// User service
    pub users: U,
    /// Default catalog page size
    pub per_page: u32,
}

impl<I, C, U> Backend<I, C, U>
where
    I: IdentityService,
    C: CatalogService + Clone,
    U: UserService + Clone,
{
    /// Run `command`, logging in first when credentials are given and
    /// logging out afterwards.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the login or of the command.
    pub async fn execute(
        &self,
        command: &Command,
        credentials: &Credentials,
        out: &mut impl Write,
    ) -> Result<()> {
        if let Command::Register { role } = command {
            return self.register(credentials, *role, out).await;
        }

        let mut session = SessionContext::anonymous();
        if let Some((email, password)) = credentials.pair() {
            session.login(&self.identity, email, password).await?;
        }

        let result = self.run(command, &mut session, out).await;
        session.logout(&self.identity).await;
        result
    }

    async fn run(
        &self,
        command: &Command,
        session: &mut SessionContext,
        out: &mut impl Write,
    ) -> Result<()> {
        match command {
            Command::Register { .. } => Ok(()),
            Command::Whoami => self.whoami(session, out).await,
            Command::Tickets => self.tickets(session, out).await,
            Command::Events(args) => self.browse(session, CatalogTab::Events, args, out).await,
            Command::Packets(args) => self.browse(session, CatalogTab::Packets, args, out).await,
            Command::Bind(pair) => {
                let manager = InclusionManager::new(self.catalog.clone());
                let inclusion = manager
                    .bind(session, EventId::new(pair.event), PacketId::new(pair.packet))
                    .await?;
                writeln!(out, "Included {} in {}.", inclusion.event_id, inclusion.packet_id)?;
                Ok(())
            }
            Command::Unbind(pair) => {
                let manager = InclusionManager::new(self.catalog.clone());
                let inclusion = manager
                    .unbind(session, EventId::new(pair.event), PacketId::new(pair.packet))
                    .await?;
                writeln!(out, "Removed {} from {}.", inclusion.event_id, inclusion.packet_id)?;
                Ok(())
            }
            Command::Inclusions { event, packet } => {
                self.inclusions(session, *event, *packet, out).await
            }
            Command::Customers => self.customers(session, out).await,
            Command::Buy { event, packet } => {
                let request = PurchaseRequest {
                    event: event.map(EventId::new),
                    packet: packet.map(PacketId::new),
                };
                let code = TicketPurchase::new(self.users.clone())
                    .purchase(session, request)
                    .await?;
                writeln!(out, "Ticket purchased: {code}")?;
                Ok(())
            }
        }
    }

    async fn register(
        &self,
        credentials: &Credentials,
        role: Role,
        out: &mut impl Write,
    ) -> Result<()> {
        let Some((email, password)) = credentials.pair() else {
            bail!("Registration needs --email and --password.");
        };
        let registration = Registration {
            email: email.to_string(),
            password: password.to_string(),
            role,
        };
        let response = session::register(&self.identity, &registration).await?;
        match response.user_id {
            Some(id) => writeln!(out, "Registered {email} as {role} (user {id}).")?,
            None => writeln!(out, "Registered {email} as {role}.")?,
        }
        Ok(())
    }

    async fn whoami(&self, session: &mut SessionContext, out: &mut impl Write) -> Result<()> {
        let Some(current) = session.current().cloned() else {
            bail!("You need to log in to perform this action.");
        };
        let valid = session.verify(&self.identity).await?;
        writeln!(
            out,
            "{} ({}, {}) since {}",
            current.email(),
            current.user_id(),
            current.role(),
            current.started_at().format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(out, "Token {}.", if valid { "valid" } else { "no longer valid" })?;
        Ok(())
    }

    async fn tickets(&self, session: &SessionContext, out: &mut impl Write) -> Result<()> {
        let mut board = TicketBoard::new(self.catalog.clone(), self.users.clone());
        let Some(tickets) = board.load(session).await? else {
            return Ok(());
        };
        if tickets.is_empty() {
            writeln!(out, "No tickets.")?;
        }
        for ticket in tickets {
            write_ticket(out, ticket)?;
        }
        Ok(())
    }

    async fn browse(
        &self,
        session: &SessionContext,
        tab: CatalogTab,
        args: &ListArgs,
        out: &mut impl Write,
    ) -> Result<()> {
        let mut view = CatalogView::new(self.catalog.clone(), self.per_page);
        view.switch_tab(tab);
        if args.mine {
            view.set_ownership(Ownership::Mine);
        }
        let filters = CatalogFilters {
            name: args.name.clone(),
            location: args.location.clone(),
            min_seats: args.min_seats,
            max_seats: args.max_seats,
            page: args.page,
            per_page: None,
        };

        write_page(out, view.page(session, filters, None).await?)?;
        for _ in 1..args.pages {
            match view.next(session).await? {
                Some(page) => write_page(out, page)?,
                None => break,
            }
        }
        Ok(())
    }

    async fn inclusions(
        &self,
        session: &SessionContext,
        event: Option<i64>,
        packet: Option<i64>,
        out: &mut impl Write,
    ) -> Result<()> {
        let manager = InclusionManager::new(self.catalog.clone());
        match (event, packet) {
            (Some(event), _) => {
                for packet in manager.packets_for_event(session, EventId::new(event)).await? {
                    write_packet(out, &packet)?;
                }
            }
            (None, Some(packet)) => {
                for event in manager.events_for_packet(session, PacketId::new(packet)).await? {
                    write_event(out, &event)?;
                }
            }
            (None, None) => bail!("Give --event or --packet."),
        }
        Ok(())
    }

    async fn customers(&self, session: &SessionContext, out: &mut impl Write) -> Result<()> {
        let mut view = CatalogView::new(self.catalog.clone(), OWNED_PAGE_SIZE);
        view.set_ownership(Ownership::Mine);

        let events = match view.page(session, CatalogFilters::default(), None).await? {
            CatalogPage::Events(feed) => feed.items.clone(),
            CatalogPage::Packets(_) => Vec::new(),
        };
        view.switch_tab(CatalogTab::Packets);
        let packets = match view.page(session, CatalogFilters::default(), None).await? {
            CatalogPage::Packets(feed) => feed.items.clone(),
            CatalogPage::Events(_) => Vec::new(),
        };

        let groups = CustomerDirectory::new(self.users.clone())
            .collect(session, &events, &packets)
            .await?;
        for group in groups {
            writeln!(out, "{}", group.title)?;
            match &group.customers {
                Lookup::Loaded(customers) if customers.is_empty() => {
                    writeln!(out, "  (no customers)")?;
                }
                Lookup::Loaded(customers) => {
                    for customer in customers {
                        write_customer(out, customer)?;
                    }
                }
                Lookup::Failed(error) => writeln!(out, "  {error}")?,
                Lookup::NotRequested | Lookup::Pending => {}
            }
        }
        Ok(())
    }
}

fn write_page(out: &mut impl Write, page: &CatalogPage) -> std::io::Result<()> {
    match page {
        CatalogPage::Events(feed) => {
            for event in &feed.items {
                write_event(out, event)?;
            }
            writeln!(out, "-- page {}", feed.metadata.page)
        }
        CatalogPage::Packets(feed) => {
            for packet in &feed.items {
                write_packet(out, packet)?;
            }
            writeln!(out, "-- page {}", feed.metadata.page)
        }
    }
}

fn write_event(out: &mut impl Write, event: &Event) -> std::io::Result<()> {
    writeln!(
        out,
        "#{} {} @ {} ({} seats)",
        event.id.get(),
        event.name,
        event.location.as_deref().unwrap_or("-"),
        event.seats.unwrap_or(0)
    )
}

fn write_packet(out: &mut impl Write, packet: &Packet) -> std::io::Result<()> {
    writeln!(
        out,
        "#{} {} @ {} ({} seats)",
        packet.id.get(),
        packet.name,
        packet.location.as_deref().unwrap_or("-"),
        packet.allocated_seats.unwrap_or(0)
    )
}

fn write_customer(out: &mut impl Write, user: &User) -> std::io::Result<()> {
    writeln!(out, "  {} <{}>", user.display_name(), user.email)
}

fn write_ticket(out: &mut impl Write, ticket: &ResolvedTicket) -> std::io::Result<()> {
    writeln!(out, "{}", ticket.ticket.code)?;
    if ticket.is_unbound() {
        return writeln!(out, "  {NO_ASSOCIATION}");
    }
    if let Some(event) = ticket.event_details() {
        write!(out, "  event ")?;
        write_event(out, event)?;
    }
    if let Some(packet) = ticket.packet_details() {
        write!(out, "  packet ")?;
        write_packet(out, packet)?;
        for event in ticket.packet_events() {
            write!(out, "    ")?;
            write_event(out, event)?;
        }
    }
    for failure in ticket.failures() {
        writeln!(out, "  {failure}")?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ticketdesk_core::model::UserId;
    use ticketdesk_testing::{fixtures, InMemoryCatalog, InMemoryIdentity, InMemoryUsers};

    fn backend() -> Backend<InMemoryIdentity, InMemoryCatalog, InMemoryUsers> {
        let mut ada = fixtures::user(3, "Ada", "Lovelace");
        ada.ticket_list = vec![fixtures::ticket_for_packet("TK-9", 10)];

        Backend {
            identity: InMemoryIdentity::new()
                .with_account(UserId::new(3), "ada@example.com", "secret", Role::Client)
                .with_account(UserId::new(7), "org@example.com", "secret", Role::Owner),
            catalog: InMemoryCatalog::new()
                .with_event(fixtures::event(1, 7, "Opening"))
                .with_event(fixtures::event(2, 8, "Jazz Night"))
                .with_packet(fixtures::packet(10, 7, "Weekend"))
                .with_inclusion(EventId::new(1), PacketId::new(10)),
            users: InMemoryUsers::new().with_user(ada),
            per_page: 10,
        }
    }

    fn login(email: &str) -> Credentials {
        Credentials {
            email: Some(email.to_string()),
            password: Some("secret".to_string()),
        }
    }

    async fn output(
        backend: &Backend<InMemoryIdentity, InMemoryCatalog, InMemoryUsers>,
        command: Command,
        credentials: Credentials,
    ) -> Result<String> {
        let mut out = Vec::new();
        backend.execute(&command, &credentials, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn events_are_listed_anonymously() {
        let list = ListArgs {
            pages: 1,
            ..ListArgs::default()
        };
        let text = output(&backend(), Command::Events(list), Credentials::default())
            .await
            .unwrap();

        assert!(text.contains("#1 Opening"));
        assert!(text.contains("#2 Jazz Night"));
    }

    #[tokio::test]
    async fn tickets_show_packet_events() {
        let text = output(&backend(), Command::Tickets, login("ada@example.com")).await.unwrap();

        assert!(text.starts_with("TK-9"));
        assert!(text.contains("packet #10 Weekend"));
        assert!(text.contains("#1 Opening"));
    }

    #[tokio::test]
    async fn customers_of_own_entities() {
        let text = output(&backend(), Command::Customers, login("org@example.com")).await.unwrap();

        assert!(text.contains("Opening\n  (no customers)"));
        assert!(text.contains("Weekend\n  Ada Lovelace <ada@example.com>"));
        assert!(!text.contains("Jazz Night"));
    }

    #[tokio::test]
    async fn buying_both_is_rejected_locally() {
        let backend = backend();
        let error = output(
            &backend,
            Command::Buy {
                event: Some(1),
                packet: Some(10),
            },
            login("ada@example.com"),
        )
        .await
        .unwrap_err();

        assert_eq!(error.to_string(), "Select either an event or a packet, not both.");
        assert_eq!(backend.users.calls("purchase_ticket"), 0);
    }

    #[tokio::test]
    async fn session_is_revoked_after_the_command() {
        let backend = backend();
        output(&backend, Command::Whoami, login("ada@example.com")).await.unwrap();

        assert!(backend.identity.is_revoked("token-1"));
    }

    #[tokio::test]
    async fn refused_login_stops_the_command() {
        let backend = backend();
        let credentials = Credentials {
            email: Some("ada@example.com".to_string()),
            password: Some("wrong".to_string()),
        };

        let error = output(&backend, Command::Tickets, credentials).await.unwrap_err();

        assert!(error.to_string().contains("Invalid credentials"));
        assert_eq!(backend.users.calls("user"), 0);
    }

    #[tokio::test]
    async fn bind_requires_login() {
        let backend = backend();
        let pair = PairArgs {
            event: 2,
            packet: 10,
        };
        let error = output(&backend, Command::Bind(pair), Credentials::default())
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "You need to log in to perform this action.");
        assert!(!backend.catalog.is_bound(EventId::new(2), PacketId::new(10)));
    }
}
