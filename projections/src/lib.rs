//! Client-side views assembled from the Ticketdesk services.
//!
//! # Overview
//!
//! The backend services return records unjoined and disagree on error shapes.
//! This crate joins and normalizes them for display:
//! - **Tickets**: resolve ticket references to events, packets and included
//!   events ([`tickets`])
//! - **Inclusions**: bind and unbind events to packets, with cached lists
//!   invalidated per entity ([`inclusions`], [`cache`])
//! - **Catalog**: paginated, owner-filtered event and packet listings
//!   ([`catalog`])
//! - **Customers**: ticket holders of an organizer's events and packets
//!   ([`customers`])
//! - **Purchase**: validated ticket purchase ([`purchase`])
//!
//! Every failure reaching a caller is a
//! [`ClassifiedError`](ticketdesk_core::ClassifiedError); failures of single
//! items inside a batch are carried as [`Lookup::Failed`] instead.
//!
//! # Example
//!
//! ```ignore
//! use ticketdesk_projections::TicketResolver;
//!
//! let resolver = TicketResolver::new(catalog);
//! let resolved = resolver.resolve_all(&session, user.ticket_list).await;
//!
//! for ticket in &resolved {
//!     if let Some(event) = ticket.event_details() {
//!         println!("{}: {}", ticket.ticket.code, event.name);
//!     }
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod customers;
pub mod inclusions;
pub mod lookup;
pub mod purchase;
pub mod scope;
pub mod tickets;

// Re-export main types for convenience
pub use cache::{Cached, EpochCache};
pub use catalog::{CatalogPage, CatalogTab, CatalogView, Ownership};
pub use customers::{CustomerDirectory, CustomerGroup};
pub use inclusions::InclusionManager;
pub use lookup::Lookup;
pub use purchase::{PurchaseRequest, TicketPurchase};
pub use scope::{ViewScope, Visit};
pub use tickets::{ResolvedTicket, TicketBoard, TicketResolver, NO_ASSOCIATION};
