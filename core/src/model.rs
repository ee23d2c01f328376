//! Domain records shared by the catalog, user and identity services.
//!
//! Field names follow the wire format of the services (`id_owner`,
//! `allocated_seats`, `ticket_list`), so these types deserialize directly from
//! service responses once the adapter has unwrapped any envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw numeric identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw numeric identifier.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", $label, self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`Event`].
    EventId,
    "event"
);
entity_id!(
    /// Identifier of a [`Packet`].
    PacketId,
    "packet"
);
entity_id!(
    /// Identifier of a [`User`].
    UserId,
    "user"
);

/// A single scheduled occurrence with finite seating, owned by one organizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Owning organizer
    #[serde(rename = "id_owner")]
    pub owner_id: UserId,
    /// Display name
    pub name: String,
    /// Venue, if any
    #[serde(default)]
    pub location: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Total seating capacity
    #[serde(default)]
    pub seats: Option<u32>,
}

/// A bundle of events sold as one purchasable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Packet identifier
    pub id: PacketId,
    /// Owning organizer
    #[serde(rename = "id_owner")]
    pub owner_id: UserId,
    /// Display name
    pub name: String,
    /// Venue, if any
    #[serde(default)]
    pub location: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Seats reserved for packet holders
    #[serde(default)]
    pub allocated_seats: Option<u32>,
}

/// Entities that carry an owning organizer.
pub trait Owned {
    /// The organizer owning this entity.
    fn owner(&self) -> UserId;
}

impl Owned for Event {
    fn owner(&self) -> UserId {
        self.owner_id
    }
}

impl Owned for Packet {
    fn owner(&self) -> UserId {
        self.owner_id
    }
}

/// The binding fact that a packet grants access to an event.
///
/// At most one inclusion exists per `(event, packet)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Inclusion {
    /// Included event
    #[serde(rename = "id_event")]
    pub event_id: EventId,
    /// Packet granting access
    #[serde(rename = "id_packet")]
    pub packet_id: PacketId,
}

impl Inclusion {
    /// Create an inclusion record for a pair.
    #[must_use]
    pub const fn new(event_id: EventId, packet_id: PacketId) -> Self {
        Self { event_id, packet_id }
    }
}

/// A purchased, uniquely coded right to attend one event or one packet's events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Server-generated ticket code
    pub code: String,
    /// Referenced event, when bought for a single event
    #[serde(default)]
    pub event_id: Option<EventId>,
    /// Referenced packet, when bought for a packet
    #[serde(default)]
    pub packet_id: Option<PacketId>,
}

/// What a ticket record points at.
///
/// Well-formed tickets are either [`TicketRef::Event`] or [`TicketRef::Packet`];
/// the remaining variants describe records the services may still return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketRef {
    /// Ticket for a single event
    Event(EventId),
    /// Ticket for a packet
    Packet(PacketId),
    /// Record carrying both references
    Both {
        /// Event reference
        event: EventId,
        /// Packet reference
        packet: PacketId,
    },
    /// Record carrying no reference
    Unbound,
}

impl Ticket {
    /// Classify the ticket's reference fields.
    #[must_use]
    pub const fn reference(&self) -> TicketRef {
        match (self.event_id, self.packet_id) {
            (Some(event), None) => TicketRef::Event(event),
            (None, Some(packet)) => TicketRef::Packet(packet),
            (Some(event), Some(packet)) => TicketRef::Both { event, packet },
            (None, None) => TicketRef::Unbound,
        }
    }
}

/// Target of a purchase request: exactly one of an event or a packet.
///
/// Serializes to the request body the user service expects,
/// `{"event_id": 3}` or `{"packet_id": 5}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TicketTarget {
    /// Buy a ticket for one event
    #[serde(rename = "event_id")]
    Event(EventId),
    /// Buy a ticket for a packet
    #[serde(rename = "packet_id")]
    Packet(PacketId),
}

/// User role, normalized case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Organizer managing events and packets
    Owner,
    /// Purchaser of tickets
    Client,
}

impl Role {
    /// Parse a role name. Accepts any casing and the legacy `owner-event` alias.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "owner" | "owner-event" => Some(Self::Owner),
            "client" => Some(Self::Client),
            _ => None,
        }
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Client => "client",
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown role: {value}"))
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user record from the user service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Login email
    pub email: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Hide the given name from other users
    #[serde(default)]
    pub first_name_private: bool,
    /// Hide the family name from other users
    #[serde(default)]
    pub last_name_private: bool,
    /// Free-form social media links
    #[serde(default)]
    pub social_media_links: Option<String>,
    /// Role, when the service reports it
    #[serde(default)]
    pub role: Option<Role>,
    /// Tickets held by the user
    #[serde(default)]
    pub ticket_list: Vec<Ticket>,
}

impl User {
    /// Name to show to other users, honoring the privacy flags.
    ///
    /// Falls back to the email when every name part is hidden or empty.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [
            (self.first_name.as_str(), self.first_name_private),
            (self.last_name.as_str(), self.last_name_private),
        ]
        .into_iter()
        .filter(|(part, private)| !private && !part.trim().is_empty())
        .map(|(part, _)| part.trim())
        .collect();

        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::parse("OWNER"), Some(Role::Owner));
        assert_eq!(Role::parse(" Client "), Some(Role::Client));
        assert_eq!(Role::parse("owner-event"), Some(Role::Owner));
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn role_deserializes_from_mixed_case() {
        let role: Role = serde_json::from_value(json!("Client")).unwrap();
        assert_eq!(role, Role::Client);
        assert!(serde_json::from_value::<Role>(json!("guest")).is_err());
    }

    #[test]
    fn ticket_reference_variants() {
        let ticket = |event: Option<i64>, packet: Option<i64>| Ticket {
            code: "T-1".to_string(),
            event_id: event.map(EventId::new),
            packet_id: packet.map(PacketId::new),
        };

        assert_eq!(ticket(Some(3), None).reference(), TicketRef::Event(EventId::new(3)));
        assert_eq!(ticket(None, Some(5)).reference(), TicketRef::Packet(PacketId::new(5)));
        assert_eq!(
            ticket(Some(3), Some(5)).reference(),
            TicketRef::Both {
                event: EventId::new(3),
                packet: PacketId::new(5)
            }
        );
        assert_eq!(ticket(None, None).reference(), TicketRef::Unbound);
    }

    #[test]
    fn ticket_target_serializes_single_reference() {
        let body = serde_json::to_value(TicketTarget::Packet(PacketId::new(5))).unwrap();
        assert_eq!(body, json!({ "packet_id": 5 }));

        let body = serde_json::to_value(TicketTarget::Event(EventId::new(3))).unwrap();
        assert_eq!(body, json!({ "event_id": 3 }));
    }

    #[test]
    fn event_deserializes_wire_names() {
        let event: Event = serde_json::from_value(json!({
            "id": 4,
            "id_owner": 9,
            "name": "Jazz Night",
            "location": null,
            "seats": 120,
            "_links": {}
        }))
        .unwrap();

        assert_eq!(event.owner_id, UserId::new(9));
        assert_eq!(event.location, None);
        assert_eq!(event.seats, Some(120));
        assert_eq!(event.description, None);
    }

    #[test]
    fn display_name_respects_privacy() {
        let mut user = User {
            id: UserId::new(1),
            email: "ana@example.com".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Pop".to_string(),
            first_name_private: false,
            last_name_private: true,
            social_media_links: None,
            role: Some(Role::Client),
            ticket_list: Vec::new(),
        };
        assert_eq!(user.display_name(), "Ana");

        user.first_name_private = true;
        assert_eq!(user.display_name(), "ana@example.com");

        user.last_name_private = false;
        assert_eq!(user.display_name(), "Pop");
    }
}
