//! Response-shape normalization.
//!
//! The services are inconsistent about envelopes. A single entity may arrive
//! bare or under a key (`{"event": {...}}`), and a list may arrive bare, under
//! one of several keys, with each item optionally wrapped again. Adapters run
//! every response through these helpers so callers only ever see plain
//! records and plain ordered lists.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use ticketdesk_core::error::{Result, ServiceError};
use ticketdesk_core::feed::{Feed, FeedMetadata, LinkSet};

/// Keys under which list endpoints place their items.
pub const LIST_KEYS: [&str; 5] = [
    "events",
    "packets",
    "event_packets",
    "event_inclusions",
    "users",
];

/// Keys wrapping individual list items.
pub const ITEM_WRAPPERS: [&str; 3] = ["event", "event_packet", "user"];

/// Decode an entity that may be wrapped under `envelope`.
///
/// # Errors
///
/// Returns `ServiceError::Decode` if neither shape deserializes
pub fn entity<T: DeserializeOwned>(value: Value, envelope: &str) -> Result<T> {
    let inner = match value {
        Value::Object(mut map) if map.get(envelope).is_some_and(Value::is_object) => {
            map.remove(envelope).unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| ServiceError::Decode(format!("{envelope}: {e}")))
}

/// Decode a list in any of the known shapes.
///
/// Items that fail to decode are skipped with a warning, keeping the rest of
/// the list usable. A body with no recognizable list yields an empty list.
#[must_use]
pub fn list<T: DeserializeOwned>(value: Value) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match take_list(&mut map) {
            Some(items) => items,
            None => {
                if !map.is_empty() {
                    let keys: Vec<_> = map.keys().collect();
                    tracing::warn!(?keys, "Unrecognized list shape");
                }
                Vec::new()
            }
        },
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(kind = value_kind(&other), "Unrecognized list shape");
            Vec::new()
        }
    };

    items
        .into_iter()
        .map(unwrap_item)
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable list item");
                None
            }
        })
        .collect()
}

/// Decode a paginated feed: items in any list shape plus `_links` and
/// `_metadata`, both optional.
#[must_use]
pub fn feed<T: DeserializeOwned>(value: Value) -> Feed<T> {
    let (links, metadata) = match &value {
        Value::Object(map) => (
            map.get("_links")
                .cloned()
                .and_then(|links| serde_json::from_value::<LinkSet>(links).ok())
                .unwrap_or_default(),
            map.get("_metadata")
                .cloned()
                .and_then(|meta| serde_json::from_value::<FeedMetadata>(meta).ok())
                .unwrap_or_default(),
        ),
        _ => (LinkSet::default(), FeedMetadata::default()),
    };

    Feed {
        items: list(value),
        links,
        metadata,
    }
}

/// Read a string field, e.g. the code returned by a purchase.
///
/// # Errors
///
/// Returns `ServiceError::Decode` if the field is missing or not a string
pub fn string_field(value: &Value, field: &str) -> Result<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ServiceError::Decode(format!("response carries no {field}")))
}

fn take_list(map: &mut Map<String, Value>) -> Option<Vec<Value>> {
    LIST_KEYS.iter().find_map(|key| match map.remove(*key) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    })
}

fn unwrap_item(item: Value) -> Value {
    match item {
        Value::Object(mut map) if map.len() == 1 => {
            match ITEM_WRAPPERS.iter().find(|key| map.get(**key).is_some_and(Value::is_object)) {
                Some(key) => map.remove(*key).unwrap_or(Value::Null),
                None => Value::Object(map),
            }
        }
        other => other,
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use ticketdesk_core::model::{Event, EventId, Packet, PacketId};

    fn event_json(id: i64) -> Value {
        json!({ "id": id, "id_owner": 1, "name": format!("Event {id}") })
    }

    #[test]
    fn entity_accepts_envelope_or_bare() {
        let wrapped: Event = entity(json!({ "event": event_json(3) }), "event").unwrap();
        let bare: Event = entity(event_json(3), "event").unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(bare.id, EventId::new(3));
    }

    #[test]
    fn entity_decode_failure() {
        let result: Result<Packet> =
            entity(json!({ "event_packet": { "id": "x" } }), "event_packet");
        assert!(matches!(result, Err(ServiceError::Decode(_))));
    }

    #[test]
    fn list_accepts_every_known_shape() {
        let shapes = [
            json!([event_json(1), event_json(2)]),
            json!({ "events": [event_json(1), event_json(2)] }),
            json!({ "event_inclusions": [{ "event": event_json(1) }, { "event": event_json(2) }] }),
            json!([{ "event": event_json(1) }, event_json(2)]),
        ];

        for shape in shapes {
            let events: Vec<Event> = list(shape);
            let ids: Vec<EventId> = events.iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![EventId::new(1), EventId::new(2)]);
        }
    }

    #[test]
    fn list_unwraps_packet_items() {
        let packets: Vec<Packet> = list(json!([
            { "event_packet": { "id": 5, "id_owner": 2, "name": "Weekend", "allocated_seats": 40 } }
        ]));
        assert_eq!(packets[0].id, PacketId::new(5));
        assert_eq!(packets[0].allocated_seats, Some(40));
    }

    #[test]
    fn list_skips_bad_items_and_unknown_shapes() {
        let events: Vec<Event> = list(json!([event_json(1), { "id": "bad" }, event_json(3)]));
        assert_eq!(events.len(), 2);

        let none: Vec<Event> = list(json!({ "something_else": [] }));
        assert!(none.is_empty());
        let none: Vec<Event> = list(Value::Null);
        assert!(none.is_empty());
    }

    #[test]
    fn feed_reads_links_and_metadata() {
        let feed: Feed<Event> = feed(json!({
            "events": [event_json(1)],
            "_links": {
                "self": { "href": "/events?page=1&per_page=1" },
                "next": { "href": "/events?page=2&per_page=1", "method": "GET" }
            },
            "_metadata": { "page": 1, "per_page": 1, "total_pages": 4 }
        }));

        assert_eq!(feed.items.len(), 1);
        assert!(feed.has_next());
        assert_eq!(feed.metadata.total_pages, Some(4));
    }
}
