//! Paginated catalog feeds and the query parameters that produce them.
//!
//! The catalog answers filter requests with a page of items, a set of
//! navigation links and page metadata. Navigation never rebuilds a query from
//! UI state: a link's own query string is re-issued verbatim through
//! [`FeedQuery::from_link`], because links may carry parameters the UI does not
//! track.

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Base used to resolve relative link targets; only the query string matters.
const LINK_BASE: &str = "http://catalog.invalid/";

/// A hypermedia link as emitted by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL (opaque to the client)
    pub href: String,
    /// Relation name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// HTTP method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// A bare link to `href`.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: None,
            method: None,
            title: None,
        }
    }
}

/// Navigation links of a feed page.
///
/// `first`/`prev` are absent on page 1 and `next`/`last` on the final page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkSet {
    /// Current page
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Link>,
    /// First page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<Link>,
    /// Previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
    /// Next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    /// Last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<Link>,
}

/// Position of a page within the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMetadata {
    /// One-based page number
    #[serde(default = "first_page")]
    pub page: u32,
    /// Requested page size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Total number of pages, when the service reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

const fn first_page() -> u32 {
    1
}

impl Default for FeedMetadata {
    fn default() -> Self {
        Self {
            page: first_page(),
            per_page: None,
            total_pages: None,
        }
    }
}

/// One page of catalog items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Navigation links
    pub links: LinkSet,
    /// Page metadata
    pub metadata: FeedMetadata,
}

impl<T> Feed<T> {
    /// An empty first page.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            links: LinkSet::default(),
            metadata: FeedMetadata::default(),
        }
    }

    /// Keep only items matching `keep`, leaving links and metadata untouched.
    #[must_use]
    pub fn filter(mut self, keep: impl Fn(&T) -> bool) -> Self {
        self.items.retain(|item| keep(item));
        self
    }

    /// Whether a following page is advertised.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.links.next.is_some()
    }

    /// Whether a preceding page is advertised.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.links.prev.is_some()
    }
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Caller-supplied catalog filters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogFilters {
    /// Name substring
    pub name: Option<String>,
    /// Location substring
    pub location: Option<String>,
    /// Minimum seat count
    pub min_seats: Option<u32>,
    /// Maximum seat count
    pub max_seats: Option<u32>,
    /// Page number
    pub page: Option<u32>,
    /// Page size
    pub per_page: Option<u32>,
}

impl CatalogFilters {
    /// Whether no filter field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.min_seats.is_none()
            && self.max_seats.is_none()
            && self.page.is_none()
            && self.per_page.is_none()
    }
}

/// Ordered query parameters of a catalog listing request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedQuery {
    params: Vec<(String, String)>,
}

impl FeedQuery {
    /// Build a query from filters. Blank text filters are omitted.
    #[must_use]
    pub fn from_filters(filters: &CatalogFilters) -> Self {
        let mut params = Vec::new();
        let mut text = |key: &str, value: &Option<String>| {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((key.to_string(), value.to_string()));
            }
        };
        text("name", &filters.name);
        text("location", &filters.location);

        let numbers = [
            ("min_seats", filters.min_seats),
            ("max_seats", filters.max_seats),
            ("page", filters.page),
            ("per_page", filters.per_page),
        ];
        for (key, value) in numbers {
            if let Some(value) = value {
                params.push((key.to_string(), value.to_string()));
            }
        }

        Self { params }
    }

    /// Extract the full query parameter set of a navigation link, verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Rejected` when the link is not a valid URL.
    pub fn from_link(link: &Link) -> Result<Self, ServiceError> {
        let base = Url::parse(LINK_BASE)
            .map_err(|e| ServiceError::Rejected(format!("invalid link base: {e}")))?;
        let url = base
            .join(&link.href)
            .map_err(|e| ServiceError::Rejected(format!("malformed pagination link: {e}")))?;

        let params = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Ok(Self { params })
    }

    /// The parameters in request order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the query carries no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_skip_blank_fields() {
        let query = FeedQuery::from_filters(&CatalogFilters {
            name: Some("  jazz ".to_string()),
            location: Some("   ".to_string()),
            min_seats: Some(10),
            per_page: Some(2),
            ..CatalogFilters::default()
        });

        assert_eq!(
            query.params(),
            &[
                ("name".to_string(), "jazz".to_string()),
                ("min_seats".to_string(), "10".to_string()),
                ("per_page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn link_query_is_taken_verbatim() {
        let link = Link::new(
            "http://localhost:12345/api/event-manager/events?name=rock&page=3&per_page=2&cursor=abc%3D",
        );
        let query = FeedQuery::from_link(&link).unwrap();

        assert_eq!(query.get("name"), Some("rock"));
        assert_eq!(query.get("page"), Some("3"));
        assert_eq!(query.get("cursor"), Some("abc="));
        assert_eq!(query.params().len(), 4);
    }

    #[test]
    fn relative_links_are_accepted() {
        let query = FeedQuery::from_link(&Link::new("/events?page=2")).unwrap();
        assert_eq!(query.get("page"), Some("2"));
    }

    #[test]
    fn link_set_reads_wire_names() {
        let links: LinkSet = serde_json::from_value(json!({
            "self": { "href": "http://x/events?page=1", "rel": "self", "method": "GET" },
            "next": { "href": "http://x/events?page=2", "method": "GET" },
            "create": { "href": "http://x/events", "method": "POST" }
        }))
        .unwrap();

        assert!(links.current.is_some());
        assert!(links.next.is_some());
        assert!(links.prev.is_none());
    }

    #[test]
    fn filter_keeps_links() {
        let feed = Feed {
            items: vec![1, 2, 3, 4],
            links: LinkSet {
                next: Some(Link::new("/events?page=2")),
                ..LinkSet::default()
            },
            metadata: FeedMetadata::default(),
        };

        let even = feed.filter(|n| n % 2 == 0);
        assert_eq!(even.items, vec![2, 4]);
        assert!(even.has_next());
        assert!(!even.has_prev());
    }
}
