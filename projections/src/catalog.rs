//! Ownership-filtered catalog view.
//!
//! Browses the event or packet feed with the caller's filters, optionally
//! restricted to items the session user owns. Pagination follows the
//! service's own links: a cursor's query string is re-issued verbatim and the
//! view's filter state is ignored for that request.

use ticketdesk_core::classify::ClassifyContext;
use ticketdesk_core::error::ClassifiedError;
use ticketdesk_core::feed::{CatalogFilters, Feed, FeedQuery, Link};
use ticketdesk_core::model::{Event, Owned, Packet, UserId};
use ticketdesk_core::services::CatalogService;
use ticketdesk_core::session::SessionContext;

const EVENTS_FAILED: &str = "Failed to load events.";
const PACKETS_FAILED: &str = "Failed to load packets.";

/// Which listing the view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogTab {
    /// Single events
    #[default]
    Events,
    /// Packets
    Packets,
}

/// Whose items the view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ownership {
    /// Every item
    #[default]
    All,
    /// Only items owned by the session user
    Mine,
}

/// One page of the current tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogPage {
    /// Events page
    Events(Feed<Event>),
    /// Packets page
    Packets(Feed<Packet>),
}

impl CatalogPage {
    /// Link to the following page.
    #[must_use]
    pub const fn next(&self) -> Option<&Link> {
        match self {
            Self::Events(feed) => feed.links.next.as_ref(),
            Self::Packets(feed) => feed.links.next.as_ref(),
        }
    }

    /// Link to the preceding page.
    #[must_use]
    pub const fn prev(&self) -> Option<&Link> {
        match self {
            Self::Events(feed) => feed.links.prev.as_ref(),
            Self::Packets(feed) => feed.links.prev.as_ref(),
        }
    }

    /// Number of items on the page.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Events(feed) => feed.items.len(),
            Self::Packets(feed) => feed.items.len(),
        }
    }

    /// Whether the page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Paginated, optionally owner-filtered view of the catalog.
#[derive(Debug)]
pub struct CatalogView<C> {
    catalog: C,
    tab: CatalogTab,
    ownership: Ownership,
    filters: CatalogFilters,
    per_page: u32,
    page: Option<CatalogPage>,
}

impl<C: CatalogService> CatalogView<C> {
    /// A view on the events tab, showing everything.
    #[must_use]
    pub fn new(catalog: C, per_page: u32) -> Self {
        Self {
            catalog,
            tab: CatalogTab::default(),
            ownership: Ownership::default(),
            filters: CatalogFilters::default(),
            per_page,
            page: None,
        }
    }

    /// Active tab.
    #[must_use]
    pub const fn tab(&self) -> CatalogTab {
        self.tab
    }

    /// Active filters.
    #[must_use]
    pub const fn filters(&self) -> &CatalogFilters {
        &self.filters
    }

    /// The last loaded page.
    #[must_use]
    pub const fn current(&self) -> Option<&CatalogPage> {
        self.page.as_ref()
    }

    /// Switch tabs. Changing tab resets every filter and discards the page.
    pub fn switch_tab(&mut self, tab: CatalogTab) {
        if tab != self.tab {
            tracing::debug!(?tab, "Switching catalog tab");
            self.tab = tab;
            self.filters = CatalogFilters::default();
            self.page = None;
        }
    }

    /// Show everything or only the session user's items.
    pub fn set_ownership(&mut self, ownership: Ownership) {
        self.ownership = ownership;
    }

    /// Load a page.
    ///
    /// Without a cursor the request carries `filters` (which become the
    /// view's filter state, with the configured page size filled in). With a
    /// cursor the link's query parameters are sent unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when showing "mine" without a session, or the
    /// classified fetch failure.
    pub async fn page(
        &mut self,
        session: &SessionContext,
        filters: CatalogFilters,
        cursor: Option<&Link>,
    ) -> Result<&CatalogPage, ClassifiedError> {
        let context = ClassifyContext::new(match self.tab {
            CatalogTab::Events => EVENTS_FAILED,
            CatalogTab::Packets => PACKETS_FAILED,
        });

        let owner = match self.ownership {
            Ownership::All => None,
            Ownership::Mine => Some(session.require().map_err(|e| e.classify(&context))?.user_id()),
        };

        let query = match cursor {
            Some(link) => FeedQuery::from_link(link).map_err(|e| e.classify(&context))?,
            None => {
                let mut filters = filters;
                filters.per_page.get_or_insert(self.per_page);
                let query = FeedQuery::from_filters(&filters);
                self.filters = filters;
                query
            }
        };

        let page = match self.tab {
            CatalogTab::Events => {
                let feed = self.catalog.filter_events(session, &query).await;
                CatalogPage::Events(owned_by(feed.map_err(|e| e.classify(&context))?, owner))
            }
            CatalogTab::Packets => {
                let feed = self.catalog.filter_packets(session, &query).await;
                CatalogPage::Packets(owned_by(feed.map_err(|e| e.classify(&context))?, owner))
            }
        };

        tracing::debug!(tab = ?self.tab, items = page.len(), "Catalog page loaded");
        Ok(self.page.insert(page))
    }

    /// Follow the current page's `next` link. Returns `Ok(None)` on the last
    /// page.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogView::page`].
    pub async fn next(
        &mut self,
        session: &SessionContext,
    ) -> Result<Option<&CatalogPage>, ClassifiedError> {
        let Some(link) = self.page.as_ref().and_then(CatalogPage::next).cloned() else {
            return Ok(None);
        };
        self.page(session, self.filters.clone(), Some(&link)).await.map(Some)
    }

    /// Follow the current page's `prev` link. Returns `Ok(None)` on the first
    /// page.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogView::page`].
    pub async fn prev(
        &mut self,
        session: &SessionContext,
    ) -> Result<Option<&CatalogPage>, ClassifiedError> {
        let Some(link) = self.page.as_ref().and_then(CatalogPage::prev).cloned() else {
            return Ok(None);
        };
        self.page(session, self.filters.clone(), Some(&link)).await.map(Some)
    }
}

fn owned_by<T: Owned>(feed: Feed<T>, owner: Option<UserId>) -> Feed<T> {
    match owner {
        Some(owner) => feed.filter(|item| item.owner() == owner),
        None => feed,
    }
}
