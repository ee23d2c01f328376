//! Tests for the in-memory service fakes

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use proptest::prelude::*;
use ticketdesk_core::identity::Registration;
use ticketdesk_core::{
    classify, CatalogFilters, CatalogService, ClassifyContext, ErrorKind, EventId, FeedQuery,
    IdentityService, PacketId, Role, ServiceError, SessionContext, TicketTarget, UserId,
    UserService,
};
use ticketdesk_testing::{fixtures, CatalogOp, InMemoryCatalog, InMemoryIdentity, InMemoryUsers};

fn catalog_with_events(count: i64) -> InMemoryCatalog {
    (1..=count).fold(InMemoryCatalog::new(), |catalog, id| {
        catalog.with_event(fixtures::event(id, 7, &format!("Event {id}")))
    })
}

#[tokio::test]
async fn missing_event_answers_like_the_catalog() {
    let catalog = InMemoryCatalog::new();

    let error = catalog
        .event(&SessionContext::anonymous(), EventId::new(12))
        .await
        .unwrap_err();

    let classified = classify(&error.raw(), &ClassifyContext::new("Failed to load event."));
    assert_eq!(classified.kind, ErrorKind::NotFound);
    assert_eq!(classified.message, "Event not found.");
}

#[tokio::test]
async fn inclusion_lifecycle() {
    let session = fixtures::owner_session(7);
    let catalog = InMemoryCatalog::new()
        .with_event(fixtures::event(1, 7, "Opening"))
        .with_packet(fixtures::packet(2, 7, "Weekend"));

    catalog
        .create_inclusion(&session, EventId::new(1), PacketId::new(2))
        .await
        .unwrap();
    assert!(catalog.is_bound(EventId::new(1), PacketId::new(2)));

    let duplicate = catalog
        .create_inclusion(&session, EventId::new(1), PacketId::new(2))
        .await
        .unwrap_err();
    assert_eq!(duplicate.http_status(), Some(409));

    let events = catalog
        .events_for_packet(&session, PacketId::new(2))
        .await
        .unwrap();
    assert_eq!(events.len(), 1);

    catalog
        .delete_inclusion(&session, EventId::new(1), PacketId::new(2))
        .await
        .unwrap();
    let missing = catalog
        .delete_inclusion(&session, EventId::new(1), PacketId::new(2))
        .await
        .unwrap_err();
    assert_eq!(missing.http_status(), Some(404));
}

#[tokio::test]
async fn mutations_need_a_session() {
    let catalog = InMemoryCatalog::new()
        .with_event(fixtures::event(1, 7, "Opening"))
        .with_packet(fixtures::packet(2, 7, "Weekend"));

    let error = catalog
        .create_inclusion(&SessionContext::anonymous(), EventId::new(1), PacketId::new(2))
        .await
        .unwrap_err();

    assert_eq!(error, ServiceError::MissingSession);
    assert_eq!(catalog.calls("create_inclusion"), 0);
}

#[tokio::test]
async fn injected_failures_until_cleared() {
    let catalog = catalog_with_events(1);
    let anonymous = SessionContext::anonymous();
    catalog.fail(CatalogOp::Event(EventId::new(1)), ServiceError::Network("offline".into()));

    assert!(catalog.event(&anonymous, EventId::new(1)).await.is_err());
    catalog.clear_failure(CatalogOp::Event(EventId::new(1)));
    assert!(catalog.event(&anonymous, EventId::new(1)).await.is_ok());
    assert_eq!(catalog.calls("event"), 2);
}

#[tokio::test]
async fn filters_and_links_keep_the_query() {
    let catalog = catalog_with_events(5).with_event(fixtures::event(6, 8, "Jazz Night"));
    let filters = CatalogFilters {
        name: Some("event".to_string()),
        per_page: Some(2),
        ..CatalogFilters::default()
    };

    let feed = catalog
        .filter_events(&SessionContext::anonymous(), &FeedQuery::from_filters(&filters))
        .await
        .unwrap();

    assert_eq!(feed.items.len(), 2);
    assert_eq!(feed.metadata.total_pages, Some(3));
    let next = FeedQuery::from_link(feed.links.next.as_ref().unwrap()).unwrap();
    assert_eq!(next.get("name"), Some("event"));
    assert_eq!(next.get("page"), Some("2"));
    assert!(feed.links.prev.is_none());
}

#[tokio::test]
async fn purchase_lands_on_the_ticket_list() {
    let session = fixtures::client_session(3);
    let users = InMemoryUsers::new().with_user(fixtures::user(3, "Ada", "Lovelace"));

    let code = users
        .purchase_ticket(&session, UserId::new(3), TicketTarget::Packet(PacketId::new(5)))
        .await
        .unwrap();

    assert_eq!(code, "TK-1");
    let holders = users.packet_customers(&session, PacketId::new(5)).await.unwrap();
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].ticket_list[0].code, "TK-1");
}

#[tokio::test]
async fn identity_refusals_are_flags_not_errors() {
    let identity = InMemoryIdentity::new();
    let registration = Registration {
        email: "ada@example.com".to_string(),
        password: "secret".to_string(),
        role: Role::Client,
    };

    assert!(identity.register(&registration).await.unwrap().success);
    let again = identity.register(&registration).await.unwrap();
    assert!(!again.success);
    assert_eq!(again.message, "User already exists");

    let refused = identity.login("ada@example.com", "wrong").await.unwrap();
    assert!(!refused.success);

    let login = identity.login("ada@example.com", "secret").await.unwrap();
    let token = login.token.unwrap();
    assert!(identity.verify(&token).await.unwrap().is_usable());

    identity.revoke(&token).await.unwrap();
    let status = identity.verify(&token).await.unwrap();
    assert!(status.blacklisted);
    assert!(!status.is_usable());
}

proptest! {
    #[test]
    fn following_next_links_visits_every_item_once(count in 0i64..40, per_page in 1u32..12) {
        let catalog = catalog_with_events(count);
        let anonymous = SessionContext::anonymous();

        let seen = tokio_test::block_on(async {
            let mut seen = Vec::new();
            let mut query = FeedQuery::from_filters(&CatalogFilters {
                per_page: Some(per_page),
                ..CatalogFilters::default()
            });
            loop {
                let feed = catalog.filter_events(&anonymous, &query).await.unwrap();
                seen.extend(feed.items.iter().map(|event| event.id.get()));
                match &feed.links.next {
                    Some(link) => query = FeedQuery::from_link(link).unwrap(),
                    None => break,
                }
            }
            seen
        });

        prop_assert_eq!(seen, (1..=count).collect::<Vec<_>>());
    }
}
