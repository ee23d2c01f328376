//! Adapter behavior against a mock HTTP server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use ticketdesk_client::{ClientConfig, ServiceUrls, Services};
use ticketdesk_core::classify::ClassifyContext;
use ticketdesk_core::error::{ErrorKind, ServiceError};
use ticketdesk_core::feed::{FeedQuery, Link};
use ticketdesk_core::model::{EventId, PacketId, Role, TicketTarget, UserId};
use ticketdesk_core::services::{CatalogService, IdentityService, UserService};
use ticketdesk_core::session::{Session, SessionContext};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn services(server: &MockServer) -> Services {
    let config = ClientConfig {
        urls: ServiceUrls::parse(
            &format!("{}/api/idm/auth", server.uri()),
            &format!("{}/api/event-manager", server.uri()),
            &format!("{}/api/user-manager", server.uri()),
        )
        .unwrap(),
        per_page: 10,
    };
    Services::connect(&config).unwrap()
}

fn owner_session() -> SessionContext {
    SessionContext::authenticated(Session::new(
        "tok-1",
        UserId::new(7),
        Role::Owner,
        "org@example.com",
    ))
}

#[tokio::test]
async fn event_is_unwrapped_and_token_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/event-manager/events/4"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "event": { "id": 4, "id_owner": 7, "name": "Jazz Night", "seats": 120, "_links": {} }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server);
    let event = services.catalog.event(&owner_session(), EventId::new(4)).await.unwrap();

    assert_eq!(event.name, "Jazz Night");
    assert_eq!(event.seats, Some(120));
}

#[tokio::test]
async fn filter_follows_link_query_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/event-manager/events"))
        .and(query_param("name", "rock"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{ "id": 2, "id_owner": 3, "name": "Rock Fest" }],
            "_links": {
                "prev": { "href": "/api/event-manager/events?name=rock&page=1&per_page=1" },
                "first": { "href": "/api/event-manager/events?name=rock&page=1&per_page=1" }
            },
            "_metadata": { "page": 2, "per_page": 1 }
        })))
        .mount(&server)
        .await;

    let services = services(&server);
    let link = Link::new("http://elsewhere/api/event-manager/events?name=rock&page=2&per_page=1");
    let query = FeedQuery::from_link(&link).unwrap();
    let feed = services
        .catalog
        .filter_events(&SessionContext::anonymous(), &query)
        .await
        .unwrap();

    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.metadata.page, 2);
    assert!(feed.has_prev());
    assert!(!feed.has_next());
}

#[tokio::test]
async fn inclusion_lists_unwrap_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/event-manager/event-packet-inclusions/event/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "event_packet": { "id": 5, "id_owner": 7, "name": "Weekend Pass" } },
            { "event_packet": { "id": 6, "id_owner": 7, "name": "Season Pass" } }
        ])))
        .mount(&server)
        .await;

    let services = services(&server);
    let packets = services
        .catalog
        .packets_for_event(&owner_session(), EventId::new(3))
        .await
        .unwrap();

    let ids: Vec<PacketId> = packets.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![PacketId::new(5), PacketId::new(6)]);
}

#[tokio::test]
async fn duplicate_inclusion_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/event-manager/event-packet-inclusions/event/3/packet/5"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "error": "inclusion already exists" })),
        )
        .mount(&server)
        .await;

    let services = services(&server);
    let error = services
        .catalog
        .create_inclusion(&owner_session(), EventId::new(3), PacketId::new(5))
        .await
        .unwrap_err();

    assert_eq!(error.http_status(), Some(409));
    assert_eq!(error.classify(&ClassifyContext::default()).kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn mutations_without_session_send_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let services = services(&server);
    let error = services
        .catalog
        .delete_inclusion(&SessionContext::anonymous(), EventId::new(3), PacketId::new(5))
        .await
        .unwrap_err();

    assert_eq!(error, ServiceError::MissingSession);
}

#[tokio::test]
async fn plain_text_not_found_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/event-manager/event-packets/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Packet with ID 7 not found"))
        .mount(&server)
        .await;

    let services = services(&server);
    let error = services
        .catalog
        .packet(&SessionContext::anonymous(), PacketId::new(7))
        .await
        .unwrap_err();
    let shown = error.classify(&ClassifyContext::new("Failed to load packet"));

    assert_eq!(shown.kind, ErrorKind::NotFound);
    assert_eq!(shown.message, "Event packet not found.");
}

#[tokio::test]
async fn purchase_posts_single_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user-manager/clients/7/tickets"))
        .and(body_json(json!({ "packet_id": 5 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ticket_code": "TK-42" })))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server);
    let code = services
        .users
        .purchase_ticket(&owner_session(), UserId::new(7), TicketTarget::Packet(PacketId::new(5)))
        .await
        .unwrap();

    assert_eq!(code, "TK-42");
}

#[tokio::test]
async fn customers_are_read_from_users_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user-manager/events/3/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                { "id": 11, "email": "a@example.com", "first_name": "Ana", "last_name": "Pop" },
                { "id": 12, "email": "b@example.com" }
            ]
        })))
        .mount(&server)
        .await;

    let services = services(&server);
    let users = services
        .users
        .event_customers(&owner_session(), EventId::new(3))
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].display_name(), "Ana Pop");
}

#[tokio::test]
async fn login_reads_string_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/idm/auth/login"))
        .and(body_json(json!({ "email": "org@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-9",
            "message": "Login successful",
            "user_id": "7",
            "role": "owner",
            "email": "org@example.com"
        })))
        .mount(&server)
        .await;

    let services = services(&server);
    let mut session = SessionContext::anonymous();
    let current = session
        .login(&services.identity, "org@example.com", "pw")
        .await
        .unwrap();

    assert_eq!(current.user_id(), UserId::new(7));
    assert_eq!(session.bearer_token(), Some("tok-9"));
}

#[tokio::test]
async fn unreachable_service_is_network_failure() {
    let server = MockServer::start().await;
    let services = services(&server);
    drop(server);

    let error = services.identity.verify("tok").await.unwrap_err();
    assert!(matches!(error, ServiceError::Network(_)));
    assert_eq!(
        error.classify(&ClassifyContext::default()).kind,
        ErrorKind::NetworkUnreachable
    );
}
