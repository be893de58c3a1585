//! HTTP-level tests of the calendar service client, against a mock server

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use mockito::Matcher;

use corkboard::gcal::token::StoredCredential;
use corkboard::gcal::GoogleCalendarClient;
use corkboard::materialize::payload_for;
use corkboard::traits::CalendarSource;
use corkboard::{Assignment, Error};

/// Write a credential blob to a scratch file and return its path
fn credential_file(name: &str, token_uri: &str, expiry: DateTime<Utc>) -> PathBuf {
    let credential = StoredCredential {
        access_token: "stale-access-token".to_string(),
        refresh_token: "the-refresh-token".to_string(),
        client_id: "the-client-id".to_string(),
        client_secret: "the-client-secret".to_string(),
        token_uri: token_uri.parse().unwrap(),
        expiry,
    };
    let path = std::env::temp_dir().join(format!("corkboard-{}-{}.json", std::process::id(), name));
    let file = std::fs::File::create(&path).unwrap();
    serde_json::to_writer(file, &credential).unwrap();
    path
}

fn far_future() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap()
}

fn long_expired() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

fn client_for(server: &mockito::ServerGuard, blob: &PathBuf) -> GoogleCalendarClient {
    GoogleCalendarClient::new(blob, "primary", Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.url().parse().unwrap())
}

#[tokio::test]
async fn searches_are_scoped_ordered_and_bounded() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut server = mockito::Server::new_async().await;
    let blob = credential_file("search", &format!("{}/token", server.url()), far_future());

    let mock = server
        .mock("GET", "/calendars/primary/events")
        .match_header("authorization", "Bearer stale-access-token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "CS 101".into()),
            Matcher::UrlEncoded("timeMin".into(), "2024-09-01T12:00:00Z".into()),
            Matcher::UrlEncoded("singleEvents".into(), "true".into()),
            Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"kind": "calendar#events", "items": [{"summary": "HW3 is due soon"}]}"#)
        .create_async()
        .await;

    let min_start = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
    let events = client_for(&server, &blob).search_events("CS 101", min_start).await.unwrap();

    mock.assert_async().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title(), "HW3 is due soon");

    let _ = std::fs::remove_file(blob);
}

#[tokio::test]
async fn an_empty_answer_without_items_is_no_events() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut server = mockito::Server::new_async().await;
    let blob = credential_file("empty", &format!("{}/token", server.url()), far_future());

    let _mock = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"kind": "calendar#events"}"#)
        .create_async()
        .await;

    let events = client_for(&server, &blob)
        .search_events("CS 101", Utc::now())
        .await
        .unwrap();
    assert!(events.is_empty());

    let _ = std::fs::remove_file(blob);
}

#[tokio::test]
async fn an_expired_token_is_refreshed_and_persisted_before_the_request() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut server = mockito::Server::new_async().await;
    let blob = credential_file("refresh", &format!("{}/token", server.url()), long_expired());

    let token_mock = server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "the-refresh-token".into()),
            Matcher::UrlEncoded("client_id".into(), "the-client-id".into()),
            Matcher::UrlEncoded("client_secret".into(), "the-client-secret".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "fresh-access-token", "expires_in": 3600, "token_type": "Bearer"}"#)
        .create_async()
        .await;
    let events_mock = server
        .mock("GET", "/calendars/primary/events")
        .match_header("authorization", "Bearer fresh-access-token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"items": []}"#)
        .create_async()
        .await;

    let events = client_for(&server, &blob)
        .search_events("CS 101", Utc::now())
        .await
        .unwrap();
    assert!(events.is_empty());

    token_mock.assert_async().await;
    events_mock.assert_async().await;

    // The refreshed token was written back to the blob
    let reloaded: StoredCredential =
        serde_json::from_reader(std::fs::File::open(&blob).unwrap()).unwrap();
    assert_eq!(reloaded.access_token, "fresh-access-token");
    assert_eq!(reloaded.refresh_token, "the-refresh-token");

    let _ = std::fs::remove_file(blob);
}

#[tokio::test]
async fn a_failed_refresh_is_a_fatal_auth_error() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut server = mockito::Server::new_async().await;
    let blob = credential_file("bad-refresh", &format!("{}/token", server.url()), long_expired());

    let token_mock = server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error": "invalid_grant"}"#)
        .create_async()
        .await;

    let result = client_for(&server, &blob).search_events("CS 101", Utc::now()).await;

    token_mock.assert_async().await;
    match result {
        Err(err @ Error::Auth(_)) => assert!(err.is_fatal()),
        other => panic!("expected an auth error, got {:?}", other.map(|e| e.len())),
    }

    let _ = std::fs::remove_file(blob);
}

#[tokio::test]
async fn inserting_posts_the_payload_and_returns_the_link() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut server = mockito::Server::new_async().await;
    let blob = credential_file("insert", &format!("{}/token", server.url()), far_future());

    let due = chrono_tz::America::New_York.with_ymd_and_hms(2024, 10, 10, 23, 59, 0).unwrap();
    let payload = payload_for(&Assignment::new("HW3", due, "CS 101"));

    let mock = server
        .mock("POST", "/calendars/primary/events")
        .match_header("authorization", "Bearer stale-access-token")
        .match_body(Matcher::Json(serde_json::to_value(&payload).unwrap()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "evt123", "htmlLink": "https://calendar.example.org/event?eid=evt123", "status": "confirmed"}"#)
        .create_async()
        .await;

    let created = client_for(&server, &blob).insert_event(&payload).await.unwrap();

    mock.assert_async().await;
    assert_eq!(created.id, "evt123");
    assert_eq!(created.html_link.as_deref(), Some("https://calendar.example.org/event?eid=evt123"));

    let _ = std::fs::remove_file(blob);
}

#[tokio::test]
async fn a_rejected_insert_is_a_creation_error() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut server = mockito::Server::new_async().await;
    let blob = credential_file("bad-insert", &format!("{}/token", server.url()), far_future());

    let _mock = server
        .mock("POST", "/calendars/primary/events")
        .with_status(400)
        .with_body(r#"{"error": {"message": "Bad Request"}}"#)
        .create_async()
        .await;

    let due = chrono_tz::America::New_York.with_ymd_and_hms(2024, 10, 10, 23, 59, 0).unwrap();
    let payload = payload_for(&Assignment::new("HW3", due, "CS 101"));

    let result = client_for(&server, &blob).insert_event(&payload).await;
    match result {
        Err(err @ Error::Creation(_)) => assert!(err.is_fatal() == false),
        other => panic!("expected a creation error, got {:?}", other.map(|c| c.id)),
    }

    let _ = std::fs::remove_file(blob);
}
