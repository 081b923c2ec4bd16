//! Integration tests for the synchronization service over real HTTP

use bookshop_lib::{
    Buch, BuchCriteria, BuchService, ClientConfig, Entity, ErrorValue, HttpTransport, Kunde,
    KundeService, SyncError, Transport,
};
use bookshop_lib::transport::HttpRequest;
use mockito::Matcher;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn service_for(server: &mockito::Server) -> BuchService {
    let config = ClientConfig::with_base_uri(format!("{}/rest", server.url()));
    BuchService::from_config(&config).unwrap()
}

fn record_errors(service: &BuchService) -> (Arc<Mutex<Vec<ErrorValue>>>, bookshop_lib::Subscription) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let subscription = service.subscribe_error(move |e: &ErrorValue| sink.lock().push(e.clone()));
    (errors, subscription)
}

#[tokio::test]
async fn test_find_sends_criteria_and_publishes_list() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/buecher")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("titel".into(), "Java".into()),
            Matcher::UrlEncoded("javascript".into(), "true".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"titel": "Java 1", "rating": 4, "_links": {"self": {"href": "https://localhost:8443/rest/buecher/00000000-0000-0000-0000-000000000001"}}},
                {"titel": "Java 2", "_links": {"self": {"href": "https://localhost:8443/rest/buecher/2"}}}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let service = service_for(&server);
    let mut results = service.list_stream();
    let criteria = BuchCriteria {
        titel: Some("Java".into()),
        javascript: true,
        ..Default::default()
    };

    service.find(&criteria).await;

    mock.assert_async().await;
    let list = results.try_next().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id(), Some("00000000-0000-0000-0000-000000000001"));
    assert_eq!(list[1].titel.as_deref(), Some("Java 2"));
}

#[tokio::test]
async fn test_find_not_found_publishes_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rest/buecher")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let service = service_for(&server);
    let (errors, _subscription) = record_errors(&service);

    service
        .find(&BuchCriteria {
            titel: Some("Nix".into()),
            ..Default::default()
        })
        .await;

    assert_eq!(errors.lock().as_slice(), &[ErrorValue::Code(404)]);
}

#[tokio::test]
async fn test_unreachable_server_is_a_local_failure() {
    let config = ClientConfig {
        base_uri: "http://127.0.0.1:1/rest".into(),
        request_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
    };
    let service = BuchService::from_config(&config).unwrap();
    let (errors, _subscription) = record_errors(&service);

    service.find(&BuchCriteria::default()).await;
    service.find_by_id(Some("1")).await;

    let mut saved = false;
    let mut reported = false;
    service
        .save(&Buch::new("Neu"), |_| saved = true, |_, _| reported = true)
        .await;

    assert_eq!(
        errors.lock().as_slice(),
        &[ErrorValue::Code(-1), ErrorValue::Code(-1)]
    );
    assert!(!saved);
    assert!(!reported);
}

#[tokio::test]
async fn test_fetch_then_update_with_if_match() {
    let mut server = mockito::Server::new_async().await;
    let get = server
        .mock("GET", "/rest/buecher/1")
        .with_status(200)
        .with_header("etag", "\"0\"")
        .with_body(json!({"titel": "Alpha", "rating": 4}).to_string())
        .expect(1)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/rest/buecher/1")
        .match_header("if-match", "\"0\"")
        .match_header("accept", "text/plain")
        .match_body(Matcher::PartialJson(json!({"titel": "Beta", "rating": 4.0})))
        .with_status(204)
        .create_async()
        .await;

    let service = service_for(&server);
    let mut entities = service.entity_stream();

    service.find_by_id(Some("1")).await;
    service.find_by_id(Some("1")).await;

    let mut buch = entities.try_next().unwrap();
    assert!(entities.try_next().is_some());
    assert_eq!(buch.version(), Some("\"0\""));

    buch.titel = Some("Beta".into());
    let mut updated = false;
    service.update(&buch, || updated = true, |_, _| {}).await;

    get.assert_async().await;
    put.assert_async().await;
    assert!(updated);
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/rest/kunden/5")
        .match_header("if-match", "\"1\"")
        .with_status(412)
        .with_body("Die Versionsnummer 1 ist veraltet")
        .create_async()
        .await;

    let config = ClientConfig::with_base_uri(format!("{}/rest", server.url()));
    let service = KundeService::from_config(&config).unwrap();
    let mut kunde = Kunde::new("Alpha", "alpha@acme.de");
    kunde.assign_identity("5".into(), Some("1".into()));
    let mut reported = None;

    service
        .update(&kunde, || {}, |status, body| reported = Some((status, body)))
        .await;

    assert_eq!(
        reported,
        Some((412, Some(json!("Die Versionsnummer 1 ist veraltet"))))
    );
}

#[tokio::test]
async fn test_save_reports_location_and_validation_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/rest/buecher")
        .match_body(Matcher::PartialJson(json!({"titel": "Neu"})))
        .with_status(201)
        .with_header("location", "https://localhost:8443/rest/buecher/99")
        .create_async()
        .await;
    server
        .mock("POST", "/rest/buecher")
        .match_body(Matcher::PartialJson(json!({"lieferbar": true})))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(json!({"titel": "required"}).to_string())
        .create_async()
        .await;

    let service = service_for(&server);

    let mut location = None;
    service
        .save(&Buch::new("Neu"), |loc| location = loc, |_, _| {})
        .await;
    assert_eq!(location.as_deref(), Some("https://localhost:8443/rest/buecher/99"));

    let mut invalid = Buch::default();
    invalid.lieferbar = true;
    let mut reported = None;
    service
        .save(&invalid, |_| {}, |status, body| reported = Some((status, body)))
        .await;
    assert_eq!(reported, Some((400, Some(json!({"titel": "required"})))));
}

#[tokio::test]
async fn test_remove_reports_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/rest/buecher/1")
        .with_status(204)
        .create_async()
        .await;
    server
        .mock("DELETE", "/rest/buecher/2")
        .with_status(403)
        .create_async()
        .await;

    let service = service_for(&server);
    let mut gone = Vec::new();
    let mut failed = None;

    for id in ["1", "2"] {
        let mut buch = Buch::new("Alpha");
        buch.assign_identity(id.into(), None);
        service
            .remove(&buch, || gone.push(id), |status| failed = Some(status))
            .await;
    }

    assert_eq!(gone, vec!["1"]);
    assert_eq!(failed, Some(403));
}

#[tokio::test]
async fn test_reserved_characters_in_id_stay_in_one_segment() {
    let mut server = mockito::Server::new_async().await;
    let get = server
        .mock("GET", "/rest/buecher/x%2Fy")
        .with_status(200)
        .with_header("etag", "\"0\"")
        .with_body(json!({"titel": "Alpha"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let service = service_for(&server);
    service.find_by_id(Some("x/y")).await;

    get.assert_async().await;
    assert_eq!(service.cached().unwrap().id(), Some("x/y"));
}

#[tokio::test]
async fn test_transport_classifies_responses() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rest/kunden/1")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let transport = HttpTransport::with_base_uri(&format!("{}/rest/", server.url())).unwrap();
    let err = transport
        .execute(HttpRequest::get(Kunde::COLLECTION).segment("1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Http { status: 500, body: Some(ref b) } if b == &json!("boom")
    ));
    assert_eq!(err.channel_value(), ErrorValue::Code(500));
}
