//! Enumeration through the HTTP client against a mock server.

use guidesync_client::{ClientError, ClientOptions, Credential, HttpRecordsClient, RecordPages};
use httpmock::prelude::*;

const RECORDS: &str = "/api/v2/guide/external_content/records";

fn client(server: &MockServer) -> HttpRecordsClient {
    HttpRecordsClient::new(ClientOptions::new(
        server.base_url(),
        Credential::from_user_secret("agent@example.com/token", "secret"),
    ))
    .unwrap()
}

fn record(id: &str, type_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "external_id": format!("ext-{id}"),
        "title": format!("Title {id}"),
        "body": "text",
        "url": format!("https://help.example.com/{id}.html"),
        "type": {"id": type_id}
    })
}

#[test]
fn walks_all_pages_in_order() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET).path(RECORDS).query_param_missing("page[after]");
        then.status(200).json_body(serde_json::json!({
            "records": [record("1", "T"), record("2", "OTHER")],
            "meta": {"has_more": true, "after_cursor": "AAA"}
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path(RECORDS).query_param("page[after]", "AAA");
        then.status(200).json_body(serde_json::json!({
            "records": [record("3", "T")],
            "meta": {"has_more": true, "after_cursor": "BBB"}
        }));
    });
    let third = server.mock(|when, then| {
        when.method(GET).path(RECORDS).query_param("page[after]", "BBB");
        then.status(200).json_body(serde_json::json!({
            "records": [record("4", "T")],
            "meta": {"has_more": false, "after_cursor": null}
        }));
    });

    let c = client(&server);
    let ids: Vec<String> = RecordPages::new(&c, "T")
        .map(|r| r.unwrap().id)
        .collect();

    assert_eq!(ids, vec!["1", "3", "4"]);
    first.assert();
    second.assert();
    third.assert();
}

#[test]
fn server_error_mid_walk_ends_enumeration() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(RECORDS).query_param_missing("page[after]");
        then.status(200).json_body(serde_json::json!({
            "records": [record("1", "T")],
            "meta": {"has_more": true, "after_cursor": "AAA"}
        }));
    });
    let failing = server.mock(|when, then| {
        when.method(GET).path(RECORDS).query_param("page[after]", "AAA");
        then.status(503).body("Service Unavailable");
    });

    let c = client(&server);
    let results: Vec<_> = RecordPages::new(&c, "T").collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    match &results[1] {
        Err(ClientError::Status { status, .. }) => assert_eq!(*status, 503),
        other => panic!("expected status error, got {other:?}"),
    }
    failing.assert_calls(1);
}
