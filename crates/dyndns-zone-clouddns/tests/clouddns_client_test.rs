// Integration tests for `CloudDnsZones` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dyndns_core::Error;
use dyndns_core::traits::{ChangeHandle, ChangeSet, ChangeStatus, RecordSet, RecordType, ZoneProvider};
use dyndns_zone_clouddns::CloudDnsZones;

async fn setup() -> (MockServer, CloudDnsZones) {
    let server = MockServer::start().await;
    let zones = CloudDnsZones::with_base_url(server.uri(), "example-project", "test-token").unwrap();
    (server, zones)
}

#[tokio::test]
async fn test_load_zone_found() {
    let (server, zones) = setup().await;

    Mock::given(method("GET"))
        .and(path("/projects/example-project/managedZones/example-com"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "example-com",
            "dnsName": "example.com.",
            "description": "",
            "id": "12345"
        })))
        .mount(&server)
        .await;

    let zone = zones.load_zone("example-com").await.unwrap().unwrap();
    assert_eq!(zone.id, "example-com");
    assert_eq!(zone.dns_name, "example.com.");
}

#[tokio::test]
async fn test_load_zone_absent_is_none() {
    let (server, zones) = setup().await;

    Mock::given(method("GET"))
        .and(path("/projects/example-project/managedZones/gone-zone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "notFound" }
        })))
        .mount(&server)
        .await;

    assert!(zones.load_zone("gone-zone").await.unwrap().is_none());
}

#[tokio::test]
async fn test_load_zone_server_error_propagates() {
    let (server, zones) = setup().await;

    Mock::given(method("GET"))
        .and(path("/projects/example-project/managedZones/example-com"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = zones.load_zone("example-com").await.unwrap_err();
    assert!(matches!(err, Error::ZoneService(_)));
}

#[tokio::test]
async fn test_list_record_sets_follows_paging_and_skips_unmanaged_types() {
    let (server, zones) = setup().await;

    Mock::given(method("GET"))
        .and(path("/projects/example-project/managedZones/example-com/rrsets"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rrsets": [
                { "name": "host.example.com.", "type": "AAAA", "ttl": 300,
                  "rrdatas": ["2001:db8::1"] }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/example-project/managedZones/example-com/rrsets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rrsets": [
                { "name": "example.com.", "type": "SOA", "ttl": 21600,
                  "rrdatas": ["ns.example.com. admin.example.com. 1 21600 3600 259200 300"] },
                { "name": "host.example.com.", "type": "A", "ttl": 300,
                  "rrdatas": ["10.0.0.1"] }
            ],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;

    let records = zones.list_record_sets("example-com").await.unwrap();

    assert_eq!(records.len(), 2, "SOA is skipped, both pages are read");
    assert_eq!(records[0].record_type, RecordType::A);
    assert_eq!(records[0].values, vec!["10.0.0.1"]);
    assert_eq!(records[1].record_type, RecordType::Aaaa);
}

#[tokio::test]
async fn test_submit_change_sends_additions_and_deletions() {
    let (server, zones) = setup().await;

    Mock::given(method("POST"))
        .and(path("/projects/example-project/managedZones/example-com/changes"))
        .and(body_partial_json(json!({
            "deletions": [
                { "name": "host.example.com.", "type": "A", "ttl": 300,
                  "rrdatas": ["10.0.0.1"] }
            ],
            "additions": [
                { "name": "host.example.com.", "type": "A", "ttl": 300,
                  "rrdatas": ["10.0.0.2"] }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "status": "pending"
        })))
        .mount(&server)
        .await;

    let change = ChangeSet {
        deletions: vec![RecordSet {
            name: "host.example.com.".to_string(),
            record_type: RecordType::A,
            ttl: 300,
            values: vec!["10.0.0.1".to_string()],
        }],
        additions: vec![RecordSet {
            name: "host.example.com.".to_string(),
            record_type: RecordType::A,
            ttl: 300,
            values: vec!["10.0.0.2".to_string()],
        }],
    };

    let handle = zones.submit_change("example-com", change).await.unwrap();
    assert_eq!(handle.id, "42");
}

#[tokio::test]
async fn test_rejected_change_maps_to_change_submission_error() {
    let (server, zones) = setup().await;

    Mock::given(method("POST"))
        .and(path("/projects/example-project/managedZones/example-com/changes"))
        .respond_with(ResponseTemplate::new(412).set_body_json(json!({
            "error": { "code": 412, "message": "precondition not met" }
        })))
        .mount(&server)
        .await;

    let err = zones
        .submit_change("example-com", ChangeSet::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ChangeSubmission(_)));
}

#[tokio::test]
async fn test_change_status_reads_the_done_sentinel() {
    let (server, zones) = setup().await;

    Mock::given(method("GET"))
        .and(path("/projects/example-project/managedZones/example-com/changes/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "status": "done"
        })))
        .mount(&server)
        .await;

    let status = zones
        .change_status("example-com", &ChangeHandle { id: "42".to_string() })
        .await
        .unwrap();
    assert_eq!(status, ChangeStatus::Done);
}

#[tokio::test]
async fn test_change_status_pending() {
    let (server, zones) = setup().await;

    Mock::given(method("GET"))
        .and(path("/projects/example-project/managedZones/example-com/changes/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "status": "pending"
        })))
        .mount(&server)
        .await;

    let status = zones
        .change_status("example-com", &ChangeHandle { id: "42".to_string() })
        .await
        .unwrap();
    assert_eq!(status, ChangeStatus::Pending);
}
