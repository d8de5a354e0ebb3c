// Integration tests for `DatastoreCredentials` using wiremock.

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dyndns_core::Error;
use dyndns_core::traits::{CredentialKey, CredentialStore, NewCredential};
use dyndns_store_datastore::DatastoreCredentials;

async fn setup() -> (MockServer, DatastoreCredentials) {
    let server = MockServer::start().await;
    let store =
        DatastoreCredentials::with_base_url(server.uri(), "example-project", "test-token").unwrap();
    (server, store)
}

fn entity(id: &str, token: &str, name: &str, zone: &str) -> serde_json::Value {
    json!({
        "entity": {
            "key": { "path": [{ "kind": "dynamic_dns_auth_key", "id": id }] },
            "properties": {
                "token": { "stringValue": token },
                "name": { "stringValue": name },
                "zone": { "stringValue": zone },
                "created_at": { "timestampValue": "2026-01-15T08:30:00Z" },
            }
        }
    })
}

#[tokio::test]
async fn test_find_by_token_sends_property_filter() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/projects/example-project:runQuery"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "query": {
                "kind": [{ "name": "dynamic_dns_auth_key" }],
                "filter": {
                    "propertyFilter": {
                        "property": { "name": "token" },
                        "op": "EQUAL",
                        "value": { "stringValue": "deadbeef" },
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch": {
                "entityResults": [entity("101", "deadbeef", "laptop.computers", "example-com")],
                "moreResults": "NO_MORE_RESULTS",
            }
        })))
        .mount(&server)
        .await;

    let found = store.find_by_token("deadbeef").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key, CredentialKey("101".to_string()));
    assert_eq!(found[0].host_label, "laptop.computers");
    assert_eq!(found[0].zone_id, "example-com");
}

#[tokio::test]
async fn test_find_by_token_no_matches() {
    let (server, store) = setup().await;

    // An empty batch has no entityResults array at all
    Mock::given(method("POST"))
        .and(path("/projects/example-project:runQuery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch": { "moreResults": "NO_MORE_RESULTS" }
        })))
        .mount(&server)
        .await;

    assert!(store.find_by_token("unknown").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_by_name_and_zone_sends_composite_filter() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/projects/example-project:runQuery"))
        .and(body_partial_json(json!({
            "query": {
                "filter": { "compositeFilter": { "op": "AND" } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch": {
                "entityResults": [entity("7", "tok", "laptop", "example-com")],
            }
        })))
        .mount(&server)
        .await;

    let found = store
        .find_by_name_and_zone("laptop", "example-com")
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].token, "tok");
}

#[tokio::test]
async fn test_create_inserts_and_returns_assigned_key() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/projects/example-project:commit"))
        .and(body_partial_json(json!({
            "mode": "NON_TRANSACTIONAL",
            "mutations": [{
                "insert": {
                    "key": { "path": [{ "kind": "dynamic_dns_auth_key" }] },
                    "properties": {
                        "token": { "stringValue": "fresh-token" },
                        "name": { "stringValue": "laptop" },
                        "zone": { "stringValue": "example-com" },
                    }
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mutationResults": [{
                "key": { "path": [{ "kind": "dynamic_dns_auth_key", "id": "314" }] }
            }]
        })))
        .mount(&server)
        .await;

    let created = store
        .create(NewCredential {
            token: "fresh-token".to_string(),
            host_label: "laptop".to_string(),
            zone_id: "example-com".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    assert_eq!(created.key, CredentialKey("314".to_string()));
    assert_eq!(created.token, "fresh-token");
}

#[tokio::test]
async fn test_delete_sends_delete_mutation() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/projects/example-project:commit"))
        .and(body_partial_json(json!({
            "mutations": [{
                "delete": { "path": [{ "kind": "dynamic_dns_auth_key", "id": "314" }] }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mutationResults": [{}]
        })))
        .mount(&server)
        .await;

    store
        .delete(&CredentialKey("314".to_string()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_api_failure_maps_to_credential_store_error() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/projects/example-project:runQuery"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "permission denied" }
        })))
        .mount(&server)
        .await;

    let err = store.find_by_token("tok").await.unwrap_err();
    assert!(matches!(err, Error::CredentialStore(_)));
}
