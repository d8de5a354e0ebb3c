// # Datastore Credential Store
//
// This crate implements the `CredentialStore` trait against the Google
// Cloud Datastore v1 REST API.
//
// ## Entity shape
//
// Kind `dynamic_dns_auth_key`, auto-assigned numeric id, properties:
//
// - `token`: string, the bearer token
// - `name`: string, the host label (sans zone name)
// - `zone`: string, the managed zone id (not the DNS name)
// - `created_at`: timestamp, stamped at registration
//
// ## API Reference
//
// - Query:  POST `/projects/:project:runQuery` with a property filter
// - Mutate: POST `/projects/:project:commit` with insert/delete mutations
//
// ## Security
//
// - The access token NEVER appears in logs
// - Requests carry it as a `Bearer` authorization header

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dyndns_core::traits::{Credential, CredentialKey, CredentialStore, NewCredential};
use dyndns_core::{Error, Result};
use serde_json::{Value, json};
use std::time::Duration;

/// Datastore v1 API base URL
const DATASTORE_API_BASE: &str = "https://datastore.googleapis.com/v1";

/// Entity kind holding credential records
const CREDENTIAL_KIND: &str = "dynamic_dns_auth_key";

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Datastore-backed credential store
pub struct DatastoreCredentials {
    /// API base URL, overridable for tests
    base_url: String,
    /// GCP project owning the datastore
    project: String,
    /// OAuth2 access token
    access_token: String,
    /// HTTP client for API requests
    client: reqwest::Client,
}

// The access token must not leak through Debug output
impl std::fmt::Debug for DatastoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatastoreCredentials")
            .field("base_url", &self.base_url)
            .field("project", &self.project)
            .field("access_token", &"<REDACTED>")
            .finish()
    }
}

impl DatastoreCredentials {
    /// Create a new Datastore credential store
    ///
    /// # Parameters
    ///
    /// - `project`: GCP project identifier
    /// - `access_token`: OAuth2 token with datastore scope
    pub fn new(project: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(DATASTORE_API_BASE, project, access_token)
    }

    /// Create a store against a different API base (tests)
    pub fn with_base_url(
        base_url: impl Into<String>,
        project: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(Error::config("Datastore access token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::credential_store(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            project: project.into(),
            access_token,
            client,
        })
    }

    async fn call(&self, action: &str, body: Value) -> Result<Value> {
        let url = format!("{}/projects/{}:{}", self.base_url, self.project, action);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::credential_store(format!("{action} request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());
            return Err(Error::credential_store(format!(
                "{action} failed: {status} - {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::credential_store(format!("failed to parse {action} response: {e}")))
    }

    async fn run_query(&self, filter: Value) -> Result<Vec<Credential>> {
        let body = json!({
            "query": {
                "kind": [{ "name": CREDENTIAL_KIND }],
                "filter": filter,
            }
        });

        let result = self.call("runQuery", body).await?;

        let mut credentials = Vec::new();
        if let Some(entity_results) = result["batch"]["entityResults"].as_array() {
            for entity_result in entity_results {
                credentials.push(entity_to_credential(&entity_result["entity"])?);
            }
        }
        Ok(credentials)
    }
}

fn property_filter(property: &str, value: &str) -> Value {
    json!({
        "propertyFilter": {
            "property": { "name": property },
            "op": "EQUAL",
            "value": { "stringValue": value },
        }
    })
}

/// Extract a string property from a Datastore entity
fn string_property(entity: &Value, name: &str) -> Result<String> {
    entity["properties"][name]["stringValue"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            Error::credential_store(format!("entity is missing string property '{name}'"))
        })
}

/// Convert a Datastore entity into a credential record
fn entity_to_credential(entity: &Value) -> Result<Credential> {
    let id = entity["key"]["path"][0]["id"]
        .as_str()
        .ok_or_else(|| Error::credential_store("entity key has no id"))?;

    let created_at = entity["properties"]["created_at"]["timestampValue"]
        .as_str()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));

    Ok(Credential {
        key: CredentialKey(id.to_string()),
        token: string_property(entity, "token")?,
        host_label: string_property(entity, "name")?,
        zone_id: string_property(entity, "zone")?,
        created_at,
    })
}

#[async_trait]
impl CredentialStore for DatastoreCredentials {
    async fn find_by_token(&self, token: &str) -> Result<Vec<Credential>> {
        self.run_query(property_filter("token", token)).await
    }

    async fn find_by_name_and_zone(
        &self,
        host_label: &str,
        zone_id: &str,
    ) -> Result<Vec<Credential>> {
        let filter = json!({
            "compositeFilter": {
                "op": "AND",
                "filters": [
                    property_filter("name", host_label),
                    property_filter("zone", zone_id),
                ],
            }
        });
        self.run_query(filter).await
    }

    async fn create(&self, credential: NewCredential) -> Result<Credential> {
        let body = json!({
            "mode": "NON_TRANSACTIONAL",
            "mutations": [{
                "insert": {
                    "key": { "path": [{ "kind": CREDENTIAL_KIND }] },
                    "properties": {
                        "token": { "stringValue": credential.token.as_str() },
                        "name": { "stringValue": credential.host_label.as_str() },
                        "zone": { "stringValue": credential.zone_id.as_str() },
                        "created_at": { "timestampValue": credential.created_at.to_rfc3339() },
                    },
                }
            }]
        });

        let result = self.call("commit", body).await?;

        let id = result["mutationResults"][0]["key"]["path"][0]["id"]
            .as_str()
            .ok_or_else(|| Error::credential_store("commit returned no entity key"))?;

        tracing::debug!(key = %id, "credential created");

        Ok(Credential {
            key: CredentialKey(id.to_string()),
            token: credential.token,
            host_label: credential.host_label,
            zone_id: credential.zone_id,
            created_at: Some(credential.created_at),
        })
    }

    async fn delete(&self, key: &CredentialKey) -> Result<()> {
        let body = json!({
            "mode": "NON_TRANSACTIONAL",
            "mutations": [{
                "delete": { "path": [{ "kind": CREDENTIAL_KIND, "id": key.0.as_str() }] }
            }]
        });

        self.call("commit", body).await?;
        tracing::debug!(key = %key, "credential deleted");
        Ok(())
    }
}
