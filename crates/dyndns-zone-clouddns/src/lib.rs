// # Cloud DNS Zone Provider
//
// This crate implements the `ZoneProvider` trait against the Google Cloud
// DNS v1 REST API.
//
// ## API Reference
//
// - Get zone:      GET  `/projects/:project/managedZones/:zone`
// - List rrsets:   GET  `/projects/:project/managedZones/:zone/rrsets`
// - Create change: POST `/projects/:project/managedZones/:zone/changes`
// - Get change:    GET  `/projects/:project/managedZones/:zone/changes/:id`
//
// A change is accepted immediately and propagates asynchronously; its
// `status` field reports `"pending"` until it is authoritative everywhere,
// then `"done"`. The reconciler owns the wait; this crate only exposes the
// status.
//
// ## Security
//
// - The access token NEVER appears in logs
// - Requests carry it as a `Bearer` authorization header

use async_trait::async_trait;
use dyndns_core::traits::{
    ChangeHandle, ChangeSet, ChangeStatus, ManagedZone, RecordSet, RecordType, ZoneProvider,
};
use dyndns_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloud DNS v1 API base URL
const CLOUD_DNS_API_BASE: &str = "https://dns.googleapis.com/dns/v1";

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Record set as Cloud DNS serializes it
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireRecordSet {
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    ttl: u32,
    rrdatas: Vec<String>,
}

impl WireRecordSet {
    fn from_record(record: &RecordSet) -> Self {
        Self {
            name: record.name.clone(),
            record_type: record.record_type.as_str().to_string(),
            ttl: record.ttl,
            rrdatas: record.values.clone(),
        }
    }

    /// Convert to the core record type; `None` for record types this
    /// service never manages (NS, SOA, MX, ...).
    fn into_record(self) -> Option<RecordSet> {
        let record_type = match self.record_type.as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            _ => return None,
        };

        Some(RecordSet {
            name: self.name,
            record_type,
            ttl: self.ttl,
            values: self.rrdatas,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireManagedZone {
    name: String,
    dns_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecordSetPage {
    #[serde(default)]
    rrsets: Vec<WireRecordSet>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireChangeRequest {
    additions: Vec<WireRecordSet>,
    deletions: Vec<WireRecordSet>,
}

#[derive(Debug, Deserialize)]
struct WireChange {
    id: String,
    status: String,
}

/// Cloud DNS zone provider
///
/// One instance serves the whole process; `reqwest::Client` pools
/// connections internally.
pub struct CloudDnsZones {
    /// API base URL, overridable for tests
    base_url: String,
    /// GCP project owning the managed zones
    project: String,
    /// OAuth2 access token
    access_token: String,
    /// HTTP client for API requests
    client: reqwest::Client,
}

// The access token must not leak through Debug output
impl std::fmt::Debug for CloudDnsZones {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudDnsZones")
            .field("base_url", &self.base_url)
            .field("project", &self.project)
            .field("access_token", &"<REDACTED>")
            .finish()
    }
}

impl CloudDnsZones {
    /// Create a new Cloud DNS zone provider
    ///
    /// # Parameters
    ///
    /// - `project`: GCP project identifier
    /// - `access_token`: OAuth2 token with DNS admin scope
    pub fn new(project: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(CLOUD_DNS_API_BASE, project, access_token)
    }

    /// Create a provider against a different API base (tests)
    pub fn with_base_url(
        base_url: impl Into<String>,
        project: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(Error::config("Cloud DNS access token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::zone_service(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            project: project.into(),
            access_token,
            client,
        })
    }

    fn zone_url(&self, zone_id: &str) -> String {
        format!(
            "{}/projects/{}/managedZones/{}",
            self.base_url, self.project, zone_id
        )
    }

    async fn read_error_body(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error response".to_string())
    }
}

#[async_trait]
impl ZoneProvider for CloudDnsZones {
    async fn load_zone(&self, zone_id: &str) -> Result<Option<ManagedZone>> {
        let response = self
            .client
            .get(self.zone_url(zone_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::zone_service(format!("zone lookup request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = Self::read_error_body(response).await;
            return Err(Error::zone_service(format!(
                "zone lookup failed: {status} - {body}"
            )));
        }

        let zone: WireManagedZone = response
            .json()
            .await
            .map_err(|e| Error::zone_service(format!("failed to parse zone: {e}")))?;

        Ok(Some(ManagedZone {
            id: zone.name,
            dns_name: zone.dns_name,
        }))
    }

    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        let url = format!("{}/rrsets", self.zone_url(zone_id));
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).bearer_auth(&self.access_token);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::zone_service(format!("rrset listing request failed: {e}")))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = Self::read_error_body(response).await;
                return Err(Error::zone_service(format!(
                    "rrset listing failed: {status} - {body}"
                )));
            }

            let page: WireRecordSetPage = response
                .json()
                .await
                .map_err(|e| Error::zone_service(format!("failed to parse rrsets: {e}")))?;

            records.extend(page.rrsets.into_iter().filter_map(WireRecordSet::into_record));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn submit_change(&self, zone_id: &str, change: ChangeSet) -> Result<ChangeHandle> {
        let body = WireChangeRequest {
            additions: change.additions.iter().map(WireRecordSet::from_record).collect(),
            deletions: change.deletions.iter().map(WireRecordSet::from_record).collect(),
        };

        let response = self
            .client
            .post(format!("{}/changes", self.zone_url(zone_id)))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::change_submission(format!("change request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = Self::read_error_body(response).await;
            return Err(Error::change_submission(format!("{status} - {body}")));
        }

        let accepted: WireChange = response
            .json()
            .await
            .map_err(|e| Error::zone_service(format!("failed to parse change: {e}")))?;

        tracing::debug!(change = %accepted.id, status = %accepted.status, "change accepted");
        Ok(ChangeHandle { id: accepted.id })
    }

    async fn change_status(&self, zone_id: &str, handle: &ChangeHandle) -> Result<ChangeStatus> {
        let response = self
            .client
            .get(format!("{}/changes/{}", self.zone_url(zone_id), handle.id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::zone_service(format!("change status request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = Self::read_error_body(response).await;
            return Err(Error::zone_service(format!(
                "change status failed: {status} - {body}"
            )));
        }

        let change: WireChange = response
            .json()
            .await
            .map_err(|e| Error::zone_service(format!("failed to parse change: {e}")))?;

        Ok(ChangeStatus::from_wire(&change.status))
    }
}
