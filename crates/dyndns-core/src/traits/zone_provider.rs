// # Zone Provider Trait
//
// Defines the interface for the managed-zone API: listing record sets,
// submitting change sets, and tracking change propagation.
//
// ## Implementations
//
// - Google Cloud DNS: `dyndns-zone-clouddns` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::traits::{ChangeSet, ZoneProvider};
//
// let zone = zones.load_zone("example-com").await?
//     .ok_or(dyndns_core::Error::zone_not_found("example-com"))?;
// let handle = zones.submit_change("example-com", change).await?;
// while !zones.change_status("example-com", &handle).await?.is_done() {
//     // wait
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// DNS record type written by this system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[serde(rename = "A")]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Record type for the address family of `addr`
    pub fn for_addr(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed DNS zone, keyed by an identifier distinct from its DNS name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedZone {
    /// Zone identifier used in API calls (e.g. `example-com`)
    pub id: String,
    /// Absolute DNS name the zone publishes, with trailing dot
    /// (e.g. `example.com.`)
    pub dns_name: String,
}

impl ManagedZone {
    /// FQDN for a host label inside this zone
    ///
    /// The label is joined to the zone's DNS name, inheriting its trailing
    /// dot: `laptop.computers` in `example.com.` becomes
    /// `laptop.computers.example.com.`.
    pub fn fqdn_for(&self, host_label: &str) -> String {
        format!("{}.{}", host_label, self.dns_name)
    }
}

/// A named, typed collection of values published for a DNS name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Fully-qualified record name, with trailing dot
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Ordered address strings; this system writes exactly one
    pub values: Vec<String>,
}

impl RecordSet {
    /// First value parsed as an IP address, if there is one and it parses
    ///
    /// Comparisons against client addresses go through this so that
    /// equivalent textual forms (compressed vs. expanded IPv6) compare
    /// equal.
    pub fn first_addr(&self) -> Option<IpAddr> {
        self.values.first().and_then(|v| v.parse().ok())
    }
}

/// Deletions and additions applied to a zone as one atomic change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Record sets removed by this change
    pub deletions: Vec<RecordSet>,
    /// Record sets added by this change
    pub additions: Vec<RecordSet>,
}

/// Handle for tracking an accepted change until it propagates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeHandle {
    /// Provider-assigned change identifier
    pub id: String,
}

/// Propagation state of a submitted change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// Accepted but not yet authoritative everywhere
    Pending,
    /// Fully propagated
    Done,
}

impl ChangeStatus {
    /// Parse the provider's status string; `"done"` is the completion
    /// sentinel, anything else counts as pending.
    pub fn from_wire(status: &str) -> Self {
        if status == "done" {
            ChangeStatus::Done
        } else {
            ChangeStatus::Pending
        }
    }

    /// Whether the change has fully propagated
    pub fn is_done(&self) -> bool {
        matches!(self, ChangeStatus::Done)
    }
}

/// Trait for zone provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Error Mapping
///
/// A zone that does not exist is `Ok(None)` from [`load_zone`], not an
/// error; transport and API failures are `Err`. Change submission rejected
/// by the service maps to [`crate::Error::ChangeSubmission`].
///
/// [`load_zone`]: ZoneProvider::load_zone
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// Load a managed zone by identifier
    async fn load_zone(&self, zone_id: &str) -> Result<Option<ManagedZone>, crate::Error>;

    /// List all record sets currently published in the zone
    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>, crate::Error>;

    /// Submit a change set and return a handle for tracking propagation
    async fn submit_change(
        &self,
        zone_id: &str,
        change: ChangeSet,
    ) -> Result<ChangeHandle, crate::Error>;

    /// Current propagation status of an accepted change
    async fn change_status(
        &self,
        zone_id: &str,
        handle: &ChangeHandle,
    ) -> Result<ChangeStatus, crate::Error>;
}
