// # Credential Store Trait
//
// Defines the interface for the external keyed-record store that holds
// client credentials.
//
// ## Implementations
//
// - Google Cloud Datastore: `dyndns-store-datastore` crate
// - In-memory (tests/dev): [`crate::store::MemoryCredentialStore`]
//
// ## Record shape
//
// A credential maps one bearer token to one (host label, zone) pair:
//
// ```text
// token = 64 hex chars
// name  = laptop.computers      (host label, may contain dots)
// zone  = example-com           (managed zone id, NOT a DNS name)
// ```
//
// With the zone `example-com` publishing `example.com.`, this client's
// eventual FQDN is `laptop.computers.example.com.`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The stored (token, host label, zone) tuple authorizing one client to
/// update one FQDN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Store-assigned key, used for deletion
    pub key: CredentialKey,
    /// Opaque bearer token, the sole authentication secret
    pub token: String,
    /// Subdomain label portion of the FQDN (stored as `name`)
    pub host_label: String,
    /// Managed zone identifier (stored as `zone`)
    pub zone_id: String,
    /// When the credential was registered, if the store recorded it
    pub created_at: Option<DateTime<Utc>>,
}

/// Store-assigned identifier for a credential record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialKey(pub String);

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields of a credential to be created
#[derive(Debug, Clone)]
pub struct NewCredential {
    /// Opaque bearer token
    pub token: String,
    /// Subdomain label portion of the FQDN
    pub host_label: String,
    /// Managed zone identifier
    pub zone_id: String,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Trait for credential store implementations
///
/// The service path only ever reads through this trait; `create` and
/// `delete` are used by the administrative register/revoke operations.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find all credentials whose token equals `token`
    ///
    /// The schema invariant says there is at most one; callers decide how
    /// to treat violations.
    async fn find_by_token(&self, token: &str) -> Result<Vec<Credential>, crate::Error>;

    /// Find all credentials registered for a (host label, zone) pair
    async fn find_by_name_and_zone(
        &self,
        host_label: &str,
        zone_id: &str,
    ) -> Result<Vec<Credential>, crate::Error>;

    /// Create a credential record, returning it with its store-assigned key
    async fn create(&self, credential: NewCredential) -> Result<Credential, crate::Error>;

    /// Delete a credential record by key
    ///
    /// Deleting a key that no longer exists is not an error.
    async fn delete(&self, key: &CredentialKey) -> Result<(), crate::Error>;
}
