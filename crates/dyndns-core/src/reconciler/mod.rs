//! Record reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Loading the managed zone an authenticated credential points at
//! - Deciding whether the zone's record is left alone, replaced, or created
//! - Applying the decision as one change set
//! - Waiting (bounded) for the change to propagate
//!
//! ## Decision sequence
//!
//! ```text
//! credential + client address
//!         │
//!         ▼
//!   load zone ── missing ──▶ ZoneNotFound
//!         │
//!         ▼
//!   list record sets, keep (name == fqdn && type matches)
//!         │
//!         ├── first value equals client address ──▶ Unchanged (no write)
//!         ▼
//!   change set: delete all stale sets, add one fresh set (TTL 300)
//!         │
//!         ▼
//!   submit ──▶ poll status with backoff ──▶ Updated | PropagationTimeout
//! ```
//!
//! Updates that target the same (zone, host label) pair are serialized by
//! an in-process lock around the read-modify-write window; different pairs
//! proceed independently.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::config::PropagationConfig;
use crate::error::{Error, Result};
use crate::traits::{
    ChangeHandle, ChangeSet, Credential, RecordSet, RecordType, ZoneProvider,
};

/// TTL in seconds on record sets written by the reconciler
pub const RECORD_TTL_SECS: u32 = 300;

/// Result of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The zone already points at the client's address; nothing was written
    Unchanged,
    /// The record set was replaced (or created) and the change propagated
    Updated {
        /// Record type that was written
        record_type: RecordType,
        /// Canonical text form of the address that was written
        ip: String,
    },
}

/// Serializes updates that target the same (zone, host label) pair
///
/// Lock entries are created on first use and kept for the process lifetime;
/// the population is bounded by the number of registered credentials.
#[derive(Default)]
struct UpdateLocks {
    inner: std::sync::Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl UpdateLocks {
    fn for_pair(&self, zone_id: &str, host_label: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap();
        map.entry((zone_id.to_string(), host_label.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Core reconciliation engine
///
/// One instance is shared across all requests; it owns no state besides the
/// update locks and reads/writes DNS exclusively through the
/// [`ZoneProvider`].
pub struct Reconciler {
    zones: Arc<dyn ZoneProvider>,
    propagation: PropagationConfig,
    locks: UpdateLocks,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `zones`: zone provider implementation
    /// - `propagation`: tuning for the bounded propagation wait
    pub fn new(zones: Arc<dyn ZoneProvider>, propagation: PropagationConfig) -> Self {
        Self {
            zones,
            propagation,
            locks: UpdateLocks::default(),
        }
    }

    /// Reconcile a zone's record with a client-reported address
    ///
    /// # Parameters
    ///
    /// - `credential`: the authenticated (host label, zone) pair
    /// - `client_addr`: the address the client reported
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileOutcome::Unchanged)`: record already current, no
    ///   mutation was issued
    /// - `Ok(ReconcileOutcome::Updated { .. })`: the record was replaced
    ///   and the change has propagated
    /// - `Err(Error)`: zone missing, submission rejected, or propagation
    ///   deadline exceeded — never retried here
    pub async fn reconcile(
        &self,
        credential: &Credential,
        client_addr: IpAddr,
    ) -> Result<ReconcileOutcome> {
        let lock = self
            .locks
            .for_pair(&credential.zone_id, &credential.host_label);
        let _guard = lock.lock().await;

        let zone = self
            .zones
            .load_zone(&credential.zone_id)
            .await?
            .ok_or_else(|| Error::zone_not_found(credential.zone_id.as_str()))?;

        let fqdn = zone.fqdn_for(&credential.host_label);
        let record_type = RecordType::for_addr(client_addr);

        let existing: Vec<RecordSet> = self
            .zones
            .list_record_sets(&credential.zone_id)
            .await?
            .into_iter()
            .filter(|rs| rs.name == fqdn && rs.record_type == record_type)
            .collect();

        // Address-level comparison, not string comparison: an existing
        // expanded IPv6 value must match its compressed request form.
        if existing
            .iter()
            .any(|rs| rs.first_addr() == Some(client_addr))
        {
            debug!(%fqdn, %client_addr, "record already current");
            return Ok(ReconcileOutcome::Unchanged);
        }

        // The zone invariant says at most one set matches; tolerate and
        // delete all that do.
        if existing.len() > 1 {
            warn!(
                %fqdn,
                count = existing.len(),
                "multiple record sets for one name, deleting all"
            );
        }

        let ip = client_addr.to_string();
        let change = ChangeSet {
            deletions: existing,
            additions: vec![RecordSet {
                name: fqdn.clone(),
                record_type,
                ttl: RECORD_TTL_SECS,
                values: vec![ip.clone()],
            }],
        };

        let handle = self
            .zones
            .submit_change(&credential.zone_id, change)
            .await?;
        info!(%fqdn, %ip, %record_type, change = %handle.id, "change submitted");

        self.wait_for_propagation(&credential.zone_id, &handle)
            .await?;

        Ok(ReconcileOutcome::Updated { record_type, ip })
    }

    /// Poll an accepted change until the provider reports completion
    ///
    /// The interval starts at the configured initial value and doubles up
    /// to the cap; once the deadline elapses without completion the wait
    /// fails with [`Error::PropagationTimeout`].
    async fn wait_for_propagation(&self, zone_id: &str, handle: &ChangeHandle) -> Result<()> {
        let started = Instant::now();
        let deadline = self.propagation.timeout();
        let mut interval = self.propagation.initial_interval();

        loop {
            if self
                .zones
                .change_status(zone_id, handle)
                .await?
                .is_done()
            {
                debug!(change = %handle.id, elapsed = ?started.elapsed(), "change propagated");
                return Ok(());
            }

            if started.elapsed() >= deadline {
                return Err(Error::PropagationTimeout {
                    change_id: handle.id.clone(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }

            debug!(change = %handle.id, ?interval, "waiting for propagation");
            sleep(interval).await;
            interval = (interval * 2).min(self.propagation.max_interval());
        }
    }
}
