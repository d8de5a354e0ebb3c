//! Test doubles and common utilities for contract tests
//!
//! Provides an in-memory ZoneProvider double that applies submitted change
//! sets to its record table and counts every call, so tests can assert
//! both outcomes and the absence of mutations.

use async_trait::async_trait;
use dyndns_core::config::PropagationConfig;
use dyndns_core::error::Result;
use dyndns_core::traits::{
    ChangeHandle, ChangeSet, ChangeStatus, Credential, CredentialKey, ManagedZone, RecordSet,
    ZoneProvider,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A mock ZoneProvider backed by an in-memory record table
///
/// Submitted change sets are applied to the table, so a second
/// reconciliation observes the state the first one wrote.
pub struct MockZoneProvider {
    zones: HashMap<String, ManagedZone>,
    records: Mutex<Vec<RecordSet>>,
    submitted: Mutex<Vec<ChangeSet>>,
    /// Status polls a change answers `Pending` before reporting `Done`;
    /// `usize::MAX` means the change never completes.
    pending_polls: usize,
    polls_seen: Mutex<HashMap<String, usize>>,
    load_zone_calls: AtomicUsize,
    list_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    next_change_id: AtomicUsize,
}

impl MockZoneProvider {
    /// Provider with no zones at all
    pub fn empty() -> Self {
        Self {
            zones: HashMap::new(),
            records: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            pending_polls: 0,
            polls_seen: Mutex::new(HashMap::new()),
            load_zone_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            next_change_id: AtomicUsize::new(0),
        }
    }

    /// Provider managing a single zone
    pub fn with_zone(id: &str, dns_name: &str) -> Self {
        let mut provider = Self::empty();
        provider.zones.insert(
            id.to_string(),
            ManagedZone {
                id: id.to_string(),
                dns_name: dns_name.to_string(),
            },
        );
        provider
    }

    /// Add another managed zone
    pub fn with_extra_zone(mut self, id: &str, dns_name: &str) -> Self {
        self.zones.insert(
            id.to_string(),
            ManagedZone {
                id: id.to_string(),
                dns_name: dns_name.to_string(),
            },
        );
        self
    }

    /// Make every change answer `Pending` this many times before `Done`
    pub fn with_pending_polls(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Make changes never report completion
    pub fn never_completing(self) -> Self {
        self.with_pending_polls(usize::MAX)
    }

    /// Seed the record table
    pub fn add_record(&self, record: RecordSet) {
        self.records.lock().unwrap().push(record);
    }

    /// Current record table contents
    pub fn records(&self) -> Vec<RecordSet> {
        self.records.lock().unwrap().clone()
    }

    /// All change sets submitted so far
    pub fn submitted_changes(&self) -> Vec<ChangeSet> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn load_zone_calls(&self) -> usize {
        self.load_zone_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ZoneProvider for MockZoneProvider {
    async fn load_zone(&self, zone_id: &str) -> Result<Option<ManagedZone>> {
        self.load_zone_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.zones.get(zone_id).cloned())
    }

    async fn list_record_sets(&self, _zone_id: &str) -> Result<Vec<RecordSet>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }

    async fn submit_change(&self, _zone_id: &str, change: ChangeSet) -> Result<ChangeHandle> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        {
            let mut records = self.records.lock().unwrap();
            records.retain(|rs| !change.deletions.contains(rs));
            records.extend(change.additions.iter().cloned());
        }

        self.submitted.lock().unwrap().push(change);

        let id = format!(
            "change-{}",
            self.next_change_id.fetch_add(1, Ordering::SeqCst)
        );
        Ok(ChangeHandle { id })
    }

    async fn change_status(&self, _zone_id: &str, handle: &ChangeHandle) -> Result<ChangeStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        if self.pending_polls == usize::MAX {
            return Ok(ChangeStatus::Pending);
        }

        let mut polls = self.polls_seen.lock().unwrap();
        let seen = polls.entry(handle.id.clone()).or_insert(0);
        if *seen >= self.pending_polls {
            Ok(ChangeStatus::Done)
        } else {
            *seen += 1;
            Ok(ChangeStatus::Pending)
        }
    }
}

/// Credential pointing a host label at a zone, as authentication returns it
pub fn credential(host_label: &str, zone_id: &str) -> Credential {
    Credential {
        key: CredentialKey("mem-00000000".to_string()),
        token: "test-token".to_string(),
        host_label: host_label.to_string(),
        zone_id: zone_id.to_string(),
        created_at: None,
    }
}

/// Propagation tuning that keeps tests fast
pub fn fast_propagation() -> PropagationConfig {
    PropagationConfig {
        poll_initial_ms: 100,
        poll_max_ms: 400,
        timeout_secs: 5,
    }
}
