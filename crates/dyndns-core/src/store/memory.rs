// # Memory Credential Store
//
// In-memory implementation of CredentialStore.
//
// ## Purpose
//
// Backs unit and contract tests, and local development against a mock zone
// provider, without a Datastore dependency. Nothing persists across
// restarts.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use async_trait::async_trait;

use crate::Error;
use crate::traits::{Credential, CredentialKey, CredentialStore, NewCredential};

/// In-memory credential store
///
/// Records live in a HashMap behind a RwLock, keyed by a store-assigned
/// sequence number. Lookups scan; the store is only ever test-sized.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<HashMap<CredentialKey, Credential>>>,
    next_id: AtomicU64,
}

impl MemoryCredentialStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_token(&self, token: &str) -> Result<Vec<Credential>, Error> {
        let guard = self.inner.read().await;
        let mut matches: Vec<Credential> = guard
            .values()
            .filter(|c| c.token == token)
            .cloned()
            .collect();
        // Insertion order, so "first match" is deterministic in tests
        matches.sort_by(|a, b| a.key.0.cmp(&b.key.0));
        Ok(matches)
    }

    async fn find_by_name_and_zone(
        &self,
        host_label: &str,
        zone_id: &str,
    ) -> Result<Vec<Credential>, Error> {
        let guard = self.inner.read().await;
        let mut matches: Vec<Credential> = guard
            .values()
            .filter(|c| c.host_label == host_label && c.zone_id == zone_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.key.0.cmp(&b.key.0));
        Ok(matches)
    }

    async fn create(&self, credential: NewCredential) -> Result<Credential, Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let key = CredentialKey(format!("mem-{id:08}"));

        let record = Credential {
            key: key.clone(),
            token: credential.token,
            host_label: credential.host_label,
            zone_id: credential.zone_id,
            created_at: Some(credential.created_at),
        };

        let mut guard = self.inner.write().await;
        guard.insert(key, record.clone());
        Ok(record)
    }

    async fn delete(&self, key: &CredentialKey) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(key);
        Ok(())
    }
}
