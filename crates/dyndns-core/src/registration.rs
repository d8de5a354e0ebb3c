//! Client registration and revocation
//!
//! Administrative operations used by the `dyndns-admin` CLI. Both refuse to
//! touch the credential store when the target zone does not exist, so stray
//! credentials cannot be minted for (or orphaned in) zones the service does
//! not manage.

use chrono::Utc;
use tracing::info;

use crate::error::{Error, Result};
use crate::traits::{Credential, CredentialStore, NewCredential, ZoneProvider};

/// Register a client for a (host label, zone) pair
///
/// Fails with [`Error::ZoneNotFound`] when the zone is absent and with
/// [`Error::AlreadyRegistered`] when a credential for the pair already
/// exists; in both cases no record is created. The token is supplied by the
/// caller so that secret generation stays out of the core.
///
/// # Returns
///
/// The created credential, with its store-assigned key.
pub async fn register(
    store: &dyn CredentialStore,
    zones: &dyn ZoneProvider,
    host_label: &str,
    zone_id: &str,
    token: String,
) -> Result<Credential> {
    if host_label.is_empty() {
        return Err(Error::invalid_input("host label cannot be empty"));
    }

    zones
        .load_zone(zone_id)
        .await?
        .ok_or_else(|| Error::zone_not_found(zone_id))?;

    if !store
        .find_by_name_and_zone(host_label, zone_id)
        .await?
        .is_empty()
    {
        return Err(Error::AlreadyRegistered {
            host_label: host_label.to_string(),
            zone_id: zone_id.to_string(),
        });
    }

    let credential = store
        .create(NewCredential {
            token,
            host_label: host_label.to_string(),
            zone_id: zone_id.to_string(),
            created_at: Utc::now(),
        })
        .await?;

    info!(%host_label, %zone_id, key = %credential.key, "registered client");
    Ok(credential)
}

/// Revoke every credential registered for a (host label, zone) pair
///
/// Deleting zero credentials is not an error. Like [`register`], refuses to
/// run against a zone the service does not manage.
///
/// # Returns
///
/// The credentials that were deleted, in store order.
pub async fn revoke(
    store: &dyn CredentialStore,
    zones: &dyn ZoneProvider,
    host_label: &str,
    zone_id: &str,
) -> Result<Vec<Credential>> {
    zones
        .load_zone(zone_id)
        .await?
        .ok_or_else(|| Error::zone_not_found(zone_id))?;

    let matches = store.find_by_name_and_zone(host_label, zone_id).await?;

    for credential in &matches {
        store.delete(&credential.key).await?;
        info!(key = %credential.key, %host_label, %zone_id, "revoked credential");
    }

    Ok(matches)
}
