//! Core traits for the dyndns service
//!
//! This module defines the abstract interfaces over the two external
//! collaborators the core depends on.
//!
//! - [`CredentialStore`]: Keyed-record store holding client credentials
//! - [`ZoneProvider`]: Managed DNS zone API (record sets and change sets)

pub mod credential_store;
pub mod zone_provider;

pub use credential_store::{Credential, CredentialKey, CredentialStore, NewCredential};
pub use zone_provider::{
    ChangeHandle, ChangeSet, ChangeStatus, ManagedZone, RecordSet, RecordType, ZoneProvider,
};
