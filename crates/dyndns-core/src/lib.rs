// # dyndns-core
//
// Core library for the dynamic DNS update service.
//
// ## Architecture Overview
//
// This library provides the decision logic for client-reported IP updates:
// - **CredentialStore**: Trait over the external keyed-record store holding
//   client tokens
// - **ZoneProvider**: Trait over the managed-zone API that publishes records
// - **Authenticator**: Resolves a bearer token to a registered
//   (host label, zone) pair
// - **Reconciler**: Decides whether the zone's record is left alone,
//   replaced, or created, then applies the change and waits for propagation
// - **registration**: Register/revoke operations used by the admin CLI
//
// ## Design Principles
//
// 1. **Thin orchestration**: the core reads and writes external services
//    through the two traits; it owns no storage and no DNS protocol logic
// 2. **Strict chain**: request → Authenticator → Reconciler → response,
//    with no other coupling between components
// 3. **Library-first**: binaries (`dyndnsd`, `dyndns-admin`) are thin
//    wrappers over this crate

pub mod authenticator;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod registration;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use authenticator::Authenticator;
pub use config::{PropagationConfig, ServiceConfig};
pub use error::{Error, Result};
pub use reconciler::{RECORD_TTL_SECS, ReconcileOutcome, Reconciler};
pub use store::MemoryCredentialStore;
pub use traits::{Credential, CredentialStore, ZoneProvider};
