//! Token authentication
//!
//! Resolves a bearer token to the credential record that authorizes one
//! client to update one FQDN. Read-only: authentication never touches the
//! zone service and has no side effects.

use std::sync::Arc;
use tracing::warn;

use crate::error::{Error, Result};
use crate::traits::{Credential, CredentialStore};

/// Resolves bearer tokens against the credential store
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
}

impl Authenticator {
    /// Create a new authenticator over a credential store
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Authenticate a bearer token
    ///
    /// Returns the matching credential, or [`Error::InvalidToken`] when the
    /// store has no record for it. Presence of the token in the request is
    /// the caller's responsibility; an empty string simply matches nothing.
    ///
    /// If the store ever returns more than one record for a token (the
    /// schema invariant says it cannot), the first is used and a warning is
    /// logged rather than failing the request.
    pub async fn authenticate(&self, token: &str) -> Result<Credential> {
        let mut matches = self.store.find_by_token(token).await?;

        if matches.len() > 1 {
            warn!(
                matches = matches.len(),
                host_label = %matches[0].host_label,
                "multiple credentials share one token, using the first"
            );
        }

        if matches.is_empty() {
            Err(Error::InvalidToken)
        } else {
            Ok(matches.swap_remove(0))
        }
    }
}
