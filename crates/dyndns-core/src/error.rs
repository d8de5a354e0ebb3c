//! Error types for the dyndns service
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dyndns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dyndns service
#[derive(Error, Debug)]
pub enum Error {
    /// Token present but matches no credential record
    #[error("invalid auth token")]
    InvalidToken,

    /// Authentication header absent from the request
    #[error("missing auth token")]
    MissingToken,

    /// Credential references a zone the zone service does not have
    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    /// A credential for this (host label, zone) pair already exists
    #[error("{host_label} in {zone_id} already exists")]
    AlreadyRegistered {
        /// Host label of the rejected registration
        host_label: String,
        /// Zone identifier of the rejected registration
        zone_id: String,
    },

    /// The zone service rejected the submitted change set
    #[error("change submission failed: {0}")]
    ChangeSubmission(String),

    /// An accepted change did not report completion within the deadline
    #[error("change {change_id} not propagated after {waited_secs}s")]
    PropagationTimeout {
        /// Identifier of the change being waited on
        change_id: String,
        /// Seconds spent waiting before giving up
        waited_secs: u64,
    },

    /// Credential store transport or API errors
    #[error("credential store error: {0}")]
    CredentialStore(String),

    /// Zone service transport or API errors
    #[error("zone service error: {0}")]
    ZoneService(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a zone-not-found error
    pub fn zone_not_found(zone_id: impl Into<String>) -> Self {
        Self::ZoneNotFound(zone_id.into())
    }

    /// Create a change submission error
    pub fn change_submission(msg: impl Into<String>) -> Self {
        Self::ChangeSubmission(msg.into())
    }

    /// Create a credential store error
    pub fn credential_store(msg: impl Into<String>) -> Self {
        Self::CredentialStore(msg.into())
    }

    /// Create a zone service error
    pub fn zone_service(msg: impl Into<String>) -> Self {
        Self::ZoneService(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
