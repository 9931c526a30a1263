//! Errors raised while provisioning identities, channels, and chaincode.

use std::path::PathBuf;
use weft_sdk::SdkError;

/// Enrollment and credential-store failures.
#[derive(Debug, thiserror::Error)]
pub enum EnrollError {
    #[error("credential store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential store entry {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("organization {organization} has no certificate authority")]
    NoCertificateAuthority { organization: String },

    #[error("registrar {user} of organization {organization} is not enrolled")]
    RegistrarNotEnrolled { organization: String, user: String },

    #[error(transparent)]
    Sdk(#[from] SdkError),

    /// Some enrollments in a batch failed; the rest went through.
    #[error("{} enrollment(s) failed: {}", .failures.len(), .failures.join("; "))]
    Partial { failures: Vec<String> },
}

/// Channel and chaincode provisioning failures.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("organization {organization} does not participate in channel {channel}")]
    NotParticipating {
        organization: String,
        channel: String,
    },

    #[error("channel {channel}: no peers to operate on")]
    NoPeers { channel: String },

    #[error("{what} not ready after {attempts} attempts")]
    NotReady { what: String, attempts: u32 },

    #[error("cannot read channel configuration {path}: {source}")]
    ConfigTx {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("orderer rejected {what}: status {status}")]
    Rejected { what: String, status: String },

    /// One or more peers failed; successful peers are not rolled back.
    #[error("channel {channel}: {} peer(s) failed to join: {}", .failures.len(), .failures.join("; "))]
    JoinFailed {
        channel: String,
        failures: Vec<String>,
    },

    #[error("{} peer(s) failed chaincode install: {}", .failures.len(), .failures.join("; "))]
    InstallFailed { failures: Vec<String> },

    #[error(transparent)]
    Enroll(#[from] EnrollError),

    #[error(transparent)]
    Sdk(#[from] SdkError),
}
