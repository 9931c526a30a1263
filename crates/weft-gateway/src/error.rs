//! Gateway failure modes, one variant per stage of a submission.

use weft_sdk::types::{CommitCode, TxId};
use weft_sdk::SdkError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A structural requirement failed before anything was sent.
    #[error("{0}")]
    Precondition(String),

    #[error("unknown identity {0}")]
    UnknownIdentity(String),

    /// Identity lookup failed for a reason other than absence.
    #[error("identity resolution failed: {0}")]
    Identity(String),

    /// Endorsement failed; nothing was broadcast.
    #[error("proposal rejected: {}", .reasons.join("; "))]
    ProposalRejected { reasons: Vec<String> },

    #[error("ordering service rejected transaction {tx_id}: status {status}")]
    BroadcastRejected { tx_id: TxId, status: String },

    /// No commit notification arrived within the configured window. The
    /// transaction may still commit later.
    #[error("transaction {tx_id} was not committed within {seconds}s")]
    CommitTimeout { tx_id: TxId, seconds: u64 },

    /// The peer validated the transaction and rejected it.
    #[error("transaction {tx_id} invalidated: {}", .code.as_str())]
    TransactionInvalid { tx_id: TxId, code: CommitCode },

    #[error(transparent)]
    Sdk(#[from] SdkError),
}
