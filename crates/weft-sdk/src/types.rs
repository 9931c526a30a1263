//! Wire-level types shared across the SDK boundary.
//!
//! Signatures here are deterministic digests binding signer and payload.
//! They stand in for the platform's real endorsement cryptography, which
//! is out of scope for the orchestration layer; the verification contract
//! (same inputs, same signature) is what the gateway relies on.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Network endpoint in `protocol://host:port` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Assemble the full URL.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Peer connection material handed to [`crate::LedgerSdk::peer`].
///
/// TLS material is optional: some deployments run peers without TLS, and
/// the event endpoint is absent on peers that do not serve commit events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEndpoint {
    pub requests: Endpoint,
    pub events: Option<Endpoint>,
    pub tls_ca_cert_pem: Option<String>,
    pub ssl_target_name_override: Option<String>,
}

/// Orderer connection material handed to [`crate::LedgerSdk::orderer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdererEndpoint {
    pub endpoint: Endpoint,
    pub tls_ca_cert_pem: Option<String>,
}

/// Unique transaction id bound to the invoking identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(String);

impl TxId {
    /// Generate a fresh id for one submission by `identity`.
    pub fn generate(identity: &Identity) -> Self {
        Self(format!("{}-{}", identity.enrollment_id, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An enrolled identity: credential material issued by an organization's
/// certificate authority. Never mutated after creation; re-enrollment
/// produces a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub enrollment_id: String,
    pub organization: String,
    pub certificate_pem: String,
    pub private_key_pem: String,
}

impl Identity {
    /// Sign opaque bytes with this identity's key material.
    pub fn sign(&self, bytes: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.private_key_pem.as_bytes());
        hasher.update(bytes);
        hasher.finalize().to_vec()
    }
}

/// Registration request submitted to a certificate authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub enrollment_id: String,
    /// When absent the CA generates a secret and returns it.
    pub secret: Option<String>,
    pub role: String,
    pub affiliation: String,
}

/// Chaincode identity and source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeSpec {
    pub id: String,
    pub version: String,
    pub path: String,
}

/// A peer's signed approval of a proposed execution result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    pub endorser: String,
    pub signature: Vec<u8>,
}

impl Endorsement {
    /// Produce the endorsement a peer attaches to its proposal response.
    pub fn sign(endorser: &str, tx_id: &TxId, payload: &[u8]) -> Self {
        Self {
            endorser: endorser.to_string(),
            signature: endorsement_digest(endorser, tx_id, payload),
        }
    }

    /// Check the signature against the response payload it endorses.
    pub fn verify(&self, tx_id: &TxId, payload: &[u8]) -> bool {
        self.signature == endorsement_digest(&self.endorser, tx_id, payload)
    }
}

fn endorsement_digest(endorser: &str, tx_id: &TxId, payload: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(endorser.as_bytes());
    hasher.update(tx_id.as_str().as_bytes());
    hasher.update(payload);
    hasher.finalize().to_vec()
}

/// A transaction proposal sent to endorsing peers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionProposal {
    pub channel: String,
    pub chaincode_id: String,
    pub tx_id: TxId,
    pub fcn: String,
    pub args: Vec<String>,
    /// Enrollment id of the invoking identity.
    pub creator: String,
}

/// One peer's response to a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub payload: Vec<u8>,
    pub endorsement: Endorsement,
}

impl ProposalResponse {
    /// Response payload as a string (payloads are UTF-8 in practice).
    pub fn payload_utf8(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// What an endorsed transaction does when committed.
#[derive(Debug, Clone)]
pub enum TransactionKind {
    /// Ordinary chaincode invocation.
    Invoke,
    /// Chaincode instantiation on the channel. The arguments seed the
    /// chaincode's initial state at commit, and the instantiating
    /// transactor becomes the chaincode's admin.
    Instantiate {
        chaincode: ChaincodeSpec,
        args: Vec<String>,
        creator: String,
    },
}

/// An endorsed transaction ready for broadcast to the ordering service.
#[derive(Debug, Clone)]
pub struct EndorsedTransaction {
    pub channel: String,
    pub tx_id: TxId,
    pub kind: TransactionKind,
    pub responses: Vec<ProposalResponse>,
}

/// Acknowledgment of a broadcast accepted by the ordering service.
///
/// Acceptance does not imply the transaction (or channel) is durable yet;
/// callers poll or wait for commit events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastAck {
    pub status: String,
}

impl BroadcastAck {
    pub fn success() -> Self {
        Self {
            status: "SUCCESS".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}

/// Validation code attached to a commit notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitCode {
    Valid,
    EndorsementPolicyFailure,
    MvccReadConflict,
    BadPayload,
}

impl CommitCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitCode::Valid => "VALID",
            CommitCode::EndorsementPolicyFailure => "ENDORSEMENT_POLICY_FAILURE",
            CommitCode::MvccReadConflict => "MVCC_READ_CONFLICT",
            CommitCode::BadPayload => "BAD_PAYLOAD",
        }
    }
}

impl fmt::Display for CommitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A peer's notification that a transaction reached the ledger.
#[derive(Debug, Clone)]
pub struct CommitEvent {
    pub tx_id: TxId,
    pub code: CommitCode,
}

/// Genesis block for one join attempt.
///
/// Deliberately not `Clone`: the platform consumes the block when a join
/// request carries it, so every join call must fetch a fresh one.
#[derive(Debug)]
pub struct GenesisBlock {
    channel: String,
    bytes: Vec<u8>,
}

impl GenesisBlock {
    pub fn new(channel: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            channel: channel.into(),
            bytes,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Channel configuration transaction signed by the creator identity.
#[derive(Debug, Clone)]
pub struct SignedChannelConfig {
    pub channel: String,
    pub config: Vec<u8>,
    pub signature: Vec<u8>,
    pub tx_id: TxId,
}
