//! Async ports onto the ledger platform.
//!
//! Handles are constructed through [`LedgerSdk`] from configuration and
//! perform no network I/O at construction time. Every method on a handle
//! is a suspension point.

use crate::error::SdkError;
use crate::types::{
    BroadcastAck, ChaincodeSpec, CommitEvent, EndorsedTransaction, Endpoint, GenesisBlock,
    Identity, OrdererEndpoint, PeerEndpoint, ProposalResponse, RegistrationRequest,
    SignedChannelConfig, TransactionProposal, TxId,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Factory for platform handles.
pub trait LedgerSdk: Send + Sync {
    fn certificate_authority(
        &self,
        org: &str,
        endpoint: &Endpoint,
    ) -> Result<Arc<dyn CertificateAuthority>, SdkError>;

    fn peer(
        &self,
        org: &str,
        name: &str,
        endpoint: PeerEndpoint,
    ) -> Result<Arc<dyn PeerNode>, SdkError>;

    fn orderer(
        &self,
        org: &str,
        name: &str,
        endpoint: OrdererEndpoint,
    ) -> Result<Arc<dyn OrdererNode>, SdkError>;
}

/// An organization's certificate authority.
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// Register a new enrollment id. Returns the enrollment secret
    /// (caller-supplied or CA-generated). The registrar identity must
    /// already be enrolled; enforcing that is the caller's precondition.
    async fn register(
        &self,
        request: &RegistrationRequest,
        registrar: &Identity,
    ) -> Result<String, SdkError>;

    /// Exchange an enrollment id and secret for credential material.
    async fn enroll(&self, enrollment_id: &str, secret: &str) -> Result<Identity, SdkError>;
}

/// A peer node: endorses proposals, joins channels, hosts chaincode, and
/// serves commit events.
#[async_trait]
pub trait PeerNode: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this peer exposes a commit event stream.
    fn has_event_source(&self) -> bool;

    /// Execute a proposal and return the endorsed result. A chaincode
    /// execution error surfaces as `Err`, which the gateway treats as an
    /// error-valued proposal response.
    async fn propose(&self, proposal: &TransactionProposal) -> Result<ProposalResponse, SdkError>;

    /// Join this peer to the channel named by the genesis block.
    async fn join_channel(
        &self,
        genesis: &GenesisBlock,
        joiner: &Identity,
    ) -> Result<(), SdkError>;

    /// Install chaincode bytes and metadata on this peer.
    /// Fails with [`SdkError::AlreadyInstalled`] when the same id and
    /// version is already present.
    async fn install_chaincode(
        &self,
        chaincode: &ChaincodeSpec,
        installer: &Identity,
    ) -> Result<(), SdkError>;

    /// Proposal endorsing a chaincode instantiation on a channel.
    async fn instantiate_proposal(
        &self,
        channel: &str,
        chaincode: &ChaincodeSpec,
        fcn: &str,
        args: &[String],
        tx_id: &TxId,
    ) -> Result<ProposalResponse, SdkError>;

    /// Whether the chaincode id is visible as instantiated on the channel
    /// from this peer. Used by readiness polling.
    async fn chaincode_instantiated(
        &self,
        channel: &str,
        chaincode_id: &str,
    ) -> Result<bool, SdkError>;

    /// Open a commit event stream connection to this peer. Each call
    /// returns a fresh connection; the caller owns it and must close it.
    async fn commit_stream(&self) -> Result<Box<dyn CommitStream>, SdkError>;
}

/// An ordering-service node.
#[async_trait]
pub trait OrdererNode: Send + Sync {
    fn name(&self) -> &str;

    /// Submit a signed channel configuration transaction. Resolution of
    /// this call does not guarantee the channel is visible yet.
    async fn create_channel(&self, config: SignedChannelConfig) -> Result<BroadcastAck, SdkError>;

    /// Readiness probe: has the channel become visible on the ordering
    /// service. Never errors merely because the channel is not yet there.
    async fn channel_visible(&self, channel: &str) -> Result<bool, SdkError>;

    /// Fetch the channel's genesis block. The block is single-use; fetch
    /// a fresh one per join attempt.
    async fn genesis_block(&self, channel: &str, tx_id: &TxId) -> Result<GenesisBlock, SdkError>;

    /// Broadcast an endorsed transaction for ordering.
    async fn broadcast(&self, transaction: EndorsedTransaction) -> Result<BroadcastAck, SdkError>;
}

/// A commit event stream connection, exclusively owned by one gateway
/// submission. Must be closed on every exit path.
#[async_trait]
pub trait CommitStream: Send {
    /// Register interest in one transaction id. The returned receiver
    /// resolves with the commit notification for that id.
    async fn register(&mut self, tx_id: &TxId) -> Result<oneshot::Receiver<CommitEvent>, SdkError>;

    /// Drop a registration without waiting for its event.
    async fn unregister(&mut self, tx_id: &TxId);

    /// Release the connection. Idempotent.
    async fn close(&mut self);
}
