//! # weft-sdk
//!
//! The boundary between Weft and the permissioned-ledger platform it
//! drives. Everything the rest of the workspace knows about certificate
//! authorities, peers, orderers, and commit event streams goes through
//! the async ports defined here.
//!
//! ## Architecture
//!
//! ```text
//! weft-topology ──builds handles via──→ LedgerSdk
//!                                          │
//!                        ┌────────────────┼──────────────────┐
//!                        ▼                ▼                  ▼
//!              CertificateAuthority    PeerNode         OrdererNode
//!                                         │
//!                                         ▼
//!                                    CommitStream
//! ```
//!
//! The shipped adapter is [`sim::SimNetwork`], an in-process simulated
//! network carrying the demo account chaincode. Consensus, ordering, and
//! endorsement cryptography are properties of the real platform and are
//! only modeled far enough for the orchestration layer to be exercised
//! end to end.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod ports;
pub mod sim;
pub mod types;

pub use error::SdkError;
pub use ports::{CertificateAuthority, CommitStream, LedgerSdk, OrdererNode, PeerNode};
pub use types::{
    BroadcastAck, ChaincodeSpec, CommitCode, CommitEvent, Endorsement, EndorsedTransaction,
    Endpoint, GenesisBlock, Identity, OrdererEndpoint, PeerEndpoint, ProposalResponse,
    RegistrationRequest, SignedChannelConfig, TransactionKind, TransactionProposal, TxId,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
