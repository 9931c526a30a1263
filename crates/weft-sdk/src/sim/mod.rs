//! In-process simulated ledger network.
//!
//! [`SimNetwork`] implements [`crate::LedgerSdk`] and hands out CA, peer,
//! orderer, and commit-stream handles that all share one in-memory state.
//! The peers carry the demo account chaincode (`create_account`,
//! `transfer`, `query_balance`, `query_account_names`).
//!
//! The simulation models exactly the behaviors the orchestration layer
//! depends on: channel visibility lag after creation, single-use genesis
//! blocks, install idempotence conflicts, endorsement signatures, and
//! commit event delivery after ordering. Fault injection knobs let tests
//! drive the failure paths (rejected proposals, lost commit events, slow
//! channel visibility, CA failures).

mod chaincode;
mod network;
mod nodes;
mod stream;

pub use network::SimNetwork;
