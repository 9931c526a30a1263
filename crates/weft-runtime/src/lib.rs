//! # weft-runtime
//!
//! Wires the whole deployment together: loads the network and
//! application configuration, provisions channels and chaincode over
//! the simulated ledger network, and serves the HTTP facade.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod bootstrap;

pub use adapters::StoredIdentityResolver;
pub use bootstrap::{bootstrap, Runtime};
