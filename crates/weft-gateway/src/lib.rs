//! # weft-gateway
//!
//! Submits chaincode transactions through the full
//! endorse-order-commit pipeline and confirms their outcome:
//!
//! 1. endorse the proposal on every channel peer and check the
//!    responses agree,
//! 2. register a commit listener on an event-serving peer,
//! 3. broadcast to the ordering service,
//! 4. resolve when the commit notification arrives, the peer
//!    invalidates the transaction, or the commit window elapses.
//!
//! The listener is registered before the broadcast, so a fast commit
//! can never slip past the gateway unobserved.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod gateway;
pub mod ports;

pub use error::GatewayError;
pub use gateway::{TransactionGateway, TransactionRequest, TransactionResult};
pub use ports::IdentityResolver;
