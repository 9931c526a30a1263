//! # weft-provisioner
//!
//! Brings a configured network from bare nodes to an operational
//! channel: enrolls bootstrap identities through each organization's CA,
//! creates channels on the ordering service, joins peers, and installs
//! and instantiates chaincode.
//!
//! Operations that depend on eventually-consistent platform state
//! (channel visibility, chaincode instantiation) never sleep a fixed
//! interval; they poll with bounded exponential backoff via
//! [`readiness::poll_ready`].

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod chaincode;
pub mod channel;
pub mod enrollment;
pub mod error;
pub mod readiness;
pub mod store;

pub use chaincode::ChaincodeInstaller;
pub use channel::{ChannelPhase, ChannelProvisioner};
pub use enrollment::EnrollmentManager;
pub use error::{EnrollError, ProvisionError};
pub use store::CredentialStore;
