//! # weft-topology
//!
//! Parses network and application configuration into an in-memory
//! topology graph: organizations with their CA, peer, and orderer
//! handles, plus the per-organization channel architectures the
//! provisioner and gateway operate on.
//!
//! Configuration comes from two JSON files:
//! - the **network config** describes the peer network (organizations,
//!   their CAs, orderers, peers, and bootstrap users), and
//! - the **application config** describes what this deployment does with
//!   it (channels, chaincode, credential store location, REST surface).
//!
//! Building the topology performs no network I/O beyond SDK handle
//! construction; inconsistent configuration fails fast with a
//! [`ConfigError`].

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod testing;
pub mod topology;

pub use config::{
    AppConfig, ChaincodeConfig, ChannelConfig, ChannelOrgConfig, ConfigError, CreatorSpec,
    NetworkConfig, OrganizationConfig, ReadinessConfig, RegistrarConfig, RestConfig,
};
pub use topology::{ChannelArchitecture, Organization, Topology};
