//! Canned two-organization configurations for tests.
//!
//! `org0` carries the channel's orderer, a CA, two peers (one serving
//! commit events) and the registrar user; `org1` is a plain participant
//! with a single event-less peer. Downstream crates build their test
//! topologies from these.

use crate::config::{AppConfig, NetworkConfig};

/// Two organizations, one orderer, three peers, one CA per organization.
pub fn sample_network() -> NetworkConfig {
    serde_json::from_value(serde_json::json!({
        "organizations": {
            "org0": {
                "msp_id": "Org0MSP",
                "ca": {
                    "remote": { "protocol": "http", "host": "ca.org0.example.com", "port": 7054 }
                },
                "orderers": {
                    "orderer0": {
                        "remote": { "protocol": "grpc", "host": "orderer0.org0.example.com", "port": 7050 }
                    }
                },
                "peers": {
                    "peer0": {
                        "requests_remote": { "protocol": "grpc", "host": "peer0.org0.example.com", "port": 7051 },
                        "events_remote": { "protocol": "grpc", "host": "peer0.org0.example.com", "port": 7053 }
                    },
                    "peer1": {
                        "requests_remote": { "protocol": "grpc", "host": "peer1.org0.example.com", "port": 8051 }
                    }
                },
                "users": {
                    "admin": { "secret": "adminpw" },
                    "Admin": { "secret": "org0Adminpw" }
                }
            },
            "org1": {
                "msp_id": "Org1MSP",
                "ca": {
                    "remote": { "protocol": "http", "host": "ca.org1.example.com", "port": 7054 }
                },
                "peers": {
                    "peer0": {
                        "requests_remote": { "protocol": "grpc", "host": "peer0.org1.example.com", "port": 9051 }
                    }
                },
                "users": {
                    "Admin": { "secret": "org1Adminpw" }
                }
            }
        }
    }))
    .unwrap()
}

/// One channel over [`sample_network`], created by `org0`.
pub fn sample_app() -> AppConfig {
    serde_json::from_value(serde_json::json!({
        "store_path_prefix": "/tmp/weft-store",
        "default_channel": "mychannel",
        "channels": {
            "mychannel": {
                "creator": { "organization": "org0", "user": "Admin" },
                "participating_orderer_organizations": {
                    "org0": ["orderer0"]
                },
                "participating_peer_organizations": {
                    "org0": { "peers": ["peer0", "peer1"], "joiner_user": "Admin" },
                    "org1": { "peers": ["peer0"], "joiner_user": "Admin" }
                },
                "chaincode": {
                    "id": "accounts",
                    "version": "v1.0",
                    "path": "github.com/accounts_cc",
                    "init_args": ["alice", "123", "bob", "456"]
                }
            }
        },
        "registrar": {
            "organization": "org0",
            "user": "admin",
            "affiliation": "org0.department1"
        },
        "rest": {
            "invoking_organization": "org0"
        }
    }))
    .unwrap()
}
