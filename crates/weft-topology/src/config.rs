//! Network and application configuration with validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use weft_sdk::types::{ChaincodeSpec, Endpoint};

/// Read-only configuration for the peer network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub organizations: BTreeMap<String, OrganizationConfig>,
}

impl NetworkConfig {
    /// Load and parse from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Internal consistency checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (org_name, org) in &self.organizations {
            if !org.users.is_empty() && org.ca.is_none() {
                return Err(ConfigError::MissingCa {
                    organization: org_name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// One organization's nodes and bootstrap users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    pub msp_id: String,
    #[serde(default)]
    pub ca: Option<CaConfig>,
    #[serde(default)]
    pub orderers: BTreeMap<String, OrdererConfig>,
    #[serde(default)]
    pub peers: BTreeMap<String, PeerConfig>,
    /// Users enrolled at bootstrap, keyed by enrollment id.
    #[serde(default)]
    pub users: BTreeMap<String, UserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaConfig {
    pub remote: Endpoint,
    #[serde(default)]
    pub ca_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdererConfig {
    pub remote: Endpoint,
    /// TLS is optional on orderers.
    #[serde(default)]
    pub tls_ca_cert_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    pub requests_remote: Endpoint,
    /// Absent on peers that do not serve commit events.
    #[serde(default)]
    pub events_remote: Option<Endpoint>,
    /// TLS is optional on peers.
    #[serde(default)]
    pub tls_ca_cert_path: Option<PathBuf>,
    #[serde(default)]
    pub ssl_target_name_override: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Enrollment secret pre-shared with the organization's CA.
    pub secret: String,
}

/// Read-only configuration for the application layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential store directory prefix; the organization name is
    /// appended to form each store path.
    pub store_path_prefix: String,
    /// Channel used by the REST facade.
    pub default_channel: String,
    pub channels: BTreeMap<String, ChannelConfig>,
    /// Registrar used by the facade to register new account identities.
    pub registrar: RegistrarConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default = "default_commit_timeout_secs")]
    pub commit_timeout_secs: u64,
    pub rest: RestConfig,
}

fn default_commit_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Load and parse from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_secs(self.commit_timeout_secs)
    }

    /// Cross-check against the network configuration. Every organization,
    /// peer, orderer, and user a channel references must exist, and each
    /// channel must name exactly one orderer organization carrying
    /// exactly one orderer.
    pub fn validate(&self, network: &NetworkConfig) -> Result<(), ConfigError> {
        if !self.channels.contains_key(&self.default_channel) {
            return Err(ConfigError::UnknownChannel {
                channel: self.default_channel.clone(),
            });
        }

        let registrar_org = network
            .organizations
            .get(&self.registrar.organization)
            .ok_or_else(|| ConfigError::UnknownOrganization {
                context: "registrar".to_string(),
                organization: self.registrar.organization.clone(),
            })?;
        if registrar_org.ca.is_none() {
            return Err(ConfigError::MissingCa {
                organization: self.registrar.organization.clone(),
            });
        }
        if !registrar_org.users.contains_key(&self.registrar.user) {
            return Err(ConfigError::UnknownUser {
                organization: self.registrar.organization.clone(),
                user: self.registrar.user.clone(),
            });
        }

        for (channel_name, channel) in &self.channels {
            self.validate_channel(network, channel_name, channel)?;
        }

        let rest_org = &self.rest.invoking_organization;
        let Some(rest_org_cfg) = network.organizations.get(rest_org) else {
            return Err(ConfigError::UnknownOrganization {
                context: "rest facade".to_string(),
                organization: rest_org.clone(),
            });
        };
        let default = &self.channels[&self.default_channel];
        if !default.participating_peer_organizations.contains_key(rest_org) {
            return Err(ConfigError::Invalid(format!(
                "rest facade organization {} does not participate in channel {}",
                rest_org, self.default_channel
            )));
        }
        // Accounts registered by the facade must be resolvable by the
        // gateway, so both read the same credential store.
        if self.registrar.organization != *rest_org {
            return Err(ConfigError::Invalid(format!(
                "registrar organization {} must match the rest facade organization {}",
                self.registrar.organization, rest_org
            )));
        }

        Ok(())
    }

    fn validate_channel(
        &self,
        network: &NetworkConfig,
        channel_name: &str,
        channel: &ChannelConfig,
    ) -> Result<(), ConfigError> {
        let creator_org = network
            .organizations
            .get(&channel.creator.organization)
            .ok_or_else(|| ConfigError::UnknownOrganization {
                context: format!("creator of channel {}", channel_name),
                organization: channel.creator.organization.clone(),
            })?;
        if !creator_org.users.contains_key(&channel.creator.user) {
            return Err(ConfigError::UnknownUser {
                organization: channel.creator.organization.clone(),
                user: channel.creator.user.clone(),
            });
        }

        // Exactly one orderer organization with exactly one orderer per
        // channel. A deliberate limitation carried over from the
        // original contract, not an oversight.
        if channel.participating_orderer_organizations.len() != 1 {
            return Err(ConfigError::OrdererOrganizationCount {
                channel: channel_name.to_string(),
                count: channel.participating_orderer_organizations.len(),
            });
        }
        for (orderer_org_name, orderer_names) in &channel.participating_orderer_organizations {
            let orderer_org = network
                .organizations
                .get(orderer_org_name)
                .ok_or_else(|| ConfigError::UnknownOrganization {
                    context: format!("orderer organization of channel {}", channel_name),
                    organization: orderer_org_name.clone(),
                })?;
            if orderer_names.len() != 1 {
                return Err(ConfigError::OrdererCount {
                    channel: channel_name.to_string(),
                    organization: orderer_org_name.clone(),
                    count: orderer_names.len(),
                });
            }
            if !orderer_org.orderers.contains_key(&orderer_names[0]) {
                return Err(ConfigError::UnknownOrderer {
                    organization: orderer_org_name.clone(),
                    orderer: orderer_names[0].clone(),
                });
            }
        }

        for (peer_org_name, membership) in &channel.participating_peer_organizations {
            let peer_org = network
                .organizations
                .get(peer_org_name)
                .ok_or_else(|| ConfigError::UnknownOrganization {
                    context: format!("participant of channel {}", channel_name),
                    organization: peer_org_name.clone(),
                })?;
            if membership.peers.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "organization {} lists no peers for channel {}",
                    peer_org_name, channel_name
                )));
            }
            for peer_name in &membership.peers {
                if !peer_org.peers.contains_key(peer_name) {
                    return Err(ConfigError::UnknownPeer {
                        organization: peer_org_name.clone(),
                        peer: peer_name.clone(),
                    });
                }
            }
            if !peer_org.users.contains_key(&membership.joiner_user) {
                return Err(ConfigError::UnknownUser {
                    organization: peer_org_name.clone(),
                    user: membership.joiner_user.clone(),
                });
            }
        }

        Ok(())
    }
}

/// One channel's definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub creator: CreatorSpec,
    /// Must contain exactly one organization naming exactly one orderer.
    pub participating_orderer_organizations: BTreeMap<String, Vec<String>>,
    pub participating_peer_organizations: BTreeMap<String, ChannelOrgConfig>,
    pub chaincode: ChaincodeConfig,
    /// Channel configuration transaction file. When absent a minimal
    /// config derived from the channel name is used.
    #[serde(default)]
    pub configtx_path: Option<PathBuf>,
}

impl ChannelConfig {
    /// The channel's single orderer as (organization, orderer) names.
    /// Valid after [`AppConfig::validate`] has passed.
    pub fn orderer_ref(&self) -> Option<(&str, &str)> {
        let (org, orderers) = self.participating_orderer_organizations.iter().next()?;
        Some((org.as_str(), orderers.first()?.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorSpec {
    pub organization: String,
    pub user: String,
}

/// One organization's membership in a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelOrgConfig {
    pub peers: Vec<String>,
    /// User whose identity signs this organization's join requests.
    pub joiner_user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaincodeConfig {
    pub id: String,
    pub version: String,
    pub path: String,
    /// Arguments passed to the chaincode's init at instantiation,
    /// as name and balance pairs.
    #[serde(default)]
    pub init_args: Vec<String>,
}

impl ChaincodeConfig {
    pub fn to_spec(&self) -> ChaincodeSpec {
        ChaincodeSpec {
            id: self.id.clone(),
            version: self.version.clone(),
            path: self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    pub organization: String,
    pub user: String,
    /// Affiliation assigned to identities the facade registers.
    pub affiliation: String,
}

/// Bounded-polling parameters for eventual-consistency waits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 2_000,
            max_attempts: 10,
        }
    }
}

impl ReadinessConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// REST facade settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_rest_host")]
    pub host: String,
    #[serde(default = "default_rest_port")]
    pub port: u16,
    /// Organization whose credential store resolves facade callers.
    pub invoking_organization: String,
    /// Static single-page client served at `/`, when present.
    #[serde(default)]
    pub client_dir: Option<PathBuf>,
}

fn default_rest_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rest_port() -> u16 {
    3000
}

/// Configuration errors. All fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context} references unknown organization {organization}")]
    UnknownOrganization {
        context: String,
        organization: String,
    },

    #[error("channel {channel} must name exactly one orderer organization, got {count}")]
    OrdererOrganizationCount { channel: String, count: usize },

    #[error("channel {channel}: orderer organization {organization} must name exactly one orderer, got {count}")]
    OrdererCount {
        channel: String,
        organization: String,
        count: usize,
    },

    #[error("organization {organization} has no orderer named {orderer}")]
    UnknownOrderer { organization: String, orderer: String },

    #[error("organization {organization} has no peer named {peer}")]
    UnknownPeer { organization: String, peer: String },

    #[error("organization {organization} has no user named {user}")]
    UnknownUser { organization: String, user: String },

    #[error("unknown channel {channel}")]
    UnknownChannel { channel: String },

    #[error("organization {organization} has users but no certificate authority")]
    MissingCa { organization: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
