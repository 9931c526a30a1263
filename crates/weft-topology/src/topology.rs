//! In-memory topology graph built from validated configuration.

use crate::config::{AppConfig, ConfigError, NetworkConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use weft_sdk::ports::{CertificateAuthority, LedgerSdk, OrdererNode, PeerNode};
use weft_sdk::types::{OrdererEndpoint, PeerEndpoint};

/// All organizations with their platform handles, resolved once at
/// startup. Cheap to share; every handle is an `Arc`.
pub struct Topology {
    organizations: BTreeMap<String, Arc<Organization>>,
}

impl std::fmt::Debug for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topology")
            .field("organizations", &self.organizations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Topology {
    /// Validate both configurations and construct handles for every CA,
    /// peer, and orderer through `sdk`. TLS certificate paths are read
    /// relative to `base_dir`.
    pub fn build(
        network: &NetworkConfig,
        app: &AppConfig,
        base_dir: &Path,
        sdk: &dyn LedgerSdk,
    ) -> Result<Self, ConfigError> {
        network.validate()?;
        app.validate(network)?;

        // Built as plain values and Arc-wrapped only after channel wiring,
        // so no handle escapes half-constructed.
        let mut organizations: BTreeMap<String, Organization> = BTreeMap::new();
        for (org_name, org_cfg) in &network.organizations {
            let ca = org_cfg
                .ca
                .as_ref()
                .map(|ca_cfg| {
                    sdk.certificate_authority(org_name, &ca_cfg.remote)
                        .map_err(|err| ConfigError::Invalid(err.to_string()))
                })
                .transpose()?;

            let mut peers = BTreeMap::new();
            for (peer_name, peer_cfg) in &org_cfg.peers {
                let endpoint = PeerEndpoint {
                    requests: peer_cfg.requests_remote.clone(),
                    events: peer_cfg.events_remote.clone(),
                    tls_ca_cert_pem: read_pem(base_dir, peer_cfg.tls_ca_cert_path.as_deref())?,
                    ssl_target_name_override: peer_cfg.ssl_target_name_override.clone(),
                };
                let peer = sdk
                    .peer(org_name, peer_name, endpoint)
                    .map_err(|err| ConfigError::Invalid(err.to_string()))?;
                peers.insert(peer_name.clone(), peer);
            }

            let mut orderers = BTreeMap::new();
            for (orderer_name, orderer_cfg) in &org_cfg.orderers {
                let endpoint = OrdererEndpoint {
                    endpoint: orderer_cfg.remote.clone(),
                    tls_ca_cert_pem: read_pem(base_dir, orderer_cfg.tls_ca_cert_path.as_deref())?,
                };
                let orderer = sdk
                    .orderer(org_name, orderer_name, endpoint)
                    .map_err(|err| ConfigError::Invalid(err.to_string()))?;
                orderers.insert(orderer_name.clone(), orderer);
            }

            debug!(
                organization = %org_name,
                peers = peers.len(),
                orderers = orderers.len(),
                has_ca = ca.is_some(),
                "resolved organization"
            );
            organizations.insert(
                org_name.clone(),
                Organization {
                    name: org_name.clone(),
                    msp_id: org_cfg.msp_id.clone(),
                    ca,
                    peers,
                    orderers,
                    channels: BTreeMap::new(),
                },
            );
        }

        wire_channels(&mut organizations, app)?;
        Ok(Self {
            organizations: organizations
                .into_iter()
                .map(|(name, org)| (name, Arc::new(org)))
                .collect(),
        })
    }

    pub fn organization(&self, name: &str) -> Option<&Arc<Organization>> {
        self.organizations.get(name)
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Arc<Organization>> {
        self.organizations.values()
    }
}

/// One organization's handles and channel memberships.
pub struct Organization {
    pub name: String,
    pub msp_id: String,
    pub ca: Option<Arc<dyn CertificateAuthority>>,
    pub peers: BTreeMap<String, Arc<dyn PeerNode>>,
    pub orderers: BTreeMap<String, Arc<dyn OrdererNode>>,
    channels: BTreeMap<String, ChannelArchitecture>,
}

impl Organization {
    /// This organization's view of a channel, when it participates.
    pub fn channel(&self, name: &str) -> Option<&ChannelArchitecture> {
        self.channels.get(name)
    }
}

/// One organization's slice of a channel: its own peers plus the
/// channel's orderer.
pub struct ChannelArchitecture {
    pub name: String,
    pub orderer: Arc<dyn OrdererNode>,
    pub peers: Vec<Arc<dyn PeerNode>>,
}

impl ChannelArchitecture {
    /// First peer serving commit events. Which event-capable peer hosts
    /// the commit listener is deliberately unspecified.
    pub fn event_peer(&self) -> Option<&Arc<dyn PeerNode>> {
        self.peers.iter().find(|peer| peer.has_event_source())
    }
}

/// Attach each channel's architecture to the organizations participating
/// in it. An organization's view of a channel holds its own peers and the
/// channel's single orderer.
fn wire_channels(
    organizations: &mut BTreeMap<String, Organization>,
    app: &AppConfig,
) -> Result<(), ConfigError> {
    for (channel_name, channel) in &app.channels {
        let (orderer_org, orderer_name) = channel
            .orderer_ref()
            .ok_or_else(|| ConfigError::OrdererOrganizationCount {
                channel: channel_name.clone(),
                count: 0,
            })?;
        let orderer = organizations[orderer_org].orderers[orderer_name].clone();

        for (org_name, membership) in &channel.participating_peer_organizations {
            let peers = {
                let org = &organizations[org_name];
                membership
                    .peers
                    .iter()
                    .map(|peer_name| org.peers[peer_name].clone())
                    .collect()
            };
            let architecture = ChannelArchitecture {
                name: channel_name.clone(),
                orderer: orderer.clone(),
                peers,
            };
            if let Some(org) = organizations.get_mut(org_name) {
                org.channels.insert(channel_name.clone(), architecture);
            }
        }
    }
    Ok(())
}

fn read_pem(base_dir: &Path, path: Option<&Path>) -> Result<Option<String>, ConfigError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let resolved: PathBuf = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    std::fs::read_to_string(&resolved)
        .map(Some)
        .map_err(|source| ConfigError::Io {
            path: resolved,
            source,
        })
}
