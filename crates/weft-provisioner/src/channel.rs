//! Channel creation, readiness, and peer joins.

use crate::error::ProvisionError;
use crate::readiness::poll_ready;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};
use weft_sdk::types::{Identity, SignedChannelConfig, TxId};
use weft_topology::config::ChannelConfig;
use weft_topology::{Organization, ReadinessConfig};

/// Provisioning lifecycle of a channel, as observed by this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChannelPhase {
    Uncreated,
    Created,
    Joined,
    Initialized,
}

/// Drives channels from creation through peer joins.
pub struct ChannelProvisioner {
    readiness: ReadinessConfig,
    /// Directory channel configuration paths resolve against.
    base_dir: PathBuf,
    phases: Mutex<BTreeMap<String, ChannelPhase>>,
}

impl ChannelProvisioner {
    pub fn new(readiness: ReadinessConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            readiness,
            base_dir: base_dir.into(),
            phases: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn phase(&self, channel: &str) -> ChannelPhase {
        self.phases
            .lock()
            .get(channel)
            .copied()
            .unwrap_or(ChannelPhase::Uncreated)
    }

    fn advance(&self, channel: &str, phase: ChannelPhase) {
        let mut phases = self.phases.lock();
        let entry = phases
            .entry(channel.to_string())
            .or_insert(ChannelPhase::Uncreated);
        if *entry < phase {
            *entry = phase;
        }
    }

    /// Submit the signed channel configuration to the channel's orderer.
    /// Resolution does not imply visibility; call
    /// [`Self::wait_until_ready`] before joining peers.
    pub async fn create(
        &self,
        channel_name: &str,
        channel: &ChannelConfig,
        creator_org: &Organization,
        creator: &Identity,
    ) -> Result<(), ProvisionError> {
        let architecture = creator_org.channel(channel_name).ok_or_else(|| {
            ProvisionError::NotParticipating {
                organization: creator_org.name.clone(),
                channel: channel_name.to_string(),
            }
        })?;

        let config = match &channel.configtx_path {
            Some(path) => {
                let resolved = if path.is_absolute() {
                    path.clone()
                } else {
                    self.base_dir.join(path)
                };
                std::fs::read(&resolved).map_err(|source| ProvisionError::ConfigTx {
                    path: resolved,
                    source,
                })?
            }
            None => format!("channel configuration for {}", channel_name).into_bytes(),
        };

        let signed = SignedChannelConfig {
            channel: channel_name.to_string(),
            signature: creator.sign(&config),
            config,
            tx_id: TxId::generate(creator),
        };
        let ack = architecture.orderer.create_channel(signed).await?;
        if !ack.is_success() {
            return Err(ProvisionError::Rejected {
                what: format!("channel {}", channel_name),
                status: ack.status,
            });
        }
        self.advance(channel_name, ChannelPhase::Created);
        info!(channel = channel_name, creator = %creator.enrollment_id, "channel created");
        Ok(())
    }

    /// Poll the orderer until the channel is visible.
    pub async fn wait_until_ready(
        &self,
        channel_name: &str,
        org: &Organization,
    ) -> Result<(), ProvisionError> {
        let architecture = org.channel(channel_name).ok_or_else(|| {
            ProvisionError::NotParticipating {
                organization: org.name.clone(),
                channel: channel_name.to_string(),
            }
        })?;
        poll_ready(
            &self.readiness,
            &format!("channel {}", channel_name),
            || architecture.orderer.channel_visible(channel_name),
        )
        .await
    }

    /// Join all of `org`'s channel peers. A fresh genesis block is
    /// fetched for this join; peers that fail leave the successful ones
    /// joined, and the failures are reported together.
    pub async fn join(
        &self,
        channel_name: &str,
        org: &Organization,
        joiner: &Identity,
    ) -> Result<(), ProvisionError> {
        let architecture = org.channel(channel_name).ok_or_else(|| {
            ProvisionError::NotParticipating {
                organization: org.name.clone(),
                channel: channel_name.to_string(),
            }
        })?;

        let tx_id = TxId::generate(joiner);
        let genesis = architecture
            .orderer
            .genesis_block(channel_name, &tx_id)
            .await?;

        let mut failures = Vec::new();
        for peer in &architecture.peers {
            match peer.join_channel(&genesis, joiner).await {
                Ok(()) => {
                    info!(channel = channel_name, peer = peer.name(), "peer joined channel");
                }
                Err(err) => {
                    warn!(channel = channel_name, peer = peer.name(), error = %err, "peer failed to join");
                    failures.push(format!("{}: {}", peer.name(), err));
                }
            }
        }
        if !failures.is_empty() {
            return Err(ProvisionError::JoinFailed {
                channel: channel_name.to_string(),
                failures,
            });
        }
        self.advance(channel_name, ChannelPhase::Joined);
        Ok(())
    }

    /// Record that the channel's chaincode is instantiated.
    pub fn mark_initialized(&self, channel_name: &str) {
        self.advance(channel_name, ChannelPhase::Initialized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use weft_sdk::sim::SimNetwork;
    use weft_sdk::SdkError;
    use weft_topology::testing::{sample_app, sample_network};
    use weft_topology::Topology;

    fn admin(org: &str) -> Identity {
        Identity {
            enrollment_id: "Admin".to_string(),
            organization: org.to_string(),
            certificate_pem: "cert".to_string(),
            private_key_pem: "key".to_string(),
        }
    }

    fn build(network: &SimNetwork) -> (Topology, ChannelProvisioner, ChannelConfig) {
        let app = sample_app();
        let topology =
            Topology::build(&sample_network(), &app, Path::new("."), network).unwrap();
        let provisioner = ChannelProvisioner::new(app.readiness.clone(), ".");
        let channel = app.channels["mychannel"].clone();
        (topology, provisioner, channel)
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_wait_join_lifecycle() {
        let network = SimNetwork::default();
        network.set_channel_visibility_delay(2);
        let (topology, provisioner, channel) = build(&network);
        let org0 = topology.organization("org0").unwrap();
        let org1 = topology.organization("org1").unwrap();

        assert_eq!(provisioner.phase("mychannel"), ChannelPhase::Uncreated);
        provisioner
            .create("mychannel", &channel, org0, &admin("org0"))
            .await
            .unwrap();
        assert_eq!(provisioner.phase("mychannel"), ChannelPhase::Created);
        assert!(network.channel_exists("mychannel"));

        provisioner
            .wait_until_ready("mychannel", org0)
            .await
            .unwrap();

        provisioner
            .join("mychannel", org0, &admin("org0"))
            .await
            .unwrap();
        provisioner
            .join("mychannel", org1, &admin("org1"))
            .await
            .unwrap();
        assert_eq!(provisioner.phase("mychannel"), ChannelPhase::Joined);
        assert!(network.peer_joined("mychannel", "org0/peer0"));
        assert!(network.peer_joined("mychannel", "org0/peer1"));
        assert!(network.peer_joined("mychannel", "org1/peer0"));
    }

    #[tokio::test]
    async fn test_join_before_create_fails() {
        let network = SimNetwork::default();
        let (topology, provisioner, _) = build(&network);
        let org0 = topology.organization("org0").unwrap();

        let err = provisioner
            .join("mychannel", org0, &admin("org0"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Sdk(SdkError::UnknownChannel(_))
        ));
        assert_eq!(provisioner.phase("mychannel"), ChannelPhase::Uncreated);
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let network = SimNetwork::default();
        let (topology, provisioner, channel) = build(&network);
        let org0 = topology.organization("org0").unwrap();

        provisioner
            .create("mychannel", &channel, org0, &admin("org0"))
            .await
            .unwrap();
        let err = provisioner
            .create("mychannel", &channel, org0, &admin("org0"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Sdk(SdkError::Orderer(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_gives_up_when_never_visible() {
        let network = SimNetwork::default();
        network.set_channel_visibility_delay(100);
        let (topology, provisioner, channel) = build(&network);
        let org0 = topology.organization("org0").unwrap();

        provisioner
            .create("mychannel", &channel, org0, &admin("org0"))
            .await
            .unwrap();
        let err = provisioner
            .wait_until_ready("mychannel", org0)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::NotReady { .. }));
    }

    #[tokio::test]
    async fn test_configtx_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("channel.tx"), b"configtx bytes").unwrap();
        let network = SimNetwork::default();
        let app = sample_app();
        let topology =
            Topology::build(&sample_network(), &app, Path::new("."), &network).unwrap();
        let provisioner = ChannelProvisioner::new(app.readiness.clone(), dir.path());
        let mut channel = app.channels["mychannel"].clone();
        channel.configtx_path = Some(PathBuf::from("channel.tx"));
        let org0 = topology.organization("org0").unwrap();

        provisioner
            .create("mychannel", &channel, org0, &admin("org0"))
            .await
            .unwrap();

        // A missing configuration file fails before the orderer is contacted.
        channel.configtx_path = Some(PathBuf::from("missing.tx"));
        let err = provisioner
            .create("mychannel", &channel, org0, &admin("org0"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::ConfigTx { .. }));
    }
}
