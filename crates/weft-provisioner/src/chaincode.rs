//! Chaincode installation and instantiation.

use crate::error::ProvisionError;
use crate::readiness::poll_ready;
use std::sync::Arc;
use tracing::{debug, info};
use weft_sdk::ports::PeerNode;
use weft_sdk::types::{
    ChaincodeSpec, EndorsedTransaction, Identity, TransactionKind, TxId,
};
use weft_sdk::SdkError;
use weft_topology::{ChannelArchitecture, ReadinessConfig};

/// Installs chaincode on peers and instantiates it on channels.
pub struct ChaincodeInstaller {
    readiness: ReadinessConfig,
}

impl ChaincodeInstaller {
    pub fn new(readiness: ReadinessConfig) -> Self {
        Self { readiness }
    }

    /// Install on every peer. A peer that already holds this id and
    /// version is fine; any other failure is collected and the rest of
    /// the peers still get their install.
    pub async fn install(
        &self,
        peers: &[Arc<dyn PeerNode>],
        chaincode: &ChaincodeSpec,
        installer: &Identity,
    ) -> Result<(), ProvisionError> {
        let mut failures = Vec::new();
        for peer in peers {
            match peer.install_chaincode(chaincode, installer).await {
                Ok(()) => {
                    info!(peer = peer.name(), chaincode = %chaincode.id, version = %chaincode.version, "chaincode installed");
                }
                Err(SdkError::AlreadyInstalled { .. }) => {
                    debug!(peer = peer.name(), chaincode = %chaincode.id, version = %chaincode.version, "chaincode already installed");
                }
                Err(err) => failures.push(format!("{}: {}", peer.name(), err)),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ProvisionError::InstallFailed { failures })
        }
    }

    /// Instantiate on the channel: endorse the instantiation on every
    /// peer of `architecture`, broadcast it, then poll until the
    /// chaincode is queryable. Unlike install, the first endorsement
    /// failure aborts the whole operation.
    pub async fn instantiate(
        &self,
        architecture: &ChannelArchitecture,
        chaincode: &ChaincodeSpec,
        fcn: &str,
        args: &[String],
        instantiator: &Identity,
    ) -> Result<(), ProvisionError> {
        let probe_peer = architecture
            .peers
            .first()
            .ok_or_else(|| ProvisionError::NoPeers {
                channel: architecture.name.clone(),
            })?;

        let tx_id = TxId::generate(instantiator);
        let mut responses = Vec::with_capacity(architecture.peers.len());
        for peer in &architecture.peers {
            responses.push(
                peer.instantiate_proposal(&architecture.name, chaincode, fcn, args, &tx_id)
                    .await?,
            );
        }

        let ack = architecture
            .orderer
            .broadcast(EndorsedTransaction {
                channel: architecture.name.clone(),
                tx_id: tx_id.clone(),
                kind: TransactionKind::Instantiate {
                    chaincode: chaincode.clone(),
                    args: args.to_vec(),
                    creator: instantiator.enrollment_id.clone(),
                },
                responses,
            })
            .await?;
        if !ack.is_success() {
            return Err(ProvisionError::Rejected {
                what: format!("instantiation of {}", chaincode.id),
                status: ack.status,
            });
        }

        // The orderer acknowledged; the chaincode becomes queryable once
        // the instantiation commits.
        poll_ready(
            &self.readiness,
            &format!("chaincode {} on channel {}", chaincode.id, architecture.name),
            || probe_peer.chaincode_instantiated(&architecture.name, &chaincode.id),
        )
        .await?;
        info!(
            channel = %architecture.name,
            chaincode = %chaincode.id,
            version = %chaincode.version,
            tx_id = %tx_id,
            "chaincode instantiated"
        );
        Ok(())
    }
}
