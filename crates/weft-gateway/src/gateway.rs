//! Endorse-order-commit submission pipeline.

use crate::error::GatewayError;
use crate::ports::IdentityResolver;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use weft_sdk::ports::CommitStream;
use weft_sdk::types::{
    CommitCode, EndorsedTransaction, Identity, ProposalResponse, TransactionKind,
    TransactionProposal, TxId,
};
use weft_topology::Organization;

/// One chaincode invocation as submitted by a caller.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub fcn: String,
    pub args: Vec<String>,
}

/// Outcome of a committed transaction.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransactionResult {
    pub tx_id: String,
    /// Endorsed chaincode payload, UTF-8 decoded.
    pub payload: String,
}

/// Submits transactions through one organization's view of a channel.
///
/// A submission endorses on every channel peer, registers a commit
/// listener *before* broadcasting to the ordering service, and resolves
/// only once the commit notification arrives or the window elapses.
pub struct TransactionGateway {
    organization: Arc<Organization>,
    channel: String,
    chaincode_id: String,
    resolver: Arc<dyn IdentityResolver>,
    commit_timeout: Duration,
}

impl TransactionGateway {
    pub fn new(
        organization: Arc<Organization>,
        channel: impl Into<String>,
        chaincode_id: impl Into<String>,
        resolver: Arc<dyn IdentityResolver>,
        commit_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let channel = channel.into();
        if organization.channel(&channel).is_none() {
            return Err(GatewayError::Precondition(format!(
                "organization {} does not participate in channel {}",
                organization.name, channel
            )));
        }
        Ok(Self {
            organization,
            channel,
            chaincode_id: chaincode_id.into(),
            resolver,
            commit_timeout,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Submit a state-changing invocation and wait for its commit.
    pub async fn submit(
        &self,
        enrollment_id: &str,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, GatewayError> {
        let identity = self.identity(enrollment_id).await?;
        let tx_id = TxId::generate(&identity);
        debug!(tx_id = %tx_id, fcn = %request.fcn, "submitting transaction");

        let responses = self.endorse(&identity, &tx_id, request).await?;
        let payload = responses[0].payload.clone();

        // The listener must exist before the orderer can possibly
        // deliver the commit, or the notification races the registration.
        let architecture = self.architecture()?;
        let event_peer = architecture.event_peer().ok_or_else(|| {
            GatewayError::Precondition(format!(
                "no peer of organization {} serves commit events for channel {}",
                self.organization.name, self.channel
            ))
        })?;
        let mut stream = event_peer.commit_stream().await?;
        let receiver = match stream.register(&tx_id).await {
            Ok(receiver) => receiver,
            Err(err) => {
                stream.close().await;
                return Err(err.into());
            }
        };

        let transaction = EndorsedTransaction {
            channel: self.channel.clone(),
            tx_id: tx_id.clone(),
            kind: TransactionKind::Invoke,
            responses,
        };
        let ack = match architecture.orderer.broadcast(transaction).await {
            Ok(ack) => ack,
            Err(err) => {
                stream.unregister(&tx_id).await;
                stream.close().await;
                return Err(err.into());
            }
        };
        if !ack.is_success() {
            stream.unregister(&tx_id).await;
            stream.close().await;
            return Err(GatewayError::BroadcastRejected {
                tx_id,
                status: ack.status,
            });
        }

        let event = match timeout(self.commit_timeout, receiver).await {
            Ok(Ok(event)) => event,
            Ok(Err(_)) => {
                stream.close().await;
                return Err(GatewayError::Sdk(weft_sdk::SdkError::Stream(
                    "commit stream dropped the registration".to_string(),
                )));
            }
            Err(_) => {
                warn!(tx_id = %tx_id, "commit window elapsed");
                stream.unregister(&tx_id).await;
                stream.close().await;
                return Err(GatewayError::CommitTimeout {
                    tx_id,
                    seconds: self.commit_timeout.as_secs(),
                });
            }
        };
        stream.close().await;

        if event.code != CommitCode::Valid {
            return Err(GatewayError::TransactionInvalid {
                tx_id,
                code: event.code,
            });
        }
        info!(tx_id = %tx_id, "transaction committed");
        Ok(TransactionResult {
            tx_id: tx_id.to_string(),
            payload: String::from_utf8_lossy(&payload).into_owned(),
        })
    }

    /// Evaluate a read-only invocation. The proposal runs through the
    /// same endorsement checks as a submission, but nothing reaches the
    /// orderer; the agreed payload is returned directly.
    pub async fn query(
        &self,
        enrollment_id: &str,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, GatewayError> {
        let identity = self.identity(enrollment_id).await?;
        let tx_id = TxId::generate(&identity);
        let responses = self.endorse(&identity, &tx_id, request).await?;
        Ok(TransactionResult {
            tx_id: tx_id.to_string(),
            payload: responses[0].payload_utf8(),
        })
    }

    /// Collect endorsements from every channel peer. Any rejection, any
    /// disagreeing payload, or any bad signature fails the whole set and
    /// nothing reaches the orderer.
    async fn endorse(
        &self,
        identity: &Identity,
        tx_id: &TxId,
        request: &TransactionRequest,
    ) -> Result<Vec<ProposalResponse>, GatewayError> {
        let proposal = self.proposal(identity, tx_id, request);
        let architecture = self.architecture()?;

        let mut responses = Vec::with_capacity(architecture.peers.len());
        let mut reasons = Vec::new();
        for peer in &architecture.peers {
            match peer.propose(&proposal).await {
                Ok(response) => {
                    if !response.endorsement.verify(tx_id, &response.payload) {
                        reasons.push(format!("{}: invalid endorsement signature", peer.name()));
                    } else {
                        responses.push(response);
                    }
                }
                Err(err) => reasons.push(format!("{}: {}", peer.name(), err)),
            }
        }
        if responses.is_empty() {
            reasons.push("no peer endorsed the proposal".to_string());
        } else {
            let reference = &responses[0].payload;
            if responses.iter().any(|r| &r.payload != reference) {
                reasons.push("peers returned disagreeing payloads".to_string());
            }
        }
        if !reasons.is_empty() {
            warn!(tx_id = %tx_id, reasons = reasons.len(), "proposal rejected");
            return Err(GatewayError::ProposalRejected { reasons });
        }
        Ok(responses)
    }

    fn proposal(
        &self,
        identity: &Identity,
        tx_id: &TxId,
        request: &TransactionRequest,
    ) -> TransactionProposal {
        TransactionProposal {
            channel: self.channel.clone(),
            chaincode_id: self.chaincode_id.clone(),
            tx_id: tx_id.clone(),
            fcn: request.fcn.clone(),
            args: request.args.clone(),
            creator: identity.enrollment_id.clone(),
        }
    }

    async fn identity(&self, enrollment_id: &str) -> Result<Identity, GatewayError> {
        self.resolver
            .resolve(enrollment_id)
            .await?
            .ok_or_else(|| GatewayError::UnknownIdentity(enrollment_id.to_string()))
    }

    fn architecture(&self) -> Result<&weft_topology::ChannelArchitecture, GatewayError> {
        self.organization.channel(&self.channel).ok_or_else(|| {
            GatewayError::Precondition(format!(
                "organization {} does not participate in channel {}",
                self.organization.name, self.channel
            ))
        })
    }
}
