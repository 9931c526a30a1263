//! Shared state of the simulated network plus its fault-injection and
//! inspection surface.

use crate::error::SdkError;
use crate::ports::{CertificateAuthority, LedgerSdk, OrdererNode, PeerNode};
use crate::sim::chaincode::LedgerWrite;
use crate::sim::nodes::{SimCa, SimOrderer, SimPeer};
use crate::types::{CommitCode, CommitEvent, Endpoint, OrdererEndpoint, PeerEndpoint};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// One channel's state on the simulated network.
#[derive(Debug, Default)]
pub(crate) struct SimChannel {
    /// Readiness polls remaining before the channel reports visible.
    pub visibility_countdown: u32,
    /// Peer names that have joined.
    pub joined: BTreeSet<String>,
    /// Chaincode id instantiated on the channel, if any.
    pub instantiated: Option<String>,
    /// Enrollment id that instantiated the chaincode. Recorded at commit
    /// and consulted by the chaincode's authorization checks.
    pub admin: Option<String>,
    /// Committed ledger state: account name to balance.
    pub accounts: BTreeMap<String, i64>,
    /// Endorsed-but-uncommitted write sets keyed by tx id.
    pub pending: BTreeMap<String, LedgerWrite>,
}

#[derive(Debug)]
pub(crate) struct SimInner {
    pub channels: BTreeMap<String, SimChannel>,
    /// Peer name to installed (chaincode id, version) pairs.
    pub installed: BTreeMap<String, BTreeSet<(String, String)>>,
    /// Per-CA registration table: (organization, enrollment id) to secret.
    pub secrets: BTreeMap<(String, String), String>,
    /// CA enroll call counts per enrollment id.
    pub enroll_counts: BTreeMap<String, u32>,
    /// Enrollment ids forced to fail at the CA.
    pub failing_enrollments: BTreeSet<String>,
    /// Peers whose proposals are forced to fail.
    pub failing_peers: BTreeSet<String>,
    /// When set, commit events are computed but never delivered.
    pub suppress_commit_events: bool,
    /// Commit code attached to delivered events.
    pub commit_code: CommitCode,
    /// Visibility countdown seeded into newly created channels.
    pub channel_visibility_delay: u32,
    /// Delay between broadcast acceptance and commit delivery.
    pub commit_latency: Duration,
    /// Registered commit waiters keyed by tx id.
    pub waiters: BTreeMap<String, Vec<oneshot::Sender<CommitEvent>>>,
    pub streams_opened: u64,
    pub streams_closed: u64,
}

impl Default for SimInner {
    fn default() -> Self {
        Self {
            channels: BTreeMap::new(),
            installed: BTreeMap::new(),
            secrets: BTreeMap::new(),
            enroll_counts: BTreeMap::new(),
            failing_enrollments: BTreeSet::new(),
            failing_peers: BTreeSet::new(),
            suppress_commit_events: false,
            commit_code: CommitCode::Valid,
            channel_visibility_delay: 0,
            commit_latency: Duration::from_millis(10),
            waiters: BTreeMap::new(),
            streams_opened: 0,
            streams_closed: 0,
        }
    }
}

/// The simulated ledger network. Cheap to clone; all handles share state.
#[derive(Clone, Default)]
pub struct SimNetwork {
    pub(crate) inner: Arc<Mutex<SimInner>>,
}

impl SimNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a CA registration (bootstrap identities carry pre-shared
    /// secrets rather than going through `register`). Registrations are
    /// scoped to the organization's CA.
    pub fn register_secret(&self, org: &str, enrollment_id: &str, secret: &str) {
        self.inner
            .lock()
            .secrets
            .insert((org.to_string(), enrollment_id.to_string()), secret.to_string());
    }

    // Fault injection

    /// Force every proposal endorsed by `peer` to fail.
    pub fn fail_proposals_from(&self, peer: &str) {
        self.inner.lock().failing_peers.insert(peer.to_string());
    }

    /// Clear a proposal fault set by [`Self::fail_proposals_from`].
    pub fn restore_peer(&self, peer: &str) {
        self.inner.lock().failing_peers.remove(peer);
    }

    /// Compute but never deliver commit events (lost-notification case).
    pub fn suppress_commit_events(&self, suppress: bool) {
        self.inner.lock().suppress_commit_events = suppress;
    }

    /// Attach this code to subsequent commit events.
    pub fn override_commit_code(&self, code: CommitCode) {
        self.inner.lock().commit_code = code;
    }

    /// Newly created channels report not-visible for this many polls.
    pub fn set_channel_visibility_delay(&self, polls: u32) {
        self.inner.lock().channel_visibility_delay = polls;
    }

    /// Delay between broadcast acceptance and commit event delivery.
    pub fn set_commit_latency(&self, latency: Duration) {
        self.inner.lock().commit_latency = latency;
    }

    /// Force enrollment of `enrollment_id` to fail at the CA.
    pub fn fail_enrollment(&self, enrollment_id: &str) {
        self.inner
            .lock()
            .failing_enrollments
            .insert(enrollment_id.to_string());
    }

    // Inspection

    /// How many times the CA has enrolled this id.
    pub fn enroll_count(&self, enrollment_id: &str) -> u32 {
        self.inner
            .lock()
            .enroll_counts
            .get(enrollment_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn streams_opened(&self) -> u64 {
        self.inner.lock().streams_opened
    }

    pub fn streams_closed(&self) -> u64 {
        self.inner.lock().streams_closed
    }

    /// Committed balance of an account, if the channel and account exist.
    pub fn balance(&self, channel: &str, account: &str) -> Option<i64> {
        self.inner
            .lock()
            .channels
            .get(channel)
            .and_then(|c| c.accounts.get(account).copied())
    }

    pub fn channel_exists(&self, channel: &str) -> bool {
        self.inner.lock().channels.contains_key(channel)
    }

    pub fn peer_joined(&self, channel: &str, peer: &str) -> bool {
        self.inner
            .lock()
            .channels
            .get(channel)
            .map(|c| c.joined.contains(peer))
            .unwrap_or(false)
    }
}

impl LedgerSdk for SimNetwork {
    fn certificate_authority(
        &self,
        org: &str,
        _endpoint: &Endpoint,
    ) -> Result<Arc<dyn CertificateAuthority>, SdkError> {
        Ok(Arc::new(SimCa {
            org: org.to_string(),
            inner: Arc::clone(&self.inner),
        }))
    }

    fn peer(
        &self,
        org: &str,
        name: &str,
        endpoint: PeerEndpoint,
    ) -> Result<Arc<dyn PeerNode>, SdkError> {
        Ok(Arc::new(SimPeer {
            // Queried by qualified name so same-named peers in different
            // organizations stay distinct.
            name: format!("{}/{}", org, name),
            org: org.to_string(),
            has_events: endpoint.events.is_some(),
            inner: Arc::clone(&self.inner),
        }))
    }

    fn orderer(
        &self,
        org: &str,
        name: &str,
        _endpoint: OrdererEndpoint,
    ) -> Result<Arc<dyn OrdererNode>, SdkError> {
        Ok(Arc::new(SimOrderer {
            name: format!("{}/{}", org, name),
            org: org.to_string(),
            inner: Arc::clone(&self.inner),
        }))
    }
}
