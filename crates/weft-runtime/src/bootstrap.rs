//! Startup choreography: from configuration files to a serving facade.
//!
//! The order matters and every step waits for real readiness, never a
//! fixed sleep:
//!
//! 1. build the topology graph,
//! 2. enroll every organization's bootstrap users,
//! 3. create each channel and poll until the orderer reports it visible,
//! 4. join every participating organization's peers,
//! 5. install the channel's chaincode on all peers,
//! 6. instantiate it from the creator organization and poll until
//!    queryable,
//! 7. assemble the transaction gateway and REST state.

use crate::adapters::StoredIdentityResolver;
use anyhow::{bail, Context, Result};
use axum::Router;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use weft_gateway::TransactionGateway;
use weft_provisioner::{ChaincodeInstaller, ChannelProvisioner, EnrollmentManager};
use weft_rest::AppState;
use weft_sdk::ports::LedgerSdk;
use weft_sdk::types::Identity;
use weft_topology::{AppConfig, NetworkConfig, Topology};

/// A fully provisioned deployment, ready to serve.
pub struct Runtime {
    app: AppConfig,
    gateway: Arc<TransactionGateway>,
    enrollment: BTreeMap<String, Arc<EnrollmentManager>>,
}

impl Runtime {
    /// Listen address for the facade, from configuration.
    pub fn rest_addr(&self) -> String {
        format!("{}:{}", self.app.rest.host, self.app.rest.port)
    }

    /// Assemble the facade router.
    pub fn router(&self) -> Router {
        let state = AppState {
            gateway: Arc::clone(&self.gateway),
            enrollment: Arc::clone(&self.enrollment[&self.app.registrar.organization]),
            registrar: self.app.registrar.clone(),
        };
        weft_rest::router(state, self.app.rest.client_dir.as_deref())
    }

    pub fn gateway(&self) -> &Arc<TransactionGateway> {
        &self.gateway
    }
}

/// Provision everything the configuration describes.
pub async fn bootstrap(
    network: &NetworkConfig,
    app: AppConfig,
    base_dir: &Path,
    sdk: &dyn LedgerSdk,
) -> Result<Runtime> {
    let topology =
        Topology::build(network, &app, base_dir, sdk).context("building topology")?;

    // Enrollment first; every later step signs with these identities.
    let mut enrollment = BTreeMap::new();
    for org in topology.organizations() {
        if org.ca.is_none() {
            continue;
        }
        let manager = Arc::new(
            EnrollmentManager::create_store(Arc::clone(org), &app.store_path_prefix)
                .with_context(|| format!("opening credential store for {}", org.name))?,
        );
        let users = &network.organizations[&org.name].users;
        manager
            .enroll_all(users)
            .await
            .with_context(|| format!("enrolling users of {}", org.name))?;
        info!(organization = %org.name, users = users.len(), "bootstrap users enrolled");
        enrollment.insert(org.name.clone(), manager);
    }

    let channels = ChannelProvisioner::new(app.readiness.clone(), base_dir);
    let installer = ChaincodeInstaller::new(app.readiness.clone());

    for (channel_name, channel) in &app.channels {
        let creator_org = topology
            .organization(&channel.creator.organization)
            .context("creator organization vanished after validation")?;
        let creator = enrolled(
            &enrollment,
            &channel.creator.organization,
            &channel.creator.user,
        )?;

        channels
            .create(channel_name, channel, creator_org, &creator)
            .await
            .with_context(|| format!("creating channel {}", channel_name))?;
        channels
            .wait_until_ready(channel_name, creator_org)
            .await
            .with_context(|| format!("waiting for channel {}", channel_name))?;

        let spec = channel.chaincode.to_spec();
        for (org_name, membership) in &channel.participating_peer_organizations {
            let org = topology
                .organization(org_name)
                .context("participant vanished after validation")?;
            let joiner = enrolled(&enrollment, org_name, &membership.joiner_user)?;
            channels
                .join(channel_name, org, &joiner)
                .await
                .with_context(|| format!("joining {} to channel {}", org_name, channel_name))?;
            installer
                .install(&org.channel(channel_name).context("missing architecture")?.peers, &spec, &joiner)
                .await
                .with_context(|| format!("installing chaincode on {}", org_name))?;
        }

        installer
            .instantiate(
                creator_org
                    .channel(channel_name)
                    .context("missing architecture")?,
                &spec,
                "init",
                &channel.chaincode.init_args,
                &creator,
            )
            .await
            .with_context(|| format!("instantiating chaincode on {}", channel_name))?;
        channels.mark_initialized(channel_name);
        info!(channel = channel_name, chaincode = %spec.id, "channel provisioned");
    }

    let invoking_org = topology
        .organization(&app.rest.invoking_organization)
        .context("facade organization vanished after validation")?
        .clone();
    let resolver = StoredIdentityResolver::new(Arc::clone(
        &enrollment[&app.rest.invoking_organization],
    ));
    let gateway = TransactionGateway::new(
        invoking_org,
        app.default_channel.clone(),
        app.channels[&app.default_channel].chaincode.id.clone(),
        Arc::new(resolver),
        app.commit_timeout(),
    )
    .context("assembling transaction gateway")?;

    Ok(Runtime {
        app,
        gateway: Arc::new(gateway),
        enrollment,
    })
}

fn enrolled(
    enrollment: &BTreeMap<String, Arc<EnrollmentManager>>,
    org: &str,
    user: &str,
) -> Result<Identity> {
    let manager = enrollment
        .get(org)
        .with_context(|| format!("organization {} has no credential store", org))?;
    match manager.identity(user)? {
        Some(identity) => Ok(identity),
        None => bail!("user {} of organization {} is not enrolled", user, org),
    }
}
