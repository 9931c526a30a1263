//! Identity enrollment against an organization's certificate authority.

use crate::error::EnrollError;
use crate::store::CredentialStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use weft_sdk::ports::CertificateAuthority;
use weft_sdk::types::{Identity, RegistrationRequest};
use weft_topology::config::UserConfig;
use weft_topology::Organization;

/// Enrolls users of one organization and persists their credentials.
///
/// Enrollment is idempotent: a persisted identity is returned without
/// contacting the CA again, so restarts do not re-enroll.
pub struct EnrollmentManager {
    organization: Arc<Organization>,
    store: CredentialStore,
}

impl EnrollmentManager {
    /// Open the organization's credential store at
    /// `<store_path_prefix><organization name>`.
    pub fn create_store(
        organization: Arc<Organization>,
        store_path_prefix: &str,
    ) -> Result<Self, EnrollError> {
        let store = CredentialStore::open(format!("{}{}", store_path_prefix, organization.name))?;
        debug!(
            organization = %organization.name,
            store = %store.path().display(),
            "opened credential store"
        );
        Ok(Self {
            organization,
            store,
        })
    }

    pub fn organization(&self) -> &Arc<Organization> {
        &self.organization
    }

    /// Previously enrolled identity, if any.
    pub fn identity(&self, enrollment_id: &str) -> Result<Option<Identity>, EnrollError> {
        self.store.get(enrollment_id)
    }

    /// Enroll one user, returning the persisted identity when it already
    /// exists.
    pub async fn enroll(
        &self,
        enrollment_id: &str,
        secret: &str,
    ) -> Result<Identity, EnrollError> {
        if let Some(identity) = self.store.get(enrollment_id)? {
            debug!(
                organization = %self.organization.name,
                enrollment_id,
                "identity already enrolled, using stored credentials"
            );
            return Ok(identity);
        }
        let identity = self.ca()?.enroll(enrollment_id, secret).await?;
        self.store.put(&identity)?;
        info!(
            organization = %self.organization.name,
            enrollment_id,
            "enrolled identity"
        );
        Ok(identity)
    }

    /// Register a new enrollment id through an already-enrolled registrar,
    /// then enroll it with the secret the CA returned.
    pub async fn register_and_enroll(
        &self,
        request: &RegistrationRequest,
        registrar_id: &str,
    ) -> Result<Identity, EnrollError> {
        let registrar = self.store.get(registrar_id)?.ok_or_else(|| {
            EnrollError::RegistrarNotEnrolled {
                organization: self.organization.name.clone(),
                user: registrar_id.to_string(),
            }
        })?;
        let secret = self.ca()?.register(request, &registrar).await?;
        self.enroll(&request.enrollment_id, &secret).await
    }

    /// Enroll every configured user concurrently. One user's failure does
    /// not stop the others; failures are reported together.
    pub async fn enroll_all(
        &self,
        users: &BTreeMap<String, UserConfig>,
    ) -> Result<Vec<Identity>, EnrollError> {
        let results = futures::future::join_all(
            users
                .iter()
                .map(|(enrollment_id, user)| self.enroll(enrollment_id, &user.secret)),
        )
        .await;

        let mut identities = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (enrollment_id, result) in users.keys().zip(results) {
            match result {
                Ok(identity) => identities.push(identity),
                Err(err) => failures.push(format!("{}: {}", enrollment_id, err)),
            }
        }
        if failures.is_empty() {
            Ok(identities)
        } else {
            Err(EnrollError::Partial { failures })
        }
    }

    fn ca(&self) -> Result<&Arc<dyn CertificateAuthority>, EnrollError> {
        self.organization
            .ca
            .as_ref()
            .ok_or_else(|| EnrollError::NoCertificateAuthority {
                organization: self.organization.name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use weft_sdk::sim::SimNetwork;
    use weft_topology::testing::{sample_app, sample_network};
    use weft_topology::Topology;

    fn manager(network: &SimNetwork, prefix: &str) -> EnrollmentManager {
        let topology =
            Topology::build(&sample_network(), &sample_app(), Path::new("."), network).unwrap();
        let org0 = topology.organization("org0").unwrap().clone();
        EnrollmentManager::create_store(org0, prefix).unwrap()
    }

    fn prefix(dir: &tempfile::TempDir) -> String {
        format!("{}/store-", dir.path().display())
    }

    #[tokio::test]
    async fn test_enroll_persists_identity() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        network.register_secret("org0", "admin", "adminpw");
        let manager = manager(&network, &prefix(&dir));

        let identity = manager.enroll("admin", "adminpw").await.unwrap();
        assert_eq!(identity.organization, "org0");
        assert!(manager.identity("admin").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_enroll_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        network.register_secret("org0", "admin", "adminpw");
        let manager = manager(&network, &prefix(&dir));

        manager.enroll("admin", "adminpw").await.unwrap();
        manager.enroll("admin", "adminpw").await.unwrap();
        // Second call served from the store, not the CA.
        assert_eq!(network.enroll_count("admin"), 1);
    }

    #[tokio::test]
    async fn test_bad_secret_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        network.register_secret("org0", "admin", "adminpw");
        let manager = manager(&network, &prefix(&dir));

        let err = manager.enroll("admin", "wrong").await.unwrap_err();
        assert!(matches!(err, EnrollError::Sdk(_)));
        assert!(manager.identity("admin").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_requires_enrolled_registrar() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        network.register_secret("org0", "admin", "adminpw");
        let manager = manager(&network, &prefix(&dir));

        let request = RegistrationRequest {
            enrollment_id: "alice".to_string(),
            secret: None,
            role: "client".to_string(),
            affiliation: "org0.department1".to_string(),
        };
        let err = manager
            .register_and_enroll(&request, "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollError::RegistrarNotEnrolled { .. }));

        manager.enroll("admin", "adminpw").await.unwrap();
        let alice = manager
            .register_and_enroll(&request, "admin")
            .await
            .unwrap();
        assert_eq!(alice.enrollment_id, "alice");
        assert!(manager.identity("alice").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_enroll_all_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let network = SimNetwork::default();
        network.register_secret("org0", "admin", "adminpw");
        network.register_secret("org0", "Admin", "org0Adminpw");
        network.fail_enrollment("Admin");
        let manager = manager(&network, &prefix(&dir));

        let users = sample_network().organizations["org0"].users.clone();
        let err = manager.enroll_all(&users).await.unwrap_err();
        match err {
            EnrollError::Partial { failures } => assert_eq!(failures.len(), 1),
            other => panic!("unexpected error: {}", other),
        }
        // The healthy enrollment still went through.
        assert!(manager.identity("admin").unwrap().is_some());
    }
}
