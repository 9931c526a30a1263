//! Port implementations connecting the gateway to the provisioner.

use async_trait::async_trait;
use std::sync::Arc;
use weft_gateway::{GatewayError, IdentityResolver};
use weft_provisioner::EnrollmentManager;
use weft_sdk::types::Identity;

/// Resolves gateway identities from an organization's credential store.
pub struct StoredIdentityResolver {
    enrollment: Arc<EnrollmentManager>,
}

impl StoredIdentityResolver {
    pub fn new(enrollment: Arc<EnrollmentManager>) -> Self {
        Self { enrollment }
    }
}

#[async_trait]
impl IdentityResolver for StoredIdentityResolver {
    async fn resolve(&self, enrollment_id: &str) -> Result<Option<Identity>, GatewayError> {
        self.enrollment
            .identity(enrollment_id)
            .map_err(|err| GatewayError::Identity(err.to_string()))
    }
}
