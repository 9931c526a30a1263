//! Identity resolution boundary.
//!
//! Submissions name their invoking identity explicitly; the gateway
//! never holds a process-wide "current user". Resolution is behind a
//! trait so the gateway does not care where credentials live.

use crate::error::GatewayError;
use async_trait::async_trait;
use weft_sdk::types::Identity;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Credentials for an enrollment id. `Ok(None)` when the id was
    /// never enrolled.
    async fn resolve(&self, enrollment_id: &str) -> Result<Option<Identity>, GatewayError>;
}
