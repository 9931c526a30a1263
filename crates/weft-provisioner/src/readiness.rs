//! Bounded polling for eventually-consistent platform state.
//!
//! The ordering service and peers acknowledge requests before the result
//! is visible. Instead of sleeping a fixed interval and hoping, callers
//! poll a readiness probe with exponential backoff and give up after a
//! configured number of attempts.

use crate::error::ProvisionError;
use std::future::Future;
use tokio::time::sleep;
use tracing::{debug, warn};
use weft_sdk::SdkError;
use weft_topology::ReadinessConfig;

/// Poll `probe` until it reports ready. The delay starts at the
/// configured initial value and doubles per attempt up to the maximum.
/// Probe errors abort immediately; only `Ok(false)` is retried.
pub async fn poll_ready<F, Fut>(
    readiness: &ReadinessConfig,
    what: &str,
    mut probe: F,
) -> Result<(), ProvisionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, SdkError>>,
{
    let mut delay = readiness.initial_delay();
    for attempt in 1..=readiness.max_attempts {
        if probe().await? {
            debug!(what, attempt, "ready");
            return Ok(());
        }
        if attempt < readiness.max_attempts {
            debug!(what, attempt, delay_ms = delay.as_millis() as u64, "not ready, backing off");
            sleep(delay).await;
            delay = (delay * 2).min(readiness.max_delay());
        }
    }
    warn!(what, attempts = readiness.max_attempts, "gave up waiting");
    Err(ProvisionError::NotReady {
        what: what.to_string(),
        attempts: readiness.max_attempts,
    })
}
