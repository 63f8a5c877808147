//! Retry-until-visible.
//!
//! The ledger offers no read-after-write guarantee. After a write is
//! accepted the workflow polls until its effect shows up, bounded both by
//! attempt count and by wall-clock time.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::{GrantError, Result};

/// Polling bounds for [`wait_until_visible`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityPolicy {
    /// Probes before giving up. At least one.
    pub attempts: u32,
    /// Sleep before each probe.
    pub interval: Duration,
    /// Overall deadline across all attempts.
    pub timeout: Duration,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Sleep, probe, repeat until `probe` yields a value.
///
/// Probe errors propagate at once. Running out of attempts or time is
/// [`GrantError::Consistency`] naming `subject`.
pub async fn wait_until_visible<T, F, Fut>(
    policy: &VisibilityPolicy,
    subject: &str,
    mut probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let mut attempts = 0u32;
    let search = async {
        while attempts < policy.attempts {
            tokio::time::sleep(policy.interval).await;
            attempts += 1;
            if let Some(found) = probe().await? {
                return Ok(Some(found));
            }
            debug!(%subject, attempt = attempts, "not visible yet");
        }
        Ok::<_, GrantError>(None)
    };

    let outcome = tokio::time::timeout(policy.timeout, search).await;
    match outcome {
        Ok(Ok(Some(found))) => Ok(found),
        Ok(Err(e)) => Err(e),
        Ok(Ok(None)) | Err(_) => Err(GrantError::Consistency {
            subject: subject.to_string(),
            attempts,
        }),
    }
}
