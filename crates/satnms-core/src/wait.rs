// ── Convergence polling ──
//
// The NMS applies configuration on its own cycle and RF links take tens of
// seconds to re-acquire, so every wait is a bounded poll loop. The outcome is
// a value, not an error: the caller decides whether a timeout fails a test.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// The condition held after `polls` probes.
    Reached { elapsed: Duration, polls: u32 },
    /// The timeout expired first.
    TimedOut { elapsed: Duration, polls: u32 },
}

impl Convergence {
    pub fn is_reached(&self) -> bool {
        matches!(self, Self::Reached { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Reached { elapsed, .. } | Self::TimedOut { elapsed, .. } => *elapsed,
        }
    }

    pub fn polls(&self) -> u32 {
        match self {
            Self::Reached { polls, .. } | Self::TimedOut { polls, .. } => *polls,
        }
    }
}

impl From<Convergence> for bool {
    fn from(c: Convergence) -> Self {
        c.is_reached()
    }
}

/// Probe until `probe` returns `true` or `timeout` expires.
///
/// The first probe runs immediately. The whole loop, slow probes included,
/// is cut off at `timeout + interval`. A timeout too large to represent
/// waits without a deadline.
pub async fn poll_until<F, Fut>(interval: Duration, timeout: Duration, mut probe: F) -> Convergence
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let deadline = start.checked_add(timeout);
    let mut polls = 0u32;

    let run = async {
        loop {
            polls += 1;
            if probe().await {
                return true;
            }
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };
            tokio::time::sleep(pause).await;
        }
    };

    let reached = match timeout.checked_add(interval) {
        Some(bound) => tokio::time::timeout(bound, run).await.unwrap_or(false),
        None => run.await,
    };

    let elapsed = start.elapsed();
    if reached {
        Convergence::Reached { elapsed, polls }
    } else {
        Convergence::TimedOut { elapsed, polls }
    }
}
