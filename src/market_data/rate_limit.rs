//! Request pacing for public market-data APIs

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

/// Pause before every CoinGecko request, sized for the public tier limits
pub const REQUEST_DELAY: Duration = Duration::from_secs(30);

/// Gate awaited before every outbound request
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Resolve once the next request may be sent
    async fn acquire(&self);
}

/// Waits a fixed delay before each request.
///
/// Acquisitions are serialized: concurrent callers queue on the gate and
/// each one still sleeps the full delay.
#[derive(Debug)]
pub struct FixedDelay {
    delay: Duration,
    gate: Mutex<()>,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: Mutex::new(()),
        }
    }
}

#[async_trait]
impl RateLimiter for FixedDelay {
    async fn acquire(&self) {
        let _gate = self.gate.lock().await;
        tokio::time::sleep(self.delay).await;
    }
}

/// No pacing at all. For tests and offline sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

#[async_trait]
impl RateLimiter for NoDelay {
    async fn acquire(&self) {}
}
