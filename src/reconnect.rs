//! Coordinated reconnection.
//!
//! Both a transport fault and a server `RECONNECT` can ask for a reconnect,
//! often at nearly the same moment. [`ReconnectCoordinator`] lets exactly one
//! cycle run; concurrent requests return immediately.
//!
//! A cycle is: close the old link, wait the backoff, connect and rejoin,
//! wait the settle delay, release. The shutdown token is checked before
//! every phase and raced against every wait, so an explicit disconnect
//! always wins over a pending reconnect.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_RECONNECT_BACKOFF, DEFAULT_SETTLE_DELAY};
use crate::error::ClientError;

/// Something that can be reconnected.
#[async_trait]
pub trait Reconnect: Send + Sync {
    /// Whether the link is up or coming up, making a reconnect pointless.
    fn is_live(&self) -> bool;

    /// Drop the current link.
    async fn close(&self);

    /// Connect again and rejoin every retained channel.
    async fn connect(&self) -> Result<(), ClientError>;
}

/// How a reconnect request ended.
#[derive(Debug)]
#[non_exhaustive]
pub enum ReconnectOutcome {
    /// The link was re-established.
    Reconnected,
    /// Another cycle was already running; this request did nothing.
    AlreadyInProgress,
    /// The link was already up or coming up.
    NotNeeded,
    /// An explicit disconnect stopped the cycle.
    Cancelled,
    /// The connect attempt failed; nothing retries until the next trigger.
    Failed(ClientError),
}

/// Single-flight reconnect driver.
#[derive(Debug)]
pub struct ReconnectCoordinator {
    lock: Mutex<()>,
    backoff: Duration,
    settle: Duration,
}

impl Default for ReconnectCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_BACKOFF, DEFAULT_SETTLE_DELAY)
    }
}

impl ReconnectCoordinator {
    /// Create a coordinator waiting `backoff` before reconnecting and
    /// `settle` after.
    pub fn new(backoff: Duration, settle: Duration) -> Self {
        Self {
            lock: Mutex::new(()),
            backoff,
            settle,
        }
    }

    /// Whether a cycle is running right now.
    pub fn in_progress(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// Run one reconnect cycle for `target`, unless one is already running.
    pub async fn reconnect<T>(&self, target: &T, shutdown: &CancellationToken) -> ReconnectOutcome
    where
        T: Reconnect + ?Sized,
    {
        let Ok(_guard) = self.lock.try_lock() else {
            debug!("reconnect already in progress");
            return ReconnectOutcome::AlreadyInProgress;
        };

        if shutdown.is_cancelled() {
            return ReconnectOutcome::Cancelled;
        }
        if target.is_live() {
            debug!("link is live, reconnect not needed");
            return ReconnectOutcome::NotNeeded;
        }

        target.close().await;

        info!("reconnecting in {:?}", self.backoff);
        if !wait(self.backoff, shutdown).await {
            return ReconnectOutcome::Cancelled;
        }

        if let Err(e) = target.connect().await {
            if shutdown.is_cancelled() {
                debug!("disconnected while reconnecting: {}", e);
                return ReconnectOutcome::Cancelled;
            }
            warn!("reconnect failed: {}", e);
            return ReconnectOutcome::Failed(e);
        }
        if shutdown.is_cancelled() {
            debug!("disconnected while reconnecting");
            target.close().await;
            return ReconnectOutcome::Cancelled;
        }

        info!("reconnected");
        wait(self.settle, shutdown).await;
        ReconnectOutcome::Reconnected
    }
}

/// Sleep for `duration`; `false` if `shutdown` fired first.
async fn wait(duration: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
