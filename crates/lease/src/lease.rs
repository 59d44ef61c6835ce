use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use ovfdeploy_vim::{ImportSpec, LeaseInfo, LeaseState, ManagedObjectRef, VimConnection};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::LeaseError;
use crate::poll::PollConfig;

/// Local handle to a remote import lease.
///
/// The remote side owns the lease state; every read goes through a poll.
/// Release (complete or abort) happens at most once per handle.
pub struct Lease {
    conn: Arc<dyn VimConnection>,
    reference: ManagedObjectRef,
    released: AtomicBool,
    last_percent: AtomicU8,
}

impl Lease {
    /// Starts an import and returns the new lease, still `initializing`.
    pub async fn acquire(
        conn: Arc<dyn VimConnection>,
        resource_pool: &ManagedObjectRef,
        spec: &ImportSpec,
        folder: &ManagedObjectRef,
        host: &ManagedObjectRef,
    ) -> Result<Self, LeaseError> {
        let reference = conn.import_vapp(resource_pool, spec, folder, host).await?;
        info!(lease = %reference, pool = %resource_pool, "import lease acquired");
        Ok(Self::attach(conn, reference))
    }

    /// Wraps an existing lease reference.
    pub fn attach(conn: Arc<dyn VimConnection>, reference: ManagedObjectRef) -> Self {
        Self {
            conn,
            reference,
            released: AtomicBool::new(false),
            last_percent: AtomicU8::new(0),
        }
    }

    pub fn reference(&self) -> &ManagedObjectRef {
        &self.reference
    }

    /// Polls the current remote state.
    pub async fn state(&self) -> Result<LeaseState, LeaseError> {
        Ok(self.conn.lease_state(&self.reference).await?)
    }

    pub async fn info(&self) -> Result<LeaseInfo, LeaseError> {
        Ok(self.conn.lease_info(&self.reference).await?)
    }

    /// Blocks until the lease leaves `initializing`.
    ///
    /// Succeeds on `ready`; fails with [`LeaseError::Failed`] on `error`,
    /// [`LeaseError::Timeout`] once `poll.timeout` elapses, and
    /// [`LeaseError::Cancelled`] when `cancel` fires.
    pub async fn await_ready(
        &self,
        poll: &PollConfig,
        cancel: &CancellationToken,
    ) -> Result<(), LeaseError> {
        let started = Instant::now();
        let deadline = poll.timeout.map(|t| started + t);
        let mut attempt: u32 = 0;

        loop {
            let state = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LeaseError::Cancelled),
                state = self.state() => state?,
            };

            match state {
                LeaseState::Ready => {
                    info!(lease = %self.reference, polls = attempt + 1, "lease ready");
                    return Ok(());
                }
                LeaseState::Error { message } => {
                    warn!(lease = %self.reference, error = %message, "lease entered error state");
                    return Err(LeaseError::Failed { message });
                }
                LeaseState::Initializing => {}
            }

            attempt = attempt.saturating_add(1);
            let mut delay = poll.delay_for_attempt(attempt);
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(LeaseError::Timeout {
                        waited: now - started,
                    });
                }
                delay = delay.min(deadline - now);
            }

            trace!(lease = %self.reference, attempt, ?delay, "lease still initializing");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LeaseError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Sends a progress percentage to the remote side.
    ///
    /// Values above 100 are clamped and values below the last reported one
    /// are dropped, so the remote side only ever sees a non-decreasing
    /// sequence. Remote failures are logged, not returned. Returns `true`
    /// if the update was sent.
    pub async fn report_progress(&self, percent: u8) -> bool {
        let percent = percent.min(100);
        let previous = self.last_percent.fetch_max(percent, Ordering::SeqCst);
        if percent < previous {
            trace!(lease = %self.reference, percent, previous, "dropping stale progress");
            return false;
        }
        if self.is_released() {
            return false;
        }

        if let Err(e) = self.conn.lease_progress(&self.reference, percent).await {
            warn!(lease = %self.reference, percent, error = %e, "lease progress update failed");
        }
        true
    }

    /// Highest percentage reported so far.
    pub fn last_percent(&self) -> u8 {
        self.last_percent.load(Ordering::SeqCst)
    }

    /// Completes the lease. Only the first release call reaches the remote
    /// side; later ones fail with [`LeaseError::AlreadyReleased`].
    ///
    /// If the remote side rejects the completion, one best-effort abort is
    /// sent and the completion error is returned.
    pub async fn complete(&self) -> Result<(), LeaseError> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Err(LeaseError::AlreadyReleased);
        }
        if let Err(e) = self.conn.lease_complete(&self.reference).await {
            warn!(lease = %self.reference, error = %e, "lease completion failed, aborting");
            if let Err(abort) = self.conn.lease_abort(&self.reference).await {
                warn!(lease = %self.reference, error = %abort, "lease abort failed");
            }
            return Err(e.into());
        }
        info!(lease = %self.reference, "lease completed");
        Ok(())
    }

    /// Aborts the lease, best effort.
    ///
    /// A no-op when the lease was already released. Failures of the remote
    /// call are logged and swallowed.
    pub async fn abort(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            debug!(lease = %self.reference, "abort skipped, lease already released");
            return;
        }
        match self.conn.lease_abort(&self.reference).await {
            Ok(()) => info!(lease = %self.reference, "lease aborted"),
            Err(e) => warn!(lease = %self.reference, error = %e, "lease abort failed"),
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Fires an abort on the current runtime without waiting for it.
    pub(crate) fn spawn_abort(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let conn = Arc::clone(&self.conn);
        let reference = self.reference.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(lease = %reference, "lease dropped while held, aborting");
                handle.spawn(async move {
                    if let Err(e) = conn.lease_abort(&reference).await {
                        warn!(lease = %reference, error = %e, "lease abort failed");
                    }
                });
            }
            Err(_) => {
                warn!(lease = %reference, "lease dropped outside a runtime, abort skipped");
            }
        }
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("reference", &self.reference)
            .field("released", &self.is_released())
            .field("last_percent", &self.last_percent())
            .finish()
    }
}
