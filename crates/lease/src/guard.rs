use std::ops::Deref;

use crate::error::LeaseError;
use crate::lease::Lease;

/// Scoped owner of a [`Lease`].
///
/// Leaving scope without calling [`LeaseGuard::complete`] or
/// [`LeaseGuard::abort`] aborts the lease in the background, so every exit
/// path (early return, error, dropped future) releases it.
#[derive(Debug)]
pub struct LeaseGuard {
    lease: Lease,
}

impl LeaseGuard {
    pub fn new(lease: Lease) -> Self {
        Self { lease }
    }

    pub fn lease(&self) -> &Lease {
        &self.lease
    }

    /// Completes the lease and disarms the guard.
    pub async fn complete(self) -> Result<(), LeaseError> {
        self.lease.complete().await
    }

    /// Aborts the lease and waits for the remote call to finish.
    pub async fn abort(self) {
        self.lease.abort().await;
    }
}

impl Deref for LeaseGuard {
    type Target = Lease;

    fn deref(&self) -> &Lease {
        &self.lease
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        self.lease.spawn_abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockVim;
    use ovfdeploy_vim::ManagedObjectRef;
    use std::sync::Arc;
    use std::time::Duration;

    fn guard_with(mock: &Arc<MockVim>) -> LeaseGuard {
        LeaseGuard::new(Lease::attach(
            mock.clone(),
            ManagedObjectRef::lease("session[7]"),
        ))
    }

    async fn wait_for_calls(mock: &MockVim, name: &str, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while mock.count(name) < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("background call never happened");
    }

    #[tokio::test]
    async fn drop_aborts_in_background() {
        let mock = Arc::new(MockVim::default());
        {
            let guard = guard_with(&mock);
            assert!(guard.report_progress(10).await);
        }
        wait_for_calls(&mock, "lease_abort", 1).await;
        assert_eq!(mock.count("lease_complete"), 0);
    }

    #[tokio::test]
    async fn complete_disarms() {
        let mock = Arc::new(MockVim::default());
        let guard = guard_with(&mock);
        guard.complete().await.unwrap();

        tokio::task::yield_now().await;
        assert_eq!(mock.count("lease_complete"), 1);
        assert_eq!(mock.count("lease_abort"), 0);
    }

    #[tokio::test]
    async fn explicit_abort_happens_once() {
        let mock = Arc::new(MockVim::default());
        let guard = guard_with(&mock);
        guard.abort().await;

        tokio::task::yield_now().await;
        assert_eq!(mock.count("lease_abort"), 1);
    }

    #[tokio::test]
    async fn dropped_future_aborts() {
        let mock = Arc::new(MockVim::default());
        let guard = guard_with(&mock);

        let task = tokio::spawn(async move {
            let _guard = guard;
            std::future::pending::<()>().await;
        });
        task.abort();
        let _ = task.await;

        wait_for_calls(&mock, "lease_abort", 1).await;
    }

    #[test]
    fn drop_outside_runtime_is_harmless() {
        let mock = Arc::new(MockVim::default());
        drop(guard_with(&mock));
        assert_eq!(mock.count("lease_abort"), 0);
    }
}
