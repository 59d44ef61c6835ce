use std::sync::Arc;

/// Callback invoked after every chunk handed to the outbound body.
pub type ProgressFn = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// Snapshot of a single transfer's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes handed to the destination so far.
    pub transferred: u64,
    /// Total payload size, `None` when the source did not announce one.
    pub total: Option<u64>,
}

impl TransferProgress {
    pub fn new(transferred: u64, total: Option<u64>) -> Self {
        Self { transferred, total }
    }

    /// Bytes left to send, when the total is known.
    pub fn remaining(&self) -> Option<u64> {
        self.total.map(|t| t.saturating_sub(self.transferred))
    }

    /// Completion percentage (0-100), rounded down.
    ///
    /// Returns `None` while the total is unknown or zero.
    pub fn percent(&self) -> Option<u8> {
        match self.total {
            Some(total) if total > 0 => {
                let done = self.transferred.min(total) as u128;
                Some((done * 100 / total as u128) as u8)
            }
            _ => None,
        }
    }
}
