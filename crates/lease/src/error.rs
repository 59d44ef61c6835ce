use std::time::Duration;

use ovfdeploy_vim::RemoteError;

/// Errors produced by the lease state machine.
#[derive(Debug, thiserror::Error)]
pub enum LeaseError {
    /// The lease entered the `error` state.
    #[error("lease failed: {message}")]
    Failed { message: String },

    #[error("lease not ready after {waited:?}")]
    Timeout { waited: Duration },

    #[error("cancelled")]
    Cancelled,

    #[error("lease already released")]
    AlreadyReleased,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
