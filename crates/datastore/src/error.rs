use ovfdeploy_transfer::TransferError;

/// Errors from datastore file access.
#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a status the operation does not expect.
    #[error("unexpected response status {status}")]
    UnexpectedResponse { status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}
