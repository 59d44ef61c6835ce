//! Deploy error types.

use ovfdeploy_lease::LeaseError;
use ovfdeploy_transfer::TransferError;
use ovfdeploy_vim::RemoteError;

/// Errors produced during an OVF deployment.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A mandatory request field was absent or empty.
    #[error("parameter {field} required")]
    MissingParameter { field: &'static str },

    #[error("network {0} mapped more than once")]
    DuplicateNetworkMapping(String),

    #[error("descriptor {location} unavailable: HTTP {status}")]
    DescriptorUnavailable { location: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint rejected the import spec. Messages are verbatim.
    #[error("import spec rejected: {}", .messages.join("; "))]
    RemoteValidation { messages: Vec<String> },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Lease(LeaseError),

    #[error("no device URL for device '{device_id}'")]
    DeviceUrlNotFound { device_id: String },

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("lease reported no imported entity")]
    MissingEntity,

    #[error("cancelled")]
    Cancelled,
}

impl From<LeaseError> for DeployError {
    fn from(e: LeaseError) -> Self {
        match e {
            LeaseError::Cancelled => DeployError::Cancelled,
            LeaseError::Remote(e) => DeployError::Remote(e),
            other => DeployError::Lease(other),
        }
    }
}
