//! Data types for the deploy flow.

use ovfdeploy_transfer::TransferProgress;
use ovfdeploy_vim::ManagedObjectRef;

/// Event emitted while a deployment runs.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    /// Non-fatal message returned with the import spec.
    Warning { message: String },
    /// A chunk of `device_id`'s file was handed to the upload body.
    TransferProgress {
        device_id: String,
        progress: TransferProgress,
    },
    /// Overall percentage sent to the lease.
    LeaseProgress { percent: u8 },
    Completed { vm: ManagedObjectRef },
    Failed { error: String },
}

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    /// The virtual machine created by the import.
    pub vm: ManagedObjectRef,
    /// Warnings the endpoint returned with the import spec.
    pub warnings: Vec<String>,
}
