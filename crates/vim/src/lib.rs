//! Remote object model seam for OVF deployment.
//!
//! Holds the data exchanged with the virtualization management endpoint
//! (managed-object references, import-spec parameters and results, lease
//! state and device URLs) and the [`VimConnection`] trait through which
//! every remote procedure call is issued. The transport behind the trait
//! is opaque to the rest of the workspace.

pub mod connection;
pub mod types;

pub use connection::{BoxFuture, RemoteError, VimConnection};
pub use types::{
    DeviceUrl, DiskProvisioning, FileItem, ImportSpec, ImportSpecParams, ImportSpecResult,
    KeyValue, LeaseInfo, LeaseState, ManagedObjectRef, NetworkMapping,
};
