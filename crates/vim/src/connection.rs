//! The remote procedure call interface consumed by the deploy flow.

use std::future::Future;
use std::pin::Pin;

use crate::types::{
    ImportSpec, ImportSpecParams, ImportSpecResult, LeaseInfo, LeaseState, ManagedObjectRef,
};

/// Boxed future returned by [`VimConnection`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors surfaced by the remote endpoint or its transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The endpoint rejected the call; `message` is its localized text.
    #[error("remote fault: {message}")]
    Fault { message: String },

    #[error("connection error: {0}")]
    Connection(String),
}

impl RemoteError {
    pub fn fault(message: impl Into<String>) -> Self {
        RemoteError::Fault {
            message: message.into(),
        }
    }
}

/// Abstract connection to the virtualization management endpoint.
///
/// Implemented on top of whatever transport the embedding application
/// uses. Keeping the calls behind a trait lets the deploy flow and the
/// lease state machine be driven by mocks in tests.
pub trait VimConnection: Send + Sync {
    /// Validates `descriptor` against the target and produces an import spec.
    fn create_import_spec<'a>(
        &'a self,
        descriptor: &'a str,
        resource_pool: &'a ManagedObjectRef,
        datastore: &'a ManagedObjectRef,
        params: &'a ImportSpecParams,
    ) -> BoxFuture<'a, Result<ImportSpecResult, RemoteError>>;

    /// Starts the import and returns a reference to the new lease.
    fn import_vapp<'a>(
        &'a self,
        resource_pool: &'a ManagedObjectRef,
        spec: &'a ImportSpec,
        folder: &'a ManagedObjectRef,
        host: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<ManagedObjectRef, RemoteError>>;

    /// Reads the current lease state.
    fn lease_state<'a>(
        &'a self,
        lease: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<LeaseState, RemoteError>>;

    /// Reads device URLs and the target entity of a ready lease.
    fn lease_info<'a>(
        &'a self,
        lease: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<LeaseInfo, RemoteError>>;

    fn lease_progress<'a>(
        &'a self,
        lease: &'a ManagedObjectRef,
        percent: u8,
    ) -> BoxFuture<'a, Result<(), RemoteError>>;

    fn lease_complete<'a>(
        &'a self,
        lease: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<(), RemoteError>>;

    fn lease_abort<'a>(
        &'a self,
        lease: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<(), RemoteError>>;

    /// Returns the management IP address through which `host` is reachable.
    fn host_management_ip<'a>(
        &'a self,
        host: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<String, RemoteError>>;

    /// Session cookie to attach to direct HTTP transfers, if any.
    fn session_cookie(&self) -> Option<String>;
}
