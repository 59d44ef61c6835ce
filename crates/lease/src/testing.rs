use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use ovfdeploy_vim::{
    BoxFuture, ImportSpec, ImportSpecParams, ImportSpecResult, LeaseInfo, LeaseState,
    ManagedObjectRef, RemoteError, VimConnection,
};

/// Scripted connection that records every lease call.
///
/// `lease_state` pops from `states`; once the script runs dry the lease
/// keeps reporting `initializing`.
#[derive(Default)]
pub(crate) struct MockVim {
    states: Mutex<VecDeque<LeaseState>>,
    calls: Mutex<Vec<&'static str>>,
    percents: Mutex<Vec<u8>>,
    pub(crate) fail_state: AtomicBool,
    pub(crate) fail_progress: AtomicBool,
    pub(crate) fail_complete: AtomicBool,
    pub(crate) fail_abort: AtomicBool,
}

impl MockVim {
    pub(crate) fn with_states(states: Vec<LeaseState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub(crate) fn percents(&self) -> Vec<u8> {
        self.percents.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

fn failure(flag: &AtomicBool) -> Result<(), RemoteError> {
    if flag.load(Ordering::SeqCst) {
        Err(RemoteError::Connection("connection reset by peer".into()))
    } else {
        Ok(())
    }
}

impl VimConnection for MockVim {
    fn create_import_spec<'a>(
        &'a self,
        _descriptor: &'a str,
        _resource_pool: &'a ManagedObjectRef,
        _datastore: &'a ManagedObjectRef,
        _params: &'a ImportSpecParams,
    ) -> BoxFuture<'a, Result<ImportSpecResult, RemoteError>> {
        Box::pin(async move {
            self.record("create_import_spec");
            Err(RemoteError::fault("not scripted"))
        })
    }

    fn import_vapp<'a>(
        &'a self,
        _resource_pool: &'a ManagedObjectRef,
        _spec: &'a ImportSpec,
        _folder: &'a ManagedObjectRef,
        _host: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<ManagedObjectRef, RemoteError>> {
        Box::pin(async move {
            self.record("import_vapp");
            Ok(ManagedObjectRef::lease("session[52]"))
        })
    }

    fn lease_state<'a>(
        &'a self,
        _lease: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<LeaseState, RemoteError>> {
        Box::pin(async move {
            self.record("lease_state");
            failure(&self.fail_state)?;
            Ok(self
                .states
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(LeaseState::Initializing))
        })
    }

    fn lease_info<'a>(
        &'a self,
        _lease: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<LeaseInfo, RemoteError>> {
        Box::pin(async move {
            self.record("lease_info");
            Ok(LeaseInfo::default())
        })
    }

    fn lease_progress<'a>(
        &'a self,
        _lease: &'a ManagedObjectRef,
        percent: u8,
    ) -> BoxFuture<'a, Result<(), RemoteError>> {
        Box::pin(async move {
            self.record("lease_progress");
            failure(&self.fail_progress)?;
            self.percents.lock().unwrap().push(percent);
            Ok(())
        })
    }

    fn lease_complete<'a>(
        &'a self,
        _lease: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<(), RemoteError>> {
        Box::pin(async move {
            self.record("lease_complete");
            failure(&self.fail_complete)
        })
    }

    fn lease_abort<'a>(
        &'a self,
        _lease: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<(), RemoteError>> {
        Box::pin(async move {
            self.record("lease_abort");
            failure(&self.fail_abort)
        })
    }

    fn host_management_ip<'a>(
        &'a self,
        _host: &'a ManagedObjectRef,
    ) -> BoxFuture<'a, Result<String, RemoteError>> {
        Box::pin(async move { Ok("127.0.0.1".to_string()) })
    }

    fn session_cookie(&self) -> Option<String> {
        None
    }
}
