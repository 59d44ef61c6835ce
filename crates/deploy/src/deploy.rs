//! OVF deploy flow.
//!
//! Requests an import spec, opens an import lease, streams every disk file
//! to its negotiated device URL, and finally completes the lease. Once the
//! lease exists, every exit path completes or aborts it.

use std::future::Future;
use std::sync::Arc;

use ovfdeploy_lease::{Lease, LeaseGuard};
use ovfdeploy_transfer::{Destination, TransferEngine, TransferProgress};
use ovfdeploy_vim::{FileItem, ImportSpecResult, ManagedObjectRef, VimConnection};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::DeployError;
use crate::progress::{DONE_PERCENT, ProgressPlan, START_PERCENT};
use crate::request::DeploymentRequest;
use crate::settings::DeploySettings;
use crate::types::{DeployEvent, Deployment};

/// Deploys OVF packages through a [`VimConnection`].
///
/// Holds no per-deployment state; concurrent deployments may share one
/// deployer.
pub struct OvfDeployer {
    conn: Arc<dyn VimConnection>,
    engine: TransferEngine,
    settings: DeploySettings,
}

impl OvfDeployer {
    pub fn new(conn: Arc<dyn VimConnection>, settings: DeploySettings) -> Result<Self, DeployError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_client(conn, http, settings))
    }

    /// Uses `http` for descriptor fetches and disk uploads.
    pub fn with_client(
        conn: Arc<dyn VimConnection>,
        http: reqwest::Client,
        settings: DeploySettings,
    ) -> Self {
        Self {
            conn,
            engine: TransferEngine::new(http, settings.chunk_size),
            settings,
        }
    }

    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    /// Runs the whole deployment and returns the created VM.
    ///
    /// Every event is delivered, so a full channel holds the deployment
    /// back until the receiver catches up; a closed channel is ignored.
    /// Cancelling `cancel` aborts the lease (if one was acquired) and fails
    /// with [`DeployError::Cancelled`].
    pub async fn deploy_ovf(
        &self,
        request: &DeploymentRequest,
        cancel: &CancellationToken,
        events_tx: &mpsc::Sender<DeployEvent>,
    ) -> Result<Deployment, DeployError> {
        let result = self.run(request, cancel, events_tx).await;
        match &result {
            Ok(deployment) => {
                info!(vm = %deployment.vm, name = request.vm_name(), "deploy completed");
                emit(events_tx, DeployEvent::Completed {
                    vm: deployment.vm.clone(),
                })
                .await;
            }
            Err(e) => {
                error!(name = request.vm_name(), error = %e, "deploy failed");
                emit(events_tx, DeployEvent::Failed {
                    error: e.to_string(),
                })
                .await;
            }
        }
        result
    }

    async fn run(
        &self,
        request: &DeploymentRequest,
        cancel: &CancellationToken,
        events_tx: &mpsc::Sender<DeployEvent>,
    ) -> Result<Deployment, DeployError> {
        check_cancelled(cancel)?;

        let descriptor = cancellable(cancel, request.descriptor().read(self.engine.http())).await?;
        debug!(
            location = %request.descriptor(),
            bytes = descriptor.len(),
            "descriptor loaded"
        );

        let params = request.import_spec_params();
        let spec = cancellable(
            cancel,
            self.conn.create_import_spec(
                &descriptor,
                request.resource_pool(),
                request.datastore(),
                &params,
            ),
        )
        .await?;

        if !spec.errors.is_empty() {
            return Err(DeployError::RemoteValidation {
                messages: spec.errors,
            });
        }
        for message in &spec.warnings {
            warn!(warning = %message.trim_end(), "OVF warning");
            until_cancelled(
                cancel,
                emit(events_tx, DeployEvent::Warning {
                    message: message.clone(),
                }),
            )
            .await?;
        }

        check_cancelled(cancel)?;
        // Not raced against `cancel`: losing the reference would leave the
        // lease unreleased.
        let lease = Lease::acquire(
            Arc::clone(&self.conn),
            request.resource_pool(),
            &spec.import_spec,
            request.folder(),
            request.host(),
        )
        .await?;
        let guard = LeaseGuard::new(lease);

        match self.import(&guard, request, &spec, cancel, events_tx).await {
            Ok(vm) => {
                guard.complete().await?;
                Ok(Deployment {
                    vm,
                    warnings: spec.warnings,
                })
            }
            Err(e) => {
                warn!(lease = %guard.reference(), error = %e, "aborting import lease");
                guard.abort().await;
                Err(e)
            }
        }
    }

    /// Everything between lease acquisition and completion.
    async fn import(
        &self,
        lease: &Lease,
        request: &DeploymentRequest,
        spec: &ImportSpecResult,
        cancel: &CancellationToken,
        events_tx: &mpsc::Sender<DeployEvent>,
    ) -> Result<ManagedObjectRef, DeployError> {
        check_cancelled(cancel)?;
        lease
            .await_ready(&self.settings.poll_config(), cancel)
            .await?;

        report(lease, START_PERCENT, cancel, events_tx).await?;

        let info = cancellable(cancel, lease.info()).await?;
        let host_ip = if spec.file_items.is_empty() {
            String::new()
        } else {
            cancellable(cancel, self.conn.host_management_ip(request.host())).await?
        };
        let cookie = self.conn.session_cookie();
        let plan = ProgressPlan::new(&spec.file_items);

        for (index, item) in spec.file_items.iter().enumerate() {
            check_cancelled(cancel)?;

            let device_url =
                info.device_url(&item.device_id)
                    .ok_or_else(|| DeployError::DeviceUrlNotFound {
                        device_id: item.device_id.clone(),
                    })?;
            let destination = Destination::new(
                device_url.resolve_host(&host_ip),
                self.settings.upload_method,
            )
            .with_cookie(cookie.clone());

            debug!(
                device = %item.device_id,
                path = %item.path,
                url = %destination.url,
                "uploading disk file"
            );
            self.upload_file(lease, request, item, index, &plan, &destination, cancel, events_tx)
                .await?;
        }

        report(lease, DONE_PERCENT, cancel, events_tx).await?;

        let info = cancellable(cancel, lease.info()).await?;
        info.entity.ok_or(DeployError::MissingEntity)
    }

    /// Streams one file and forwards its progress to the lease in order.
    ///
    /// The transfer callback only queues progress; this loop emits the
    /// per-chunk events and lease updates.
    #[allow(clippy::too_many_arguments)]
    async fn upload_file(
        &self,
        lease: &Lease,
        request: &DeploymentRequest,
        item: &FileItem,
        index: usize,
        plan: &ProgressPlan,
        destination: &Destination,
        cancel: &CancellationToken,
        events_tx: &mpsc::Sender<DeployEvent>,
    ) -> Result<(), DeployError> {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<TransferProgress>();
        let on_progress = move |progress: TransferProgress| {
            let _ = progress_tx.send(progress);
        };

        let forward = move |progress: TransferProgress| async move {
            until_cancelled(
                cancel,
                emit(events_tx, DeployEvent::TransferProgress {
                    device_id: item.device_id.clone(),
                    progress,
                }),
            )
            .await?;
            report(lease, plan.percent(index, progress), cancel, events_tx).await
        };

        let source = request.descriptor().file_source(&item.path);
        let transfer = self.engine.transfer(source, destination, on_progress);
        tokio::pin!(transfer);

        let outcome = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(DeployError::Cancelled),
                Some(progress) = progress_rx.recv() => {
                    if let Err(e) = forward(progress).await {
                        break Err(e);
                    }
                }
                result = &mut transfer => break result.map_err(DeployError::from),
            }
        };
        outcome?;

        while let Ok(progress) = progress_rx.try_recv() {
            forward(progress).await?;
        }
        Ok(())
    }
}

/// Reports `percent` to the lease and emits it if it was sent. Gives up
/// when `cancel` fires while the remote call is pending.
async fn report(
    lease: &Lease,
    percent: u8,
    cancel: &CancellationToken,
    events_tx: &mpsc::Sender<DeployEvent>,
) -> Result<(), DeployError> {
    if until_cancelled(cancel, lease.report_progress(percent)).await? {
        until_cancelled(cancel, emit(events_tx, DeployEvent::LeaseProgress { percent })).await?;
    }
    Ok(())
}

async fn emit(events_tx: &mpsc::Sender<DeployEvent>, event: DeployEvent) {
    if events_tx.send(event).await.is_err() {
        trace!("event receiver dropped");
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), DeployError> {
    if cancel.is_cancelled() {
        Err(DeployError::Cancelled)
    } else {
        Ok(())
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T, DeployError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeployError::Cancelled),
        value = fut => Ok(value),
    }
}

async fn cancellable<T, E>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, DeployError>
where
    DeployError: From<E>,
{
    until_cancelled(cancel, fut).await?.map_err(DeployError::from)
}
