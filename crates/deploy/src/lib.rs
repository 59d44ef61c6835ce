//! OVF deploy flow.
//!
//! Library crate with no transport of its own: the embedding application
//! supplies a [`ovfdeploy_vim::VimConnection`] that issues the remote calls.
//!
//! # Pipeline
//!
//! 1. **Validate** the request (at build time)
//! 2. **Import spec**: read the descriptor and have the endpoint validate it
//! 3. **Lease**: start the import and wait for the lease to become ready
//! 4. **Upload** every disk file to its negotiated device URL
//! 5. **Complete** the lease, or abort it on any failure

pub mod deploy;
pub mod descriptor;
pub mod error;
pub mod progress;
pub mod request;
pub mod settings;
pub mod types;

pub use deploy::OvfDeployer;
pub use descriptor::DescriptorLocation;
pub use error::DeployError;
pub use progress::ProgressPlan;
pub use request::{DeploymentRequest, DeploymentRequestBuilder};
pub use settings::{DeploySettings, SettingsError};
pub use types::{DeployEvent, Deployment};
