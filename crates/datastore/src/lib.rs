//! Datastore file access over the endpoint's HTTP file service.
//!
//! Resolves datastore-relative paths into the `/folder/...` URIs the
//! endpoint serves, and offers existence probes, downloads and uploads on
//! top of them.

mod client;
mod error;
mod path;

pub use client::DatastoreClient;
pub use error::DatastoreError;
pub use path::{Datastore, resolve_path};
