//! Chunked HTTP transfer with per-chunk progress reporting.
//!
//! Streams a local file, a remote HTTP resource, or any async byte stream
//! into an HTTP `PUT`/`POST` body in fixed-size chunks, so memory use stays
//! bounded regardless of payload size.

mod chunked;
mod engine;
mod progress;
mod source;

pub use chunked::ChunkReader;
pub use engine::{Destination, TransferEngine, UploadMethod};
pub use progress::{ProgressFn, TransferProgress};
pub use source::TransferSource;

/// Default chunk size: 1 MiB.
///
/// Matches the HTTP client's I/O buffer granularity; callers override it
/// through [`TransferEngine::new`].
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The destination answered with a non-success status.
    #[error("destination returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The remote source could not be fetched.
    #[error("source {url} returned {status}")]
    SourceStatus { status: u16, url: String },

    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),
}
