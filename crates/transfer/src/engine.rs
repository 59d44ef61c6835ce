use std::io;
use std::sync::{Arc, Mutex};

use futures_util::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, COOKIE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chunked::ChunkReader;
use crate::progress::{ProgressFn, TransferProgress};
use crate::source::TransferSource;
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// HTTP method used to push the body to the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadMethod {
    Put,
    #[default]
    Post,
}

impl UploadMethod {
    fn as_method(self) -> reqwest::Method {
        match self {
            UploadMethod::Put => reqwest::Method::PUT,
            UploadMethod::Post => reqwest::Method::POST,
        }
    }
}

/// An HTTP endpoint accepting a streamed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub url: String,
    pub method: UploadMethod,
    /// Session cookie sent as the `Cookie` header.
    pub cookie: Option<String>,
}

impl Destination {
    pub fn new(url: impl Into<String>, method: UploadMethod) -> Self {
        Self {
            url: url.into(),
            method,
            cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }
}

/// Streams sources into HTTP request bodies chunk by chunk.
///
/// Holds no per-transfer state, so one engine can drive any number of
/// concurrent transfers.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    http: reqwest::Client,
    chunk_size: usize,
}

impl TransferEngine {
    /// Creates an engine. A `chunk_size` of 0 selects [`DEFAULT_CHUNK_SIZE`].
    pub fn new(http: reqwest::Client, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self { http, chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Streams `source` to `destination`, calling `on_progress` after every
    /// chunk is queued on the request body.
    ///
    /// Nothing is retried. When the source length is known the request
    /// carries `Content-Length`; otherwise the body is sent chunked.
    pub async fn transfer<F>(
        &self,
        source: TransferSource,
        destination: &Destination,
        on_progress: F,
    ) -> Result<(), TransferError>
    where
        F: Fn(TransferProgress) + Send + Sync + 'static,
    {
        let opened = source.open(&self.http).await?;
        let total = opened.total;

        // Read errors surface through the HTTP client as opaque body errors;
        // keep the original so it can be reported as an I/O failure.
        let read_failure: Arc<Mutex<Option<io::Error>>> = Arc::default();
        let slot = Arc::clone(&read_failure);

        let on_progress: ProgressFn = Arc::new(on_progress);
        let chunks = ChunkReader::new(opened.reader, self.chunk_size, total)
            .into_stream(on_progress)
            .map_err(move |e| {
                let proxy = io::Error::new(e.kind(), e.to_string());
                if let Ok(mut s) = slot.lock() {
                    *s = Some(e);
                }
                proxy
            });

        let mut request = self
            .http
            .request(destination.method.as_method(), &destination.url)
            .body(reqwest::Body::wrap_stream(chunks));
        if let Some(total) = total {
            request = request.header(CONTENT_LENGTH, total);
        }
        if let Some(cookie) = &destination.cookie {
            request = request.header(COOKIE, cookie);
        }

        debug!(
            url = %destination.url,
            method = ?destination.method,
            ?total,
            chunk_size = self.chunk_size,
            "starting transfer"
        );

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                let read_err = read_failure.lock().ok().and_then(|mut s| s.take());
                if let Some(read_err) = read_err {
                    return Err(TransferError::Io(read_err));
                }
                return Err(TransferError::Connection(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %destination.url, status = status.as_u16(), "transfer rejected");
            return Err(TransferError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(url = %destination.url, status = status.as_u16(), "transfer complete");
        Ok(())
    }
}
