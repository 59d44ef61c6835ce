use std::fmt;
use std::io;
use std::path::PathBuf;

use futures_util::TryStreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::TransferError;

/// Where the bytes of a transfer come from.
pub enum TransferSource {
    /// A local file; its size is taken from the filesystem.
    LocalFile(PathBuf),
    /// A resource fetched with HTTP `GET` and piped straight through.
    Remote { url: String },
    /// Any async byte stream, with a total size when the caller knows it.
    Stream {
        reader: Box<dyn AsyncRead + Send + Unpin>,
        total: Option<u64>,
    },
}

/// A source ready to be read: the byte stream plus its announced size.
pub(crate) struct OpenedSource {
    pub(crate) reader: Box<dyn AsyncRead + Send + Unpin>,
    pub(crate) total: Option<u64>,
}

impl TransferSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        TransferSource::LocalFile(path.into())
    }

    pub fn remote(url: impl Into<String>) -> Self {
        TransferSource::Remote { url: url.into() }
    }

    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static, total: Option<u64>) -> Self {
        TransferSource::Stream {
            reader: Box::new(reader),
            total,
        }
    }

    /// Opens the source. The file handle or response body lives exactly as
    /// long as the returned reader.
    pub(crate) async fn open(self, http: &reqwest::Client) -> Result<OpenedSource, TransferError> {
        match self {
            TransferSource::LocalFile(path) => {
                let file = tokio::fs::File::open(&path).await?;
                let total = file.metadata().await?.len();
                debug!(path = %path.display(), total, "opened local source");
                Ok(OpenedSource {
                    reader: Box::new(file),
                    total: Some(total),
                })
            }
            TransferSource::Remote { url } => {
                let response = http.get(&url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(TransferError::SourceStatus {
                        status: status.as_u16(),
                        url,
                    });
                }
                let total = response.content_length();
                debug!(%url, ?total, "opened remote source");
                let body = Box::pin(response.bytes_stream().map_err(io::Error::other));
                Ok(OpenedSource {
                    reader: Box::new(StreamReader::new(body)),
                    total,
                })
            }
            TransferSource::Stream { reader, total } => Ok(OpenedSource { reader, total }),
        }
    }
}

impl fmt::Debug for TransferSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferSource::LocalFile(path) => f.debug_tuple("LocalFile").field(path).finish(),
            TransferSource::Remote { url } => f.debug_struct("Remote").field("url", url).finish(),
            TransferSource::Stream { total, .. } => {
                f.debug_struct("Stream").field("total", total).finish_non_exhaustive()
            }
        }
    }
}
