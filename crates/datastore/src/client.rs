use std::io;
use std::path::Path;

use futures_util::TryStreamExt;
use ovfdeploy_transfer::{
    ChunkReader, Destination, TransferEngine, TransferProgress, TransferSource, UploadMethod,
};
use reqwest::header::COOKIE;
use reqwest::{Method, StatusCode};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use crate::error::DatastoreError;
use crate::path::Datastore;

/// HTTP client for files stored on datastores.
pub struct DatastoreClient {
    engine: TransferEngine,
    endpoint: String,
    cookie: Option<String>,
}

impl DatastoreClient {
    /// Creates a client for `endpoint` (scheme and host, e.g.
    /// `https://vcenter.example.com`). `cookie` is sent with every request.
    pub fn new(endpoint: &str, cookie: Option<String>) -> Result<Self, DatastoreError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_client(http, endpoint, cookie))
    }

    /// Creates a client on top of an existing HTTP client.
    pub fn with_client(http: reqwest::Client, endpoint: &str, cookie: Option<String>) -> Self {
        Self {
            engine: TransferEngine::new(http, 0),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            cookie,
        }
    }

    /// Overrides the chunk size used for downloads and uploads.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.engine = TransferEngine::new(self.engine.http().clone(), chunk_size);
        self
    }

    /// Absolute URL of `path` on `datastore`.
    pub fn url(&self, datastore: &Datastore, path: &str) -> String {
        format!("{}{}", self.endpoint, datastore.resolve(path))
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let request = self.engine.http().request(method, url);
        match &self.cookie {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }

    /// Probes `path` with `HEAD`: 2xx means present, 404 absent.
    pub async fn exists(&self, datastore: &Datastore, path: &str) -> Result<bool, DatastoreError> {
        let url = self.url(datastore, path);
        let status = self.request(Method::HEAD, &url).send().await?.status();
        debug!(%url, status = status.as_u16(), "datastore probe");

        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(DatastoreError::UnexpectedResponse {
                status: status.as_u16(),
            })
        }
    }

    /// Downloads `remote_path` into `local_path`, chunk by chunk.
    ///
    /// Returns the number of bytes written. A download that fails after
    /// `local_path` was created removes the partial file.
    pub async fn download<F>(
        &self,
        datastore: &Datastore,
        remote_path: &str,
        local_path: impl AsRef<Path>,
        on_progress: F,
    ) -> Result<u64, DatastoreError>
    where
        F: Fn(TransferProgress),
    {
        let url = self.url(datastore, remote_path);
        let response = self.request(Method::GET, &url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(DatastoreError::UnexpectedResponse {
                status: status.as_u16(),
            });
        }

        let total = response.content_length();
        let body = StreamReader::new(Box::pin(response.bytes_stream().map_err(io::Error::other)));
        let mut reader = ChunkReader::new(body, self.engine.chunk_size(), total);
        let local_path = local_path.as_ref();
        let mut file = tokio::fs::File::create(local_path).await?;

        if let Err(e) = write_chunks(&mut reader, &mut file, &on_progress).await {
            drop(file);
            warn!(%url, path = %local_path.display(), error = %e, "download failed, removing partial file");
            if let Err(remove) = tokio::fs::remove_file(local_path).await {
                warn!(path = %local_path.display(), error = %remove, "failed to remove partial file");
            }
            return Err(e.into());
        }

        debug!(%url, bytes = reader.offset(), "datastore download complete");
        Ok(reader.offset())
    }

    /// Uploads `local_path` to `remote_path` with a streamed `POST`.
    pub async fn upload<F>(
        &self,
        datastore: &Datastore,
        remote_path: &str,
        local_path: impl AsRef<Path>,
        on_progress: F,
    ) -> Result<(), DatastoreError>
    where
        F: Fn(TransferProgress) + Send + Sync + 'static,
    {
        let destination = Destination::new(self.url(datastore, remote_path), UploadMethod::Post)
            .with_cookie(self.cookie.clone());
        self.engine
            .transfer(
                TransferSource::local(local_path.as_ref()),
                &destination,
                on_progress,
            )
            .await?;
        Ok(())
    }
}

async fn write_chunks<R, F>(
    reader: &mut ChunkReader<R>,
    file: &mut tokio::fs::File,
    on_progress: &F,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    F: Fn(TransferProgress),
{
    while let Some(chunk) = reader.next_chunk().await? {
        file.write_all(&chunk).await?;
        on_progress(reader.progress());
    }
    file.flush().await
}
