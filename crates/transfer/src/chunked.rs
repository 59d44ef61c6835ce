use std::io;

use futures_util::Stream;
use futures_util::stream;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::DEFAULT_CHUNK_SIZE;
use crate::progress::{ProgressFn, TransferProgress};

/// Reads an async byte source in fixed-size chunks.
///
/// Every chunk except the last is exactly `chunk_size` bytes, independent
/// of how the underlying reader splits its reads.
pub struct ChunkReader<R> {
    reader: R,
    chunk_size: usize,
    offset: u64,
    total: Option<u64>,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    /// Wraps `reader` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(reader: R, chunk_size: usize, total: Option<u64>) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            reader,
            chunk_size,
            offset: 0,
            total,
        }
    }

    /// Reads the next chunk. Returns `None` at EOF.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        self.offset += filled as u64;
        Ok(Some(buf))
    }

    /// Bytes read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Announced total size, if any.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Bytes remaining to read, when the total is known.
    pub fn remaining(&self) -> Option<u64> {
        self.progress().remaining()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn progress(&self) -> TransferProgress {
        TransferProgress::new(self.offset, self.total)
    }
}

impl<R> ChunkReader<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Turns the reader into a stream of chunks, invoking `on_progress`
    /// after each chunk is produced.
    pub fn into_stream(
        self,
        on_progress: ProgressFn,
    ) -> impl Stream<Item = io::Result<Vec<u8>>> + Send + 'static {
        stream::try_unfold(
            (self, on_progress),
            |(mut reader, on_progress)| async move {
                let Some(chunk) = reader.next_chunk().await? else {
                    return Ok(None);
                };
                on_progress(reader.progress());
                Ok::<_, io::Error>(Some((chunk, (reader, on_progress))))
            },
        )
    }
}
