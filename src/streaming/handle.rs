use super::records::{self, RecordStream};
use super::StreamTransportError;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use std::pin::Pin;

pub(crate) type ChunkStream =
    Pin<Box<dyn Stream<Item = Result<Bytes, StreamTransportError>> + Send + 'static>>;

/// One step of a [`StreamHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Chunk(Bytes),
    /// Terminal signal; every later advance returns it again.
    Done,
}

/// Forward-only, single-owner cursor over response chunks.
///
/// Not `Clone`: exactly one caller advances it. Dropping (or [`close`]) releases
/// the underlying connection.
///
/// [`close`]: StreamHandle::close
pub struct StreamHandle {
    inner: Option<ChunkStream>,
    chunks: u64,
}

impl StreamHandle {
    pub(crate) fn from_response(resp: reqwest::Response) -> Self {
        Self::from_stream(
            resp.bytes_stream()
                .map_err(|e| StreamTransportError::Read(e.to_string())),
        )
    }

    /// Wrap an arbitrary chunk source.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, StreamTransportError>> + Send + 'static,
    {
        Self {
            inner: Some(Box::pin(stream)),
            chunks: 0,
        }
    }

    /// Advance by one chunk. Empty chunks are skipped.
    ///
    /// After `Done` or an error the handle is exhausted and only yields `Done`.
    pub async fn next_event(&mut self) -> Result<StreamEvent, StreamTransportError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(StreamEvent::Done);
        };
        loop {
            match inner.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => {
                    self.chunks += 1;
                    return Ok(StreamEvent::Chunk(chunk));
                }
                Some(Err(e)) => {
                    self.inner = None;
                    return Err(e);
                }
                None => {
                    self.inner = None;
                    return Ok(StreamEvent::Done);
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    /// Chunks yielded so far.
    pub fn chunks_read(&self) -> u64 {
        self.chunks
    }

    /// Abandon the stream early.
    pub fn close(mut self) {
        self.inner = None;
    }

    /// Decode the remaining bytes as newline-delimited JSON records.
    pub fn into_records(self) -> RecordStream {
        records::ndjson(self)
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("finished", &self.is_finished())
            .field("chunks", &self.chunks)
            .finish()
    }
}
