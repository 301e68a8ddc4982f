//! NDJSON decoding over a [`StreamHandle`] (one JSON object per line).

use super::{StreamEvent, StreamHandle, StreamTransportError};
use futures::{stream, Stream};
use serde_json::Value;
use std::pin::Pin;

pub type RecordStream =
    Pin<Box<dyn Stream<Item = Result<Value, StreamTransportError>> + Send + 'static>>;

/// Longest record accepted before the stream is failed.
pub const MAX_RECORD_BYTES: usize = 8 * 1024 * 1024;

struct State {
    handle: StreamHandle,
    buf: Vec<u8>,
    // Bytes of `buf` already known to hold no newline.
    scanned: usize,
    max_record: usize,
    finished: bool,
}

impl State {
    fn fail(
        mut self,
        err: StreamTransportError,
    ) -> Option<(Result<Value, StreamTransportError>, Self)> {
        self.finished = true;
        self.buf = Vec::new();
        Some((Err(err), self))
    }
}

pub(crate) fn ndjson(handle: StreamHandle) -> RecordStream {
    ndjson_with_limit(handle, MAX_RECORD_BYTES)
}

pub(crate) fn ndjson_with_limit(handle: StreamHandle, max_record: usize) -> RecordStream {
    let init = State {
        handle,
        buf: Vec::new(),
        scanned: 0,
        max_record,
        finished: false,
    };

    // Bytes are buffered rather than decoded per chunk so a multi-byte
    // character split across chunks survives.
    let stream = stream::unfold(init, |mut st| async move {
        if st.finished {
            return None;
        }
        loop {
            if let Some(offset) = st.buf[st.scanned..].iter().position(|b| *b == b'\n') {
                let idx = st.scanned + offset;
                let line: Vec<u8> = st.buf.drain(..=idx).collect();
                st.scanned = 0;
                match parse_line(&line) {
                    Some(Ok(v)) => return Some((Ok(v), st)),
                    Some(Err(e)) => return st.fail(e),
                    None => continue,
                }
            }
            st.scanned = st.buf.len();
            if st.buf.len() > st.max_record {
                let len = st.buf.len();
                let max_record = st.max_record;
                return st.fail(StreamTransportError::Decode(format!(
                    "record exceeds {} bytes without a line break ({} buffered)",
                    max_record, len
                )));
            }

            match st.handle.next_event().await {
                Ok(StreamEvent::Chunk(bytes)) => st.buf.extend_from_slice(&bytes),
                Ok(StreamEvent::Done) => {
                    st.finished = true;
                    let rest = std::mem::take(&mut st.buf);
                    return parse_line(&rest).map(|item| (item, st));
                }
                Err(e) => return st.fail(e),
            }
        }
    });

    Box::pin(stream)
}

fn parse_line(raw: &[u8]) -> Option<Result<Value, StreamTransportError>> {
    let line = trim_ascii(raw);
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_slice(line).map_err(|e| StreamTransportError::Decode(e.to_string())))
}

fn trim_ascii(raw: &[u8]) -> &[u8] {
    let start = raw
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(raw.len());
    let end = raw
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &raw[start..end]
}
