//! Server-Sent Events (SSE) record splitting.
//!
//! The backend emits one JSON payload per `data:` line:
//! ```text
//! data: {"chunk": "Hello "}
//!
//! data: {"chunk": "world"}
//!
//! data: {"done": true}
//! ```
//! Some call sites separate records by a blank line, others by a single
//! line break. Treating every `data:` line as one record covers both.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;

use crate::client::ClientError;
use crate::decode::Utf8Decoder;

/// Extension trait turning a raw byte stream into a stream of SSE records.
///
/// # Example
/// ```
/// use bytes::Bytes;
/// use futures::{stream, StreamExt};
/// use travel_chat::client::ClientError;
/// use travel_chat::sse::SseStreamExt;
///
/// let body = stream::iter(vec![
///     Ok::<_, ClientError>(Bytes::from_static(b"data: {\"ch")),
///     Ok(Bytes::from_static(b"unk\":\"x\"}\n\n")),
/// ]);
/// let records: Vec<_> = futures::executor::block_on(body.sse_records().collect());
/// assert_eq!(records.len(), 1);
/// ```
pub trait SseStreamExt {
    /// Split the stream into `data:` payloads.
    ///
    /// Bytes are decoded incrementally, so multi-byte characters may be
    /// split anywhere. A line is only parsed once its terminating newline
    /// has arrived; when the transport ends, a final unterminated line is
    /// still processed. A transport error is yielded once and ends the
    /// stream.
    fn sse_records(self) -> impl Stream<Item = Result<String, ClientError>> + Send;
}

impl<S, E> SseStreamExt for S
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError>,
{
    fn sse_records(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        let state = RecordReader {
            bytes: Box::pin(self),
            decoder: Utf8Decoder::new(),
            buffer: String::new(),
            ended: false,
        };

        stream::unfold(state, |mut state| async move {
            loop {
                // Drain complete lines before reading more
                if let Some(record) = state.next_record() {
                    return Some((Ok(record), state));
                }

                if state.ended {
                    return None;
                }

                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        let text = state.decoder.decode(&chunk);
                        state.buffer.push_str(&text);
                    }
                    Some(Err(e)) => {
                        state.ended = true;
                        state.buffer.clear();
                        return Some((Err(e.into()), state));
                    }
                    None => {
                        // Terminate whatever is left so it is processed as a final line
                        state.ended = true;
                        let tail = state.decoder.finish();
                        state.buffer.push_str(&tail);
                        state.buffer.push('\n');
                    }
                }
            }
        })
    }
}

struct RecordReader<S> {
    bytes: Pin<Box<S>>,
    decoder: Utf8Decoder,
    buffer: String,
    ended: bool,
}

impl<S> RecordReader<S> {
    fn next_record(&mut self) -> Option<String> {
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(data) = parse_sse_line(line) {
                return Some(data.to_string());
            }
        }
        None
    }
}

/// Parse an SSE line to extract the data portion.
///
/// SSE lines are in the format: `data: <content>`. Blank lines, comments
/// (`: ping`) and other fields yield `None`.
///
/// # Example
/// ```
/// use travel_chat::sse::parse_sse_line;
///
/// let line = "data: {\"key\": \"value\"}";
/// assert_eq!(parse_sse_line(line), Some("{\"key\": \"value\"}"));
///
/// let line = "invalid";
/// assert_eq!(parse_sse_line(line), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix("data:")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}
