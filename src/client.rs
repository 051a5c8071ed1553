//! Backend trait and error types.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::history::Conversation;
use crate::model::StreamRequest;

/// Raw response body of a streaming endpoint.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Errors that can occur while talking to the backend.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// The external chat/planning service.
///
/// Streaming endpoints hand back the raw response body; decoding and
/// rendering happen in [`crate::renderer::StreamingMessageRenderer`]. The
/// history endpoints are plain JSON request/reply.
///
/// # Example
/// ```rust,ignore
/// struct Canned(Vec<u8>);
///
/// #[async_trait]
/// impl ChatBackend for Canned {
///     async fn open_stream(&self, _request: &StreamRequest) -> Result<ByteStream, ClientError> {
///         let body = Bytes::from(self.0.clone());
///         Ok(futures::stream::iter(vec![Ok(body)]).boxed())
///     }
///     // history methods...
/// }
/// ```
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue a streaming request and return its body once the server has
    /// accepted it. A non-OK status is an error, not an empty stream.
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ClientError>;

    /// All stored conversations of `email`, newest first.
    async fn load_history(&self, email: &str) -> Result<Vec<Conversation>, ClientError>;

    /// Remove every stored conversation of `email`.
    async fn clear_history(&self, email: &str) -> Result<(), ClientError>;

    /// Remove one conversation.
    async fn delete_conversation(&self, email: &str, conversation_id: &str)
        -> Result<(), ClientError>;

    /// Start a fresh server-side conversation; later messages are stored under it.
    async fn new_conversation(&self) -> Result<(), ClientError>;
}
