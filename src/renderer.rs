//! The streaming message renderer.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::client::ClientError;
use crate::model::ChunkEvent;
use crate::options::RenderOptions;
use crate::render::RenderPipeline;
use crate::session::{SessionOutcome, StreamSession};
use crate::sse::SseStreamExt;

/// An element a reply is rendered into.
pub trait RenderTarget {
    /// Replace the element's content with already-sanitized HTML.
    fn set_inner_html(&mut self, html: String);

    fn add_class(&mut self, class: &str);

    fn remove_class(&mut self, class: &str);
}

/// Consumes a backend event stream and keeps a target in sync with the
/// rendered reply.
///
/// Every text event re-renders the whole accumulated document, so a
/// construct split across chunks (an open code fence, half a table) is
/// rendered correctly as soon as its remainder arrives.
///
/// # Example
/// ```
/// use bytes::Bytes;
/// use futures::stream;
/// use travel_chat::client::ClientError;
/// use travel_chat::options::RenderOptions;
/// use travel_chat::renderer::StreamingMessageRenderer;
/// use travel_chat::transcript::MessageSlot;
///
/// let renderer = StreamingMessageRenderer::new(RenderOptions::default());
/// let body = stream::iter(vec![Ok::<_, ClientError>(Bytes::from_static(
///     b"data: {\"chunk\": \"Hello\"}\n\ndata: {\"done\": true}\n\n",
/// ))]);
///
/// let mut slot = MessageSlot::default();
/// let outcome = futures::executor::block_on(renderer.consume(body, &mut slot));
/// assert!(outcome.is_success());
/// assert_eq!(slot.inner_html(), "<p>Hello</p>\n");
/// ```
pub struct StreamingMessageRenderer {
    pipeline: Arc<RenderPipeline>,
    options: RenderOptions,
}

impl StreamingMessageRenderer {
    /// Renderer with the default pipeline (pulldown-cmark, syntect, ammonia).
    pub fn new(options: RenderOptions) -> Self {
        Self::with_pipeline(Arc::new(RenderPipeline::default()), options)
    }

    pub fn with_pipeline(pipeline: Arc<RenderPipeline>, options: RenderOptions) -> Self {
        Self { pipeline, options }
    }

    pub fn pipeline(&self) -> &Arc<RenderPipeline> {
        &self.pipeline
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Start a session on `target` without a byte stream, for callers that
    /// produce events themselves.
    pub fn session<'a, T>(&'a self, target: &'a mut T) -> StreamSession<'a, T>
    where
        T: RenderTarget + ?Sized,
    {
        StreamSession::new(&self.pipeline, target, &self.options)
    }

    /// Drive one session from a response body until it turns terminal.
    ///
    /// Malformed records are logged and skipped. A read error is rendered
    /// like a server error event. Reading stops at the first terminal
    /// event; anything after it is never rendered.
    pub async fn consume<S, E, T>(&self, body: S, target: &mut T) -> SessionOutcome
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<ClientError>,
        T: RenderTarget + ?Sized,
    {
        let mut session = self.session(target);
        session.begin();

        let mut records = Box::pin(body.sse_records());
        while let Some(record) = records.next().await {
            match record {
                Ok(data) => match ChunkEvent::parse(&data) {
                    Ok(events) if events.is_empty() => debug!(record = %data, "record without event"),
                    Ok(events) => {
                        for event in events {
                            if session.is_terminal() {
                                break;
                            }
                            session.apply(event);
                        }
                    }
                    Err(e) => warn!(error = %e, record = %data, "skipping malformed record"),
                },
                Err(e) => {
                    warn!(error = %e, "response stream failed");
                    session.fail(e.to_string());
                }
            }

            if session.is_terminal() {
                break;
            }
        }

        session.into_outcome()
    }
}

impl Default for StreamingMessageRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}
