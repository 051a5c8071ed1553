//! Per-request streaming state.
//!
//! A [`StreamSession`] owns the accumulated text of one reply and holds the
//! target element exclusively for its whole lifetime. Once it turns
//! terminal, every later event is ignored.

use std::fmt;
use tracing::debug;

use crate::join::AccumulatedText;
use crate::model::ChunkEvent;
use crate::options::RenderOptions;
use crate::render::RenderPipeline;
use crate::renderer::RenderTarget;

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The server sent `{"done": true}`
    Done,

    /// The transport closed without a done event
    EndOfStream,

    /// The server sent `{"error": ...}`
    ServerError(String),

    /// Reading the response body failed
    TransportError(String),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Done => f.write_str("done"),
            Termination::EndOfStream => f.write_str("end of stream"),
            Termination::ServerError(message) => write!(f, "server error: {message}"),
            Termination::TransportError(message) => write!(f, "transport error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Terminal(Termination),
}

/// What a finished session hands back to its call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub termination: Termination,

    /// The accumulated Markdown
    pub text: String,

    /// Number of text events applied
    pub chunks: usize,
}

impl SessionOutcome {
    /// The reply completed without an error.
    pub fn is_success(&self) -> bool {
        matches!(self.termination, Termination::Done | Termination::EndOfStream)
    }
}

/// One streaming render bound to one target.
pub struct StreamSession<'a, T: RenderTarget + ?Sized> {
    pipeline: &'a RenderPipeline,
    target: &'a mut T,
    text: AccumulatedText,
    state: SessionState,
    chunks: usize,
    streaming_class: String,
}

impl<'a, T: RenderTarget + ?Sized> StreamSession<'a, T> {
    pub fn new(pipeline: &'a RenderPipeline, target: &'a mut T, options: &RenderOptions) -> Self {
        Self {
            pipeline,
            target,
            text: AccumulatedText::new(options.join_policy),
            state: SessionState::Idle,
            chunks: 0,
            streaming_class: options.streaming_class.clone(),
        }
    }

    /// Mark the target as streaming. Called implicitly by the first event.
    pub fn begin(&mut self) {
        if self.state == SessionState::Idle {
            self.target.add_class(&self.streaming_class);
            self.state = SessionState::Streaming;
        }
    }

    /// Apply one event. Returns `false` once the session is terminal.
    pub fn apply(&mut self, event: ChunkEvent) -> bool {
        if self.is_terminal() {
            debug!(?event, "ignoring event after termination");
            return false;
        }
        self.begin();

        match event {
            ChunkEvent::Text(chunk) => {
                self.text.push(&chunk);
                self.chunks += 1;
                let html = self.pipeline.render(self.text.as_str());
                self.target.set_inner_html(html);
                true
            }
            ChunkEvent::Error(message) => {
                self.target.set_inner_html(self.pipeline.render_error(&message));
                self.terminate(Termination::ServerError(message));
                false
            }
            ChunkEvent::Done => {
                self.terminate(Termination::Done);
                false
            }
        }
    }

    /// Reading the body failed; show the failure the way a server error is shown.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        let message = message.into();
        self.target.set_inner_html(self.pipeline.render_error(&message));
        self.terminate(Termination::TransportError(message));
    }

    /// The transport closed. Normal completion unless already terminal.
    pub fn end_of_stream(&mut self) {
        if !self.is_terminal() {
            self.terminate(Termination::EndOfStream);
        }
    }

    fn terminate(&mut self, termination: Termination) {
        debug!(%termination, chunks = self.chunks, "session finished");
        self.target.remove_class(&self.streaming_class);
        self.state = SessionState::Terminal(termination);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SessionState::Terminal(_))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Finish the session and release the target.
    pub fn into_outcome(mut self) -> SessionOutcome {
        self.end_of_stream();
        let termination = match self.state {
            SessionState::Terminal(termination) => termination,
            _ => Termination::EndOfStream,
        };
        SessionOutcome {
            termination,
            text: self.text.into_string(),
            chunks: self.chunks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::JoinPolicy;

    #[derive(Default)]
    struct Recorder {
        renders: Vec<String>,
        classes: Vec<String>,
    }

    impl RenderTarget for Recorder {
        fn set_inner_html(&mut self, html: String) {
            self.renders.push(html);
        }

        fn add_class(&mut self, class: &str) {
            self.classes.push(class.to_string());
        }

        fn remove_class(&mut self, class: &str) {
            self.classes.retain(|c| c != class);
        }
    }

    #[test]
    fn test_text_events_rerender_full_document() {
        let pipeline = RenderPipeline::default();
        let mut target = Recorder::default();
        let mut session = StreamSession::new(&pipeline, &mut target, &RenderOptions::default());

        assert!(session.apply(ChunkEvent::Text("Hello ".to_string())));
        assert!(session.apply(ChunkEvent::Text("world".to_string())));
        assert!(!session.apply(ChunkEvent::Done));

        let outcome = session.into_outcome();
        assert_eq!(outcome.termination, Termination::Done);
        assert_eq!(outcome.text, "Hello world");
        assert_eq!(outcome.chunks, 2);
        assert!(outcome.is_success());

        assert_eq!(target.renders.len(), 2);
        assert_eq!(target.renders[1], "<p>Hello world</p>\n");
        assert!(target.classes.is_empty());
    }

    #[test]
    fn test_streaming_class_while_active() {
        let pipeline = RenderPipeline::default();
        let mut target = Recorder::default();
        let mut session = StreamSession::new(&pipeline, &mut target, &RenderOptions::default());

        session.begin();
        assert_eq!(session.state(), &SessionState::Streaming);
        session.end_of_stream();
        assert_eq!(session.state(), &SessionState::Terminal(Termination::EndOfStream));
        drop(session);

        assert!(target.classes.is_empty());
    }

    #[test]
    fn test_events_after_error_are_ignored() {
        let pipeline = RenderPipeline::default();
        let mut target = Recorder::default();
        let mut session = StreamSession::new(&pipeline, &mut target, &RenderOptions::default());

        session.apply(ChunkEvent::Text("partial".to_string()));
        assert!(!session.apply(ChunkEvent::Error("upstream timeout".to_string())));
        assert!(!session.apply(ChunkEvent::Text("late".to_string())));
        assert!(!session.apply(ChunkEvent::Done));

        let outcome = session.into_outcome();
        assert_eq!(
            outcome.termination,
            Termination::ServerError("upstream timeout".to_string())
        );
        assert_eq!(outcome.text, "partial");
        assert!(!outcome.is_success());

        let last = target.renders.last().unwrap();
        assert!(last.contains("stream-error"));
        assert!(last.contains("upstream timeout"));
        assert!(!target.renders.iter().any(|html| html.contains("late")));
    }

    #[test]
    fn test_transport_failure_renders_error_once() {
        let pipeline = RenderPipeline::default();
        let mut target = Recorder::default();
        let mut session = StreamSession::new(&pipeline, &mut target, &RenderOptions::default());

        session.fail("connection reset");
        session.fail("again");
        let outcome = session.into_outcome();

        assert_eq!(
            outcome.termination,
            Termination::TransportError("connection reset".to_string())
        );
        assert_eq!(target.renders.len(), 1);
    }

    #[test]
    fn test_spaced_policy_is_applied() {
        let pipeline = RenderPipeline::default();
        let mut target = Recorder::default();
        let options = RenderOptions {
            join_policy: JoinPolicy::Spaced,
            ..RenderOptions::default()
        };
        let mut session = StreamSession::new(&pipeline, &mut target, &options);

        session.apply(ChunkEvent::Text("Hello".to_string()));
        session.apply(ChunkEvent::Text("world".to_string()));
        assert_eq!(session.text(), "Hello world");
    }

    #[test]
    fn test_unfinished_session_ends_normally() {
        let pipeline = RenderPipeline::default();
        let mut target = Recorder::default();
        let session = StreamSession::new(&pipeline, &mut target, &RenderOptions::default());

        let outcome = session.into_outcome();
        assert_eq!(outcome.termination, Termination::EndOfStream);
        assert_eq!(outcome.chunks, 0);
    }
}
