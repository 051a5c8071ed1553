//! Running a user submission through the backend and the renderer.

use std::sync::Arc;
use tracing::{info, warn};

use crate::client::{ChatBackend, ClientError};
use crate::form::{format_travel_request, TravelRequirements};
use crate::guide::{guide_display, guide_request, GuideStyle};
use crate::model::{AgentType, SendMessageRequest, StreamRequest};
use crate::options::RenderOptions;
use crate::renderer::StreamingMessageRenderer;
use crate::session::SessionOutcome;
use crate::transcript::Transcript;

/// The input controls (message box, send and plan buttons) of a front end.
#[derive(Debug)]
pub struct Controls {
    enabled: bool,
}

impl Controls {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disable the controls until the returned guard is dropped.
    pub fn disable(&mut self) -> ControlsGuard<'_> {
        self.enabled = false;
        ControlsGuard { controls: self }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Re-enables the controls when dropped, on every exit path.
pub struct ControlsGuard<'a> {
    controls: &'a mut Controls,
}

impl Drop for ControlsGuard<'_> {
    fn drop(&mut self) {
        self.controls.enabled = true;
    }
}

/// One request as the user issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub request: StreamRequest,

    /// Markdown shown as the user's message
    pub display: String,
}

impl Submission {
    pub fn new(request: StreamRequest, display: impl Into<String>) -> Self {
        Self {
            request,
            display: display.into(),
        }
    }

    /// A chat message answered by `agent`.
    pub fn chat(message: impl Into<String>, agent: AgentType) -> Self {
        let message = message.into();
        Self::new(
            StreamRequest::SendMessage(SendMessageRequest::new(message.clone(), agent)),
            message,
        )
    }

    /// A travel plan for validated requirements.
    pub fn plan(requirements: TravelRequirements) -> Self {
        let display = format_travel_request(&requirements);
        Self::new(StreamRequest::PlanTravel(requirements), display)
    }

    pub fn attraction_guide(attraction: &str, style: GuideStyle) -> Self {
        Self::new(
            guide_request(attraction, style),
            guide_display(attraction, style),
        )
    }

    /// Summary request handled by the PDF agent. The prompt doubles as the
    /// user-visible message.
    pub fn pdf_export(prompt: impl Into<String>) -> Self {
        Self::chat(prompt, AgentType::PdfGenerator)
    }
}

/// Drives submissions for one transcript. All call sites share the
/// renderer; they differ only in payload and completion hook.
pub struct ChatController<B: ChatBackend + ?Sized> {
    backend: Arc<B>,
    renderer: StreamingMessageRenderer,
    controls: Controls,
}

impl<B: ChatBackend + ?Sized> ChatController<B> {
    pub fn new(backend: Arc<B>, options: RenderOptions) -> Self {
        Self::with_renderer(backend, StreamingMessageRenderer::new(options))
    }

    pub fn with_renderer(backend: Arc<B>, renderer: StreamingMessageRenderer) -> Self {
        Self {
            backend,
            renderer,
            controls: Controls::default(),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn renderer(&self) -> &StreamingMessageRenderer {
        &self.renderer
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Show the submission, stream the reply into a new assistant entry and
    /// call `on_complete` with the outcome.
    ///
    /// A request the backend refuses (or that never reaches it) leaves one
    /// error entry in the transcript and is returned as `Err`; the hook is
    /// not called. Errors reported inside the stream are part of the
    /// outcome. The controls are enabled again when this returns.
    pub async fn submit<F>(
        &mut self,
        transcript: &mut Transcript,
        submission: Submission,
        on_complete: F,
    ) -> Result<SessionOutcome, ClientError>
    where
        F: FnOnce(&SessionOutcome),
    {
        let _controls = self.controls.disable();

        transcript.push_user(submission.display);
        transcript.show_loading();

        let path = submission.request.path();
        info!(path, "sending request");

        let body = match self.backend.open_stream(&submission.request).await {
            Ok(body) => body,
            Err(e) => {
                warn!(path, error = %e, "request failed");
                transcript.remove_loading();
                transcript.push_error(format!("❌ Request failed: {e}"));
                return Err(e);
            }
        };

        transcript.remove_loading();
        let slot = transcript.open_assistant_slot();
        let outcome = self.renderer.consume(body, slot).await;
        info!(path, termination = %outcome.termination, chunks = outcome.chunks, "reply finished");

        on_complete(&outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::TravelForm;

    #[test]
    fn test_guard_reenables_controls() {
        let mut controls = Controls::default();
        {
            let guard = controls.disable();
            assert!(!guard.controls.is_enabled());
        }
        assert!(controls.is_enabled());
    }

    #[test]
    fn test_guard_reenables_controls_on_early_return() {
        fn failing_step(controls: &mut Controls) -> Result<u16, ClientError> {
            let _guard = controls.disable();
            let port = "not a port"
                .parse::<u16>()
                .map_err(|e| ClientError::Config(e.to_string()))?;
            Ok(port)
        }

        let mut controls = Controls::default();
        assert!(failing_step(&mut controls).is_err());
        assert!(controls.is_enabled());
    }

    #[test]
    fn test_chat_submission() {
        let submission = Submission::chat("Best noodles in Lanzhou?", AgentType::Travel);
        assert_eq!(submission.display, "Best noodles in Lanzhou?");
        assert_eq!(submission.request.path(), "/send_message");
    }

    #[test]
    fn test_plan_submission_shows_summary() {
        let form = TravelForm {
            source: "Shanghai".to_string(),
            destination: "Chengdu".to_string(),
            start_date: "2025-06-01".to_string(),
            end_date: "2025-06-03".to_string(),
            budget: "3000".to_string(),
            accommodation_type: "hostel".to_string(),
            preferences: vec!["food".to_string()],
            ..TravelForm::default()
        };
        let submission = Submission::plan(form.validate().unwrap());

        assert_eq!(submission.request.path(), "/plan_travel");
        assert!(submission.display.contains("To: Chengdu"));
    }

    #[test]
    fn test_pdf_submission_uses_pdf_agent() {
        let submission = Submission::pdf_export("summarize");
        match submission.request {
            StreamRequest::SendMessage(request) => {
                assert_eq!(request.agent_type, Some(AgentType::PdfGenerator));
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }
}
