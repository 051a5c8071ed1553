//! The travel-planning page: plan, follow-up chat, attraction guides and
//! PDF export over one transcript.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{ChatBackend, ClientError};
use crate::controller::{ChatController, Submission};
use crate::form::{TravelForm, TravelRequirements, ValidationError};
use crate::guide::GuideStyle;
use crate::model::{AgentType, SendMessageRequest, StreamRequest};
use crate::options::RenderOptions;
use crate::session::SessionOutcome;
use crate::transcript::Transcript;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Make a travel plan first")]
    NoPlan,

    #[error("There is no conversation to export")]
    NothingToExport,

    #[error("Enter the name of an attraction")]
    EmptyAttraction,
}

/// Where the planner is in its lifecycle.
///
/// `Planning` is only observable if a `plan` future was dropped before it
/// finished; the next `plan` call starts over.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlannerState {
    #[default]
    Idle,
    Planning,
    Planned { plan: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub is_user: bool,
    pub content: String,
}

/// Completed exchanges of this page, in order. Input for PDF export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    entries: Vec<LogEntry>,
}

impl ConversationLog {
    pub fn push_exchange(&mut self, user: impl Into<String>, reply: impl Into<String>) {
        self.entries.push(LogEntry {
            is_user: true,
            content: user.into(),
        });
        self.entries.push(LogEntry {
            is_user: false,
            content: reply.into(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prompt asking the PDF agent to summarize the log. `None` when empty.
    pub fn export_prompt(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut prompt = String::from(
            "Summarize all of the conversation above and generate a PDF. The conversation:\n\n",
        );
        for entry in &self.entries {
            let speaker = if entry.is_user { "User" } else { "Assistant" };
            prompt.push_str(&format!("{}: {}\n\n", speaker, entry.content));
        }
        Some(prompt)
    }
}

/// The travel page.
pub struct TravelPlanner<B: ChatBackend + ?Sized> {
    controller: ChatController<B>,
    transcript: Transcript,
    state: PlannerState,
    log: ConversationLog,
    requirements: Option<TravelRequirements>,
}

impl<B: ChatBackend + ?Sized> TravelPlanner<B> {
    pub fn new(backend: Arc<B>, options: RenderOptions) -> Self {
        Self {
            controller: ChatController::new(backend, options),
            transcript: Transcript::new(),
            state: PlannerState::Idle,
            log: ConversationLog::default(),
            requirements: None,
        }
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn current_plan(&self) -> Option<&str> {
        match &self.state {
            PlannerState::Planned { plan } => Some(plan),
            _ => None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn controller(&self) -> &ChatController<B> {
        &self.controller
    }

    /// PDF export is offered once a plan exists.
    pub fn can_export(&self) -> bool {
        self.current_plan().is_some() && !self.log.is_empty()
    }

    /// Validate the form and stream a plan.
    ///
    /// A successful reply becomes the current plan. A failed one leaves
    /// the previous plan, if any, in place.
    pub async fn plan(&mut self, form: &TravelForm) -> Result<SessionOutcome, PlannerError> {
        let requirements = form.validate()?;
        let previous = std::mem::replace(&mut self.state, PlannerState::Planning);
        info!(destination = %requirements.destination, days = requirements.days(), "planning trip");

        let submission = Submission::plan(requirements.clone());
        let display = submission.display.clone();
        let state = &mut self.state;
        let log = &mut self.log;

        let result = self
            .controller
            .submit(&mut self.transcript, submission, |outcome| {
                if outcome.is_success() {
                    log.push_exchange(display, outcome.text.clone());
                    *state = PlannerState::Planned {
                        plan: outcome.text.clone(),
                    };
                }
            })
            .await;

        if self.state == PlannerState::Planning {
            self.state = previous;
        } else {
            self.requirements = Some(requirements);
        }
        Ok(result?)
    }

    /// A follow-up message to the travel agent. Once a plan exists, the
    /// validated requirements travel along as form data.
    pub async fn chat(&mut self, message: &str) -> Result<SessionOutcome, PlannerError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(PlannerError::EmptyMessage);
        }

        let mut request = SendMessageRequest::new(message, AgentType::Travel);
        if let Some(requirements) = &self.requirements {
            request = request.with_form_data(serde_json::to_value(requirements).map_err(ClientError::from)?);
        }
        let submission = Submission::new(StreamRequest::SendMessage(request), message);
        self.submit_logged(submission).await
    }

    /// One of the suggested questions about the current plan.
    pub async fn quick_question(&mut self, question: &str) -> Result<SessionOutcome, PlannerError> {
        if self.current_plan().is_none() {
            return Err(PlannerError::NoPlan);
        }
        self.chat(question).await
    }

    pub async fn attraction_guide(
        &mut self,
        attraction: &str,
        style: GuideStyle,
    ) -> Result<SessionOutcome, PlannerError> {
        let attraction = attraction.trim();
        if attraction.is_empty() {
            return Err(PlannerError::EmptyAttraction);
        }
        debug!(attraction, %style, "requesting attraction guide");
        self.submit_logged(Submission::attraction_guide(attraction, style))
            .await
    }

    /// Ask the PDF agent to summarize everything said so far. The export
    /// exchange itself is not logged.
    pub async fn export_pdf(&mut self) -> Result<SessionOutcome, PlannerError> {
        let prompt = self
            .log
            .export_prompt()
            .ok_or(PlannerError::NothingToExport)?;
        info!(entries = self.log.len(), "exporting conversation");

        let outcome = self
            .controller
            .submit(&mut self.transcript, Submission::pdf_export(prompt), |_| {})
            .await?;
        Ok(outcome)
    }

    async fn submit_logged(&mut self, submission: Submission) -> Result<SessionOutcome, PlannerError> {
        let display = submission.display.clone();
        let log = &mut self.log;

        let outcome = self
            .controller
            .submit(&mut self.transcript, submission, |outcome| {
                if outcome.is_success() {
                    log.push_exchange(display, outcome.text.clone());
                }
            })
            .await?;
        Ok(outcome)
    }
}
