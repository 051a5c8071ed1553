//! Wire models for the streaming endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::form::TravelRequirements;

/// One event carried by a `data:` record.
///
/// A non-empty `error` in a record discards everything else it carries. A
/// record with both `chunk` and `done` yields the text, then completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    /// Incremental response text
    Text(String),

    /// Server-side failure; terminates the session
    Error(String),

    /// Normal completion
    Done,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(default)]
    chunk: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    done: Option<bool>,
}

impl ChunkEvent {
    /// Parse the JSON payload of one record into the events it carries, in
    /// the order they apply.
    ///
    /// Well-formed records without an event, such as an empty chunk, an
    /// empty error or `{"done": false}`, yield nothing.
    ///
    /// # Example
    /// ```
    /// use travel_chat::model::ChunkEvent;
    ///
    /// let events = ChunkEvent::parse(r#"{"chunk": "Hi", "done": true}"#).unwrap();
    /// assert_eq!(events, vec![ChunkEvent::Text("Hi".to_string()), ChunkEvent::Done]);
    /// ```
    pub fn parse(data: &str) -> Result<Vec<Self>, serde_json::Error> {
        let wire: WireEvent = serde_json::from_str(data)?;

        if let Some(message) = wire.error.filter(|m| !m.is_empty()) {
            return Ok(vec![ChunkEvent::Error(message)]);
        }

        let mut events = Vec::with_capacity(2);
        if let Some(text) = wire.chunk.filter(|t| !t.is_empty()) {
            events.push(ChunkEvent::Text(text));
        }
        if wire.done == Some(true) {
            events.push(ChunkEvent::Done);
        }
        Ok(events)
    }

    /// Encode as a complete `data:` record, the way the backend emits it.
    pub fn to_record(&self) -> String {
        let payload = match self {
            ChunkEvent::Text(text) => json!({ "chunk": text }),
            ChunkEvent::Error(message) => json!({ "error": message }),
            ChunkEvent::Done => json!({ "done": true }),
        };
        format!("data: {}\n\n", payload)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChunkEvent::Error(_) | ChunkEvent::Done)
    }
}

/// Which backend agent answers a `/send_message` request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    #[default]
    General,
    Travel,
    PdfGenerator,
    AttractionGuide,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::General => "general",
            AgentType::Travel => "travel",
            AgentType::PdfGenerator => "pdf_generator",
            AgentType::AttractionGuide => "attraction_guide",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(AgentType::General),
            "travel" => Ok(AgentType::Travel),
            "pdf_generator" | "pdf" => Ok(AgentType::PdfGenerator),
            "attraction_guide" | "guide" => Ok(AgentType::AttractionGuide),
            other => Err(format!("unknown agent type: {other}")),
        }
    }
}

/// Body of `POST /send_message`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SendMessageRequest {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<AgentType>,

    /// Travel form snapshot sent along with follow-up questions
    #[serde(rename = "formData", skip_serializing_if = "Option::is_none")]
    pub form_data: Option<Value>,
}

impl SendMessageRequest {
    pub fn new(message: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            message: message.into(),
            agent_type: Some(agent_type),
            form_data: None,
        }
    }

    pub fn with_form_data(mut self, form_data: Value) -> Self {
        self.form_data = Some(form_data);
        self
    }
}

/// Body of `POST /attraction_guide`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AttractionGuideRequest {
    pub message: String,
}

/// A request answered with an event stream.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StreamRequest {
    SendMessage(SendMessageRequest),
    PlanTravel(TravelRequirements),
    AttractionGuide(AttractionGuideRequest),
}

impl StreamRequest {
    /// Endpoint path for this request.
    pub fn path(&self) -> &'static str {
        match self {
            StreamRequest::SendMessage(_) => "/send_message",
            StreamRequest::PlanTravel(_) => "/plan_travel",
            StreamRequest::AttractionGuide(_) => "/attraction_guide",
        }
    }
}
