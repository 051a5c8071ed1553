//! Stored conversations as returned by `/load_history`.

use serde::{Deserialize, Deserializer};

use crate::render::RenderPipeline;
use crate::transcript::Transcript;

/// Messages shown in a preview.
const PREVIEW_MESSAGES: usize = 2;

/// Characters kept per previewed message.
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Conversation {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

/// One stored message. Older records use `content` / `isUser`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryMessage {
    #[serde(default, alias = "content", deserialize_with = "null_as_empty")]
    pub text: String,

    #[serde(default, alias = "isUser")]
    pub is_user: bool,

    #[serde(default)]
    pub agent_type: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl Conversation {
    /// Heading of the `index`-th entry in a history list.
    pub fn label(&self, index: usize) -> String {
        format!("Conversation {} - {}", index + 1, self.date)
    }

    /// The first messages, truncated, followed by a count of the rest.
    ///
    /// # Example
    /// ```
    /// use travel_chat::history::Conversation;
    ///
    /// let conversation: Conversation = serde_json::from_str(r#"{
    ///     "id": 7, "date": "2025-03-01",
    ///     "messages": [
    ///         {"text": "Two days in Suzhou?", "is_user": true},
    ///         {"content": "Day 1: gardens", "isUser": false},
    ///         {"text": "Thanks", "is_user": true}
    ///     ]
    /// }"#).unwrap();
    ///
    /// assert_eq!(conversation.preview(), vec![
    ///     "You: Two days in Suzhou?".to_string(),
    ///     "Assistant: Day 1: gardens".to_string(),
    ///     "+ 1 more messages".to_string(),
    /// ]);
    /// ```
    pub fn preview(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .messages
            .iter()
            .take(PREVIEW_MESSAGES)
            .map(|m| format!("{}: {}", m.speaker(), truncate(&m.text, PREVIEW_CHARS)))
            .collect();

        if self.messages.len() > PREVIEW_MESSAGES {
            lines.push(format!("+ {} more messages", self.messages.len() - PREVIEW_MESSAGES));
        }
        lines
    }
}

impl HistoryMessage {
    pub fn speaker(&self) -> &'static str {
        if self.is_user {
            "You"
        } else {
            "Assistant"
        }
    }
}

/// The conversation numbered `number` in a history list, counting from 1
/// as [`Conversation::label`] does.
pub fn listed(conversations: &[Conversation], number: usize) -> Option<&Conversation> {
    number.checked_sub(1).and_then(|index| conversations.get(index))
}

/// Show a stored conversation in place of the current transcript.
/// Assistant messages go through the same pipeline as live replies.
pub fn replay(conversation: &Conversation, transcript: &mut Transcript, pipeline: &RenderPipeline) {
    transcript.clear();
    for message in &conversation.messages {
        if message.is_user {
            transcript.push_user(message.text.clone());
        } else {
            transcript.push_assistant_html(pipeline.render(&message.text));
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
