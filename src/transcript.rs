//! The chat transcript: what the user sees, in order.

use crate::render::{escape_html, RenderPipeline};
use crate::renderer::RenderTarget;

pub const WELCOME_MESSAGE: &str =
    "👋 Welcome! I'm your travel assistant. Where would you like to go?";

/// A message element: sanitized inner HTML plus a class list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSlot {
    inner_html: String,
    classes: Vec<String>,
}

impl MessageSlot {
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

impl RenderTarget for MessageSlot {
    fn set_inner_html(&mut self, html: String) {
        self.inner_html = html;
    }

    fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Welcome,

    /// The user's message as Markdown
    User(String),

    Assistant(MessageSlot),

    /// Typing indicator shown until the reply starts
    Loading,

    /// Transport-level failure, shown as plain text
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    /// A fresh transcript showing the welcome message.
    pub fn new() -> Self {
        Self {
            entries: vec![Entry::Welcome],
        }
    }

    /// Back to the welcome message.
    pub fn reset(&mut self) {
        self.entries = vec![Entry::Welcome];
    }

    /// Remove everything, welcome included.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn dismiss_welcome(&mut self) {
        self.entries.retain(|e| *e != Entry::Welcome);
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.dismiss_welcome();
        self.entries.push(Entry::User(text.into()));
    }

    /// Show the typing indicator. At most one is ever shown.
    pub fn show_loading(&mut self) {
        if !self.is_loading() {
            self.entries.push(Entry::Loading);
        }
    }

    pub fn remove_loading(&mut self) {
        self.entries.retain(|e| *e != Entry::Loading);
    }

    pub fn is_loading(&self) -> bool {
        self.entries.contains(&Entry::Loading)
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.entries.push(Entry::Error(message.into()));
    }

    /// Append an empty assistant message and hand out its slot.
    pub fn open_assistant_slot(&mut self) -> &mut MessageSlot {
        self.dismiss_welcome();
        self.entries.push(Entry::Assistant(MessageSlot::default()));
        match self.entries.last_mut() {
            Some(Entry::Assistant(slot)) => slot,
            _ => unreachable!("assistant entry was just pushed"),
        }
    }

    /// Append a finished assistant message.
    pub fn push_assistant_html(&mut self, html: String) {
        self.open_assistant_slot().set_inner_html(html);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Error(_)))
            .count()
    }

    pub fn last_assistant(&self) -> Option<&MessageSlot> {
        self.entries.iter().rev().find_map(|e| match e {
            Entry::Assistant(slot) => Some(slot),
            _ => None,
        })
    }

    /// The transcript as an HTML fragment. User messages go through the
    /// same pipeline as replies.
    pub fn to_html(&self, pipeline: &RenderPipeline) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let div = match entry {
                Entry::Welcome => format!(
                    "<div class=\"welcome-message\"><p>{}</p></div>",
                    escape_html(WELCOME_MESSAGE)
                ),
                Entry::User(text) => format!(
                    "<div class=\"message user-message\">{}</div>",
                    pipeline.render(text)
                ),
                Entry::Assistant(slot) => {
                    let mut classes = vec!["message", "ai-message"];
                    classes.extend(slot.classes().iter().map(String::as_str));
                    format!("<div class=\"{}\">{}</div>", classes.join(" "), slot.inner_html())
                }
                Entry::Loading => {
                    "<div class=\"typing-indicator\"><span></span><span></span><span></span></div>"
                        .to_string()
                }
                Entry::Error(message) => format!(
                    "<div class=\"message error-message\">{}</div>",
                    escape_html(message)
                ),
            };
            out.push_str(&div);
            out.push('\n');
        }
        out
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
