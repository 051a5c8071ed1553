//! Markdown → highlighted, sanitized HTML.
//!
//! The pipeline is `sanitize(markdown(text))`, where the markdown step
//! already tags and highlights every code block. Sanitizing last means the
//! highlighter output passes through the same allow-list as everything
//! else.

pub mod highlight;
pub mod language;
pub mod markdown;
pub mod sanitize;

use thiserror::Error;

use self::highlight::{Highlighter, SyntectHighlighter};
use self::markdown::MarkdownRenderer;
use self::sanitize::{AmmoniaSanitizer, Sanitizer};

/// Class of the inline error node.
pub const ERROR_CLASS: &str = "stream-error";

/// Errors raised while rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Highlight error: {0}")]
    Highlight(#[from] syntect::Error),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
}

/// Shared, immutable rendering pipeline. One per application; sessions
/// hold it behind an `Arc`.
pub struct RenderPipeline {
    markdown: MarkdownRenderer,
    sanitizer: Box<dyn Sanitizer>,
}

impl RenderPipeline {
    pub fn new(highlighter: Box<dyn Highlighter>, sanitizer: Box<dyn Sanitizer>) -> Self {
        Self {
            markdown: MarkdownRenderer::new(highlighter),
            sanitizer,
        }
    }

    /// Render a complete Markdown document.
    ///
    /// # Example
    /// ```
    /// use travel_chat::render::RenderPipeline;
    ///
    /// let pipeline = RenderPipeline::default();
    /// let html = pipeline.render("**Day 1**: West Lake <script>alert(1)</script>");
    /// assert!(html.contains("<strong>Day 1</strong>"));
    /// assert!(!html.contains("<script>"));
    /// ```
    pub fn render(&self, text: &str) -> String {
        self.sanitizer.sanitize(&self.markdown.render(text))
    }

    /// Inline error node shown in place of a reply.
    pub fn render_error(&self, message: &str) -> String {
        self.sanitizer.sanitize(&format!(
            "<div class=\"{}\">Error: {}</div>",
            ERROR_CLASS,
            escape_html(message)
        ))
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(
            Box::new(SyntectHighlighter::new()),
            Box::new(AmmoniaSanitizer::new()),
        )
    }
}

/// Escape text for use in HTML content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
