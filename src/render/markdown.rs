use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use tracing::warn;

use super::escape_html;
use super::highlight::Highlighter;
use super::language::{infer_language, LanguageTag};

/// Class marking a code element that has been highlighted.
pub const HIGHLIGHTED_CLASS: &str = "hljs";

/// Markdown → HTML with every code element, block or inline, tagged and
/// highlighted.
///
/// GitHub-flavoured extensions (tables, strikethrough, task lists) and smart
/// punctuation are enabled; single line breaks render as `<br />`, which is
/// how chat replies are meant to read.
pub struct MarkdownRenderer {
    options: Options,
    highlighter: Box<dyn Highlighter>,
}

struct PendingCode {
    language: Option<LanguageTag>,
    code: String,
}

impl MarkdownRenderer {
    pub fn new(highlighter: Box<dyn Highlighter>) -> Self {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION;
        Self {
            options,
            highlighter,
        }
    }

    /// Render the complete document. Unsanitized: raw HTML in the input
    /// passes through.
    pub fn render(&self, markdown: &str) -> String {
        let mut events = Vec::new();
        let mut pending: Option<PendingCode> = None;

        for event in Parser::new_ext(markdown, self.options) {
            if pending.is_some() {
                match event {
                    Event::Text(text) => {
                        if let Some(block) = pending.as_mut() {
                            block.code.push_str(&text);
                        }
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some(block) = pending.take() {
                            events.push(Event::Html(CowStr::from(self.code_block_html(block))));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => LanguageTag::from_info(&info),
                        CodeBlockKind::Indented => None,
                    };
                    pending = Some(PendingCode {
                        language,
                        code: String::new(),
                    });
                }
                Event::Code(code) => {
                    events.push(Event::Html(CowStr::from(self.inline_code_html(&code))))
                }
                Event::SoftBreak => events.push(Event::HardBreak),
                other => events.push(other),
            }
        }

        // Unclosed fences are closed by the parser at end of input
        if let Some(block) = pending.take() {
            events.push(Event::Html(CowStr::from(self.code_block_html(block))));
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn code_block_html(&self, block: PendingCode) -> String {
        let language = block
            .language
            .unwrap_or_else(|| infer_language(&block.code));
        format!("<pre>{}</pre>\n", self.code_html(&block.code, &language))
    }

    /// Inline code never carries a tag, so its language is always inferred.
    fn inline_code_html(&self, code: &str) -> String {
        self.code_html(code, &infer_language(code))
    }

    fn code_html(&self, code: &str, language: &LanguageTag) -> String {
        let body = match self.highlighter.highlight(code, language) {
            Ok(body) => body,
            Err(err) => {
                warn!(language = %language, error = %err, "highlighting failed, rendering plain code");
                escape_html(code)
            }
        };

        format!(
            "<code class=\"{} {}\">{}</code>",
            language.class_name(),
            HIGHLIGHTED_CLASS,
            body
        )
    }
}
