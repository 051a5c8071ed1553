use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::language::LanguageTag;
use super::RenderError;

/// Syntax highlighter for code blocks.
pub trait Highlighter: Send + Sync {
    /// Highlighted inner HTML for a `<code>` element. The output must be
    /// safe to embed: all code text escaped.
    fn highlight(&self, code: &str, language: &LanguageTag) -> Result<String, RenderError>;
}

/// Class-based HTML highlighting backed by syntect's default syntaxes.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// CSS for the classes this highlighter emits.
    pub fn stylesheet(theme_name: &str) -> Result<String, RenderError> {
        let theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .get(theme_name)
            .ok_or_else(|| RenderError::UnknownTheme(theme_name.to_string()))?;
        Ok(css_for_theme_with_class_style(theme, ClassStyle::Spaced)?)
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: &LanguageTag) -> Result<String, RenderError> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(language.as_str())
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}
