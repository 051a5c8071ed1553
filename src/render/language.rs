//! Language tags for fenced code blocks.

use std::fmt;

/// Marker substrings checked in order; the first rule with a hit wins.
const INFERENCE_RULES: &[(&str, &[&str])] = &[
    ("python", &["def ", "import ", "print("]),
    ("javascript", &["function ", "const ", "let "]),
];

/// Used when no rule matches.
const FALLBACK_LANGUAGE: &str = "javascript";

/// Language of a code block, normalized to the highlighter's names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    Python,
    JavaScript,
    Other(String),
}

impl LanguageTag {
    /// Tag from a fence info string (` ```js title="x" ` → `javascript`).
    ///
    /// Only the first word counts. Characters outside `[A-Za-z0-9_+#.-]`
    /// are dropped; an info string with nothing left yields `None`.
    pub fn from_info(info: &str) -> Option<Self> {
        let word = info.split_whitespace().next()?;
        let name: String = word
            .chars()
            .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '#' | '.' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        if name.is_empty() {
            return None;
        }

        Some(match name.as_str() {
            "js" | "javascript" | "jsx" | "mjs" | "cjs" | "node" => LanguageTag::JavaScript,
            "py" | "python" | "python3" | "py3" => LanguageTag::Python,
            _ => LanguageTag::Other(name),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            LanguageTag::Python => "python",
            LanguageTag::JavaScript => "javascript",
            LanguageTag::Other(name) => name,
        }
    }

    /// `language-<name>` class carried by the rendered `<code>` element.
    pub fn class_name(&self) -> String {
        format!("language-{}", self.as_str())
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guess the language of an untagged code block from its content.
///
/// # Example
/// ```
/// use travel_chat::render::language::{infer_language, LanguageTag};
///
/// assert_eq!(infer_language("import json\n"), LanguageTag::Python);
/// assert_eq!(infer_language("echo hi"), LanguageTag::JavaScript);
/// ```
pub fn infer_language(code: &str) -> LanguageTag {
    let name = INFERENCE_RULES
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| code.contains(m)))
        .map_or(FALLBACK_LANGUAGE, |(name, _)| *name);

    LanguageTag::from_info(name).unwrap_or(LanguageTag::JavaScript)
}
