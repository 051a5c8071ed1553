//! Chunk join policy and the accumulated logical document.
//!
//! Two ways of gluing text chunks together exist:
//!
//! - [`JoinPolicy::Direct`] concatenates chunks as they arrive. This is the
//!   default: the live rendering then matches the text the backend stores
//!   in history.
//! - [`JoinPolicy::Spaced`] inserts a single space between two word
//!   characters (ASCII alphanumeric or CJK) that meet at a chunk boundary,
//!   unless the boundary sits inside an open fenced code block.

use std::fmt;
use std::str::FromStr;

const FENCE: &str = "```";

/// Rule for joining a new chunk onto the accumulated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    #[default]
    Direct,
    Spaced,
}

impl JoinPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinPolicy::Direct => "direct",
            JoinPolicy::Spaced => "spaced",
        }
    }
}

impl fmt::Display for JoinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(JoinPolicy::Direct),
            "spaced" => Ok(JoinPolicy::Spaced),
            other => Err(format!("unknown join policy: {other}")),
        }
    }
}

/// CJK unified ideographs, extension A, compatibility ideographs and extension B.
pub fn is_cjk(c: char) -> bool {
    matches!(
        c,
        '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
    )
}

pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || is_cjk(c)
}

/// Number of triple-backtick fences in `text`.
pub fn fence_count(text: &str) -> usize {
    text.matches(FENCE).count()
}

/// An odd fence count means the end of `text` is inside a code block.
pub fn inside_fence(text: &str) -> bool {
    fence_count(text) % 2 == 1
}

/// The logical document built from the text chunks of one session.
#[derive(Debug, Clone, Default)]
pub struct AccumulatedText {
    text: String,
    policy: JoinPolicy,
}

impl AccumulatedText {
    pub fn new(policy: JoinPolicy) -> Self {
        Self {
            text: String::new(),
            policy,
        }
    }

    /// Append a chunk under the configured policy.
    pub fn push(&mut self, chunk: &str) {
        if self.needs_separator(chunk) {
            self.text.push(' ');
        }
        self.text.push_str(chunk);
    }

    fn needs_separator(&self, chunk: &str) -> bool {
        if self.policy != JoinPolicy::Spaced {
            return false;
        }
        let (Some(prev), Some(next)) = (self.text.chars().next_back(), chunk.chars().next()) else {
            return false;
        };
        is_word_char(prev) && is_word_char(next) && !inside_fence(&self.text)
    }

    pub fn policy(&self) -> JoinPolicy {
        self.policy
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(policy: JoinPolicy, chunks: &[&str]) -> String {
        let mut text = AccumulatedText::new(policy);
        for chunk in chunks {
            text.push(chunk);
        }
        text.into_string()
    }

    #[test]
    fn test_direct_concatenates() {
        assert_eq!(joined(JoinPolicy::Direct, &["Hel", "lo", " world"]), "Hello world");
        assert_eq!(joined(JoinPolicy::Direct, &["你好", "世界"]), "你好世界");
    }

    #[test]
    fn test_spaced_separates_word_chars() {
        assert_eq!(joined(JoinPolicy::Spaced, &["Hello", "world"]), "Hello world");
        assert_eq!(joined(JoinPolicy::Spaced, &["杭州", "西湖"]), "杭州 西湖");
        assert_eq!(joined(JoinPolicy::Spaced, &["day", "2"]), "day 2");
    }

    #[test]
    fn test_spaced_leaves_punctuation_and_whitespace_alone() {
        assert_eq!(joined(JoinPolicy::Spaced, &["Hello ", "world"]), "Hello world");
        assert_eq!(joined(JoinPolicy::Spaced, &["Hello", ", world"]), "Hello, world");
        assert_eq!(joined(JoinPolicy::Spaced, &["**", "bold", "**"]), "**bold**");
    }

    #[test]
    fn test_spaced_never_joins_inside_open_fence() {
        let text = joined(JoinPolicy::Spaced, &["```python\nprint", "x"]);
        assert_eq!(text, "```python\nprintx");

        // Once the fence closes, spacing resumes
        let text = joined(JoinPolicy::Spaced, &["```\ncode\n```\nend", "done"]);
        assert_eq!(text, "```\ncode\n```\nend done");
    }

    #[test]
    fn test_fence_split_across_chunks_is_counted_after_join() {
        let text = joined(JoinPolicy::Spaced, &["``", "`js\nlet", "x"]);
        assert_eq!(text, "```js\nletx");
    }

    #[test]
    fn test_first_chunk_gets_no_separator() {
        assert_eq!(joined(JoinPolicy::Spaced, &["a"]), "a");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Spaced".parse::<JoinPolicy>(), Ok(JoinPolicy::Spaced));
        assert_eq!(" direct ".parse::<JoinPolicy>(), Ok(JoinPolicy::Direct));
        assert!("merge".parse::<JoinPolicy>().is_err());
    }

    #[test]
    fn test_fence_helpers() {
        assert_eq!(fence_count("no fences"), 0);
        assert!(inside_fence("```rust\nfn main"));
        assert!(!inside_fence("```rust\nfn main() {}\n```"));
    }
}
