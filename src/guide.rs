//! Attraction guide requests.

use std::fmt;
use std::str::FromStr;

use crate::model::{AttractionGuideRequest, StreamRequest};

/// Narration style of an attraction guide.
///
/// The backend recognizes styles by their Chinese label, so that label is
/// what goes into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuideStyle {
    #[default]
    Academic,
    Storytelling,
    FamilyFriendly,
    Influencer,
    Humorous,
}

impl GuideStyle {
    pub const ALL: [GuideStyle; 5] = [
        GuideStyle::Academic,
        GuideStyle::Storytelling,
        GuideStyle::FamilyFriendly,
        GuideStyle::Influencer,
        GuideStyle::Humorous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GuideStyle::Academic => "academic",
            GuideStyle::Storytelling => "storytelling",
            GuideStyle::FamilyFriendly => "family-friendly",
            GuideStyle::Influencer => "influencer",
            GuideStyle::Humorous => "humorous",
        }
    }

    /// Label the backend's guide agent switches on.
    pub fn wire_label(&self) -> &'static str {
        match self {
            GuideStyle::Academic => "学术型",
            GuideStyle::Storytelling => "故事型",
            GuideStyle::FamilyFriendly => "亲子型",
            GuideStyle::Influencer => "网红风格",
            GuideStyle::Humorous => "幽默诙谐",
        }
    }
}

impl fmt::Display for GuideStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuideStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        GuideStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s) || style.wire_label() == s)
            .ok_or_else(|| format!("unknown guide style: {s}"))
    }
}

/// Prompt sent to `/attraction_guide`.
pub fn guide_prompt(attraction: &str, style: GuideStyle) -> String {
    format!(
        "Please give a detailed {}-style introduction to {}, covering its historical background, \
         cultural significance, architecture and visiting tips.",
        style.wire_label(),
        attraction
    )
}

/// Markdown shown as the user's message for a guide request.
pub fn guide_display(attraction: &str, style: GuideStyle) -> String {
    format!(
        "🏛️ **Attraction guide request**\n\n**Attraction**: {}\n**Style**: {}\n\nPreparing your guide...",
        attraction, style
    )
}

pub fn guide_request(attraction: &str, style: GuideStyle) -> StreamRequest {
    StreamRequest::AttractionGuide(AttractionGuideRequest {
        message: guide_prompt(attraction, style),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parsing() {
        assert_eq!("Humorous".parse::<GuideStyle>(), Ok(GuideStyle::Humorous));
        assert_eq!("亲子型".parse::<GuideStyle>(), Ok(GuideStyle::FamilyFriendly));
        assert_eq!("family-friendly".parse::<GuideStyle>(), Ok(GuideStyle::FamilyFriendly));
        assert!("poetic".parse::<GuideStyle>().is_err());
    }

    #[test]
    fn test_prompt_carries_wire_label() {
        let prompt = guide_prompt("Terracotta Army", GuideStyle::Storytelling);
        assert!(prompt.contains("故事型"));
        assert!(prompt.contains("Terracotta Army"));

        let display = guide_display("Terracotta Army", GuideStyle::Storytelling);
        assert!(display.contains("**Style**: storytelling"));
    }

    #[test]
    fn test_request_targets_guide_endpoint() {
        assert_eq!(guide_request("West Lake", GuideStyle::default()).path(), "/attraction_guide");
    }
}
