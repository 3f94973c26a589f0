//! Inline rich text.
//!
//! A block of rich text is a list of spans. Each span is either a bare
//! string or a `[text, attributes]` pair:
//!
//! ```text
//! ["hello ", ["world", { "b": true }]]
//! ```

use serde::{Deserialize, Serialize};

/// A block of inline rich text.
pub type RichText = Vec<RichTextSpan>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RichTextSpan {
    Plain(String),
    Formatted(String, SpanAttributes),
}

impl RichTextSpan {
    pub fn text(&self) -> &str {
        match self {
            RichTextSpan::Plain(text) | RichTextSpan::Formatted(text, _) => text,
        }
    }

    pub fn attributes(&self) -> Option<&SpanAttributes> {
        match self {
            RichTextSpan::Plain(_) => None,
            RichTextSpan::Formatted(_, attrs) => Some(attrs),
        }
    }
}

impl From<&str> for RichTextSpan {
    fn from(text: &str) -> Self {
        RichTextSpan::Plain(text.to_string())
    }
}

/// Formatting of a span. Absent flags are `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpanAttributes {
    /// Bold.
    #[serde(skip_serializing_if = "is_false")]
    pub b: bool,
    /// Italic.
    #[serde(skip_serializing_if = "is_false")]
    pub i: bool,
    /// Underline.
    #[serde(skip_serializing_if = "is_false")]
    pub u: bool,
    /// Strikethrough.
    #[serde(skip_serializing_if = "is_false")]
    pub s: bool,
    /// Monospace.
    #[serde(skip_serializing_if = "is_false")]
    pub m: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub tag: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub spoiler: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<blah_identity::AbsoluteUrl>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Concatenate the text of every span, dropping formatting.
pub fn to_plain_text(rich_text: &[RichTextSpan]) -> String {
    rich_text.iter().map(RichTextSpan::text).collect()
}
