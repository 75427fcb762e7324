//! Display blocks emitted by the renderer.

use serde::Serialize;
use serde_json::Value;

/// An abstract renderable unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayBlock {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    BulletList { items: Vec<ListItem> },
    NumberedList { items: Vec<ListItem> },
    KeyValue { key: String, value: String },
    Link { text: String, href: String },
    Warning { text: String },
    /// Content the renderer has no shape for, kept verbatim.
    RawDump { value: Value },
}

impl DisplayBlock {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    pub fn key_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::Warning { text: text.into() }
    }
}

/// One list entry: a bold title, optional body text and labelled detail lines.
///
/// `title` and `body` are printed as `**title**: body`; an empty title prints the
/// body alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListItem {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Detail>,
}

impl ListItem {
    /// Item with body text only, e.g. an answer line or bare-string entry.
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn titled(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push(Detail {
            label: label.into(),
            value: value.into(),
        });
        self
    }
}

/// Labelled sub-field printed beneath a list item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detail {
    pub label: String,
    pub value: String,
}
