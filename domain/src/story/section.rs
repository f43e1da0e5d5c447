//! Segment mutation commands.

use serde::{Deserialize, Serialize};

/// A single write against one segment field.
///
/// Each variant carries the argument type its field needs, so there is no
/// runtime branching on the current shape of the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SectionWrite {
    ReplaceText(String),
    AppendText(String),
    ReplaceImages(Vec<String>),
    AppendImages(Vec<String>),
}

impl SectionWrite {
    /// Text write, appending unless `replace` is set.
    pub fn text(value: impl Into<String>, replace: bool) -> Self {
        if replace {
            SectionWrite::ReplaceText(value.into())
        } else {
            SectionWrite::AppendText(value.into())
        }
    }

    /// Image write, appending unless `replace` is set.
    pub fn images(values: Vec<String>, replace: bool) -> Self {
        if replace {
            SectionWrite::ReplaceImages(values)
        } else {
            SectionWrite::AppendImages(values)
        }
    }
}
