//! Element size scale.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Render scale for an element. Anything the model emits outside this
/// 3-value set collapses to [`Size::Medium`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
}

impl Size {
    /// All sizes, smallest first.
    pub fn all() -> &'static [Size] {
        &[Size::Small, Size::Medium, Size::Large]
    }

    /// The wire tag for this size.
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Large => "large",
        }
    }

    /// Parse a tag emitted by the model; unknown tags return `None`.
    pub fn from_tag(tag: &str) -> Option<Size> {
        Size::all()
            .iter()
            .copied()
            .find(|size| size.as_str().eq_ignore_ascii_case(tag.trim()))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
