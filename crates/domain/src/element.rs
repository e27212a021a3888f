//! A single visualizable story entity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shape::Shape;
use crate::size::Size;

/// Maximum element name length, in characters, after truncation.
pub const NAME_MAX_CHARS: usize = 60;

/// Maximum element description length, in characters, after truncation.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Placeholder description for elements the model left undescribed.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description yet.";

/// The four element categories of the story schema.
///
/// The kind decides which shape an element falls back to when the model
/// emits an unknown or missing shape tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Location,
    Character,
    Item,
    Event,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Location => "location",
            ElementKind::Character => "character",
            ElementKind::Item => "item",
            ElementKind::Event => "event",
        }
    }

    /// Fallback shape used when the model's shape tag is absent or invalid.
    pub fn default_shape(&self) -> Shape {
        match self {
            ElementKind::Location => Shape::Cave,
            ElementKind::Character => Shape::Humanoid,
            ElementKind::Item => Shape::Gem,
            ElementKind::Event => Shape::Scroll,
        }
    }

    /// Placeholder name for elements the model left unnamed.
    pub fn placeholder_name(&self) -> String {
        format!("Unnamed {}", self.as_str())
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schema-conformant story entity.
///
/// Every `Element` produced by the sanitizer satisfies the field bounds:
/// name 1..=60 chars, description <=500 chars, shape and size members of
/// their enums, color a strict `#RRGGBB` string. The renderer relies on
/// this and performs no further validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub description: String,
    pub shape: Shape,
    pub color: String,
    pub size: Size,
}
