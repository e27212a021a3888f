//! The per-turn story delta.

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// One turn's worth of new story elements, grouped by category.
///
/// Produced fresh for every model turn. Appending it to the accumulated
/// world state is the caller's concern; the sequences here are
/// order-preserving and never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryElements {
    #[serde(default)]
    pub locations: Vec<Element>,
    #[serde(default)]
    pub characters: Vec<Element>,
    #[serde(default)]
    pub items: Vec<Element>,
    #[serde(default)]
    pub events: Vec<Element>,
}

impl StoryElements {
    /// True when all four categories are empty.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
            && self.characters.is_empty()
            && self.items.is_empty()
            && self.events.is_empty()
    }

    /// Total element count across all categories.
    pub fn element_count(&self) -> usize {
        self.locations.len() + self.characters.len() + self.items.len() + self.events.len()
    }
}
