//! Client-owned world state and the bounded summary sent in prompts.

use serde::{Deserialize, Serialize};

use storypulse_domain::{Element, Shape, Size, StoryElements};

/// How many recent elements per category the prompt summary carries.
///
/// This bound exists to keep prompt size roughly constant no matter how
/// large the accumulated story has grown.
pub const SUMMARY_ELEMENTS_PER_CATEGORY: usize = 8;

/// The full accumulated world, owned by the client.
///
/// Append-only and order-preserving: each turn's [`StoryElements`] delta
/// is absorbed at the end of its category, with no dedup by content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    #[serde(default)]
    pub locations: Vec<Element>,
    #[serde(default)]
    pub characters: Vec<Element>,
    #[serde(default)]
    pub items: Vec<Element>,
    #[serde(default)]
    pub events: Vec<Element>,
}

impl WorldState {
    /// Append one turn's delta.
    pub fn absorb(&mut self, delta: StoryElements) {
        self.locations.extend(delta.locations);
        self.characters.extend(delta.characters);
        self.items.extend(delta.items);
        self.events.extend(delta.events);
    }

    pub fn element_count(&self) -> usize {
        self.locations.len() + self.characters.len() + self.items.len() + self.events.len()
    }
}

/// Core fields of one element, as embedded in the prompt summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryElement {
    pub name: String,
    pub shape: Shape,
    pub size: Size,
    pub color: String,
}

impl From<&Element> for SummaryElement {
    fn from(element: &Element) -> Self {
        Self {
            name: element.name.clone(),
            shape: element.shape,
            size: element.size,
            color: element.color.clone(),
        }
    }
}

/// A deliberately truncated view of the world: the last
/// [`SUMMARY_ELEMENTS_PER_CATEGORY`] entries per category, core fields
/// only. Recomputed on every turn, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldSummary {
    pub locations: Vec<SummaryElement>,
    pub characters: Vec<SummaryElement>,
    pub items: Vec<SummaryElement>,
    pub events: Vec<SummaryElement>,
}

impl WorldSummary {
    pub fn from_world(world: &WorldState) -> Self {
        Self {
            locations: summarize(&world.locations),
            characters: summarize(&world.characters),
            items: summarize(&world.items),
            events: summarize(&world.events),
        }
    }
}

fn summarize(elements: &[Element]) -> Vec<SummaryElement> {
    let skip = elements.len().saturating_sub(SUMMARY_ELEMENTS_PER_CATEGORY);
    elements[skip..].iter().map(SummaryElement::from).collect()
}
