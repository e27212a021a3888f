//! Visual shape tags for story elements.
//!
//! The renderer maps each tag to a fixed mesh, so the set is closed: any
//! tag outside this list is replaced by the element kind's default during
//! sanitization rather than rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the 14 renderable shape tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Tree,
    Tower,
    Cave,
    Village,
    Water,
    Humanoid,
    Warrior,
    Mage,
    Sprite,
    Sword,
    Potion,
    Gem,
    Scroll,
    Dragon,
}

impl Shape {
    /// All shape tags, in schema order.
    pub fn all() -> &'static [Shape] {
        &[
            Shape::Tree,
            Shape::Tower,
            Shape::Cave,
            Shape::Village,
            Shape::Water,
            Shape::Humanoid,
            Shape::Warrior,
            Shape::Mage,
            Shape::Sprite,
            Shape::Sword,
            Shape::Potion,
            Shape::Gem,
            Shape::Scroll,
            Shape::Dragon,
        ]
    }

    /// The wire tag for this shape.
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Tree => "tree",
            Shape::Tower => "tower",
            Shape::Cave => "cave",
            Shape::Village => "village",
            Shape::Water => "water",
            Shape::Humanoid => "humanoid",
            Shape::Warrior => "warrior",
            Shape::Mage => "mage",
            Shape::Sprite => "sprite",
            Shape::Sword => "sword",
            Shape::Potion => "potion",
            Shape::Gem => "gem",
            Shape::Scroll => "scroll",
            Shape::Dragon => "dragon",
        }
    }

    /// Parse a tag emitted by the model. Case-insensitive; unknown tags
    /// return `None` so the caller can substitute a default.
    pub fn from_tag(tag: &str) -> Option<Shape> {
        Shape::all()
            .iter()
            .copied()
            .find(|shape| shape.as_str().eq_ignore_ascii_case(tag.trim()))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
