//! StoryPulse domain - the bounded story element schema and the
//! model-output normalization pipeline.
//!
//! Everything in this crate is a pure synchronous transformation: no I/O,
//! no async, no shared state. The two entry points most callers want are
//! [`extract_first_json_object`] (rescue a JSON object out of prose-laden
//! model output) and [`sanitize_story_elements`] (coerce the rescued value
//! into a structurally valid [`StoryElements`], clamping every field).

pub mod color;
pub mod element;
pub mod extract;
pub mod sanitize;
pub mod shape;
pub mod size;
pub mod story;

pub use color::{is_valid_hex_color, random_hex_color};
pub use element::{Element, ElementKind, DESCRIPTION_MAX_CHARS, NAME_MAX_CHARS};
pub use extract::extract_first_json_object;
pub use sanitize::{sanitize_element, sanitize_story_elements};
pub use shape::Shape;
pub use size::Size;
pub use story::StoryElements;
