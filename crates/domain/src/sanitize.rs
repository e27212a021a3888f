//! Best-effort coercion of untrusted model output into the element schema.
//!
//! The upstream model is a creative-writing model and misbehaves
//! routinely: wrong types, overlong strings, invented shape tags, CSS
//! color names. None of that is an error here. Every input produces a
//! structurally valid [`StoryElements`]; unusable fields are clamped or
//! replaced with defaults, and unusable input collapses to four empty
//! sequences.

use serde_json::Value;

use crate::color::{is_valid_hex_color, random_hex_color};
use crate::element::{
    Element, ElementKind, DESCRIPTION_MAX_CHARS, DESCRIPTION_PLACEHOLDER, NAME_MAX_CHARS,
};
use crate::shape::Shape;
use crate::size::Size;
use crate::story::StoryElements;

/// Coerce an arbitrary JSON value into a valid [`StoryElements`].
///
/// Total: never fails, never panics. Non-object input (null, arrays,
/// primitives) and missing or non-array category fields yield empty
/// sequences for the affected categories.
pub fn sanitize_story_elements(candidate: &Value) -> StoryElements {
    let Some(object) = candidate.as_object() else {
        return StoryElements::default();
    };

    StoryElements {
        locations: sanitize_category(object.get("locations"), ElementKind::Location),
        characters: sanitize_category(object.get("characters"), ElementKind::Character),
        items: sanitize_category(object.get("items"), ElementKind::Item),
        events: sanitize_category(object.get("events"), ElementKind::Event),
    }
}

fn sanitize_category(value: Option<&Value>, kind: ElementKind) -> Vec<Element> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items.iter().map(|item| sanitize_element(item, kind)).collect()
}

/// Coerce one candidate element. Each field is validated independently so
/// a single bad field never discards the rest of the element.
pub fn sanitize_element(candidate: &Value, kind: ElementKind) -> Element {
    let name = bounded_text(candidate.get("name"), NAME_MAX_CHARS)
        .unwrap_or_else(|| kind.placeholder_name());

    let description = bounded_text(candidate.get("description"), DESCRIPTION_MAX_CHARS)
        .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string());

    let shape = candidate
        .get("shape")
        .and_then(Value::as_str)
        .and_then(Shape::from_tag)
        .unwrap_or_else(|| kind.default_shape());

    // Malformed colors are replaced, not repaired: guessing what the model
    // meant by "dark-ish red" is not this layer's job.
    let color = match candidate.get("color").and_then(Value::as_str) {
        Some(value) if is_valid_hex_color(value) => value.to_string(),
        _ => random_hex_color(),
    };

    let size = candidate
        .get("size")
        .and_then(Value::as_str)
        .and_then(Size::from_tag)
        .unwrap_or_default();

    Element {
        name,
        description,
        shape,
        color,
        size,
    }
}

/// Non-string or empty values are treated as absent; overlong strings are
/// truncated on a char boundary, never rejected.
fn bounded_text(value: Option<&Value>, max_chars: usize) -> Option<String> {
    let text = value?.as_str()?;
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(max_chars).collect())
}
