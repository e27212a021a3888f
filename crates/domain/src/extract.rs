//! Rescue extraction of a JSON object from prose-laden model output.

use serde_json::Value;

/// Extract and parse the first balanced `{...}` object in `text`.
///
/// Scans from the first `{`, tracking brace depth; the first point depth
/// returns to zero bounds the candidate slice, which is then parsed
/// strictly. Text before the first `{` and after the matched `}` is
/// ignored, which is what makes this useful against models that wrap
/// their JSON in prose or markdown fences.
///
/// Returns `None` when there is no `{`, the braces never balance, or the
/// balanced slice is not valid JSON. Never panics.
///
/// Brace counting is deliberately naive about braces inside string
/// literals: the payload this rescues is expected to contain exactly one
/// JSON object plus noise, and a miscounted slice simply fails the strict
/// parse and yields `None`.
pub fn extract_first_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut end = None;

    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    serde_json::from_str(&text[start..end?]).ok()
}
