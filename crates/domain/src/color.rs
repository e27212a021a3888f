//! Hex color validation and fallback generation.

use rand::Rng;
use regex_lite::Regex;
use std::sync::LazyLock;

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^#[0-9A-Fa-f]{6}$").expect("valid regex"));

/// Returns true if `value` is a strict 7-character `#RRGGBB` color.
///
/// Shorthand (`#abc`), named colors, and `rgb()` notation are all
/// rejected: the renderer only accepts the full hex form, and the
/// sanitizer replaces anything else rather than trying to repair it.
pub fn is_valid_hex_color(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value)
}

/// Generate a random `#RRGGBB` color for elements whose color was missing
/// or malformed.
pub fn random_hex_color() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "#{:02X}{:02X}{:02X}",
        rng.gen::<u8>(),
        rng.gen::<u8>(),
        rng.gen::<u8>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_hex_colors() {
        assert!(is_valid_hex_color("#112233"));
        assert!(is_valid_hex_color("#AABBCC"));
        assert!(is_valid_hex_color("#aAbBcC"));
    }

    #[test]
    fn test_invalid_hex_colors() {
        assert!(!is_valid_hex_color("112233"));
        assert!(!is_valid_hex_color("#12345"));
        assert!(!is_valid_hex_color("#1234567"));
        assert!(!is_valid_hex_color("#11223G"));
        assert!(!is_valid_hex_color("#abc"));
        assert!(!is_valid_hex_color("red"));
        assert!(!is_valid_hex_color(""));
    }

    #[test]
    fn test_random_color_is_always_valid() {
        for _ in 0..100 {
            let color = random_hex_color();
            assert!(is_valid_hex_color(&color), "generated {color}");
        }
    }
}
