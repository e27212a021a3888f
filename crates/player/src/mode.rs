//! Story generation modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How adventurous the generated world updates should be. The mode is
/// embedded verbatim in the user turn of every prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryMode {
    /// Grounded, instructional tone.
    #[default]
    Education,
    /// Anything goes.
    Wildcard,
}

impl StoryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryMode::Education => "education",
            StoryMode::Wildcard => "wildcard",
        }
    }
}

impl fmt::Display for StoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_education() {
        assert_eq!(StoryMode::default(), StoryMode::Education);
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(
            serde_json::to_string(&StoryMode::Wildcard).expect("serialize"),
            "\"wildcard\""
        );
    }
}
