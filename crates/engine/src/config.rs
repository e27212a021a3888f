//! Engine configuration.
//!
//! Everything is environment-supplied with fixed fallbacks, loaded once in
//! `main` and passed by value from there - including the upstream flavor,
//! which is detected from the configured URL exactly once so the two
//! dispatch code paths stay independently testable.

use serde::Serialize;

/// Default upstream endpoint (Ollama's OpenAI-compatible API).
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:11434/v1/chat/completions";

/// Default model when the client does not name one.
pub const DEFAULT_MODEL: &str = "gpt-oss:20b";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 4000;

/// Which wire shape the configured upstream speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamFlavor {
    /// OpenAI-compatible `/v1/chat/completions`.
    V1,
    /// Native chat API (Ollama `/api/chat` style).
    Native,
}

impl UpstreamFlavor {
    /// A versioned API path segment selects the OpenAI-compatible flavor;
    /// anything else is assumed native.
    pub fn detect(upstream_url: &str) -> UpstreamFlavor {
        if upstream_url.contains("/v1/") {
            UpstreamFlavor::V1
        } else {
            UpstreamFlavor::Native
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamFlavor::V1 => "v1",
            UpstreamFlavor::Native => "native",
        }
    }
}

/// Process configuration, resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub upstream_url: String,
    pub upstream_api_key: Option<String>,
    pub default_model: String,
    pub flavor: UpstreamFlavor,
    pub host: String,
    pub port: u16,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let upstream_url = std::env::var("UPSTREAM_URL")
            .or_else(|_| std::env::var("OLLAMA_URL"))
            .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.into());
        let upstream_api_key = std::env::var("UPSTREAM_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());
        let default_model = std::env::var("DEFAULT_MODEL")
            .or_else(|_| std::env::var("OLLAMA_MODEL"))
            .unwrap_or_else(|_| DEFAULT_MODEL.into());
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_HOST.into());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_default()
            .parse()
            .unwrap_or(DEFAULT_PORT);

        let flavor = UpstreamFlavor::detect(&upstream_url);

        Self {
            upstream_url,
            upstream_api_key,
            default_model,
            flavor,
            host,
            port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_path_selects_openai_flavor() {
        assert_eq!(
            UpstreamFlavor::detect("http://127.0.0.1:11434/v1/chat/completions"),
            UpstreamFlavor::V1
        );
        assert_eq!(
            UpstreamFlavor::detect("https://llm.lan/v1/chat/completions"),
            UpstreamFlavor::V1
        );
    }

    #[test]
    fn test_other_paths_select_native_flavor() {
        assert_eq!(
            UpstreamFlavor::detect("http://127.0.0.1:11434/api/chat"),
            UpstreamFlavor::Native
        );
        assert_eq!(
            UpstreamFlavor::detect("http://localhost:11434"),
            UpstreamFlavor::Native
        );
    }

    #[test]
    fn test_v1_must_be_a_path_segment() {
        // "v1" embedded in a hostname is not an API version segment.
        assert_eq!(
            UpstreamFlavor::detect("http://v1-models.lan/api/chat"),
            UpstreamFlavor::Native
        );
    }
}
