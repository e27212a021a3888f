//! Model request adaptation for "stubborn" model families.
//!
//! Some local model families reliably ignore a plain "respond in JSON"
//! instruction and wrap their output in analysis prose, markdown fences,
//! or leaked reasoning keys. For those families the message sequence is
//! rewritten before dispatch: a strict schema system instruction, a
//! one-shot example exchange, a synthetic assistant turn containing only
//! the opening brace (to bias the model toward continuing JSON
//! immediately), and the caller's seed re-appended.
//!
//! When prompt-level coercion is active the upstream API's native
//! JSON-mode flag must be suppressed (`force_plain`): combining both
//! mechanisms has been observed to make these families produce nothing
//! usable at all. This is an empirical workaround, not a derived rule.

use crate::message::ChatMessage;
use storypulse_domain::{Shape, Size};

/// Sampling temperature used when the caller does not specify one.
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

/// Hard ceiling applied to stubborn models regardless of the requested
/// temperature; hotter sampling makes their format drift worse.
pub const STUBBORN_TEMPERATURE_CEILING: f32 = 0.4;

/// A fully valid example payload for the one-shot exchange.
pub const EXAMPLE_JSON: &str = "{\"locations\":[{\"name\":\"Test Tower\",\"description\":\"Stub.\",\"shape\":\"tower\",\"color\":\"#112233\",\"size\":\"small\"}],\"characters\":[{\"name\":\"Test Keeper\",\"description\":\"Stub.\",\"shape\":\"humanoid\",\"color\":\"#445566\",\"size\":\"medium\"}],\"items\":[{\"name\":\"Test Prism\",\"description\":\"Stub.\",\"shape\":\"gem\",\"color\":\"#778899\",\"size\":\"small\"}],\"events\":[{\"name\":\"Test Reveal\",\"description\":\"Stub.\",\"shape\":\"scroll\",\"color\":\"#AABBCC\",\"size\":\"small\"}]}";

const FALLBACK_SEED: &str = "Seed: (none)";

/// One sentence describing the element schema, shared by the strict
/// system instruction and the client-side prompt builder so the two can
/// never drift apart.
pub fn schema_description() -> String {
    let shapes: Vec<&str> = Shape::all().iter().map(Shape::as_str).collect();
    let sizes: Vec<String> = Size::all()
        .iter()
        .map(|size| format!("\"{size}\""))
        .collect();
    format!(
        "Schema: {{\"locations\":[],\"characters\":[],\"items\":[],\"events\":[]}}. \
         Each element has name (<=60), description (<=500), shape ({}), \
         color (\"#RRGGBB\"), size ({}).",
        shapes.join("|"),
        sizes.join("|"),
    )
}

/// The strict system instruction used for stubborn models.
pub fn strict_json_system_prompt() -> String {
    format!(
        "You output ONLY a single JSON object. No prose, no code fences, no comments, \
         and no keys named thinking or reasoning. {} \
         Return exactly 1 location, 1 character, 1 item, 1 event.",
        schema_description()
    )
}

/// Classification table mapping model names to stubborn behavior.
///
/// Classification is a case-insensitive substring match against a list of
/// family patterns, so new troublesome families are added by pattern, not
/// by changing adapter control flow.
#[derive(Debug, Clone)]
pub struct ModelBehaviorTable {
    stubborn_patterns: Vec<String>,
}

impl ModelBehaviorTable {
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            stubborn_patterns: patterns
                .into_iter()
                .map(|pattern| pattern.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn is_stubborn(&self, model: &str) -> bool {
        let model = model.to_ascii_lowercase();
        self.stubborn_patterns
            .iter()
            .any(|pattern| model.contains(pattern.as_str()))
    }
}

impl Default for ModelBehaviorTable {
    /// The gpt-oss family is the known offender; add others here if needed.
    fn default() -> Self {
        Self::new(["gpt-oss"])
    }
}

/// Result of adapting an outgoing message sequence.
#[derive(Debug, Clone)]
pub struct AdaptedRequest {
    pub messages: Vec<ChatMessage>,
    /// When true the caller must NOT set the upstream's native JSON-mode
    /// flag; prompt-level coercion is already active.
    pub force_plain: bool,
}

/// Reshapes outgoing requests for the target model family.
#[derive(Debug, Clone, Default)]
pub struct ModelRequestAdapter {
    table: ModelBehaviorTable,
}

impl ModelRequestAdapter {
    pub fn new(table: ModelBehaviorTable) -> Self {
        Self { table }
    }

    pub fn is_stubborn(&self, model: &str) -> bool {
        self.table.is_stubborn(model)
    }

    /// Adapt a message sequence for the given model.
    ///
    /// Non-JSON requests and compliant models pass through unchanged.
    /// Stubborn models asked for JSON get the wrapped sequence and
    /// `force_plain = true`.
    pub fn adapt(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        wants_json: bool,
    ) -> AdaptedRequest {
        if !wants_json || !self.table.is_stubborn(model) {
            return AdaptedRequest {
                messages,
                force_plain: false,
            };
        }

        let seed = messages
            .last()
            .map(|message| message.content.clone())
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| FALLBACK_SEED.to_string());

        let wrapped = vec![
            ChatMessage::system(strict_json_system_prompt()),
            ChatMessage::user("Example only. Follow exactly this shape and formatting:"),
            ChatMessage::assistant(EXAMPLE_JSON),
            // Brace seed: the model continues from "{" instead of opening
            // with prose.
            ChatMessage::assistant("{"),
            ChatMessage::user(seed),
        ];

        AdaptedRequest {
            messages: wrapped,
            force_plain: true,
        }
    }

    /// Effective sampling temperature for this model: caller's value (or
    /// the default), clamped to the stubborn ceiling where that applies.
    pub fn effective_temperature(&self, model: &str, requested: Option<f32>) -> f32 {
        let temperature = requested.unwrap_or(DEFAULT_TEMPERATURE);
        if self.table.is_stubborn(model) {
            temperature.min(STUBBORN_TEMPERATURE_CEILING)
        } else {
            temperature
        }
    }
}
