//! The world update orchestrator.
//!
//! One entry point per user turn: build a bounded prompt from the
//! accumulated world, send it through the transport, and normalize
//! whatever comes back. Transport failures surface as errors; malformed
//! model output never does - it degrades to an empty, clearly-marked
//! fallback update instead.

use std::sync::Arc;

use storypulse_domain::{extract_first_json_object, sanitize_story_elements, StoryElements};
use storypulse_protocol::{schema_description, ChatMessage, ChatRequest, ResponseFormat};

use crate::mode::StoryMode;
use crate::transport::{ChatTransport, TransportError};
use crate::world::{WorldState, WorldSummary};

/// Token budget for one world update turn.
const UPDATE_MAX_TOKENS: u32 = 512;

/// Where the elements of a [`WorldUpdate`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    /// A JSON object was extracted from the reply and sanitized.
    Extracted,
    /// The reply carried nothing usable; the elements are empty.
    Fallback,
}

/// One validated world-state delta.
#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub elements: StoryElements,
    pub source: UpdateSource,
}

impl WorldUpdate {
    pub fn was_extracted(&self) -> bool {
        self.source == UpdateSource::Extracted
    }
}

/// Client-side entry point for requesting story world updates.
pub struct WorldUpdateOrchestrator {
    transport: Arc<dyn ChatTransport>,
    model: Option<String>,
}

impl WorldUpdateOrchestrator {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            model: None,
        }
    }

    /// Pin a specific model instead of the engine's configured default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// One user turn: prompt, transport, extract, sanitize.
    pub async fn request_world_update(
        &self,
        input: &str,
        world: &WorldState,
        mode: StoryMode,
    ) -> Result<WorldUpdate, TransportError> {
        let summary = WorldSummary::from_world(world);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(system_instruction()),
                ChatMessage::user(user_turn(mode, &summary, input)),
            ],
            format: Some(ResponseFormat::Json),
            max_tokens: Some(UPDATE_MAX_TOKENS),
            ..Default::default()
        };

        let completion = self.transport.chat(request).await?;
        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or("");

        let update = match extract_first_json_object(content) {
            Some(value) => {
                let elements = sanitize_story_elements(&value);
                tracing::debug!(elements = elements.element_count(), "world update extracted");
                WorldUpdate {
                    elements,
                    source: UpdateSource::Extracted,
                }
            }
            None => {
                tracing::debug!("reply carried no JSON object, returning empty update");
                WorldUpdate {
                    elements: StoryElements::default(),
                    source: UpdateSource::Fallback,
                }
            }
        };

        Ok(update)
    }
}

fn system_instruction() -> String {
    format!(
        "You are a world-building AI for a collaborative storytelling app. \
         Respond with ONLY a single JSON object, no prose. {} \
         Return exactly 1 location, 1 character, 1 item, 1 event.",
        schema_description()
    )
}

fn user_turn(mode: StoryMode, summary: &WorldSummary, input: &str) -> String {
    let world = serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string());
    format!("Mode: {mode}. Current world: {world}. {input}")
}
