//! StoryPulse Protocol - Shared types for Engine and Player communication
//!
//! This crate contains everything shared between the engine (server bridge)
//! and the player (client orchestrator):
//! - Chat wire format: messages, the logical chat request, response envelopes
//! - The model request adapter (stubborn-model prompt wrapping)
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, serde_json, chrono, and the domain
//!    vocabulary only
//! 2. **Single source of truth** - the adapter and the schema prompt live
//!    here precisely so the server dispatch path and the client prompt
//!    builder cannot drift apart

pub mod adapter;
pub mod message;
pub mod request;
pub mod response;

pub use adapter::{
    schema_description, strict_json_system_prompt, AdaptedRequest, ModelBehaviorTable,
    ModelRequestAdapter, DEFAULT_TEMPERATURE, STUBBORN_TEMPERATURE_CEILING,
};
pub use message::{ChatMessage, Role};
pub use request::{ChatRequest, ResponseFormat};
pub use response::{
    ChatChoice, ChatCompletion, ChatCompletionChunk, ChunkChoice, ChunkDelta, FinishReason,
    UnifiedChatResponse,
};
