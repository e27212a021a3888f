//! StoryPulse Player - the client-side world update orchestrator.
//!
//! The player owns the accumulated world state, builds bounded prompts
//! from it, talks to the engine bridge over HTTP/SSE, and runs every
//! reply through the domain extraction + sanitization pipeline before
//! anything reaches a renderer. The model's output is never trusted
//! directly, regardless of upstream success.

pub mod mode;
pub mod orchestrator;
pub mod transport;
pub mod world;

pub use mode::StoryMode;
pub use orchestrator::{UpdateSource, WorldUpdate, WorldUpdateOrchestrator};
pub use transport::{ChatTransport, HttpTransport, TransportError};
pub use world::{WorldState, WorldSummary, SUMMARY_ELEMENTS_PER_CATEGORY};
