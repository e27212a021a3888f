//! Infrastructure implementations.
//!
//! Upstream dispatch and stream reframing for the two supported model
//! API flavors.

pub mod ports;
pub mod reframe;
pub mod upstream;
