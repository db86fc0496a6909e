//! Runtime configuration knobs for [`super::App`], in the teacher's
//! `RenderConfig` builder style (`app/config.rs`).
//!
//! `Serialize`/`Deserialize` let a host load this from a config file
//! (TOML/JSON/...) instead of hand-assembling it in code; the crate itself
//! stays format-agnostic and leaves the actual file I/O to the embedder.

use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Configuration for the terminal event loop.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Event polling duration in milliseconds (default: 50ms). Lower values
    /// make the app more responsive to input at the cost of more wakeups.
    pub poll_duration_ms: u64,
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for RenderConfig {
    fn default() -> Self {
        Self { poll_duration_ms: 50 }
    }
}
