//! Audio session control.
//!
//! Talks to the operating system's per-application mixer: resolving live
//! sessions by process name, reading and mutating their volume and mute
//! state, and enumerating the applications currently rendering audio.

pub(crate) mod backend;
mod discovery;
mod engine;
mod icon;
mod platform;

pub use backend::AudioBackend;
pub use discovery::{AppDiscovery, DiscoveredApp};
pub use engine::{StepDirection, VolumeEngine, DEFAULT_STEP_PERCENT};
pub use platform::create_backend;

use thiserror::Error;

/// Errors surfaced by the platform audio layer.
///
/// Per-session problems (an exited process, a vanished session) are not
/// errors; they are handled locally as misses or skips. This enum covers
/// systemic failures only.
#[derive(Debug, Error)]
pub enum AudioError {
    /// No default render endpoint is available.
    #[error("no default render endpoint is available")]
    EndpointUnavailable,

    /// A Core Audio call failed.
    #[cfg(target_os = "windows")]
    #[error("core audio call failed: {0}")]
    Com(#[from] windows::core::Error),
}
