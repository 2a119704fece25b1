//! Platform backends for the OS mixer.

#[cfg(target_os = "windows")]
mod windows;

#[cfg(not(target_os = "windows"))]
mod fallback;

use std::sync::Arc;

use super::backend::AudioBackend;

/// Construct the mixer backend for the current platform.
pub fn create_backend() -> Arc<dyn AudioBackend> {
    #[cfg(target_os = "windows")]
    return Arc::new(windows::WindowsAudioBackend::new());

    #[cfg(not(target_os = "windows"))]
    Arc::new(fallback::UnsupportedAudioBackend)
}
