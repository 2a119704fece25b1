//! Inert backend for platforms without a per-application mixer integration.

use crate::audio::backend::{AudioBackend, SessionInfo, SessionState};
use crate::audio::icon::RawIcon;
use crate::audio::AudioError;

/// Backend that reports no endpoint and no sessions.
pub struct UnsupportedAudioBackend;

impl AudioBackend for UnsupportedAudioBackend {
    fn initialize(&self) -> Result<(), AudioError> {
        log::warn!("per-application mixer control is not implemented on this platform; every lookup will miss");
        Ok(())
    }

    fn find_session(&self, _process_name: &str) -> Result<Option<SessionState>, AudioError> {
        Ok(None)
    }

    fn apply_volume(&self, _process_name: &str, _level: f32) -> Result<bool, AudioError> {
        Ok(false)
    }

    fn apply_mute(&self, _process_name: &str, _muted: bool) -> Result<bool, AudioError> {
        Ok(false)
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>, AudioError> {
        Ok(Vec::new())
    }

    fn load_icon(&self, _exe_path: &str) -> Option<RawIcon> {
        None
    }
}
