//! Volume semantics over resolved sessions.
//!
//! Percent inputs saturate into their valid range instead of erroring, and
//! integer percents round half away from zero everywhere they are produced.

use std::sync::Arc;

use serde::Deserialize;

use super::backend::AudioBackend;
use super::AudioError;

/// Default step size for relative adjustments, in percent.
pub const DEFAULT_STEP_PERCENT: f32 = 5.0;

/// Direction of a relative volume step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDirection {
    Up,
    Down,
}

/// Read and mutate operations on a named application's session.
///
/// Every operation resolves its target afresh through the backend; a miss
/// is a clean "not found" outcome, never an error.
pub struct VolumeEngine {
    backend: Arc<dyn AudioBackend>,
}

impl VolumeEngine {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self { backend }
    }

    /// Absolute set. `percent` saturates into `[0, 100]` before it is
    /// applied as a linear level. Returns `false` when the app has no live
    /// session.
    pub fn set_volume(&self, app: &str, percent: f32) -> Result<bool, AudioError> {
        let level = percent.clamp(0.0, 100.0) / 100.0;
        self.backend.apply_volume(app, level)
    }

    /// Flip the target's mute flag.
    pub fn toggle_mute(&self, app: &str) -> Result<bool, AudioError> {
        match self.backend.find_session(app)? {
            Some(state) => self.backend.apply_mute(app, !state.muted),
            None => Ok(false),
        }
    }

    /// Relative step, clamped to `[0.0, 1.0]`. Returns the resulting integer
    /// percent so the caller can render feedback without a follow-up query,
    /// or `None` when the app has no live session.
    pub fn step_volume(
        &self,
        app: &str,
        direction: StepDirection,
        step_percent: f32,
    ) -> Result<Option<u32>, AudioError> {
        let Some(state) = self.backend.find_session(app)? else {
            return Ok(None);
        };
        let target = stepped(state.level, direction, step_percent);
        if self.backend.apply_volume(app, target)? {
            Ok(Some(to_percent(target)))
        } else {
            Ok(None)
        }
    }

    /// Current volume as an integer percent, or `None` when the app has no
    /// live session.
    pub fn current_volume(&self, app: &str) -> Result<Option<u32>, AudioError> {
        Ok(self.backend.find_session(app)?.map(|s| to_percent(s.level)))
    }
}

/// Apply a percent step to a linear level, saturating at the range ends.
/// Negative step sizes are treated as zero rather than inverting direction.
fn stepped(level: f32, direction: StepDirection, step_percent: f32) -> f32 {
    let delta = step_percent.max(0.0) / 100.0;
    match direction {
        StepDirection::Up => (level + delta).min(1.0),
        StepDirection::Down => (level - delta).max(0.0),
    }
}

/// Linear level to integer percent, rounding half away from zero.
fn to_percent(level: f32) -> u32 {
    (level * 100.0).round() as u32
}
