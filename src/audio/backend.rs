//! Platform seam for the OS mixer.

use super::icon::RawIcon;
use super::AudioError;

/// Volume and mute snapshot of one resolved session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    /// Linear volume level in `[0.0, 1.0]`.
    pub level: f32,
    /// Whether the session is muted.
    pub muted: bool,
}

/// One session observed during a discovery sweep.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Owning process id; 0 is the system-sounds session.
    pub process_id: u32,
    /// Process image name without the `.exe` suffix, when resolvable.
    pub process_name: Option<String>,
    /// Full path of the owning executable, when resolvable.
    pub exe_path: Option<String>,
}

/// Backend over the OS audio mixer.
///
/// Sessions are never cached: every call re-resolves against the live OS
/// state, so callers cannot hold a stale handle across requests.
pub trait AudioBackend: Send + Sync {
    /// Verify the mixer is usable. Acquiring the default render endpoint is
    /// the one operation allowed to fail fatally, and only at startup.
    fn initialize(&self) -> Result<(), AudioError>;

    /// Resolve `process_name` to a session on the default render endpoint
    /// and snapshot its state. The comparison is a case-insensitive exact
    /// match; the first session in enumeration order wins.
    fn find_session(&self, process_name: &str) -> Result<Option<SessionState>, AudioError>;

    /// Write a linear volume level to the named session. Returns `false`
    /// when no session matched.
    fn apply_volume(&self, process_name: &str, level: f32) -> Result<bool, AudioError>;

    /// Write the mute flag of the named session. Returns `false` when no
    /// session matched.
    fn apply_mute(&self, process_name: &str, muted: bool) -> Result<bool, AudioError>;

    /// List every session on every active render endpoint, in enumeration
    /// order. Sessions whose process cannot be identified keep their
    /// optional fields empty rather than being dropped.
    fn list_sessions(&self) -> Result<Vec<SessionInfo>, AudioError>;

    /// Extract the icon pixels of an executable. Best-effort; `None` means
    /// the caller degrades to no icon.
    fn load_icon(&self, exe_path: &str) -> Option<RawIcon>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use crate::audio::icon::RawIcon;
    use crate::audio::AudioError;

    use super::{AudioBackend, SessionInfo, SessionState};

    /// One scripted session inside a [`FakeBackend`].
    #[derive(Debug, Clone)]
    pub struct FakeSession {
        pub process_id: u32,
        pub process_name: Option<String>,
        pub exe_path: Option<String>,
        pub level: f32,
        pub muted: bool,
    }

    impl FakeSession {
        pub fn named(name: &str, level: f32) -> Self {
            Self {
                process_id: 100,
                process_name: Some(name.to_string()),
                exe_path: None,
                level,
                muted: false,
            }
        }
    }

    /// In-memory mixer used by tests above the platform seam.
    #[derive(Default)]
    pub struct FakeBackend {
        sessions: Mutex<Vec<FakeSession>>,
        icons: Mutex<HashMap<String, RawIcon>>,
        broken: AtomicBool,
    }

    impl FakeBackend {
        pub fn push(&self, session: FakeSession) {
            self.sessions.lock().unwrap().push(session);
        }

        pub fn put_icon(&self, exe_path: &str, icon: RawIcon) {
            self.icons.lock().unwrap().insert(exe_path.to_string(), icon);
        }

        /// Make every subsequent call fail, simulating a dying audio stack.
        pub fn break_backend(&self) {
            self.broken.store(true, Ordering::SeqCst);
        }

        pub fn level_of(&self, name: &str) -> f32 {
            self.sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.process_name.as_deref() == Some(name))
                .unwrap()
                .level
        }

        pub fn muted_of(&self, name: &str) -> bool {
            self.sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.process_name.as_deref() == Some(name))
                .unwrap()
                .muted
        }

        fn check(&self) -> Result<(), AudioError> {
            if self.broken.load(Ordering::SeqCst) {
                Err(AudioError::EndpointUnavailable)
            } else {
                Ok(())
            }
        }

        fn matches(session: &FakeSession, name: &str) -> bool {
            session.process_id != 0
                && session
                    .process_name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
        }
    }

    impl AudioBackend for FakeBackend {
        fn initialize(&self) -> Result<(), AudioError> {
            self.check()
        }

        fn find_session(&self, process_name: &str) -> Result<Option<SessionState>, AudioError> {
            self.check()?;
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| Self::matches(s, process_name))
                .map(|s| SessionState {
                    level: s.level,
                    muted: s.muted,
                }))
        }

        fn apply_volume(&self, process_name: &str, level: f32) -> Result<bool, AudioError> {
            self.check()?;
            let mut sessions = self.sessions.lock().unwrap();
            match sessions.iter_mut().find(|s| Self::matches(s, process_name)) {
                Some(session) => {
                    session.level = level;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn apply_mute(&self, process_name: &str, muted: bool) -> Result<bool, AudioError> {
            self.check()?;
            let mut sessions = self.sessions.lock().unwrap();
            match sessions.iter_mut().find(|s| Self::matches(s, process_name)) {
                Some(session) => {
                    session.muted = muted;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn list_sessions(&self) -> Result<Vec<SessionInfo>, AudioError> {
            self.check()?;
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .map(|s| SessionInfo {
                    process_id: s.process_id,
                    process_name: s.process_name.clone(),
                    exe_path: s.exe_path.clone(),
                })
                .collect())
        }

        fn load_icon(&self, exe_path: &str) -> Option<RawIcon> {
            self.icons.lock().unwrap().get(exe_path).cloned()
        }
    }
}
