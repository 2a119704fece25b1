//! Discovery of applications currently rendering audio.
//!
//! A sweep walks every active render endpoint, not just the default one, so
//! the remote surface sees apps playing through any device. Results are
//! recomputed in full on each call; nothing is cached between sweeps.

use std::collections::HashSet;
use std::sync::Arc;

use super::backend::{AudioBackend, SessionInfo};
use super::icon;
use super::AudioError;

/// Display name reported for the PID-0 system-sounds session.
pub const SYSTEM_SOUNDS_NAME: &str = "System Sounds";

/// Display name reported when the owning process can no longer be resolved.
pub const UNKNOWN_APP_NAME: &str = "Unknown";

/// One application discovered during a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredApp {
    /// Display name the remote surface shows.
    pub name: String,
    /// Inline `data:` PNG for the app's icon, or empty when unavailable.
    pub icon: String,
}

/// Enumerates the applications playing audio on any active render endpoint.
pub struct AppDiscovery {
    backend: Arc<dyn AudioBackend>,
}

impl AppDiscovery {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self { backend }
    }

    /// Run one full sweep. Entries are unique by case-insensitive display
    /// name, the first occurrence wins, and enumeration order is preserved.
    pub fn list_running_apps(&self) -> Result<Vec<DiscoveredApp>, AudioError> {
        let sessions = self.backend.list_sessions()?;
        let mut seen = HashSet::new();
        let mut apps = Vec::new();

        for session in &sessions {
            let (name, exe_path) = display_identity(session);
            if !seen.insert(name.to_ascii_lowercase()) {
                continue;
            }
            let icon = exe_path
                .and_then(|path| self.fetch_icon(path))
                .unwrap_or_default();
            apps.push(DiscoveredApp { name, icon });
        }

        Ok(apps)
    }

    /// Best-effort icon fetch; any sub-failure degrades to no icon.
    fn fetch_icon(&self, exe_path: &str) -> Option<String> {
        let pixels = self.backend.load_icon(exe_path)?;
        let uri = icon::encode_data_uri(&pixels);
        if uri.is_none() {
            log::warn!("could not encode icon for {exe_path}");
        }
        uri
    }
}

/// Resolve what a session should be called, and which executable (if any)
/// supplies its icon. Lookup failures map to fixed placeholder names instead
/// of aborting the sweep.
fn display_identity(session: &SessionInfo) -> (String, Option<&str>) {
    if session.process_id == 0 {
        return (SYSTEM_SOUNDS_NAME.to_string(), None);
    }
    match &session.process_name {
        Some(name) => (name.clone(), session.exe_path.as_deref()),
        None => (UNKNOWN_APP_NAME.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::backend::testing::{FakeBackend, FakeSession};
    use super::super::icon::RawIcon;
    use super::*;

    fn session(pid: u32, name: Option<&str>, exe: Option<&str>) -> FakeSession {
        FakeSession {
            process_id: pid,
            process_name: name.map(str::to_string),
            exe_path: exe.map(str::to_string),
            level: 0.5,
            muted: false,
        }
    }

    fn discovery(backend: &Arc<FakeBackend>) -> AppDiscovery {
        AppDiscovery::new(backend.clone())
    }

    #[test]
    fn test_sweep_preserves_enumeration_order() {
        let backend = Arc::new(FakeBackend::default());
        backend.push(session(10, Some("chrome"), None));
        backend.push(session(11, Some("spotify"), None));
        backend.push(session(12, Some("discord"), None));

        let apps = discovery(&backend).list_running_apps().unwrap();
        let names: Vec<_> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["chrome", "spotify", "discord"]);
    }

    #[test]
    fn test_duplicate_names_collapse_case_insensitively() {
        let backend = Arc::new(FakeBackend::default());
        backend.push(session(10, Some("Chrome"), None));
        backend.push(session(11, Some("chrome"), None));
        backend.push(session(12, Some("CHROME"), None));

        let apps = discovery(&backend).list_running_apps().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Chrome");
    }

    #[test]
    fn test_pid_zero_maps_to_system_sounds() {
        let backend = Arc::new(FakeBackend::default());
        backend.push(session(0, None, Some(r"C:\Windows\System32\audiodg.exe")));

        let apps = discovery(&backend).list_running_apps().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, SYSTEM_SOUNDS_NAME);
        assert_eq!(apps[0].icon, "");
    }

    #[test]
    fn test_failed_lookup_maps_to_unknown() {
        let backend = Arc::new(FakeBackend::default());
        backend.push(session(99, None, None));
        backend.push(session(98, None, None));

        let apps = discovery(&backend).list_running_apps().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, UNKNOWN_APP_NAME);
    }

    #[test]
    fn test_icon_attached_only_for_named_apps() {
        let backend = Arc::new(FakeBackend::default());
        let exe = r"C:\Program Files\chrome.exe";
        backend.push(session(10, Some("chrome"), Some(exe)));
        backend.push(session(0, None, None));
        backend.put_icon(
            exe,
            RawIcon {
                width: 2,
                height: 2,
                rgba: vec![128; 16],
            },
        );

        let apps = discovery(&backend).list_running_apps().unwrap();
        assert!(apps[0].icon.starts_with("data:image/png;base64,"));
        assert_eq!(apps[1].icon, "");
    }

    #[test]
    fn test_missing_icon_degrades_to_empty() {
        let backend = Arc::new(FakeBackend::default());
        backend.push(session(10, Some("chrome"), Some(r"C:\gone\chrome.exe")));

        let apps = discovery(&backend).list_running_apps().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].icon, "");
    }

    #[test]
    fn test_unencodable_icon_keeps_the_entry() {
        let backend = Arc::new(FakeBackend::default());
        let exe = r"C:\Program Files\chrome.exe";
        backend.push(session(10, Some("chrome"), Some(exe)));
        backend.put_icon(
            exe,
            RawIcon {
                width: 8,
                height: 8,
                rgba: vec![0; 4],
            },
        );

        let apps = discovery(&backend).list_running_apps().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "chrome");
        assert_eq!(apps[0].icon, "");
    }
}
