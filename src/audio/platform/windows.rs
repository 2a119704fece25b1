//! Core Audio (WASAPI) backend.
//!
//! Every operation re-resolves sessions from the live device state; nothing
//! COM-owned outlives a single call.

use std::cell::Cell;

use windows::core::{Interface, PCWSTR, PWSTR};
use windows::Win32::Foundation::{CloseHandle, HWND, MAX_PATH};
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, GetDC, GetObjectW, ReleaseDC,
    SelectObject, BITMAP, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBRUSH,
};
use windows::Win32::Media::Audio::{
    eMultimedia, eRender, AudioSessionStateExpired, IAudioSessionControl, IAudioSessionControl2,
    IAudioSessionManager2, IMMDevice, IMMDeviceEnumerator, ISimpleAudioVolume, MMDeviceEnumerator,
    DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CLSCTX_ALL, COINIT_MULTITHREADED,
};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::Shell::ExtractIconExW;
use windows::Win32::UI::WindowsAndMessaging::{
    DestroyIcon, DrawIconEx, GetIconInfo, DI_NORMAL, HICON, ICONINFO,
};

use crate::audio::backend::{AudioBackend, SessionInfo, SessionState};
use crate::audio::icon::RawIcon;
use crate::audio::AudioError;

thread_local! {
    static COM_READY: Cell<bool> = const { Cell::new(false) };
}

/// Initialize COM once per calling thread. Blocking dispatch may land a
/// request on any worker thread, so this runs at the top of every entry
/// point that touches Core Audio.
fn ensure_com() -> Result<(), AudioError> {
    COM_READY.with(|ready| {
        if !ready.get() {
            unsafe { CoInitializeEx(None, COINIT_MULTITHREADED).ok()? };
            ready.set(true);
        }
        Ok(())
    })
}

pub struct WindowsAudioBackend;

impl WindowsAudioBackend {
    pub fn new() -> Self {
        Self
    }
}

unsafe fn device_enumerator() -> windows::core::Result<IMMDeviceEnumerator> {
    CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
}

unsafe fn default_render_device() -> windows::core::Result<IMMDevice> {
    device_enumerator()?.GetDefaultAudioEndpoint(eRender, eMultimedia)
}

/// Collect the non-expired sessions of one endpoint.
unsafe fn sessions_of(device: &IMMDevice) -> windows::core::Result<Vec<IAudioSessionControl>> {
    let manager: IAudioSessionManager2 = device.Activate(CLSCTX_ALL, None)?;
    let enumerator = manager.GetSessionEnumerator()?;
    let mut sessions = Vec::new();
    for i in 0..enumerator.GetCount()? {
        let Ok(control) = enumerator.GetSession(i) else {
            continue;
        };
        match control.GetState() {
            Ok(state) if state == AudioSessionStateExpired => continue,
            Ok(_) => sessions.push(control),
            Err(_) => continue,
        }
    }
    Ok(sessions)
}

/// Resolve a PID to its image path. Fails quietly for processes that have
/// already exited or that cannot be opened.
unsafe fn process_image_path(pid: u32) -> Option<String> {
    if pid == 0 {
        return None;
    }
    let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
    let mut buffer = [0u16; MAX_PATH as usize];
    let mut size = buffer.len() as u32;
    let queried = QueryFullProcessImageNameW(
        handle,
        PROCESS_NAME_WIN32,
        PWSTR(buffer.as_mut_ptr()),
        &mut size,
    );
    let _ = CloseHandle(handle);
    queried.ok()?;
    Some(String::from_utf16_lossy(&buffer[..size as usize]))
}

/// Image base name without the `.exe` suffix.
fn image_base_name(path: &str) -> Option<String> {
    let base = path.rsplit(['\\', '/']).next()?;
    let trimmed = match base.len().checked_sub(4).and_then(|at| base.get(at..)) {
        Some(ext) if ext.eq_ignore_ascii_case(".exe") => &base[..base.len() - 4],
        _ => base,
    };
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Resolve `process_name` to its session's volume interface on the default
/// render endpoint. Sessions that cannot be inspected are skipped rather
/// than failing the whole lookup; a missing endpoint resolves to `None`.
unsafe fn resolve_session(process_name: &str) -> Result<Option<ISimpleAudioVolume>, AudioError> {
    ensure_com()?;
    let device = match default_render_device() {
        Ok(device) => device,
        Err(e) => {
            log::warn!("default render endpoint unavailable: {e}");
            return Ok(None);
        }
    };
    for control in sessions_of(&device)? {
        let Ok(control2) = control.cast::<IAudioSessionControl2>() else {
            continue;
        };
        let Ok(pid) = control2.GetProcessId() else {
            continue;
        };
        let Some(path) = process_image_path(pid) else {
            continue;
        };
        let Some(name) = image_base_name(&path) else {
            continue;
        };
        if !name.eq_ignore_ascii_case(process_name) {
            continue;
        }
        if let Ok(volume) = control.cast::<ISimpleAudioVolume>() {
            return Ok(Some(volume));
        }
    }
    Ok(None)
}

impl AudioBackend for WindowsAudioBackend {
    fn initialize(&self) -> Result<(), AudioError> {
        ensure_com()?;
        unsafe { default_render_device().map_err(|_| AudioError::EndpointUnavailable)? };
        Ok(())
    }

    fn find_session(&self, process_name: &str) -> Result<Option<SessionState>, AudioError> {
        unsafe {
            let Some(volume) = resolve_session(process_name)? else {
                return Ok(None);
            };
            let level = volume.GetMasterVolume()?;
            let muted = volume.GetMute()?.as_bool();
            Ok(Some(SessionState { level, muted }))
        }
    }

    fn apply_volume(&self, process_name: &str, level: f32) -> Result<bool, AudioError> {
        unsafe {
            let Some(volume) = resolve_session(process_name)? else {
                return Ok(false);
            };
            volume.SetMasterVolume(level, std::ptr::null())?;
            Ok(true)
        }
    }

    fn apply_mute(&self, process_name: &str, muted: bool) -> Result<bool, AudioError> {
        unsafe {
            let Some(volume) = resolve_session(process_name)? else {
                return Ok(false);
            };
            volume.SetMute(muted, std::ptr::null())?;
            Ok(true)
        }
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>, AudioError> {
        ensure_com()?;
        unsafe {
            let collection = device_enumerator()?.EnumAudioEndpoints(eRender, DEVICE_STATE_ACTIVE)?;
            let mut infos = Vec::new();
            for device_index in 0..collection.GetCount()? {
                let Ok(device) = collection.Item(device_index) else {
                    continue;
                };
                let Ok(sessions) = sessions_of(&device) else {
                    continue;
                };
                for control in sessions {
                    let Ok(control2) = control.cast::<IAudioSessionControl2>() else {
                        continue;
                    };
                    let pid = control2.GetProcessId().unwrap_or(0);
                    let path = process_image_path(pid);
                    let name = path.as_deref().and_then(image_base_name);
                    infos.push(SessionInfo {
                        process_id: pid,
                        process_name: name,
                        exe_path: path,
                    });
                }
            }
            Ok(infos)
        }
    }

    fn load_icon(&self, exe_path: &str) -> Option<RawIcon> {
        unsafe { extract_icon_pixels(exe_path) }
    }
}

/// Pull the first icon out of an executable and rasterize it to RGBA.
unsafe fn extract_icon_pixels(exe_path: &str) -> Option<RawIcon> {
    let wide: Vec<u16> = exe_path.encode_utf16().chain(std::iter::once(0)).collect();

    let mut icon = HICON::default();
    let extracted = ExtractIconExW(PCWSTR(wide.as_ptr()), 0, Some(&mut icon), None, 1);
    if extracted == 0 || icon.is_invalid() {
        return None;
    }

    let mut info = ICONINFO::default();
    if GetIconInfo(icon, &mut info).is_err() {
        let _ = DestroyIcon(icon);
        return None;
    }

    let mut bitmap = BITMAP::default();
    GetObjectW(
        info.hbmColor.into(),
        std::mem::size_of::<BITMAP>() as i32,
        Some(&mut bitmap as *mut _ as *mut _),
    );
    let width = bitmap.bmWidth as u32;
    let height = bitmap.bmHeight as u32;
    if width == 0 || height == 0 {
        let _ = DeleteObject(info.hbmColor.into());
        let _ = DeleteObject(info.hbmMask.into());
        let _ = DestroyIcon(icon);
        return None;
    }

    let screen_dc = GetDC(Some(HWND::default()));
    let mem_dc = CreateCompatibleDC(Some(screen_dc));

    let header = BITMAPINFOHEADER {
        biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
        biWidth: width as i32,
        biHeight: -(height as i32),
        biPlanes: 1,
        biBitCount: 32,
        biCompression: BI_RGB.0 as u32,
        ..Default::default()
    };
    let bmi = BITMAPINFO {
        bmiHeader: header,
        ..Default::default()
    };

    let mut bits: *mut std::ffi::c_void = std::ptr::null_mut();
    let mut rgba = Vec::new();

    if let Ok(dib) = CreateDIBSection(Some(mem_dc), &bmi, DIB_RGB_COLORS, &mut bits, None, 0) {
        let previous = SelectObject(mem_dc, dib.into());
        let drawn = DrawIconEx(
            mem_dc,
            0,
            0,
            icon,
            width as i32,
            height as i32,
            0,
            Some(HBRUSH::default()),
            DI_NORMAL,
        )
        .is_ok();

        if drawn && !bits.is_null() {
            let pixels =
                std::slice::from_raw_parts(bits as *const u8, (width * height * 4) as usize);
            rgba.reserve(pixels.len());
            for bgra in pixels.chunks_exact(4) {
                rgba.extend_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
            }
        }

        SelectObject(mem_dc, previous);
        let _ = DeleteObject(dib.into());
    }

    let _ = DeleteDC(mem_dc);
    ReleaseDC(Some(HWND::default()), screen_dc);
    let _ = DeleteObject(info.hbmColor.into());
    let _ = DeleteObject(info.hbmMask.into());
    let _ = DestroyIcon(icon);

    (!rgba.is_empty()).then(|| RawIcon {
        width,
        height,
        rgba,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_base_name_strips_path_and_suffix() {
        assert_eq!(
            image_base_name(r"C:\Program Files\Google\chrome.exe").as_deref(),
            Some("chrome")
        );
        assert_eq!(
            image_base_name(r"C:\Apps\SPOTIFY.EXE").as_deref(),
            Some("SPOTIFY")
        );
        assert_eq!(image_base_name("discord").as_deref(), Some("discord"));
        assert_eq!(image_base_name(r"C:\Apps\"), None);
    }
}
