use crate::hotkey::InputSource;

/// Global keyboard and cursor state read straight from the OS, independent of
/// window focus.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInput;

#[cfg(target_os = "windows")]
impl InputSource for SystemInput {
    fn key_down(&self, vk: u16) -> bool {
        use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;
        if vk == 0 {
            return false;
        }
        let state = unsafe { GetAsyncKeyState(i32::from(vk)) };
        (state as u16 & 0x8000) != 0
    }

    fn cursor(&self) -> Option<(f64, f64)> {
        use windows::Win32::Foundation::POINT;
        use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;
        // Screen coordinates equal overlay coordinates: the viewport is
        // fullscreen on the primary monitor at (0, 0).
        let mut pt = POINT::default();
        unsafe { GetCursorPos(&mut pt) }.ok()?;
        Some((f64::from(pt.x), f64::from(pt.y)))
    }
}

#[cfg(not(target_os = "windows"))]
impl InputSource for SystemInput {
    fn key_down(&self, _vk: u16) -> bool {
        false
    }

    fn cursor(&self) -> Option<(f64, f64)> {
        None
    }
}

/// Primary screen size in physical pixels.
#[cfg(target_os = "windows")]
pub fn screen_size() -> Option<(i32, i32)> {
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};
    let (w, h) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    (w > 0 && h > 0).then_some((w, h))
}

#[cfg(not(target_os = "windows"))]
pub fn screen_size() -> Option<(i32, i32)> {
    None
}
