use serde::Serialize;
use std::collections::BTreeMap;

pub const VK_TAB: u16 = 0x09;
pub const VK_SHIFT: u16 = 0x10;
pub const VK_CONTROL: u16 = 0x11;
pub const VK_MENU: u16 = 0x12;
pub const VK_ESCAPE: u16 = 0x1B;
pub const VK_DELETE: u16 = 0x2E;
pub const VK_1: u16 = 0x31;
pub const VK_2: u16 = 0x32;
pub const VK_3: u16 = 0x33;
pub const VK_4: u16 = 0x34;
pub const VK_H: u16 = 0x48;
pub const VK_BACKTICK: u16 = 0xC0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// Live keyboard and cursor state supplied by the host window layer.
pub trait InputSource {
    /// Whether the virtual key is currently held.
    fn key_down(&self, vk: u16) -> bool;

    fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.key_down(VK_CONTROL),
            alt: self.key_down(VK_MENU),
            shift: self.key_down(VK_SHIFT),
        }
    }

    /// Cursor position in overlay-local pixels.
    fn cursor(&self) -> Option<(f64, f64)>;
}

/// Hotkey actions recognised by the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeybindAction {
    ToggleMaster,
    ToggleOverlay,
    HideOverlay,
    Map1,
    Map2,
    Map3,
    Map4,
    HideHovered,
}

impl KeybindAction {
    pub const ALL: [KeybindAction; 8] = [
        KeybindAction::ToggleMaster,
        KeybindAction::ToggleOverlay,
        KeybindAction::HideOverlay,
        KeybindAction::Map1,
        KeybindAction::Map2,
        KeybindAction::Map3,
        KeybindAction::Map4,
        KeybindAction::HideHovered,
    ];

    pub const MAP_SWITCH: [KeybindAction; 4] = [
        KeybindAction::Map1,
        KeybindAction::Map2,
        KeybindAction::Map3,
        KeybindAction::Map4,
    ];

    pub fn key(self) -> &'static str {
        match self {
            KeybindAction::ToggleMaster => "toggle_master",
            KeybindAction::ToggleOverlay => "toggle_overlay",
            KeybindAction::HideOverlay => "hide_overlay",
            KeybindAction::Map1 => "map_1",
            KeybindAction::Map2 => "map_2",
            KeybindAction::Map3 => "map_3",
            KeybindAction::Map4 => "map_4",
            KeybindAction::HideHovered => "hide_hovered",
        }
    }

    /// Only hiding the hovered POI requires modifiers.
    pub fn is_modifier_gated(self) -> bool {
        self == KeybindAction::HideHovered
    }

    pub fn default_binding(self) -> Keybinding {
        match self {
            KeybindAction::ToggleMaster => Keybinding::key(VK_BACKTICK),
            KeybindAction::ToggleOverlay => Keybinding::key(VK_TAB),
            KeybindAction::HideOverlay => Keybinding::key(VK_H),
            KeybindAction::Map1 => Keybinding::key(VK_1),
            KeybindAction::Map2 => Keybinding::key(VK_2),
            KeybindAction::Map3 => Keybinding::key(VK_3),
            KeybindAction::Map4 => Keybinding::key(VK_4),
            KeybindAction::HideHovered => Keybinding {
                vk: VK_DELETE,
                ctrl: Some(true),
                alt: Some(true),
                shift: Some(true),
            },
        }
    }
}

/// A virtual key plus optional modifier requirements.
///
/// Modifiers are kept for every action so they survive a save, but they are
/// only consulted for [`KeybindAction::HideHovered`]. Absent modifiers on that
/// action count as required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Keybinding {
    pub vk: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctrl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<bool>,
}

impl Keybinding {
    pub const fn key(vk: u16) -> Self {
        Self {
            vk,
            ctrl: None,
            alt: None,
            shift: None,
        }
    }

    fn required_modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl.unwrap_or(true),
            alt: self.alt.unwrap_or(true),
            shift: self.shift.unwrap_or(true),
        }
    }

    /// Level check: is this binding held right now.
    pub fn is_pressed(&self, action: KeybindAction, input: &dyn InputSource) -> bool {
        if self.vk == 0 {
            return false;
        }
        if action.is_modifier_gated() {
            let need = self.required_modifiers();
            let held = input.modifiers();
            if (need.ctrl && !held.ctrl) || (need.alt && !held.alt) || (need.shift && !held.shift) {
                return false;
            }
        }
        input.key_down(self.vk)
    }

    /// Human readable label such as `Ctrl + Alt + Shift + Delete`.
    pub fn label(&self, action: KeybindAction) -> String {
        if !action.is_modifier_gated() {
            return vk_label(self.vk);
        }
        let need = self.required_modifiers();
        let mut parts = Vec::new();
        if need.ctrl {
            parts.push("Ctrl".to_owned());
        }
        if need.alt {
            parts.push("Alt".to_owned());
        }
        if need.shift {
            parts.push("Shift".to_owned());
        }
        parts.push(vk_label(self.vk));
        parts.join(" + ")
    }
}

pub fn vk_label(vk: u16) -> String {
    match vk {
        VK_TAB => "Tab".into(),
        VK_BACKTICK => "`".into(),
        VK_DELETE => "Delete".into(),
        VK_SHIFT => "Shift".into(),
        VK_CONTROL => "Ctrl".into(),
        VK_MENU => "Alt".into(),
        VK_ESCAPE => "Esc".into(),
        0x30..=0x39 | 0x41..=0x5A => char::from(vk as u8).to_string(),
        _ => format!("VK_{vk}"),
    }
}

/// Rising-edge detector: remembers the previous sample per action so a held
/// key fires exactly once.
#[derive(Debug, Default, Clone)]
pub struct EdgeDetector {
    previous: BTreeMap<KeybindAction, bool>,
}

impl EdgeDetector {
    /// Record the current level and report whether it just went down.
    pub fn rising(&mut self, action: KeybindAction, now: bool) -> bool {
        let before = self.previous.insert(action, now).unwrap_or(false);
        now && !before
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[derive(Default)]
    struct Keys(BTreeSet<u16>);

    impl InputSource for Keys {
        fn key_down(&self, vk: u16) -> bool {
            self.0.contains(&vk)
        }

        fn cursor(&self) -> Option<(f64, f64)> {
            None
        }
    }

    fn keys(list: &[u16]) -> Keys {
        Keys(list.iter().copied().collect())
    }

    #[test]
    fn labels_match_default_bindings() {
        assert_eq!(KeybindAction::ToggleMaster.default_binding().label(KeybindAction::ToggleMaster), "`");
        assert_eq!(vk_label(VK_TAB), "Tab");
        assert_eq!(vk_label(VK_H), "H");
        assert_eq!(vk_label(VK_3), "3");
        assert_eq!(vk_label(0x70), "VK_112");
        assert_eq!(
            KeybindAction::HideHovered
                .default_binding()
                .label(KeybindAction::HideHovered),
            "Ctrl + Alt + Shift + Delete"
        );
    }

    #[test]
    fn only_hide_hovered_is_modifier_gated() {
        let gated = KeybindAction::HideHovered.default_binding();
        assert!(!gated.is_pressed(KeybindAction::HideHovered, &keys(&[VK_DELETE])));
        assert!(!gated.is_pressed(
            KeybindAction::HideHovered,
            &keys(&[VK_DELETE, VK_CONTROL, VK_MENU])
        ));
        assert!(gated.is_pressed(
            KeybindAction::HideHovered,
            &keys(&[VK_DELETE, VK_CONTROL, VK_MENU, VK_SHIFT])
        ));

        let plain = Keybinding {
            vk: VK_H,
            ctrl: Some(true),
            alt: Some(true),
            shift: Some(true),
        };
        assert!(plain.is_pressed(KeybindAction::HideOverlay, &keys(&[VK_H])));
    }

    #[test]
    fn unbound_key_never_fires() {
        let binding = Keybinding::key(0);
        assert!(!binding.is_pressed(KeybindAction::Map1, &keys(&[0])));
    }

    #[test]
    fn edge_detector_fires_once_per_press() {
        let mut edges = EdgeDetector::default();
        let action = KeybindAction::ToggleOverlay;
        assert!(edges.rising(action, true));
        assert!(!edges.rising(action, true));
        assert!(!edges.rising(action, true));
        assert!(!edges.rising(action, false));
        assert!(edges.rising(action, true));
        assert!(!edges.rising(KeybindAction::Map1, false));
    }
}
