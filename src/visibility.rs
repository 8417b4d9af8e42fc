use crate::catalog::{Category, PoiPoint};
use crate::settings::{clamp_global_scale, HiddenTable, OverlaySettings, TypeState, TypeTable};
use crate::style::{Palette, Rgb};
use std::collections::BTreeSet;

const MIN_DRAW_RADIUS: u32 = 1;
const MAX_DRAW_RADIUS: u32 = 40;

/// In-session view of per-category visibility, colors, hidden POIs and the
/// global marker scale. Mutations are visible immediately; the owner flushes
/// them into the settings document before saving.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityState {
    types: TypeTable,
    hidden: HiddenTable,
    global_scale: f64,
    palette: Palette,
}

impl VisibilityState {
    pub fn from_settings(settings: &OverlaySettings, palette: Palette) -> Self {
        Self {
            types: settings.types.clone(),
            hidden: settings.hidden.clone(),
            global_scale: clamp_global_scale(settings.global_scale),
            palette,
        }
    }

    /// Copy the session state back into `settings`.
    pub fn write_into(&self, settings: &mut OverlaySettings) {
        settings.types = self.types.clone();
        settings.hidden = self.hidden.clone();
        settings.global_scale = self.global_scale;
    }

    fn type_state(&self, category: Category) -> TypeState {
        self.types.get(category).copied().unwrap_or(TypeState {
            enabled: true,
            color: self.palette.default_fill(category),
        })
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        self.type_state(category).enabled
    }

    pub fn color(&self, category: Category) -> Rgb {
        self.type_state(category).color
    }

    pub fn global_scale(&self) -> f64 {
        self.global_scale
    }

    pub fn set_enabled(&mut self, category: Category, enabled: bool) {
        let mut state = self.type_state(category);
        state.enabled = enabled;
        self.types.insert(category, state);
    }

    pub fn set_color(&mut self, category: Category, color: Rgb) {
        let mut state = self.type_state(category);
        state.color = color;
        self.types.insert(category, state);
    }

    /// Returns the effective (clamped) scale.
    pub fn set_global_scale(&mut self, scale: f64) -> f64 {
        self.global_scale = clamp_global_scale(scale);
        self.global_scale
    }

    /// Add `id` to the hidden set of `category`. Returns false if it was
    /// already hidden.
    pub fn hide(&mut self, category: Category, id: impl Into<String>) -> bool {
        let id = id.into();
        match self.hidden.get_mut(category) {
            Some(set) => set.insert(id),
            None => {
                self.hidden.insert(category, BTreeSet::from([id]));
                true
            }
        }
    }

    pub fn is_hidden(&self, category: Category, id: &str) -> bool {
        self.hidden
            .get(category)
            .is_some_and(|set| set.contains(id))
    }

    pub fn is_point_hidden(&self, category: Category, point: &PoiPoint) -> bool {
        self.is_hidden(category, &point.hide_id(category))
    }

    /// Restore every category's default color and enable it. Hidden sets and
    /// the global scale are left alone.
    pub fn reset_colors_to_default(&mut self) {
        for category in Category::DRAW_ORDER {
            self.types.insert(
                category,
                TypeState {
                    enabled: true,
                    color: self.palette.default_fill(category),
                },
            );
        }
    }

    /// Marker radius after applying the global scale.
    pub fn scaled_radius(&self, base_px: u32) -> u32 {
        let scaled = (base_px as f64 * self.global_scale).round_ties_even();
        (scaled as u32).clamp(MIN_DRAW_RADIUS, MAX_DRAW_RADIUS)
    }
}
