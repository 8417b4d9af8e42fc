use crate::aspect::{detect_aspect, resolve_rect, AspectBucket, PixelRect};
use crate::catalog::{Category, MapName, MapPoints, PointCatalog};
use crate::hotkey::{vk_label, EdgeDetector, InputSource, KeybindAction, Keybinding};
use crate::hover::{self, HoverTarget, DEFAULT_HOVER_RADIUS_PX};
use crate::settings::{Config, ConfigStore, CONFIG_VERSION};
use crate::style::{Rgb, StyleCatalog};
use crate::visibility::VisibilityState;
use std::collections::BTreeMap;

/// Overlay state derived from the master switch and the visibility flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    MasterOff,
    Hidden,
    Visible,
}

/// What the host window should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// New window visibility when it changed during the tick.
    pub window_visible: Option<bool>,
    pub repaint: bool,
}

/// One marker ready for the paint step.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPoint {
    pub category: Category,
    pub center: (f64, f64),
    pub fill: Rgb,
    pub border: Rgb,
    pub radius: u32,
}

/// Owns the session: config document, point cache, visibility view and the
/// hotkey state machine. Every change to a persisted field saves right away.
pub struct OverlayController {
    store: ConfigStore,
    config: Config,
    styles: StyleCatalog,
    catalog: PointCatalog,
    visibility: VisibilityState,
    screen: (i32, i32),
    aspect: AspectBucket,
    rect: PixelRect,
    hover: Option<HoverTarget>,
    edges: EdgeDetector,
}

impl OverlayController {
    pub fn new(
        store: ConfigStore,
        styles: StyleCatalog,
        catalog: PointCatalog,
        screen_w: i32,
        screen_h: i32,
    ) -> Self {
        let config = store.load();
        let visibility = VisibilityState::from_settings(&config.settings, store.palette().clone());
        let aspect = detect_aspect(screen_w, screen_h);
        tracing::info!(width = screen_w, height = screen_h, %aspect, "detected screen aspect");
        let mut controller = Self {
            store,
            config,
            styles,
            catalog,
            visibility,
            screen: (screen_w, screen_h),
            aspect,
            rect: PixelRect::default(),
            hover: None,
            edges: EdgeDetector::default(),
        };
        controller.apply_rect();
        // Writes back any keys synthesized during load.
        controller.persist();
        controller
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn aspect(&self) -> AspectBucket {
        self.aspect
    }

    pub fn selected_map(&self) -> MapName {
        self.config.settings.selected_map
    }

    pub fn hover(&self) -> Option<&HoverTarget> {
        self.hover.as_ref()
    }

    pub fn mode(&self) -> OverlayMode {
        let settings = &self.config.settings;
        match (settings.master_on, settings.visible_overlay) {
            (false, _) => OverlayMode::MasterOff,
            (true, false) => OverlayMode::Hidden,
            (true, true) => OverlayMode::Visible,
        }
    }

    pub fn is_window_visible(&self) -> bool {
        self.mode() == OverlayMode::Visible
    }

    fn active_points(&self) -> Option<&MapPoints> {
        self.catalog.map(self.selected_map())
    }

    /// Advance one polling step: detect hotkey edges, run transitions and
    /// refresh the hover target.
    pub fn tick(&mut self, input: &dyn InputSource) -> TickOutcome {
        let was_visible = self.is_window_visible();

        let mut rising = BTreeMap::new();
        for action in KeybindAction::ALL {
            let down = self
                .config
                .settings
                .keybinding(action)
                .is_pressed(action, input);
            rising.insert(action, self.edges.rising(action, down));
        }
        let fired = |action: KeybindAction| rising.get(&action).copied().unwrap_or(false);

        if fired(KeybindAction::ToggleMaster) {
            self.toggle_master();
        }
        if fired(KeybindAction::HideOverlay) {
            self.hide_overlay();
        }

        if self.config.settings.master_on {
            if fired(KeybindAction::ToggleOverlay) {
                self.toggle_overlay();
            }
            if self.is_window_visible() && self.config.settings.enable_num_switch {
                let requested = KeybindAction::MAP_SWITCH
                    .iter()
                    .zip(MapName::ALL)
                    .find(|(action, _)| fired(**action))
                    .map(|(_, map)| map);
                if let Some(map) = requested {
                    self.select_map(map);
                }
            }
            if self.is_window_visible() {
                self.update_hover(input.cursor());
            } else {
                self.hover = None;
            }
            if fired(KeybindAction::HideHovered) {
                self.hide_hovered();
            }
        } else {
            self.hover = None;
        }

        let now_visible = self.is_window_visible();
        TickOutcome {
            window_visible: (now_visible != was_visible).then_some(now_visible),
            repaint: self.config.settings.master_on || now_visible != was_visible,
        }
    }

    /// `MasterOff <-> MasterOn+Hidden`. The overlay is hidden on both edges.
    pub fn toggle_master(&mut self) {
        let settings = &mut self.config.settings;
        settings.master_on = !settings.master_on;
        settings.visible_overlay = false;
        self.hover = None;
        tracing::debug!(master_on = self.config.settings.master_on, "toggled master");
        self.persist();
    }

    /// `MasterOn+Visible -> MasterOn+Hidden`; no-op otherwise.
    pub fn hide_overlay(&mut self) -> bool {
        if self.mode() != OverlayMode::Visible {
            return false;
        }
        self.config.settings.visible_overlay = false;
        self.hover = None;
        tracing::debug!("overlay hidden");
        self.persist();
        true
    }

    /// `MasterOn+Hidden <-> MasterOn+Visible`; no-op while the master is off.
    pub fn toggle_overlay(&mut self) -> bool {
        if self.mode() == OverlayMode::MasterOff {
            return false;
        }
        let settings = &mut self.config.settings;
        settings.visible_overlay = !settings.visible_overlay;
        if !settings.visible_overlay {
            self.hover = None;
        }
        tracing::debug!(visible = self.config.settings.visible_overlay, "toggled overlay");
        self.persist();
        true
    }

    /// Switch the active map. Allowed in any mode; a real change recomputes
    /// the rectangle and saves.
    pub fn select_map(&mut self, map: MapName) -> bool {
        if map == self.config.settings.selected_map {
            return false;
        }
        self.config.settings.selected_map = map;
        self.hover = None;
        self.apply_rect();
        tracing::info!(%map, "switched map");
        self.persist();
        true
    }

    /// Hide the hovered POI within its own category.
    pub fn hide_hovered(&mut self) -> bool {
        if self.mode() != OverlayMode::Visible {
            return false;
        }
        let Some(target) = self.hover.take() else {
            return false;
        };
        let id = target.hide_id();
        tracing::info!(category = %target.category, %id, "hiding hovered POI");
        self.visibility.hide(target.category, id);
        self.persist();
        true
    }

    pub fn set_category_enabled(&mut self, category: Category, enabled: bool) {
        self.visibility.set_enabled(category, enabled);
        if !enabled && self.hover.as_ref().is_some_and(|h| h.category == category) {
            self.hover = None;
        }
        self.persist();
    }

    pub fn set_category_color(&mut self, category: Category, color: Rgb) {
        self.visibility.set_color(category, color);
        self.persist();
    }

    pub fn set_global_scale(&mut self, scale: f64) -> f64 {
        let effective = self.visibility.set_global_scale(scale);
        self.persist();
        effective
    }

    pub fn reset_colors(&mut self) {
        self.visibility.reset_colors_to_default();
        self.persist();
    }

    pub fn set_num_switch(&mut self, enabled: bool) {
        self.config.settings.enable_num_switch = enabled;
        self.persist();
    }

    pub fn set_minimize_to_tray(&mut self, enabled: bool) {
        self.config.settings.minimize_to_tray = enabled;
        self.persist();
    }

    /// Apply a captured binding. Modifiers only matter for the gated action
    /// and are ignored for the others.
    pub fn set_keybind(&mut self, action: KeybindAction, captured: Keybinding) {
        let mut binding = self.config.settings.keybinding(action);
        binding.vk = captured.vk;
        if action.is_modifier_gated() {
            binding.ctrl = Some(captured.ctrl.unwrap_or(true));
            binding.alt = Some(captured.alt.unwrap_or(true));
            binding.shift = Some(captured.shift.unwrap_or(true));
        }
        tracing::info!(action = action.key(), label = %binding.label(action), "keybind updated");
        self.config.settings.keybinds.insert(action, binding);
        self.persist();
    }

    /// Replace the config with defaults and reload all derived state.
    pub fn reset_config(&mut self) {
        self.config = self.store.reset_to_defaults();
        self.visibility =
            VisibilityState::from_settings(&self.config.settings, self.store.palette().clone());
        self.hover = None;
        self.edges.reset();
        self.apply_rect();
        self.persist();
    }

    pub fn set_screen_size(&mut self, width: i32, height: i32) {
        if self.screen == (width, height) {
            return;
        }
        self.screen = (width, height);
        self.aspect = detect_aspect(width, height);
        self.hover = None;
        self.apply_rect();
    }

    /// Flush session state into the document and save it.
    pub fn persist(&mut self) {
        self.visibility.write_into(&mut self.config.settings);
        self.config.version = CONFIG_VERSION.to_owned();
        self.store.save(&self.config);
    }

    fn apply_rect(&mut self) {
        let label = self.aspect.label();
        let stored = self.config.rect_ratio(self.selected_map(), label);
        self.rect = resolve_rect(stored, label, self.screen.0, self.screen.1);
        tracing::debug!(map = %self.selected_map(), rect = ?self.rect, "applied overlay rect");
    }

    fn update_hover(&mut self, cursor: Option<(f64, f64)>) {
        self.hover = match (cursor, self.active_points()) {
            (Some(cursor), Some(points)) => hover::resolve(
                cursor,
                self.selected_map(),
                points,
                &self.visibility,
                self.rect,
                DEFAULT_HOVER_RADIUS_PX,
            ),
            _ => None,
        };
    }

    /// Markers of the active map, enabled categories only, hidden points
    /// removed. Empty unless the overlay is visible.
    pub fn render_points(&self) -> Vec<RenderPoint> {
        let mut out = Vec::new();
        if !self.is_window_visible() {
            return out;
        }
        let Some(points) = self.active_points() else {
            return out;
        };
        for category in Category::DRAW_ORDER {
            if !self.visibility.is_enabled(category) {
                continue;
            }
            let style = self.styles.style(category);
            let radius = self.visibility.scaled_radius(style.radius_px);
            let fill = self.visibility.color(category);
            out.extend(
                points
                    .points(category)
                    .iter()
                    .filter(|p| !self.visibility.is_point_hidden(category, p))
                    .map(|p| RenderPoint {
                        category,
                        center: self.rect.project(p.u, p.v),
                        fill,
                        border: style.border,
                        radius,
                    }),
            );
        }
        out
    }

    pub fn map_label(&self) -> String {
        format!("{}  ({})", self.selected_map(), self.aspect)
    }

    fn bind_label(&self, action: KeybindAction) -> String {
        self.config.settings.keybinding(action).label(action)
    }

    /// Panel help text built from the live keybinds and detected aspect.
    pub fn help_text(&self) -> String {
        let maps = KeybindAction::MAP_SWITCH
            .iter()
            .map(|a| vk_label(self.config.settings.keybinding(*a).vk))
            .collect::<Vec<_>>()
            .join(" ");
        let location = self
            .store
            .path()
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        format!(
            "{:<12} Toggle master on or off\n\
             {:<12} Show or hide overlay\n\
             {:<12} Hide overlay\n\
             {}      Switch map (if enabled)\n\
             {}   Hide hovered POI for current category only\n\
             \n\
             Detected aspect: {}\n\
             Config version: {}\n\
             Files are stored at:\n\
             {}\n",
            self.bind_label(KeybindAction::ToggleMaster),
            self.bind_label(KeybindAction::ToggleOverlay),
            self.bind_label(KeybindAction::HideOverlay),
            maps,
            self.bind_label(KeybindAction::HideHovered),
            self.aspect,
            self.config.version,
            location,
        )
    }
}
