use crate::aspect::{AspectBucket, RectRatio};
use crate::catalog::{Category, MapName};
use crate::hotkey::{KeybindAction, Keybinding};
use crate::style::{Palette, Rgb};
use anyhow::{Context, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Documents carrying any other version are replaced wholesale on load.
pub const CONFIG_VERSION: &str = "1.0.1";

pub const MIN_GLOBAL_SCALE: f64 = 0.10;
pub const MAX_GLOBAL_SCALE: f64 = 5.00;

/// `possible_xp` entries that no longer grant XP. Re-seeded on every load.
pub const DEFAULT_HIDDEN_POSSIBLE_XP: [&str; 2] = ["armories:1508:2096", "big_towers:1320:3328"];

pub fn clamp_global_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_GLOBAL_SCALE, MAX_GLOBAL_SCALE)
}

/// Fixed key set of a [`KeyedTable`].
pub trait TableKey: Copy + Ord + 'static {
    fn all() -> &'static [Self];
    fn key(self) -> &'static str;
}

impl TableKey for Category {
    fn all() -> &'static [Self] {
        &Category::DRAW_ORDER
    }

    fn key(self) -> &'static str {
        Category::key(self)
    }
}

impl TableKey for KeybindAction {
    fn all() -> &'static [Self] {
        &KeybindAction::ALL
    }

    fn key(self) -> &'static str {
        KeybindAction::key(self)
    }
}

/// JSON object keyed by a closed set of names.
///
/// Every known key always has an entry. Unknown keys found on disk are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedTable<K, V> {
    entries: BTreeMap<K, V>,
    extra: Map<String, Value>,
}

impl<K: TableKey, V> KeyedTable<K, V> {
    pub fn from_fn(mut make: impl FnMut(K) -> V) -> Self {
        Self {
            entries: K::all().iter().map(|k| (*k, make(*k))).collect(),
            extra: Map::new(),
        }
    }

    /// Build from a raw JSON value, filling every known key through `parse`.
    fn from_value(value: Option<&Value>, mut parse: impl FnMut(K, Option<&Value>) -> V) -> Self {
        let obj = value.and_then(Value::as_object);
        let entries = K::all()
            .iter()
            .map(|k| (*k, parse(*k, obj.and_then(|o| o.get(k.key())))))
            .collect();
        let extra = obj
            .map(|o| {
                o.iter()
                    .filter(|(name, _)| !K::all().iter().any(|k| k.key() == name.as_str()))
                    .map(|(name, v)| (name.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Self { entries, extra }
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.entries.get(&key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.entries.get_mut(&key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

impl<K: TableKey, V: Serialize> Serialize for KeyedTable<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut merged: BTreeMap<&str, Value> = self
            .extra
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        for (k, v) in &self.entries {
            let value = serde_json::to_value(v).map_err(serde::ser::Error::custom)?;
            merged.insert(k.key(), value);
        }
        let mut map = serializer.serialize_map(Some(merged.len()))?;
        for (k, v) in &merged {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub type Keybinds = KeyedTable<KeybindAction, Keybinding>;
pub type TypeTable = KeyedTable<Category, TypeState>;
pub type HiddenTable = KeyedTable<Category, BTreeSet<String>>;

/// Per-category toggle and fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeState {
    pub enabled: bool,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapProfile {
    pub rect_ratio_by_aspect: BTreeMap<String, RectRatio>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MapProfile {
    fn with_defaults() -> Self {
        Self {
            rect_ratio_by_aspect: AspectBucket::ALL
                .into_iter()
                .map(|b| (b.label().to_owned(), b.default_ratio()))
                .collect(),
            extra: Map::new(),
        }
    }

    fn from_value(map_name: &str, value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            tracing::warn!(map = map_name, "profile is not an object; ignoring it");
            return Self {
                rect_ratio_by_aspect: BTreeMap::new(),
                extra: Map::new(),
            };
        };
        let mut rect_ratio_by_aspect = BTreeMap::new();
        if let Some(ratios) = obj.get("rect_ratio_by_aspect").and_then(Value::as_object) {
            for (label, raw) in ratios {
                match RectRatio::from_value(raw) {
                    Some(ratio) => {
                        rect_ratio_by_aspect.insert(label.clone(), ratio);
                    }
                    None => {
                        tracing::warn!(map = map_name, aspect = %label, "malformed rect ratio; default will be used")
                    }
                }
            }
        }
        let extra = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "rect_ratio_by_aspect")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            rect_ratio_by_aspect,
            extra,
        }
    }
}

/// The `settings` section of the config document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySettings {
    pub enable_num_switch: bool,
    pub selected_map: MapName,
    pub visible_overlay: bool,
    pub master_on: bool,
    pub global_scale: f64,
    pub minimize_to_tray: bool,
    /// Initialise logging at debug level and write a log file.
    pub debug_logging: bool,
    pub keybinds: Keybinds,
    pub types: TypeTable,
    pub hidden: HiddenTable,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const SETTINGS_KEYS: [&str; 10] = [
    "enable_num_switch",
    "selected_map",
    "visible_overlay",
    "master_on",
    "global_scale",
    "minimize_to_tray",
    "debug_logging",
    "keybinds",
    "types",
    "hidden",
];

impl OverlaySettings {
    pub fn with_defaults(palette: &Palette) -> Self {
        Self {
            enable_num_switch: true,
            selected_map: MapName::default(),
            visible_overlay: false,
            master_on: true,
            global_scale: 1.0,
            minimize_to_tray: false,
            debug_logging: false,
            keybinds: Keybinds::from_fn(KeybindAction::default_binding),
            types: TypeTable::from_fn(|cat| default_type_state(cat, palette)),
            hidden: default_hidden(),
            extra: Map::new(),
        }
    }

    fn from_value(value: Option<&Value>, palette: &Palette) -> Self {
        let obj = value.and_then(Value::as_object);
        let field = |name: &str| obj.and_then(|o| o.get(name));
        let flag = |name: &str, default: bool| field(name).and_then(Value::as_bool).unwrap_or(default);

        let selected_map = field("selected_map")
            .and_then(Value::as_str)
            .and_then(MapName::from_label)
            .unwrap_or_default();
        let global_scale = field("global_scale")
            .and_then(Value::as_f64)
            .map(clamp_global_scale)
            .unwrap_or(1.0);

        let mut hidden = HiddenTable::from_value(field("hidden"), |_, raw| {
            raw.and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default()
        });
        if let Some(xp) = hidden.get_mut(Category::PossibleXp) {
            xp.extend(DEFAULT_HIDDEN_POSSIBLE_XP.iter().map(|s| (*s).to_owned()));
        }

        let extra = obj
            .map(|o| {
                o.iter()
                    .filter(|(k, _)| !SETTINGS_KEYS.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        // The overlay can only be shown while the master switch is on.
        let master_on = flag("master_on", true);
        let visible_overlay = master_on && flag("visible_overlay", false);

        Self {
            enable_num_switch: flag("enable_num_switch", true),
            selected_map,
            visible_overlay,
            master_on,
            global_scale,
            minimize_to_tray: flag("minimize_to_tray", false),
            debug_logging: flag("debug_logging", false),
            keybinds: Keybinds::from_value(field("keybinds"), normalize_keybinding),
            types: TypeTable::from_value(field("types"), |cat, raw| {
                normalize_type_state(cat, raw, palette)
            }),
            hidden,
            extra,
        }
    }

    pub fn keybinding(&self, action: KeybindAction) -> Keybinding {
        self.keybinds
            .get(action)
            .copied()
            .unwrap_or_else(|| action.default_binding())
    }
}

fn default_type_state(category: Category, palette: &Palette) -> TypeState {
    TypeState {
        enabled: true,
        color: palette.default_fill(category),
    }
}

fn default_hidden() -> HiddenTable {
    HiddenTable::from_fn(|cat| {
        if cat == Category::PossibleXp {
            DEFAULT_HIDDEN_POSSIBLE_XP
                .iter()
                .map(|s| (*s).to_owned())
                .collect()
        } else {
            BTreeSet::new()
        }
    })
}

fn normalize_type_state(category: Category, raw: Option<&Value>, palette: &Palette) -> TypeState {
    let defaults = default_type_state(category, palette);
    let Some(obj) = raw.and_then(Value::as_object) else {
        return defaults;
    };
    TypeState {
        enabled: obj
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.enabled),
        color: obj.get("color").and_then(parse_rgb).unwrap_or(defaults.color),
    }
}

fn parse_rgb(value: &Value) -> Option<Rgb> {
    let items = value.as_array()?;
    if items.len() != 3 {
        return None;
    }
    let channel = |v: &Value| v.as_f64().map(|c| c.clamp(0.0, 255.0) as u8);
    Some(Rgb(channel(&items[0])?, channel(&items[1])?, channel(&items[2])?))
}

fn parse_vk(value: &Value) -> Option<u16> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    let n = n.trunc();
    (n >= 0.0 && n <= u16::MAX as f64).then_some(n as u16)
}

/// Merge a stored binding over the action's default. Modifier flags are
/// always materialised for the gated action.
fn normalize_keybinding(action: KeybindAction, raw: Option<&Value>) -> Keybinding {
    let default = action.default_binding();
    let obj = raw.and_then(Value::as_object);
    let modifier = |name: &str, fallback: Option<bool>| {
        obj.and_then(|o| o.get(name))
            .and_then(Value::as_bool)
            .or(fallback)
    };
    let mut binding = Keybinding {
        vk: obj
            .and_then(|o| o.get("vk"))
            .and_then(parse_vk)
            .unwrap_or(default.vk),
        ctrl: modifier("ctrl", default.ctrl),
        alt: modifier("alt", default.alt),
        shift: modifier("shift", default.shift),
    };
    if action.is_modifier_gated() {
        binding.ctrl = Some(binding.ctrl.unwrap_or(true));
        binding.alt = Some(binding.alt.unwrap_or(true));
        binding.shift = Some(binding.shift.unwrap_or(true));
    }
    binding
}

/// The whole persisted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub version: String,
    pub profiles: BTreeMap<String, MapProfile>,
    pub settings: OverlaySettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Config {
    pub fn with_defaults(palette: &Palette) -> Self {
        Self {
            version: CONFIG_VERSION.to_owned(),
            profiles: MapName::ALL
                .into_iter()
                .map(|map| (map.label().to_owned(), MapProfile::with_defaults()))
                .collect(),
            settings: OverlaySettings::with_defaults(palette),
            extra: Map::new(),
        }
    }

    /// Normalize a parsed document. The version is taken as-is; gating is the
    /// store's job.
    pub fn from_value(value: &Value, palette: &Palette) -> Self {
        let obj = value.as_object();
        let version = obj
            .and_then(|o| o.get("version"))
            .and_then(Value::as_str)
            .unwrap_or(CONFIG_VERSION)
            .to_owned();
        let profiles = obj
            .and_then(|o| o.get("profiles"))
            .and_then(Value::as_object)
            .map(|profiles| {
                profiles
                    .iter()
                    .map(|(name, raw)| (name.clone(), MapProfile::from_value(name, raw)))
                    .collect()
            })
            .unwrap_or_default();
        let settings = OverlaySettings::from_value(obj.and_then(|o| o.get("settings")), palette);
        let extra = obj
            .map(|o| {
                o.iter()
                    .filter(|(k, _)| !matches!(k.as_str(), "version" | "profiles" | "settings"))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            version,
            profiles,
            settings,
            extra,
        }
    }

    /// Stored ratio for a map and aspect label, if the profile has a valid one.
    pub fn rect_ratio(&self, map: MapName, aspect_label: &str) -> Option<RectRatio> {
        self.profiles
            .get(map.label())
            .and_then(|p| p.rect_ratio_by_aspect.get(aspect_label))
            .copied()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize config document")
    }
}

/// Loads and persists the config document at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    palette: Palette,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, palette: Palette) -> Self {
        Self {
            path: path.into(),
            palette,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn defaults(&self) -> Config {
        Config::with_defaults(&self.palette)
    }

    /// Load the document, replacing it with fresh defaults when it is missing,
    /// unreadable or carries a different version.
    pub fn load(&self) -> Config {
        match self.read_current() {
            Ok(Some(config)) => config,
            Ok(None) => self.replace_with_defaults(),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "config unreadable; replacing with defaults");
                self.replace_with_defaults()
            }
        }
    }

    /// Overwrite the stored document with defaults, then reload it.
    pub fn reset_to_defaults(&self) -> Config {
        tracing::info!(path = %self.path.display(), "resetting config to defaults");
        self.save(&self.defaults());
        self.load()
    }

    /// Persist best-effort. Failures are logged and swallowed.
    pub fn save(&self, config: &Config) {
        if let Err(e) = self.try_save(config) {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to save config");
        }
    }

    pub fn try_save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create config folder {}", parent.display()))?;
            }
        }
        let json = config.to_json()?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace config file {}", self.path.display()))
    }

    /// `Ok(None)` means the file is absent or has a different version.
    fn read_current(&self) -> Result<Option<Config>> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no config found; creating defaults");
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read config {}", self.path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("parse config {}", self.path.display()))?;
        match value.get("version").and_then(Value::as_str) {
            Some(CONFIG_VERSION) if value.is_object() => Ok(Some(Config::from_value(&value, &self.palette))),
            found => {
                tracing::info!(?found, expected = CONFIG_VERSION, "config version mismatch; replacing");
                Ok(None)
            }
        }
    }

    fn replace_with_defaults(&self) -> Config {
        let config = self.defaults();
        self.save(&config);
        config
    }
}

/// Read `settings.debug_logging` without normalizing or rewriting the file.
/// Used before logging is initialised; anything unreadable counts as off.
pub fn peek_debug_logging(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .and_then(|value| value.pointer("/settings/debug_logging").and_then(Value::as_bool))
        .unwrap_or(false)
}
