use crate::catalog::Category;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Opaque RGB color, stored in the config as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Parse `#RGB`, `#RRGGBB` or `#AARRGGBB` (alpha is dropped).
    pub fn parse_hex(text: &str) -> Option<Self> {
        let hex = text.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self(it.next()??, it.next()??, it.next()??))
            }
            6 => Some(Self(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
            8 => Some(Self(byte(&hex[2..4])?, byte(&hex[4..6])?, byte(&hex[6..8])?)),
            _ => None,
        }
    }
}

const DEFAULT_BORDER: Rgb = Rgb::new(0x55, 0x55, 0x55);
const DEFAULT_FILL: Rgb = Rgb::new(0xB4, 0xB4, 0xB4);
const DEFAULT_STYLE_RADIUS: f64 = 12.0;

/// Display attributes for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStyle {
    pub label: String,
    pub border: Rgb,
    pub default_fill: Rgb,
    pub radius_px: u32,
}

impl CategoryStyle {
    fn possible_xp() -> Self {
        Self {
            label: "Possible XP Location".to_owned(),
            border: Rgb::new(0xFF, 0xFF, 0xFF),
            default_fill: Rgb::new(0xFF, 0xD3, 0x4D),
            radius_px: 6,
        }
    }

    fn fallback(category: Category) -> Self {
        Self {
            label: fallback_label(category).to_owned(),
            border: DEFAULT_BORDER,
            default_fill: DEFAULT_FILL,
            radius_px: overlay_radius(DEFAULT_STYLE_RADIUS),
        }
    }
}

fn fallback_label(category: Category) -> &'static str {
    match category {
        Category::PossibleXp => "Possible XP Location",
        Category::Spawns => "Spawns",
        Category::Armories => "Armories",
        Category::Towers => "Hunting Towers",
        Category::BigTowers => "Watch Towers",
        Category::Workbenches => "Workbenches",
        Category::WildTargets => "Wild Targets",
        Category::Beetles => "Beetles",
        Category::EasterEggs => "Easter Eggs",
        Category::MeleeWeapons => "Melee Weapons",
        Category::CashRegisters => "Cash Registers",
    }
}

/// Map a style-file radius to an on-screen base radius in pixels.
pub fn overlay_radius(style_radius: f64) -> u32 {
    let px = (style_radius * 0.25).round_ties_even();
    if px.is_nan() {
        return 3;
    }
    px.clamp(3.0, 10.0) as u32
}

/// Default fill color per category. Drives config defaults and color resets.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    fills: BTreeMap<Category, Rgb>,
}

impl Palette {
    pub fn default_fill(&self, category: Category) -> Rgb {
        self.fills.get(&category).copied().unwrap_or(DEFAULT_FILL)
    }
}

impl Default for Palette {
    fn default() -> Self {
        StyleCatalog::default().palette()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleCatalog {
    styles: BTreeMap<Category, CategoryStyle>,
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::from_value(&Value::Null)
    }
}

impl StyleCatalog {
    /// Build styles from the style dataset. Entries are matched by their
    /// `categories` field, not by their key. Anything missing or invalid falls
    /// back to the built-in look.
    pub fn from_value(raw: &Value) -> Self {
        let mut styles = BTreeMap::new();
        for category in Category::DRAW_ORDER {
            let style = if category.is_synthetic() {
                CategoryStyle::possible_xp()
            } else {
                match find_spec(raw, category) {
                    Some(spec) => parse_spec(spec, category),
                    None => CategoryStyle::fallback(category),
                }
            };
            styles.insert(category, style);
        }
        Self { styles }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read style dataset {}", path.display()))?;
        let raw: Value = serde_json::from_str(&content)
            .with_context(|| format!("parse style dataset {}", path.display()))?;
        if !raw.is_object() {
            tracing::warn!(path = %path.display(), "style dataset is not an object; using built-in styles");
        }
        Ok(Self::from_value(&raw))
    }

    pub fn style(&self, category: Category) -> CategoryStyle {
        self.styles
            .get(&category)
            .cloned()
            .unwrap_or_else(|| CategoryStyle::fallback(category))
    }

    pub fn palette(&self) -> Palette {
        Palette {
            fills: self
                .styles
                .iter()
                .map(|(cat, style)| (*cat, style.default_fill))
                .collect(),
        }
    }
}

fn find_spec(raw: &Value, category: Category) -> Option<&serde_json::Map<String, Value>> {
    raw.as_object()?
        .values()
        .filter_map(Value::as_object)
        .find(|spec| spec.get("categories").and_then(Value::as_str) == Some(category.key()))
}

fn parse_spec(spec: &serde_json::Map<String, Value>, category: Category) -> CategoryStyle {
    let label = match spec.get("label") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => fallback_label(category).to_owned(),
        Some(other) => other.to_string(),
    };
    let color = |key: &str, fallback: Rgb| {
        spec.get(key)
            .and_then(Value::as_str)
            .and_then(Rgb::parse_hex)
            .unwrap_or(fallback)
    };
    let radius = match spec.get("radius") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .unwrap_or(DEFAULT_STYLE_RADIUS);
    CategoryStyle {
        label,
        border: color("borderColor", DEFAULT_BORDER),
        default_fill: color("fillColor", DEFAULT_FILL),
        radius_px: overlay_radius(radius),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgb::parse_hex("#FFD34D"), Some(Rgb::new(255, 211, 77)));
        assert_eq!(Rgb::parse_hex("#fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(Rgb::parse_hex("#80102030"), Some(Rgb::new(0x10, 0x20, 0x30)));
        assert_eq!(Rgb::parse_hex("red"), None);
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("#gg0000"), None);
    }

    #[test]
    fn radius_is_quartered_and_clamped() {
        assert_eq!(overlay_radius(12.0), 3);
        assert_eq!(overlay_radius(24.0), 6);
        assert_eq!(overlay_radius(4.0), 3);
        assert_eq!(overlay_radius(100.0), 10);
        assert_eq!(overlay_radius(f64::NAN), 3);
    }

    #[test]
    fn styles_are_looked_up_by_category_field() {
        let raw = json!({
            "anything": {
                "categories": "armories",
                "label": "Arsenals",
                "borderColor": "#101010",
                "fillColor": "#ff0000",
                "radius": 32
            },
            "other": {"categories": "beetles", "fillColor": "nope", "radius": "20"}
        });
        let styles = StyleCatalog::from_value(&raw);

        let armories = styles.style(Category::Armories);
        assert_eq!(armories.label, "Arsenals");
        assert_eq!(armories.border, Rgb::new(0x10, 0x10, 0x10));
        assert_eq!(armories.default_fill, Rgb::new(255, 0, 0));
        assert_eq!(armories.radius_px, 8);

        let beetles = styles.style(Category::Beetles);
        assert_eq!(beetles.label, "Beetles");
        assert_eq!(beetles.default_fill, DEFAULT_FILL);
        assert_eq!(beetles.radius_px, 5);

        let towers = styles.style(Category::Towers);
        assert_eq!(towers.label, "Hunting Towers");
        assert_eq!(towers.radius_px, 3);
    }

    #[test]
    fn possible_xp_style_is_fixed() {
        let raw = json!({"x": {"categories": "possible_xp", "fillColor": "#000000"}});
        let styles = StyleCatalog::from_value(&raw);
        let xp = styles.style(Category::PossibleXp);
        assert_eq!(xp.default_fill, Rgb::new(0xFF, 0xD3, 0x4D));
        assert_eq!(xp.radius_px, 6);
        assert_eq!(
            styles.palette().default_fill(Category::PossibleXp),
            Rgb::new(0xFF, 0xD3, 0x4D)
        );
    }
}
