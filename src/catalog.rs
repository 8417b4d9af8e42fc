use crate::geometry::rotate90cw_norm;
use anyhow::{bail, Context, Result};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Maps in release order. The order drives numeric switching and the
/// positional lookup of the indexed dataset format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MapName {
    #[default]
    StillwaterBayou,
    LawsonDelta,
    DeSalle,
    MammonsGulch,
}

impl MapName {
    pub const ALL: [MapName; 4] = [
        MapName::StillwaterBayou,
        MapName::LawsonDelta,
        MapName::DeSalle,
        MapName::MammonsGulch,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MapName::StillwaterBayou => "Stillwater Bayou",
            MapName::LawsonDelta => "Lawson Delta",
            MapName::DeSalle => "DeSalle",
            MapName::MammonsGulch => "Mammon's Gulch",
        }
    }

    pub fn index(self) -> usize {
        match self {
            MapName::StillwaterBayou => 0,
            MapName::LawsonDelta => 1,
            MapName::DeSalle => 2,
            MapName::MammonsGulch => 3,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|map| map.label() == label)
    }
}

impl std::fmt::Display for MapName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for MapName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// POI categories, declared in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    PossibleXp,
    Spawns,
    Armories,
    Towers,
    BigTowers,
    Workbenches,
    WildTargets,
    Beetles,
    EasterEggs,
    MeleeWeapons,
    CashRegisters,
}

impl Category {
    pub const DRAW_ORDER: [Category; 11] = [
        Category::PossibleXp,
        Category::Spawns,
        Category::Armories,
        Category::Towers,
        Category::BigTowers,
        Category::Workbenches,
        Category::WildTargets,
        Category::Beetles,
        Category::EasterEggs,
        Category::MeleeWeapons,
        Category::CashRegisters,
    ];

    /// Source categories concatenated into `possible_xp`, in union order.
    pub const XP_SOURCES: [Category; 3] = [Category::Towers, Category::BigTowers, Category::Armories];

    pub fn key(self) -> &'static str {
        match self {
            Category::PossibleXp => "possible_xp",
            Category::Spawns => "spawns",
            Category::Armories => "armories",
            Category::Towers => "towers",
            Category::BigTowers => "big_towers",
            Category::Workbenches => "workbenches",
            Category::WildTargets => "wild_targets",
            Category::Beetles => "beetles",
            Category::EasterEggs => "easter_eggs",
            Category::MeleeWeapons => "melee_weapons",
            Category::CashRegisters => "cash_registers",
        }
    }

    pub fn is_synthetic(self) -> bool {
        self == Category::PossibleXp
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One plotted marker. Points are immutable; hide state is tracked by
/// [`PoiPoint::hide_id`] outside the point.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiPoint {
    pub u: f64,
    pub v: f64,
    pub x: f64,
    pub y: f64,
    pub source: Category,
    pub raw: Arc<Value>,
}

impl PoiPoint {
    pub fn new(x: f64, y: f64, source: Category, raw: Arc<Value>) -> Self {
        let (u, v) = rotate90cw_norm(x, y);
        Self {
            u,
            v,
            x,
            y,
            source,
            raw,
        }
    }

    /// Identifier used in the hidden set of `category`.
    ///
    /// Coordinates are rounded half to even. Inside `possible_xp` the source
    /// category is prefixed so hiding there never hides the source entry.
    pub fn hide_id(&self, category: Category) -> String {
        let xi = self.x.round_ties_even() as i64;
        let yi = self.y.round_ties_even() as i64;
        if category.is_synthetic() {
            format!("{}:{xi}:{yi}", self.source.key())
        } else {
            format!("{xi}:{yi}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// `[{"i": mapIndex, "r": {category: [...]}}]`
    Indexed,
    /// `[{"n": mapName, category: [...]}]`
    Named,
    Unknown,
}

/// Sniff the dataset schema from its first element.
pub fn detect_format(raw: &Value) -> DataFormat {
    let Some(first) = raw.as_array().and_then(|items| items.first()) else {
        return DataFormat::Unknown;
    };
    let Some(obj) = first.as_object() else {
        return DataFormat::Unknown;
    };
    if obj.contains_key("i") && (obj.contains_key("r") || obj.contains_key("a")) {
        DataFormat::Indexed
    } else if obj.contains_key("n") {
        DataFormat::Named
    } else {
        DataFormat::Unknown
    }
}

/// Points of one map grouped by category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapPoints {
    by_category: BTreeMap<Category, Vec<PoiPoint>>,
}

impl MapPoints {
    pub fn points(&self, category: Category) -> &[PoiPoint] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn insert(&mut self, category: Category, points: Vec<PoiPoint>) {
        self.by_category.insert(category, points);
    }

    pub fn total(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    /// Rebuild `possible_xp` from the current source lists.
    fn derive_possible_xp(&mut self) {
        let union: Vec<PoiPoint> = Category::XP_SOURCES
            .iter()
            .flat_map(|src| self.points(*src).iter().cloned())
            .collect();
        self.by_category.insert(Category::PossibleXp, union);
    }
}

/// Per-map point cache built once from the dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCatalog {
    maps: BTreeMap<MapName, MapPoints>,
}

impl PointCatalog {
    pub fn map(&self, map: MapName) -> Option<&MapPoints> {
        self.maps.get(&map)
    }

    pub fn insert(&mut self, map: MapName, points: MapPoints) {
        self.maps.insert(map, points);
    }
}

/// Build the point catalog for every map. An unknown format is fatal.
pub fn load(raw: &Value, format: DataFormat) -> Result<PointCatalog> {
    if format == DataFormat::Unknown {
        bail!("unrecognized POI dataset format");
    }
    let mut catalog = PointCatalog::default();
    for map in MapName::ALL {
        let points = match map_block(raw, format, map) {
            Some(block) => build_map_points(block, format),
            None => {
                tracing::warn!(map = %map, "no dataset block for map");
                MapPoints::default()
            }
        };
        tracing::debug!(map = %map, points = points.total(), "built map points");
        catalog.insert(map, points);
    }
    Ok(catalog)
}

/// Read, sniff and load a dataset file.
pub fn load_file(path: &Path) -> Result<PointCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read POI dataset {}", path.display()))?;
    let raw: Value = serde_json::from_str(&content)
        .with_context(|| format!("parse POI dataset {}", path.display()))?;
    let format = detect_format(&raw);
    tracing::info!(?format, path = %path.display(), "loading POI dataset");
    load(&raw, format).with_context(|| format!("load POI dataset {}", path.display()))
}

fn map_block(raw: &Value, format: DataFormat, map: MapName) -> Option<&Value> {
    let items = raw.as_array()?;
    match format {
        DataFormat::Named => items
            .iter()
            .find(|item| item.get("n").and_then(Value::as_str) == Some(map.label())),
        DataFormat::Indexed => items.iter().find(|item| {
            item.get("i")
                .and_then(Value::as_f64)
                .is_some_and(|i| i == map.index() as f64)
        }),
        DataFormat::Unknown => None,
    }
}

fn category_entries<'a>(block: &'a Value, format: DataFormat, category: Category) -> &'a [Value] {
    let list = match format {
        DataFormat::Named => block.get(category.key()),
        DataFormat::Indexed => block
            .get("r")
            .filter(|r| r.is_object())
            .and_then(|r| r.get(category.key())),
        DataFormat::Unknown => None,
    };
    list.and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn build_map_points(block: &Value, format: DataFormat) -> MapPoints {
    let mut points = MapPoints::default();
    for category in Category::DRAW_ORDER {
        if category.is_synthetic() {
            continue;
        }
        let entries = category_entries(block, format, category);
        let parsed: Vec<PoiPoint> = entries
            .iter()
            .filter_map(|entry| parse_entry(entry, category))
            .collect();
        if parsed.len() != entries.len() {
            tracing::debug!(
                category = %category,
                skipped = entries.len() - parsed.len(),
                "skipped malformed POI records"
            );
        }
        points.insert(category, parsed);
    }
    points.derive_possible_xp();
    points
}

fn parse_entry(entry: &Value, category: Category) -> Option<PoiPoint> {
    if !entry.is_object() {
        return None;
    }
    let coords = entry.get("c")?.as_array()?;
    if coords.len() < 2 {
        return None;
    }
    let x = coord(&coords[0])?;
    let y = coord(&coords[1])?;
    Some(PoiPoint::new(x, y, category, Arc::new(entry.clone())))
}

fn coord(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}
