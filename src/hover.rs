use crate::aspect::PixelRect;
use crate::catalog::{Category, MapName, MapPoints, PoiPoint};
use crate::visibility::VisibilityState;

/// Hit radius around a marker center, in pixels.
pub const DEFAULT_HOVER_RADIUS_PX: f64 = 10.0;

/// The POI currently under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    pub map: MapName,
    pub category: Category,
    pub index: usize,
    pub point: PoiPoint,
}

impl HoverTarget {
    pub fn hide_id(&self) -> String {
        self.point.hide_id(self.category)
    }
}

/// Find the nearest enabled, non-hidden point within `radius_px` of `cursor`.
///
/// Categories are scanned in draw order and points in insertion order; on an
/// exact distance tie the first point seen wins.
pub fn resolve(
    cursor: (f64, f64),
    map: MapName,
    points: &MapPoints,
    visibility: &VisibilityState,
    rect: PixelRect,
    radius_px: f64,
) -> Option<HoverTarget> {
    let limit = radius_px * radius_px;
    let mut best: Option<(f64, Category, usize, &PoiPoint)> = None;

    for category in Category::DRAW_ORDER {
        if !visibility.is_enabled(category) {
            continue;
        }
        for (index, point) in points.points(category).iter().enumerate() {
            if visibility.is_point_hidden(category, point) {
                continue;
            }
            let (cx, cy) = rect.project(point.u, point.v);
            let dx = cursor.0 - cx;
            let dy = cursor.1 - cy;
            let d2 = dx * dx + dy * dy;
            if d2 > limit {
                continue;
            }
            if best.map_or(true, |(best_d2, ..)| d2 < best_d2) {
                best = Some((d2, category, index, point));
            }
        }
    }

    best.map(|(_, category, index, point)| HoverTarget {
        map,
        category,
        index,
        point: point.clone(),
    })
}
