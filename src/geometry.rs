/// Largest coordinate of the 4096x4096 source grid.
pub const GRID_MAX: f64 = 4095.0;

/// Convert source grid coordinates into normalized `(u, v)` overlay space.
///
/// The dataset's axes are rotated relative to the on-screen map, so the grid is
/// turned 90 degrees clockwise: `u` comes from `y` and `v` runs top-down from
/// the inverted `x`. Both components are clamped to `[0, 1]`.
pub fn rotate90cw_norm(x: f64, y: f64) -> (f64, f64) {
    let u = y / GRID_MAX;
    let v = (GRID_MAX - x) / GRID_MAX;
    (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0))
}
