use glam::Vec3;

use crate::app::GRID_TILE_SIZE;

use super::grid::Grid;

/// World units per unit of tile height.
pub const TILE_HEIGHT: f32 = 64.0;

/// Step applied along each grid axis while walking tiles back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalDirection {
    pub dx: i32,
    pub dy: i32,
}

/// Below this magnitude a sine or cosine counts as zero.
const AXIS_EPSILON: f32 = 1e-5;

fn step_for(component: f32) -> i32 {
    if component > -AXIS_EPSILON {
        -1
    } else {
        1
    }
}

impl TraversalDirection {
    /// Quadrant boundaries (`0`, `±π/2`, `π`) take the `-1` step on the axis
    /// whose component is zero.
    pub fn for_angle(angle: f32) -> Self {
        Self {
            dx: step_for(angle.sin()),
            dy: step_for(angle.cos()),
        }
    }

    pub fn reversed(self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleTile {
    pub x: i32,
    pub y: i32,
    /// Offset from the previous tile of the same inner run; the first tile of
    /// a run is offset from the grid origin.
    pub translation: Vec3,
    /// Set on the first tile emitted for each outer-axis index.
    pub run_start: bool,
    /// Wall segments toward `(x + dx, y)` and `(x, y + dy)`.
    pub walls: (u32, u32),
}

pub fn tile_origin(x: i32, y: i32, height: u32) -> Vec3 {
    Vec3::new(
        x as f32 * GRID_TILE_SIZE,
        y as f32 * GRID_TILE_SIZE,
        height as f32 * TILE_HEIGHT,
    )
}

/// Height difference toward a neighbour, or zero when the neighbour is
/// missing, a hole, or not lower.
fn wall_count(grid: &Grid, height: u32, nx: i32, ny: i32) -> u32 {
    match grid.get_tile(nx, ny) {
        Some(neighbour) if neighbour.kind.is_some() => height.saturating_sub(neighbour.height),
        _ => 0,
    }
}

fn axis_order(len: u32, step: i32) -> Box<dyn Iterator<Item = i32>> {
    let len = len as i32;
    if step > 0 {
        Box::new(0..len)
    } else {
        Box::new((0..len).rev())
    }
}

/// Lists every non-hole tile so that later entries are drawn over earlier
/// ones. Traversal runs x outer, y inner, each in the direction's sense.
pub fn build_visible_tiles(grid: &Grid, direction: TraversalDirection) -> Vec<VisibleTile> {
    let mut visible = Vec::new();
    for x in axis_order(grid.width(), direction.dx) {
        let mut previous = Vec3::ZERO;
        let mut run_start = true;
        for y in axis_order(grid.height(), direction.dy) {
            let Some(tile) = grid.get_tile(x, y) else {
                continue;
            };
            if tile.kind.is_none() {
                continue;
            }
            let origin = tile_origin(x, y, tile.height);
            visible.push(VisibleTile {
                x,
                y,
                translation: origin - previous,
                run_start,
                walls: (
                    wall_count(grid, tile.height, x + direction.dx, y),
                    wall_count(grid, tile.height, x, y + direction.dy),
                ),
            });
            previous = origin;
            run_start = false;
        }
    }
    visible
}
