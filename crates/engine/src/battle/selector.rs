use glam::Vec3;

use crate::app::GRID_TILE_SIZE;

use super::camera::ViewCamera;
use super::grid::Grid;
use super::visibility::TILE_HEIGHT;

/// Tile cursor. Always inside the grid, or `(0, 0)` for an empty grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selector {
    tile: (i32, i32),
}

impl Selector {
    pub fn tile(&self) -> (i32, i32) {
        self.tile
    }

    /// Clamps to the grid and points the camera at the tile centre.
    pub fn set_selected_tile(&mut self, x: i32, y: i32, grid: &Grid, camera: &mut ViewCamera) {
        let clamp_axis = |value: i32, len: u32| value.clamp(0, (len as i32 - 1).max(0));
        self.tile = (clamp_axis(x, grid.width()), clamp_axis(y, grid.height()));
        camera.set_target_position(tile_focus(grid, self.tile.0, self.tile.1));
    }

    /// Moves by a screen-relative step (`+x` right, `+y` up), remapped for
    /// the camera's current quarter turn.
    pub fn adjust_selected_tile(
        &mut self,
        dx: i32,
        dy: i32,
        grid: &Grid,
        camera: &mut ViewCamera,
    ) {
        let (gx, gy) = screen_step_to_grid(dx, dy, camera.quarter_index());
        let (x, y) = self.tile;
        self.set_selected_tile(x + gx, y + gy, grid, camera);
    }
}

/// Centre of the tile's top face, or the grid origin plane for a missing tile.
pub fn tile_focus(grid: &Grid, x: i32, y: i32) -> Vec3 {
    let height = grid.get_tile(x, y).map_or(0, |tile| tile.height);
    Vec3::new(
        (x as f32 + 0.5) * GRID_TILE_SIZE,
        (y as f32 + 0.5) * GRID_TILE_SIZE,
        height as f32 * TILE_HEIGHT,
    )
}

/// At rest (quarter 0) screen right is grid `+x` and screen up is grid `+y`;
/// each quarter turn of the view rotates that mapping by -90°.
pub fn screen_step_to_grid(dx: i32, dy: i32, quarter: i32) -> (i32, i32) {
    match quarter.rem_euclid(4) {
        0 => (dx, dy),
        1 => (dy, -dx),
        2 => (-dx, -dy),
        _ => (-dy, dx),
    }
}
