use tracing::debug;

use crate::app::{SpriteCanvas, Viewport};

use super::camera::{RotationDirection, ViewCamera};
use super::draw::{draw_battlefield, BattlefieldFrame};
use super::grid::Grid;
use super::selector::Selector;
use super::visibility::{build_visible_tiles, TraversalDirection, VisibleTile};

/// Camera, cursor and the cached back-to-front tile list for one grid.
#[derive(Debug, Clone)]
pub struct BattleView {
    camera: ViewCamera,
    selector: Selector,
    visible: Vec<VisibleTile>,
    built_for: Option<(TraversalDirection, u64)>,
    rebuilds: u64,
}

impl BattleView {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            camera: ViewCamera::new(viewport),
            selector: Selector::default(),
            visible: Vec::new(),
            built_for: None,
            rebuilds: 0,
        }
    }

    pub fn camera(&self) -> &ViewCamera {
        &self.camera
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn visible_tiles(&self) -> &[VisibleTile] {
        &self.visible
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub fn direction(&self) -> TraversalDirection {
        TraversalDirection::for_angle(self.camera.angle())
    }

    /// Camera has reached both of its targets.
    pub fn is_settled(&self) -> bool {
        !self.camera.is_rotating() && !self.camera.is_moving()
    }

    pub fn bounds_changed(&mut self, viewport: Viewport) {
        self.camera.set_viewport(viewport);
    }

    pub fn rotate(&mut self, direction: RotationDirection) -> bool {
        self.camera.rotate(direction)
    }

    pub fn zoom_by(&mut self, steps: i32) {
        self.camera.zoom_by(steps);
    }

    pub fn set_selected_tile(&mut self, x: i32, y: i32, grid: &Grid) {
        self.selector
            .set_selected_tile(x, y, grid, &mut self.camera);
    }

    pub fn adjust_selected_tile(&mut self, dx: i32, dy: i32, grid: &Grid) {
        self.selector
            .adjust_selected_tile(dx, dy, grid, &mut self.camera);
    }

    /// Jumps the camera to its targets and brings the tile list up to date.
    pub fn snap(&mut self, grid: &Grid) {
        self.camera.snap_to_target();
        self.refresh_visible(grid);
    }

    pub fn update(&mut self, frames: u32, grid: &Grid) {
        self.camera.update(frames);
        self.refresh_visible(grid);
    }

    /// Rebuilds the tile list only when the traversal direction or the grid
    /// changed since the last build.
    pub fn refresh_visible(&mut self, grid: &Grid) -> bool {
        let key = (self.direction(), grid.revision());
        if self.built_for == Some(key) {
            return false;
        }
        self.visible = build_visible_tiles(grid, key.0);
        self.built_for = Some(key);
        self.rebuilds += 1;
        debug!(
            dx = key.0.dx,
            dy = key.0.dy,
            grid_revision = key.1,
            visible = self.visible.len(),
            "visible_tiles_rebuilt"
        );
        true
    }

    pub fn display(&self, canvas: &mut dyn SpriteCanvas, grid: &Grid) {
        let Some((direction, _)) = self.built_for else {
            return;
        };
        canvas.push();
        canvas.multiply(self.camera.transform());
        draw_battlefield(
            canvas,
            &BattlefieldFrame {
                grid,
                visible: &self.visible,
                direction,
                selected: self.selector.tile(),
                view_angle: self.camera.angle(),
            },
        );
        canvas.pop();
    }
}
