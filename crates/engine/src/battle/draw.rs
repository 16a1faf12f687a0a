use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;

use crate::app::{Palette, SpriteCanvas, SpriteRef, GRID_TILE_SIZE};

use super::grid::{Grid, Tile};
use super::objects::draw_billboard;
use super::visibility::{TraversalDirection, VisibleTile, TILE_HEIGHT};

pub const SELECTOR_SHEET: &str = "ui/selector";
pub const SELECTOR_FLAT_INDEX: u32 = 0;
pub const SELECTOR_MARKER_INDEX: u32 = 1;
const SELECTOR_TINT: Vec3 = Vec3::new(1.0, 0.9, 0.35);

/// Per-frame inputs shared by the three passes.
pub struct BattlefieldFrame<'a> {
    pub grid: &'a Grid,
    pub visible: &'a [VisibleTile],
    pub direction: TraversalDirection,
    pub selected: (i32, i32),
    pub view_angle: f32,
}

pub fn draw_battlefield(canvas: &mut dyn SpriteCanvas, frame: &BattlefieldFrame<'_>) {
    walk_visible(canvas, frame, |canvas, tile, visible| {
        draw_ground(canvas, tile, visible, frame.direction)
    });
    walk_visible(canvas, frame, |canvas, tile, visible| {
        draw_objects(canvas, tile, visible, frame)
    });
    walk_visible(canvas, frame, |canvas, tile, _| {
        if let Some(terrain) = &tile.terrain {
            terrain.display(canvas, frame.view_angle);
        }
    });
}

/// One pass: translate by each stored offset and draw at that tile. Each
/// inner run gets its own matrix so its offsets start from the grid origin.
fn walk_visible(
    canvas: &mut dyn SpriteCanvas,
    frame: &BattlefieldFrame<'_>,
    mut draw_tile: impl FnMut(&mut dyn SpriteCanvas, &Tile, &VisibleTile),
) {
    canvas.push();
    let mut in_run = false;
    for visible in frame.visible {
        if visible.run_start {
            if in_run {
                canvas.pop();
            }
            canvas.push();
            in_run = true;
        }
        canvas.translate(visible.translation);
        if let Some(tile) = frame.grid.get_tile(visible.x, visible.y) {
            draw_tile(canvas, tile, visible);
        }
    }
    if in_run {
        canvas.pop();
    }
    canvas.pop();
}

fn draw_ground(
    canvas: &mut dyn SpriteCanvas,
    tile: &Tile,
    visible: &VisibleTile,
    direction: TraversalDirection,
) {
    let Some(kind) = &tile.kind else {
        return;
    };
    canvas.draw_sprite(&kind.top, &Palette::IDENTITY);
    let (x_walls, y_walls) = visible.walls;
    if x_walls > 0 {
        draw_wall(canvas, &kind.side, x_walls, x_face(direction.dx));
    }
    if y_walls > 0 {
        draw_wall(canvas, &kind.side, y_walls, y_face(direction.dy));
    }
}

/// Corner the face starts from and its rotation about z, chosen so the
/// face's u axis runs left to right for a viewer in front of it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WallFace {
    offset: Vec3,
    rotation: f32,
}

fn x_face(dx: i32) -> WallFace {
    if dx > 0 {
        WallFace {
            offset: Vec3::new(GRID_TILE_SIZE, 0.0, 0.0),
            rotation: FRAC_PI_2,
        }
    } else {
        WallFace {
            offset: Vec3::new(0.0, GRID_TILE_SIZE, 0.0),
            rotation: 3.0 * FRAC_PI_2,
        }
    }
}

fn y_face(dy: i32) -> WallFace {
    if dy > 0 {
        WallFace {
            offset: Vec3::new(GRID_TILE_SIZE, GRID_TILE_SIZE, 0.0),
            rotation: PI,
        }
    } else {
        WallFace {
            offset: Vec3::ZERO,
            rotation: 0.0,
        }
    }
}

fn draw_wall(canvas: &mut dyn SpriteCanvas, side: &SpriteRef, segments: u32, face: WallFace) {
    canvas.push();
    canvas.translate(face.offset);
    canvas.rotate_z(face.rotation);
    // Stand the sprite up: local +y now points down the face.
    canvas.rotate_x(-FRAC_PI_2);
    for segment in 0..segments {
        canvas.push();
        canvas.translate(Vec3::new(0.0, segment as f32 * TILE_HEIGHT, 0.0));
        canvas.scale(Vec3::new(1.0, TILE_HEIGHT / GRID_TILE_SIZE, 1.0));
        canvas.draw_sprite(side, &Palette::IDENTITY);
        canvas.pop();
    }
    canvas.pop();
}

fn draw_objects(
    canvas: &mut dyn SpriteCanvas,
    tile: &Tile,
    visible: &VisibleTile,
    frame: &BattlefieldFrame<'_>,
) {
    let is_selected = (visible.x, visible.y) == frame.selected;
    if tile.occupant.is_none() && !is_selected {
        return;
    }
    canvas.push();
    canvas.translate(Vec3::new(0.0, 0.0, tile.terrain_height()));
    if let Some(occupant) = &tile.occupant {
        occupant.display(canvas, frame.view_angle);
    }
    if is_selected {
        let palette = Palette::tinted(SELECTOR_TINT);
        match &tile.occupant {
            Some(occupant) => {
                canvas.translate(Vec3::new(0.0, 0.0, occupant.height_offset()));
                draw_billboard(
                    canvas,
                    &SpriteRef::new(SELECTOR_SHEET, SELECTOR_MARKER_INDEX),
                    &palette,
                    frame.view_angle,
                );
            }
            None => canvas.draw_sprite(
                &SpriteRef::new(SELECTOR_SHEET, SELECTOR_FLAT_INDEX),
                &palette,
            ),
        }
    }
    canvas.pop();
}
