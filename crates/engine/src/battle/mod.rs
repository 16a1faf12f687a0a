mod camera;
mod controller;
mod draw;
mod events;
mod grid;
mod objects;
mod selector;
#[cfg(test)]
mod test_support;
mod tile_catalog;
mod view;
mod visibility;

pub use camera::{
    normalize_angle, RotationDirection, ViewCamera, CAMERA_FOLLOW_RATE, INITIAL_ANGLE,
    QUARTER_TURN, ROTATION_SPEED, ZOOM_DEFAULT, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP,
};
pub use controller::{
    BattleController, BattleLoadError, BattleStage, ChangePhase, FocusTile, RotateView,
    TurnPhase, Wait,
};
pub use draw::{draw_battlefield, BattlefieldFrame, SELECTOR_SHEET};
pub use events::{Event, EventQueue, Signal};
pub use grid::{Grid, Tile, MAX_GRID_EXTENT};
pub use objects::{BattleObject, ObjectRegistry, Terrain};
pub use selector::{screen_step_to_grid, tile_focus, Selector};
pub use tile_catalog::{TileCatalog, TileSet, TileType};
pub use view::BattleView;
pub use visibility::{build_visible_tiles, tile_origin, TraversalDirection, VisibleTile, TILE_HEIGHT};
