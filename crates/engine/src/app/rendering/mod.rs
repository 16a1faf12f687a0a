mod canvas;
mod renderer;
mod transform;

pub use canvas::{
    DrawCall, MatrixStack, Palette, RecordingCanvas, SpriteCanvas, SpriteRef, GRID_TILE_SIZE,
};
pub use renderer::Renderer;
pub use transform::{
    ndc_to_screen_px, projection, view_transform, world_to_screen_px, Viewport, DEPTH_SCALE, TILT,
};
