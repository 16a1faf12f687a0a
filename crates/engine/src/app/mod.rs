mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod state;

pub use input::{
    default_key_bindings, parse_key_code, Control, ControlEvent, KeyBinding, Propagation,
};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    ndc_to_screen_px, projection, view_transform, world_to_screen_px, DrawCall, MatrixStack,
    Palette, RecordingCanvas, Renderer, SpriteCanvas, SpriteRef, Viewport, DEPTH_SCALE,
    GRID_TILE_SIZE, TILT,
};
pub use state::{State, StateStats};
