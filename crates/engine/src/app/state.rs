use super::input::{ControlEvent, Propagation};
use super::rendering::SpriteCanvas;

/// Counters a state reports for the periodic `loop_metrics` log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateStats {
    pub visible_tiles: usize,
    pub pending_events: usize,
}

/// A screen driven by the host loop. All calls happen on the loop thread and
/// complete synchronously.
pub trait State {
    fn bounds_changed(&mut self, width: u32, height: u32);
    /// Called once per rendered frame with the number of fixed ticks elapsed.
    fn update(&mut self, frames_passed: u32);
    fn display(&self, canvas: &mut dyn SpriteCanvas);
    fn handle_control(&mut self, event: ControlEvent) -> Propagation;
    /// Appended to the window title while present.
    fn debug_title(&self) -> Option<String> {
        None
    }
    fn stats(&self) -> StateStats {
        StateStats::default()
    }
}

/// Owns the active state and filters redundant bounds changes.
pub(crate) struct StateHost {
    state: Box<dyn State>,
    bounds: Option<(u32, u32)>,
}

impl StateHost {
    pub(crate) fn new(state: Box<dyn State>) -> Self {
        Self {
            state,
            bounds: None,
        }
    }

    pub(crate) fn bounds_changed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.bounds == Some((width, height)) {
            return;
        }
        self.bounds = Some((width, height));
        self.state.bounds_changed(width, height);
    }

    pub(crate) fn update(&mut self, frames_passed: u32) {
        if frames_passed > 0 {
            self.state.update(frames_passed);
        }
    }

    pub(crate) fn handle_control(&mut self, event: ControlEvent) -> Propagation {
        self.state.handle_control(event)
    }

    pub(crate) fn state(&self) -> &dyn State {
        self.state.as_ref()
    }
}
