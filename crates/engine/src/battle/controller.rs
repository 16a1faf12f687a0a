use std::rc::Rc;

use thiserror::Error;
use tracing::{info, warn};

use crate::app::{Control, ControlEvent, Propagation, SpriteCanvas, State, StateStats, Viewport};
use crate::content::{ContentError, ContentSource};

use super::camera::RotationDirection;
use super::events::{Event, EventQueue, Signal};
use super::grid::Grid;
use super::objects::ObjectRegistry;
use super::tile_catalog::TileCatalog;
use super::view::BattleView;

const OPENING_FOCUS_PRIORITY: i32 = 0;
const OPENING_PAUSE_PRIORITY: i32 = 5;
const OPENING_PHASE_PRIORITY: i32 = 10;
const OPENING_PAUSE_FRAMES: u32 = 20;

#[derive(Debug, Error)]
pub enum BattleLoadError {
    #[error("failed to load battle map `{map_id}`: {source}")]
    Map {
        map_id: String,
        #[source]
        source: ContentError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Opening,
    Player,
    Enemy,
}

/// Everything battle events are allowed to touch.
#[derive(Debug, Clone)]
pub struct BattleStage {
    pub grid: Grid,
    pub view: BattleView,
    pub phase: TurnPhase,
    pub confirmed_tile: Option<(i32, i32)>,
}

/// Selects a tile and waits for the camera to arrive.
#[derive(Debug, Clone, Copy)]
pub struct FocusTile {
    pub x: i32,
    pub y: i32,
}

impl Event<BattleStage> for FocusTile {
    fn name(&self) -> &'static str {
        "focus_tile"
    }

    fn start(&mut self, stage: &mut BattleStage) -> Signal {
        stage.view.set_selected_tile(self.x, self.y, &stage.grid);
        settled_signal(stage)
    }

    fn update(&mut self, stage: &mut BattleStage, _frames: u32) -> Signal {
        settled_signal(stage)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Wait {
    pub frames: u32,
}

impl Event<BattleStage> for Wait {
    fn name(&self) -> &'static str {
        "wait"
    }

    fn start(&mut self, _stage: &mut BattleStage) -> Signal {
        if self.frames == 0 {
            Signal::Stop
        } else {
            Signal::Continue
        }
    }

    fn update(&mut self, _stage: &mut BattleStage, frames: u32) -> Signal {
        self.frames = self.frames.saturating_sub(frames);
        if self.frames == 0 {
            Signal::Stop
        } else {
            Signal::Continue
        }
    }
}

/// Turns the view a quarter and waits for the rotation to finish.
#[derive(Debug, Clone, Copy)]
pub struct RotateView {
    pub direction: RotationDirection,
}

impl Event<BattleStage> for RotateView {
    fn name(&self) -> &'static str {
        "rotate_view"
    }

    fn start(&mut self, stage: &mut BattleStage) -> Signal {
        stage.view.rotate(self.direction);
        settled_signal(stage)
    }

    fn update(&mut self, stage: &mut BattleStage, _frames: u32) -> Signal {
        settled_signal(stage)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChangePhase {
    pub phase: TurnPhase,
}

impl Event<BattleStage> for ChangePhase {
    fn name(&self) -> &'static str {
        "change_phase"
    }

    fn start(&mut self, stage: &mut BattleStage) -> Signal {
        info!(from = ?stage.phase, to = ?self.phase, "turn_phase_changed");
        stage.phase = self.phase;
        Signal::Stop
    }

    fn update(&mut self, _stage: &mut BattleStage, _frames: u32) -> Signal {
        Signal::Stop
    }
}

fn settled_signal(stage: &BattleStage) -> Signal {
    if stage.view.is_settled() {
        Signal::Stop
    } else {
        Signal::Continue
    }
}

/// The battle screen. Owns the content caches so reloading a map reuses
/// loaded tile sets and objects.
pub struct BattleController {
    stage: BattleStage,
    events: EventQueue<BattleStage>,
    source: Rc<dyn ContentSource>,
    catalog: TileCatalog,
    registry: ObjectRegistry,
}

impl BattleController {
    /// Empty battlefield; call `load_map` to populate it.
    pub fn new(source: Rc<dyn ContentSource>, viewport: Viewport) -> Self {
        Self {
            stage: BattleStage {
                grid: Grid::default(),
                view: BattleView::new(viewport),
                phase: TurnPhase::Opening,
                confirmed_tile: None,
            },
            events: EventQueue::new(),
            catalog: TileCatalog::new(Rc::clone(&source)),
            registry: ObjectRegistry::new(Rc::clone(&source)),
            source,
        }
    }

    pub fn load(
        map_id: &str,
        source: Rc<dyn ContentSource>,
        viewport: Viewport,
    ) -> Result<Self, BattleLoadError> {
        let mut controller = Self::new(source, viewport);
        controller.load_map(map_id)?;
        Ok(controller)
    }

    /// Replaces the battlefield with `map_id` and queues the opening
    /// sequence. On error the current battlefield is kept.
    pub fn load_map(&mut self, map_id: &str) -> Result<(), BattleLoadError> {
        let records = self
            .source
            .map_records(map_id)
            .map_err(|source| BattleLoadError::Map {
                map_id: map_id.to_string(),
                source,
            })?;
        let grid = Grid::from_records(&records, &mut self.catalog, &mut self.registry);
        if grid.is_empty() {
            warn!(map_id, "battle_map_empty");
        }

        let mut view = BattleView::new(self.stage.view.camera().viewport());
        let centre = (grid.width() as i32 / 2, grid.height() as i32 / 2);
        view.set_selected_tile(centre.0, centre.1, &grid);
        view.snap(&grid);

        let mut events = EventQueue::new();
        events.push(
            Box::new(FocusTile {
                x: centre.0,
                y: centre.1,
            }),
            OPENING_FOCUS_PRIORITY,
        );
        events.push(
            Box::new(Wait {
                frames: OPENING_PAUSE_FRAMES,
            }),
            OPENING_PAUSE_PRIORITY,
        );
        events.push(
            Box::new(ChangePhase {
                phase: TurnPhase::Player,
            }),
            OPENING_PHASE_PRIORITY,
        );

        info!(
            map_id,
            width = grid.width(),
            height = grid.height(),
            visible_tiles = view.visible_tiles().len(),
            "battle_loaded"
        );
        self.stage = BattleStage {
            grid,
            view,
            phase: TurnPhase::Opening,
            confirmed_tile: None,
        };
        self.events = events;
        Ok(())
    }

    pub fn stage(&self) -> &BattleStage {
        &self.stage
    }

    pub fn queue_event(&mut self, event: Box<dyn Event<BattleStage>>, priority: i32) {
        self.events.push(event, priority);
    }

    pub fn is_busy(&self) -> bool {
        !self.events.is_idle() || !self.events.is_empty()
    }

    fn accepts_cursor_input(&self) -> bool {
        self.stage.phase == TurnPhase::Player && !self.is_busy()
    }

    fn move_selection(&mut self, dx: i32, dy: i32) {
        let stage = &mut self.stage;
        stage.view.adjust_selected_tile(dx, dy, &stage.grid);
    }

    fn confirm_selection(&mut self) {
        let (x, y) = self.stage.view.selector().tile();
        let occupant = self
            .stage
            .grid
            .get_tile(x, y)
            .and_then(|tile| tile.occupant.as_deref())
            .map(|object| object.id())
            .unwrap_or("none");
        info!(x, y, occupant, "tile_confirmed");
        self.stage.confirmed_tile = Some((x, y));
    }
}

impl State for BattleController {
    fn bounds_changed(&mut self, width: u32, height: u32) {
        self.stage.view.bounds_changed(Viewport { width, height });
    }

    fn update(&mut self, frames_passed: u32) {
        self.events.update(&mut self.stage, frames_passed);
        let stage = &mut self.stage;
        stage.view.update(frames_passed, &stage.grid);
    }

    fn display(&self, canvas: &mut dyn SpriteCanvas) {
        self.stage.view.display(canvas, &self.stage.grid);
    }

    fn handle_control(&mut self, event: ControlEvent) -> Propagation {
        if !event.pressed {
            return Propagation::Continue;
        }
        match event.control {
            Control::RotateLeft => {
                self.stage.view.rotate(RotationDirection::Left);
            }
            Control::RotateRight => {
                self.stage.view.rotate(RotationDirection::Right);
            }
            Control::ZoomIn => self.stage.view.zoom_by(1),
            Control::ZoomOut => self.stage.view.zoom_by(-1),
            _ if !self.accepts_cursor_input() => return Propagation::Continue,
            Control::MoveUp => self.move_selection(0, 1),
            Control::MoveDown => self.move_selection(0, -1),
            Control::MoveLeft => self.move_selection(-1, 0),
            Control::MoveRight => self.move_selection(1, 0),
            Control::Select => self.confirm_selection(),
            Control::Cancel => {
                if self.stage.confirmed_tile.take().is_some() {
                    info!("tile_selection_cleared");
                }
            }
        }
        Propagation::Stop
    }

    fn debug_title(&self) -> Option<String> {
        let (x, y) = self.stage.view.selector().tile();
        Some(format!(
            "{:?} | tile ({x}, {y}) | zoom {:.2}",
            self.stage.phase,
            self.stage.view.camera().zoom()
        ))
    }

    fn stats(&self) -> StateStats {
        StateStats {
            visible_tiles: self.stage.view.visible_tiles().len(),
            pending_events: self.events.len() + usize::from(!self.events.is_idle()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RecordingCanvas;
    use crate::battle::test_support::MemorySource;
    use crate::content::AssetDirectory;
    use std::path::Path;

    const ARENA_MAP: &str = "tileset id=grassland\n\
        tiles x=0 y=0 dx=2 dy=2 height=1 type=grass\n\
        tiles x=2 y=0 dx=2 dy=2 height=3 type=grass\n\
        tiles x=0 y=2 dx=2 dy=2 height=2 type=stone\n\
        object x=0 y=0 id=oak\n";

    fn viewport() -> Viewport {
        Viewport {
            width: 800,
            height: 600,
        }
    }

    fn source() -> Rc<MemorySource> {
        Rc::new(
            MemorySource::standard()
                .with_map("arena", ARENA_MAP)
                .with_map("small", "tileset id=grassland\ntiles x=0 y=0 dx=1 dy=1 height=0 type=grass\n"),
        )
    }

    fn press(control: Control) -> ControlEvent {
        ControlEvent {
            control,
            pressed: true,
        }
    }

    fn release(control: Control) -> ControlEvent {
        ControlEvent {
            control,
            pressed: false,
        }
    }

    fn run_until_player_phase(controller: &mut BattleController) {
        for _ in 0..200 {
            if controller.stage().phase == TurnPhase::Player && !controller.is_busy() {
                return;
            }
            controller.update(1);
        }
        panic!("opening sequence did not finish");
    }

    fn walls_at(controller: &BattleController, x: i32, y: i32) -> (u32, u32) {
        controller
            .stage()
            .view
            .visible_tiles()
            .iter()
            .find(|tile| (tile.x, tile.y) == (x, y))
            .map(|tile| tile.walls)
            .expect("visible tile")
    }

    #[test]
    fn loaded_arena_matches_records() {
        let mut controller =
            BattleController::load("arena", source(), viewport()).expect("load arena");
        let grid = &controller.stage().grid;
        assert_eq!((grid.width(), grid.height()), (4, 4));
        assert_eq!(grid.get_tile(0, 0).expect("tile").height, 1);
        assert_eq!(grid.get_tile(3, 1).expect("tile").height, 3);
        assert_eq!(grid.get_tile(1, 3).expect("tile").height, 2);
        assert!(grid.get_tile(3, 3).expect("tile").kind.is_none());
        assert!(grid.get_tile(4, 0).is_none());

        let occupant = grid
            .get_tile(0, 0)
            .and_then(|tile| tile.occupant.clone())
            .expect("occupant");
        let registered = controller.registry.get_object("oak").expect("oak");
        assert!(Rc::ptr_eq(&occupant, &registered));

        // Resting view walks toward -x and -y, so walls face those neighbours.
        let view = &controller.stage().view;
        assert_eq!(view.direction().dx, -1);
        assert_eq!(view.direction().dy, -1);
        assert_eq!(view.visible_tiles().len(), 12);
        assert_eq!(walls_at(&controller, 2, 0), (2, 0));
        assert_eq!(walls_at(&controller, 2, 1), (2, 0));
        assert_eq!(walls_at(&controller, 0, 2), (0, 1));
        assert_eq!(walls_at(&controller, 1, 2), (0, 1));
        assert_eq!(walls_at(&controller, 0, 0), (0, 0));
        assert_eq!(walls_at(&controller, 3, 1), (0, 0));
    }

    #[test]
    fn missing_map_is_a_load_error() {
        let result = BattleController::load("nowhere", source(), viewport());
        assert!(matches!(
            result,
            Err(BattleLoadError::Map { ref map_id, .. }) if map_id == "nowhere"
        ));
    }

    #[test]
    fn opening_sequence_centres_and_hands_over_to_the_player() {
        let mut controller =
            BattleController::load("arena", source(), viewport()).expect("load arena");
        assert_eq!(controller.stage().phase, TurnPhase::Opening);
        assert_eq!(controller.stage().view.selector().tile(), (2, 2));
        assert_eq!(controller.stats().pending_events, 3);

        assert_eq!(
            controller.handle_control(press(Control::MoveRight)),
            Propagation::Continue
        );
        assert_eq!(controller.stage().view.selector().tile(), (2, 2));

        run_until_player_phase(&mut controller);
        assert_eq!(controller.stats().pending_events, 0);
    }

    #[test]
    fn player_moves_select_and_cancel() {
        let mut controller =
            BattleController::load("arena", source(), viewport()).expect("load arena");
        run_until_player_phase(&mut controller);

        assert_eq!(
            controller.handle_control(press(Control::MoveDown)),
            Propagation::Stop
        );
        assert_eq!(
            controller.handle_control(press(Control::MoveLeft)),
            Propagation::Stop
        );
        assert_eq!(controller.stage().view.selector().tile(), (1, 1));

        for _ in 0..5 {
            controller.handle_control(press(Control::MoveLeft));
        }
        assert_eq!(controller.stage().view.selector().tile(), (0, 1));

        controller.handle_control(press(Control::Select));
        assert_eq!(controller.stage().confirmed_tile, Some((0, 1)));
        controller.handle_control(press(Control::Cancel));
        assert_eq!(controller.stage().confirmed_tile, None);

        assert_eq!(
            controller.handle_control(release(Control::Select)),
            Propagation::Continue
        );
    }

    #[test]
    fn view_controls_are_accepted_while_events_run() {
        let mut controller =
            BattleController::load("arena", source(), viewport()).expect("load arena");
        let zoom = controller.stage().view.camera().zoom();

        assert_eq!(
            controller.handle_control(press(Control::ZoomIn)),
            Propagation::Stop
        );
        assert!(controller.stage().view.camera().zoom() > zoom);
        assert_eq!(
            controller.handle_control(press(Control::RotateLeft)),
            Propagation::Stop
        );
        assert!(controller.stage().view.camera().is_rotating());
        assert_eq!(
            controller.handle_control(release(Control::RotateLeft)),
            Propagation::Continue
        );
    }

    #[test]
    fn queued_rotation_blocks_cursor_until_it_completes() {
        let mut controller =
            BattleController::load("arena", source(), viewport()).expect("load arena");
        run_until_player_phase(&mut controller);
        let start_direction = controller.stage().view.direction();

        controller.queue_event(
            Box::new(RotateView {
                direction: RotationDirection::Right,
            }),
            0,
        );
        controller.update(1);
        assert!(controller.is_busy());
        assert_eq!(
            controller.handle_control(press(Control::MoveUp)),
            Propagation::Continue
        );

        run_until_player_phase(&mut controller);
        assert!(controller.stage().view.is_settled());
        assert_ne!(controller.stage().view.direction(), start_direction);
    }

    #[test]
    fn reloading_reuses_cached_tile_sets() {
        let source = source();
        let mut controller =
            BattleController::load("arena", source.clone(), viewport()).expect("load arena");
        controller.load_map("small").expect("load small");
        assert_eq!(source.tile_set_loads.get(), 1);
        assert_eq!(controller.stage().grid.width(), 1);
        assert_eq!(controller.stage().phase, TurnPhase::Opening);

        assert!(controller.load_map("nowhere").is_err());
        assert_eq!(controller.stage().grid.width(), 1);
    }

    #[test]
    fn display_and_title_reflect_the_stage() {
        let mut controller =
            BattleController::load("arena", source(), viewport()).expect("load arena");
        controller.bounds_changed(1024, 768);
        assert_eq!(
            controller.stage().view.camera().viewport(),
            Viewport {
                width: 1024,
                height: 768
            }
        );

        let mut canvas = RecordingCanvas::new();
        controller.display(&mut canvas);
        assert!(!canvas.draws().is_empty());
        assert_eq!(canvas.depth(), 0);

        let title = controller.debug_title().expect("title");
        assert!(title.contains("Opening"));
        assert!(title.contains("tile (2, 2)"));
    }

    #[test]
    fn shipped_debug_map_loads() {
        let base = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/base");
        let controller =
            BattleController::load("debug", Rc::new(AssetDirectory::new(base)), viewport())
                .expect("debug map");
        let grid = &controller.stage().grid;
        assert_eq!((grid.width(), grid.height()), (10, 10));
        assert_eq!(grid.get_tile(7, 1).expect("tile").height, 3);
        assert!(grid.get_tile(1, 1).expect("tile").occupant.is_some());
        let boulder = grid.get_tile(5, 5).expect("tile");
        assert!(boulder.occupant.is_some());
        assert_eq!(boulder.terrain_height(), 24.0);
        assert_eq!(controller.stage().view.visible_tiles().len(), 100);
    }
}
