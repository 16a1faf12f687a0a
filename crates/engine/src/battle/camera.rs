use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use glam::{Mat4, Vec3};

use crate::app::{view_transform, Viewport};

pub const QUARTER_TURN: f32 = FRAC_PI_2;
/// Resting orientation: the grid's x axis runs down-right on screen.
pub const INITIAL_ANGLE: f32 = FRAC_PI_4;
/// Radians per tick; a quarter turn takes 18 ticks.
pub const ROTATION_SPEED: f32 = FRAC_PI_2 / 18.0;
/// Fraction of the remaining distance covered per tick.
pub const CAMERA_FOLLOW_RATE: f32 = 0.15;
pub const CAMERA_SNAP_DISTANCE_SQ: f32 = 0.25;
const ANGLE_SNAP_EPSILON: f32 = 1e-4;

pub const ZOOM_DEFAULT: f32 = 0.75;
pub const ZOOM_MIN: f32 = 0.25;
pub const ZOOM_MAX: f32 = 2.0;
pub const ZOOM_STEP: f32 = 0.125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    /// Increases the view angle.
    Left,
    /// Decreases the view angle.
    Right,
}

impl RotationDirection {
    fn sign(self) -> f32 {
        match self {
            RotationDirection::Left => 1.0,
            RotationDirection::Right => -1.0,
        }
    }
}

/// Maps any angle into `(-π, π]`.
pub fn normalize_angle(angle: f32) -> f32 {
    let normalized = angle - TAU * ((angle - PI) / TAU).ceil();
    if normalized <= -PI {
        normalized + TAU
    } else {
        normalized
    }
}

fn normalize_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return ZOOM_DEFAULT;
    }
    zoom.clamp(ZOOM_MIN, ZOOM_MAX)
}

/// Rotating, zooming camera that eases toward discrete targets. The cached
/// transform is recomputed only after an input to it changed.
#[derive(Debug, Clone)]
pub struct ViewCamera {
    angle: f32,
    target_angle: f32,
    position: Vec3,
    target_position: Vec3,
    zoom: f32,
    viewport: Viewport,
    transform: Mat4,
    dirty: bool,
    revision: u64,
}

impl ViewCamera {
    pub fn new(viewport: Viewport) -> Self {
        let mut camera = Self {
            angle: INITIAL_ANGLE,
            target_angle: INITIAL_ANGLE,
            position: Vec3::ZERO,
            target_position: Vec3::ZERO,
            zoom: ZOOM_DEFAULT,
            viewport,
            transform: Mat4::IDENTITY,
            dirty: true,
            revision: 0,
        };
        camera.refresh_transform();
        camera
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn target_angle(&self) -> f32 {
        self.target_angle
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target_position(&self) -> Vec3 {
        self.target_position
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Number of times the transform has been recomputed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_rotating(&self) -> bool {
        self.angle != self.target_angle
    }

    pub fn is_moving(&self) -> bool {
        self.position != self.target_position
    }

    /// Index of the nearest resting orientation, in `0..4`.
    pub fn quarter_index(&self) -> i32 {
        (((self.angle - INITIAL_ANGLE) / QUARTER_TURN).round() as i32).rem_euclid(4)
    }

    /// Queues a quarter turn in `direction`. At most one turn may wait behind
    /// the one in progress; further requests are dropped until the angle
    /// reaches the earlier target.
    pub fn rotate(&mut self, direction: RotationDirection) -> bool {
        let sign = direction.sign();
        let remaining = (self.target_angle - self.angle) * sign;
        if remaining > QUARTER_TURN + ANGLE_SNAP_EPSILON {
            return false;
        }
        self.target_angle += sign * QUARTER_TURN;
        true
    }

    pub fn set_target_position(&mut self, target: Vec3) {
        self.target_position = target;
    }

    /// Jumps straight to the targets.
    pub fn snap_to_target(&mut self) {
        self.angle = self.target_angle;
        self.position = self.target_position;
        self.renormalize_angle();
        self.dirty = true;
        self.refresh_transform();
    }

    pub fn zoom_by(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        self.set_zoom(self.zoom + steps as f32 * ZOOM_STEP);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let zoom = normalize_zoom(zoom);
        if zoom != self.zoom {
            self.zoom = zoom;
            self.dirty = true;
            self.refresh_transform();
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.dirty = true;
            self.refresh_transform();
        }
    }

    /// Advances the angle and position toward their targets.
    pub fn update(&mut self, frames: u32) {
        if frames == 0 {
            return;
        }
        let frames_f = frames as f32;

        if self.is_rotating() {
            let delta = self.target_angle - self.angle;
            let step = ROTATION_SPEED * frames_f;
            if delta.abs() <= step + ANGLE_SNAP_EPSILON {
                self.angle = self.target_angle;
            } else {
                self.angle += step.copysign(delta);
            }
            self.renormalize_angle();
            self.dirty = true;
        }

        if self.is_moving() {
            let delta = self.target_position - self.position;
            let factor = (CAMERA_FOLLOW_RATE * frames_f).min(1.0);
            self.position += delta * factor;
            if self.position.distance_squared(self.target_position) < CAMERA_SNAP_DISTANCE_SQ {
                self.position = self.target_position;
            }
            self.dirty = true;
        }

        self.refresh_transform();
    }

    /// Keeps `angle` in `(-π, π]`, shifting the target by the same amount so
    /// the remaining rotation is preserved.
    fn renormalize_angle(&mut self) {
        let normalized = normalize_angle(self.angle);
        let shift = normalized - self.angle;
        if shift != 0.0 {
            self.angle = normalized;
            self.target_angle += shift;
            if (self.target_angle - self.angle).abs() < ANGLE_SNAP_EPSILON {
                self.target_angle = self.angle;
            }
        }
    }

    fn refresh_transform(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.transform = view_transform(self.viewport, self.zoom, self.angle, self.position);
        self.dirty = false;
        self.revision += 1;
        true
    }
}
