use std::rc::Rc;

use glam::{Mat4, Vec3};

/// Side length, in pixels and in world units, of one sprite sheet cell.
pub const GRID_TILE_SIZE: f32 = 128.0;

/// A cell in a sprite sheet partitioned into `GRID_TILE_SIZE` squares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteRef {
    pub sheet: Rc<str>,
    pub index: u32,
}

impl SpriteRef {
    pub fn new(sheet: impl Into<Rc<str>>, index: u32) -> Self {
        Self {
            sheet: sheet.into(),
            index,
        }
    }
}

/// Channel mixer applied to sprite texels: `out = r * red + g * green + b * blue`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub red: Vec3,
    pub green: Vec3,
    pub blue: Vec3,
}

impl Palette {
    pub const IDENTITY: Palette = Palette {
        red: Vec3::X,
        green: Vec3::Y,
        blue: Vec3::Z,
    };

    pub fn tinted(tint: Vec3) -> Self {
        Self {
            red: Vec3::new(tint.x, 0.0, 0.0),
            green: Vec3::new(0.0, tint.y, 0.0),
            blue: Vec3::new(0.0, 0.0, tint.z),
        }
    }

    pub fn apply(&self, rgb: Vec3) -> Vec3 {
        self.red * rgb.x + self.green * rgb.y + self.blue * rgb.z
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Opaque draw primitive. Transforms post-multiply the current matrix, so
/// each call operates in the local space established by the previous ones.
/// A sprite covers local `[0, GRID_TILE_SIZE]²` in the xy plane with texel
/// `(u, v)` at `(u, v, 0)`.
pub trait SpriteCanvas {
    fn push(&mut self);
    fn pop(&mut self);
    fn multiply(&mut self, transform: &Mat4);
    fn draw_sprite(&mut self, sprite: &SpriteRef, palette: &Palette);

    fn translate(&mut self, offset: Vec3) {
        self.multiply(&Mat4::from_translation(offset));
    }

    fn rotate_x(&mut self, radians: f32) {
        self.multiply(&Mat4::from_rotation_x(radians));
    }

    fn rotate_z(&mut self, radians: f32) {
        self.multiply(&Mat4::from_rotation_z(radians));
    }

    fn scale(&mut self, factors: Vec3) {
        self.multiply(&Mat4::from_scale(factors));
    }
}

#[derive(Debug, Clone)]
pub struct MatrixStack {
    current: Mat4,
    saved: Vec<Mat4>,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self {
            current: Mat4::IDENTITY,
            saved: Vec::new(),
        }
    }
}

impl MatrixStack {
    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Returns false on an unbalanced pop, leaving the current matrix as is.
    pub fn pop(&mut self) -> bool {
        match self.saved.pop() {
            Some(saved) => {
                self.current = saved;
                true
            }
            None => false,
        }
    }

    pub fn multiply(&mut self, transform: &Mat4) {
        self.current *= *transform;
    }

    pub fn current(&self) -> Mat4 {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub sprite: SpriteRef,
    pub palette: Palette,
    pub transform: Mat4,
}

impl DrawCall {
    /// World-space position of the sprite's local origin.
    pub fn origin(&self) -> Vec3 {
        self.transform.transform_point3(Vec3::ZERO)
    }

    pub fn local_point(&self, local: Vec3) -> Vec3 {
        self.transform.transform_point3(local)
    }
}

/// Canvas that records every draw with the transform active at the time.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    stack: MatrixStack,
    draws: Vec<DrawCall>,
    unbalanced_pops: usize,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn unbalanced_pops(&self) -> usize {
        self.unbalanced_pops
    }

    pub fn clear(&mut self) {
        self.stack = MatrixStack::default();
        self.draws.clear();
        self.unbalanced_pops = 0;
    }
}

impl SpriteCanvas for RecordingCanvas {
    fn push(&mut self) {
        self.stack.push();
    }

    fn pop(&mut self) {
        if !self.stack.pop() {
            self.unbalanced_pops += 1;
        }
    }

    fn multiply(&mut self, transform: &Mat4) {
        self.stack.multiply(transform);
    }

    fn draw_sprite(&mut self, sprite: &SpriteRef, palette: &Palette) {
        self.draws.push(DrawCall {
            sprite: sprite.clone(),
            palette: *palette,
            transform: self.stack.current(),
        });
    }
}
