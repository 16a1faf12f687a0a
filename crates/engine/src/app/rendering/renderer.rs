use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use glam::{Mat4, Vec2, Vec3};
use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::State;
use crate::asset_keys::asset_path;

use super::canvas::{MatrixStack, Palette, SpriteCanvas, SpriteRef, GRID_TILE_SIZE};
use super::transform::{ndc_to_screen_px, Viewport};

const CLEAR_COLOR: [u8; 4] = [18, 20, 27, 255];
const FALLBACK_BASE_COLOR: Vec3 = Vec3::new(0.42, 0.52, 0.36);
const MIN_PARALLELOGRAM_AREA_PX: f32 = 1e-3;
const CELL_SIZE_PX: u32 = GRID_TILE_SIZE as u32;

struct LoadedSheet {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl LoadedSheet {
    fn columns(&self) -> u32 {
        self.width / CELL_SIZE_PX
    }

    /// Top-left pixel of `index`, or none when the cell lies outside the sheet.
    fn cell_origin(&self, index: u32) -> Option<(u32, u32)> {
        let columns = self.columns();
        if columns == 0 {
            return None;
        }
        let x = (index % columns) * CELL_SIZE_PX;
        let y = (index / columns).checked_mul(CELL_SIZE_PX)?;
        (y.checked_add(CELL_SIZE_PX)? <= self.height).then_some((x, y))
    }

    fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        match self.rgba.get(offset..offset + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0, 0, 0, 0],
        }
    }
}

/// Decoded sprite sheets keyed by asset key. Failed loads are cached as
/// `None` and reported once.
pub(crate) struct SheetCache {
    sprites_dir: PathBuf,
    sheets: HashMap<String, Option<LoadedSheet>>,
    warned_keys: HashSet<String>,
}

impl SheetCache {
    pub(crate) fn new(sprites_dir: PathBuf) -> Self {
        Self {
            sprites_dir,
            sheets: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    fn resolve(&mut self, key: &str) -> Option<&LoadedSheet> {
        if !self.sheets.contains_key(key) {
            let sheet = match asset_path(&self.sprites_dir, key, "png") {
                Ok(path) => match load_sheet_rgba(&path) {
                    Ok(sheet) => Some(sheet),
                    Err(reason) => {
                        warn_sheet_load_once(&mut self.warned_keys, key, Some(&path), &reason);
                        None
                    }
                },
                Err(error) => {
                    let reason = format!("invalid_key:{error}");
                    warn_sheet_load_once(&mut self.warned_keys, key, None, &reason);
                    None
                }
            };
            self.sheets.insert(key.to_string(), sheet);
        }
        self.sheets.get(key).and_then(Option::as_ref)
    }

    fn warn_cell_once(&mut self, sprite: &SpriteRef) {
        let key = format!("{}#{}", sprite.sheet, sprite.index);
        if self.warned_keys.insert(key) {
            warn!(
                sheet = %sprite.sheet,
                index = sprite.index,
                "renderer_sprite_cell_out_of_range"
            );
        }
    }
}

fn load_sheet_rgba(path: &Path) -> Result<LoadedSheet, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSheet {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sheet_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sheet_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sheet_load_failed_using_fallback"
    );
}

pub struct Renderer {
    window: &'static Window,
    pixels: Pixels<'static>,
    viewport: Viewport,
    sheets: SheetCache,
    last_frame_sprite_count: usize,
}

impl Renderer {
    pub fn new(window: &'static Window, sprites_dir: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(window, size.width.max(1), size.height.max(1))?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width.max(1),
                height: size.height.max(1),
            },
            sheets: SheetCache::new(sprites_dir),
            last_frame_sprite_count: 0,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn last_frame_sprite_count(&self) -> usize {
        self.last_frame_sprite_count
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(self.window, width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: &'static Window,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_state(&mut self, state: &dyn State) -> Result<(), Error> {
        let viewport = self.viewport;
        let frame = self.pixels.frame_mut();
        for pixel in frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&CLEAR_COLOR);
        }
        let mut canvas = FrameCanvas::new(frame, viewport, &mut self.sheets);
        state.display(&mut canvas);
        self.last_frame_sprite_count = canvas.sprite_count;
        self.pixels.render()
    }
}

/// Rasterizing canvas. The accumulated matrix is expected to end in clip
/// space; callers multiply the view transform first.
pub(crate) struct FrameCanvas<'a> {
    frame: &'a mut [u8],
    viewport: Viewport,
    stack: MatrixStack,
    sheets: &'a mut SheetCache,
    sprite_count: usize,
}

impl<'a> FrameCanvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], viewport: Viewport, sheets: &'a mut SheetCache) -> Self {
        Self {
            frame,
            viewport,
            stack: MatrixStack::default(),
            sheets,
            sprite_count: 0,
        }
    }

    fn corners_px(&self, transform: &Mat4) -> SpriteCorners {
        let project = |local: Vec3| {
            ndc_to_screen_px(transform.project_point3(local).truncate(), self.viewport)
        };
        let origin = project(Vec3::ZERO);
        SpriteCorners {
            origin,
            edge_u: project(Vec3::new(GRID_TILE_SIZE, 0.0, 0.0)) - origin,
            edge_v: project(Vec3::new(0.0, GRID_TILE_SIZE, 0.0)) - origin,
        }
    }
}

impl SpriteCanvas for FrameCanvas<'_> {
    fn push(&mut self) {
        self.stack.push();
    }

    fn pop(&mut self) {
        if !self.stack.pop() {
            warn!("canvas_pop_without_push");
        }
    }

    fn multiply(&mut self, transform: &Mat4) {
        self.stack.multiply(transform);
    }

    fn draw_sprite(&mut self, sprite: &SpriteRef, palette: &Palette) {
        let corners = self.corners_px(&self.stack.current());
        let target = FrameTarget {
            width: self.viewport.width,
            height: self.viewport.height,
        };
        let cell = match self.sheets.resolve(&sprite.sheet) {
            Some(sheet) => match sheet.cell_origin(sprite.index) {
                Some(origin) => Some(Ok((sheet, origin))),
                None => Some(Err(())),
            },
            None => None,
        };
        let drawn = match cell {
            Some(Ok((sheet, origin))) => {
                blit_cell(self.frame, target, corners, sheet, origin, palette)
            }
            Some(Err(())) => {
                self.sheets.warn_cell_once(sprite);
                fill_fallback(self.frame, target, corners, sprite.index, palette)
            }
            None => fill_fallback(self.frame, target, corners, sprite.index, palette),
        };
        if drawn {
            self.sprite_count += 1;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FrameTarget {
    width: u32,
    height: u32,
}

/// Screen-space parallelogram covered by one sprite cell.
#[derive(Debug, Clone, Copy)]
struct SpriteCorners {
    origin: Vec2,
    edge_u: Vec2,
    edge_v: Vec2,
}

impl SpriteCorners {
    fn determinant(&self) -> f32 {
        self.edge_u.perp_dot(self.edge_v)
    }

    /// Coordinates of `point` in the (edge_u, edge_v) basis.
    fn local_coords(&self, point: Vec2, det: f32) -> Vec2 {
        let d = point - self.origin;
        Vec2::new(d.perp_dot(self.edge_v) / det, self.edge_u.perp_dot(d) / det)
    }

    fn clipped_bounds(&self, target: FrameTarget) -> Option<(i32, i32, i32, i32)> {
        let points = [
            self.origin,
            self.origin + self.edge_u,
            self.origin + self.edge_v,
            self.origin + self.edge_u + self.edge_v,
        ];
        let min = points.iter().fold(Vec2::splat(f32::INFINITY), |acc, p| acc.min(*p));
        let max = points
            .iter()
            .fold(Vec2::splat(f32::NEG_INFINITY), |acc, p| acc.max(*p));
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        let left = (min.x.floor() as i32).max(0);
        let top = (min.y.floor() as i32).max(0);
        let right = (max.x.ceil() as i32).min(target.width as i32);
        let bottom = (max.y.ceil() as i32).min(target.height as i32);
        (left < right && top < bottom).then_some((left, top, right, bottom))
    }
}

fn rasterize(
    frame: &mut [u8],
    target: FrameTarget,
    corners: SpriteCorners,
    mut shade: impl FnMut(Vec2) -> Option<[u8; 4]>,
) -> bool {
    let det = corners.determinant();
    if det.abs() < MIN_PARALLELOGRAM_AREA_PX {
        return false;
    }
    let Some((left, top, right, bottom)) = corners.clipped_bounds(target) else {
        return false;
    };
    for y in top..bottom {
        for x in left..right {
            let local = corners.local_coords(Vec2::new(x as f32 + 0.5, y as f32 + 0.5), det);
            if local.x < 0.0 || local.x >= 1.0 || local.y < 0.0 || local.y >= 1.0 {
                continue;
            }
            if let Some(color) = shade(local) {
                blend_pixel_clipped(frame, target.width as usize, x, y, color);
            }
        }
    }
    true
}

fn blit_cell(
    frame: &mut [u8],
    target: FrameTarget,
    corners: SpriteCorners,
    sheet: &LoadedSheet,
    cell_origin: (u32, u32),
    palette: &Palette,
) -> bool {
    let max_texel = CELL_SIZE_PX - 1;
    rasterize(frame, target, corners, |local| {
        let u = ((local.x * GRID_TILE_SIZE) as u32).min(max_texel);
        let v = ((local.y * GRID_TILE_SIZE) as u32).min(max_texel);
        let texel = sheet.texel(cell_origin.0 + u, cell_origin.1 + v);
        (texel[3] > 0).then(|| apply_palette(texel, palette))
    })
}

fn fill_fallback(
    frame: &mut [u8],
    target: FrameTarget,
    corners: SpriteCorners,
    index: u32,
    palette: &Palette,
) -> bool {
    let color = apply_palette(fallback_color(index), palette);
    rasterize(frame, target, corners, |_| Some(color))
}

fn fallback_color(index: u32) -> [u8; 4] {
    let shade = 1.0 - 0.12 * (index % 4) as f32;
    let rgb = FALLBACK_BASE_COLOR * shade;
    [
        (rgb.x * 255.0) as u8,
        (rgb.y * 255.0) as u8,
        (rgb.z * 255.0) as u8,
        255,
    ]
}

fn apply_palette(texel: [u8; 4], palette: &Palette) -> [u8; 4] {
    if *palette == Palette::IDENTITY {
        return texel;
    }
    let rgb = Vec3::new(texel[0] as f32, texel[1] as f32, texel[2] as f32) / 255.0;
    let mixed = palette.apply(rgb).clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    [
        mixed.x.round() as u8,
        mixed.y.round() as u8,
        mixed.z.round() as u8,
        texel[3],
    ]
}

fn blend_pixel_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let offset = (y as usize * width + x as usize) * 4;
    let Some(dst) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    let alpha = color[3] as u32;
    if alpha == 255 {
        dst.copy_from_slice(&color);
        return;
    }
    for channel in 0..3 {
        let blended = (color[channel] as u32 * alpha + dst[channel] as u32 * (255 - alpha)) / 255;
        dst[channel] = blended as u8;
    }
    dst[3] = 255;
}
