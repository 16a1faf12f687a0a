use glam::{Mat4, Vec2, Vec3, Vec4};

/// Camera pitch in radians, applied as a rotation about x by `-TILT`.
pub const TILT: f32 = 0.8727;
/// Depth compression so world heights stay within clip range.
pub const DEPTH_SCALE: f32 = 0.00198;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn size(self) -> Vec2 {
        Vec2::new(self.width.max(1) as f32, self.height.max(1) as f32)
    }
}

/// Orthographic projection mapping one world unit to `zoom` pixels.
pub fn projection(viewport: Viewport, zoom: f32) -> Mat4 {
    let size = viewport.size();
    Mat4::from_diagonal(Vec4::new(
        2.0 * zoom / size.x,
        2.0 * zoom / size.y,
        DEPTH_SCALE,
        1.0,
    ))
}

pub fn view_transform(viewport: Viewport, zoom: f32, angle: f32, position: Vec3) -> Mat4 {
    projection(viewport, zoom)
        * Mat4::from_rotation_x(-TILT)
        * Mat4::from_rotation_z(angle)
        * Mat4::from_translation(-position)
}

pub fn ndc_to_screen_px(ndc: Vec2, viewport: Viewport) -> Vec2 {
    let size = viewport.size();
    Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y)
}

pub fn world_to_screen_px(world: Vec3, transform: &Mat4, viewport: Viewport) -> Vec2 {
    let clip = transform.project_point3(world);
    ndc_to_screen_px(clip.truncate(), viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    fn approx_eq_mat4(a: &Mat4, b: &Mat4) -> bool {
        a.abs_diff_eq(*b, 1e-5)
    }

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let position = Vec3::new(300.0, 200.0, 64.0);
        let transform = view_transform(VIEWPORT, 0.75, 1.2, position);
        let px = world_to_screen_px(position, &transform, VIEWPORT);
        assert!((px - Vec2::new(400.0, 300.0)).length() < 1e-3);
    }

    #[test]
    fn full_turn_yields_the_same_transform() {
        let position = Vec3::new(10.0, -4.0, 2.0);
        let a = view_transform(VIEWPORT, 0.75, 0.3, position);
        let b = view_transform(VIEWPORT, 0.75, 0.3 + std::f32::consts::TAU, position);
        assert!(approx_eq_mat4(&a, &b));
    }

    #[test]
    fn zero_angle_and_position_is_the_base_oblique_projection() {
        let transform = view_transform(VIEWPORT, 0.75, 0.0, Vec3::ZERO);
        let expected = projection(VIEWPORT, 0.75) * Mat4::from_rotation_x(-TILT);
        assert!(approx_eq_mat4(&transform, &expected));
    }

    #[test]
    fn zoom_scales_screen_axes_only() {
        let a = view_transform(VIEWPORT, 1.0, 0.4, Vec3::ZERO);
        let b = view_transform(VIEWPORT, 2.0, 0.4, Vec3::ZERO);
        let point = Vec3::new(50.0, 20.0, 10.0);
        let pa = a.project_point3(point);
        let pb = b.project_point3(point);
        assert!((pb.x - 2.0 * pa.x).abs() < 1e-5);
        assert!((pb.y - 2.0 * pa.y).abs() < 1e-5);
        assert!((pb.z - pa.z).abs() < 1e-6);
    }

    #[test]
    fn raised_points_appear_higher_on_screen() {
        let transform = view_transform(VIEWPORT, 1.0, 0.0, Vec3::ZERO);
        let ground = world_to_screen_px(Vec3::ZERO, &transform, VIEWPORT);
        let raised = world_to_screen_px(Vec3::new(0.0, 0.0, 64.0), &transform, VIEWPORT);
        assert!(raised.y < ground.y);
    }
}
