use glam::Mat4;

use crate::math::Vec2;
use crate::render::Frame;

/// Screen-space rectangle a camera renders into, in pixels.
///
/// The origin is the lower-left corner of the canvas, matching world-space
/// y-up; the GPU backend flips it when recording the hardware viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<[f32; 4]> for Viewport {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// A 2D camera mapping world coordinates to a screen viewport.
///
/// Pan and zoom state live in `wc_center` and `wc_width`; the world-space
/// height is derived from the viewport's aspect ratio. No bounds are
/// enforced on any field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    wc_center: Vec2,
    wc_width: f32,
    viewport: Viewport,
    background_color: [f32; 4],
}

impl Camera {
    pub fn new(wc_center: Vec2, wc_width: f32, viewport: Viewport) -> Self {
        Self {
            wc_center,
            wc_width,
            viewport,
            background_color: [0.8, 0.8, 0.8, 1.0],
        }
    }

    pub fn set_background_color(&mut self, color: [f32; 4]) {
        self.background_color = color;
    }

    pub fn background_color(&self) -> [f32; 4] {
        self.background_color
    }

    pub fn wc_center(&self) -> Vec2 {
        self.wc_center
    }

    pub fn set_wc_center(&mut self, x: f32, y: f32) {
        self.wc_center = Vec2::new(x, y);
    }

    pub fn wc_width(&self) -> f32 {
        self.wc_width
    }

    pub fn set_wc_width(&mut self, width: f32) {
        self.wc_width = width;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Activate this camera for drawing: switch to its viewport and clear it
    /// to the camera's background color.
    pub fn setup_view_projection(&self, frame: &mut Frame) {
        frame.set_viewport(self.viewport);
        frame.clear_viewport(self.background_color);
    }

    /// Orthographic view-projection for this camera's pan/zoom state.
    pub fn vp_matrix(&self) -> Mat4 {
        let half_w = self.wc_width * 0.5;
        let half_h = half_w * self.viewport.height / self.viewport.width;
        Mat4::orthographic_rh_gl(
            self.wc_center.x - half_w,
            self.wc_center.x + half_w,
            self.wc_center.y - half_h,
            self.wc_center.y + half_h,
            -1.0,
            1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn camera() -> Camera {
        Camera::new(Vec2::new(20.0, 60.0), 20.0, Viewport::new(20.0, 40.0, 600.0, 300.0))
    }

    #[test]
    fn center_maps_to_ndc_origin() {
        let cam = camera();
        let p = cam.vp_matrix().project_point3(Vec3::new(20.0, 60.0, 0.0));
        assert!(p.x.abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn right_edge_maps_to_plus_one() {
        let cam = camera();
        let p = cam.vp_matrix().project_point3(Vec3::new(30.0, 60.0, 0.0));
        assert!((p.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_widens_the_visible_span() {
        let mut cam = camera();
        cam.set_wc_width(40.0);
        let p = cam.vp_matrix().project_point3(Vec3::new(30.0, 60.0, 0.0));
        assert!((p.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn pan_and_viewport_setters_round_trip() {
        let mut cam = camera();
        cam.set_wc_center(19.5, 60.5);
        assert_eq!(cam.wc_center(), Vec2::new(19.5, 60.5));
        let vp = Viewport::new(18.0, 41.0, 600.0, 300.0);
        cam.set_viewport(vp);
        assert_eq!(cam.viewport(), vp);
    }
}
