use glam::Mat4;

use crate::math::Transform2D;
use crate::render::Frame;

/// A solid-colored square renderable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Square {
    transform: Transform2D,
    color: [f32; 4],
}

impl Square {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            transform: Transform2D::identity(),
            color,
        }
    }

    pub fn xform(&self) -> &Transform2D {
        &self.transform
    }

    pub fn xform_mut(&mut self) -> &mut Transform2D {
        &mut self.transform
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Record this square into the frame under the given view-projection.
    pub fn draw(&self, frame: &mut Frame, vp_matrix: Mat4) {
        frame.draw_quad(vp_matrix * self.transform.to_matrix(), self.color);
    }
}
