mod square;
mod wgpu_backend;

use glam::Mat4;

use crate::camera::Viewport;

pub use square::Square;
pub use wgpu_backend::Renderer;

/// One recorded draw operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    /// Clear the whole canvas.
    ClearCanvas([f32; 4]),
    /// Restrict subsequent commands to a screen-space rectangle.
    SetViewport(Viewport),
    /// Clear the current viewport rectangle only.
    ClearViewport([f32; 4]),
    /// A solid-colored unit quad under a model-view-projection matrix.
    Quad { mvp: Mat4, color: [f32; 4] },
}

/// A frame of recorded draw commands.
///
/// Recording is plain CPU work with no GPU handles, so scene `draw` code can
/// run (and be tested) without a window. `Renderer::render` executes a
/// recorded frame and presents it.
pub struct Frame {
    commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn clear_canvas(&mut self, color: [f32; 4]) {
        self.commands.push(DrawCommand::ClearCanvas(color));
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(DrawCommand::SetViewport(viewport));
    }

    pub fn clear_viewport(&mut self, color: [f32; 4]) {
        self.commands.push(DrawCommand::ClearViewport(color));
    }

    pub fn draw_quad(&mut self, mvp: Mat4, color: [f32; 4]) {
        self.commands.push(DrawCommand::Quad { mvp, color });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
