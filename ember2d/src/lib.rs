//! Ember2D - a small 2D scene framework.
//!
//! Supplies the platform services a scene rides on: window and main loop,
//! keyboard polling, audio clip management, text-file resources, camera and
//! transform math, and a command-recording renderer with a wgpu backend.

pub mod assets;
pub mod audio;
pub mod camera;
pub mod engine;
pub mod input;
pub mod math;
pub mod render;
pub mod scene;

pub use crate::assets::{AssetError, TextFileKind, TextFileStore};
pub use crate::audio::AudioClips;
pub use crate::camera::{Camera, Viewport};
pub use crate::engine::{Engine, EngineConfig, EngineContext, Game};
pub use crate::input::InputState;
pub use crate::math::{Transform2D, Vec2};
pub use crate::render::{DrawCommand, Frame, Renderer, Square};
pub use crate::scene::Scene;
pub use winit::keyboard::KeyCode;
