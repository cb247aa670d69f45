use anyhow::Result;

use crate::engine::EngineContext;
use crate::render::Frame;

/// Lifecycle contract for a screen's worth of game state.
///
/// A driver activates a scene by calling `load_scene` once, polling
/// `is_loaded` until the requested resources are cached, then calling
/// `initialize` once. After that it alternates `update` and `draw` every
/// frame until the scene asks to leave, and finishes with `unload_scene`.
/// Implementations own their state outright; there is no shared base state.
pub trait Scene {
    /// Issue load requests for every resource this scene needs. Side effect
    /// only; must be safe to call once per activation.
    fn load_scene(&mut self, ctx: &mut EngineContext) -> Result<()>;

    /// True once everything requested by `load_scene` is cached.
    fn is_loaded(&self, ctx: &EngineContext) -> bool;

    /// Build cameras and renderables from loaded resources and start any
    /// ambient playback. Only called after `is_loaded` reports true.
    fn initialize(&mut self, ctx: &mut EngineContext) -> Result<()>;

    /// Advance state one frame. Never draws.
    fn update(&mut self, ctx: &mut EngineContext) -> Result<()>;

    /// Record the frame. Must not mutate any scene state; the receiver is
    /// shared to make that hard to get wrong.
    fn draw(&self, frame: &mut Frame) -> Result<()>;

    /// Release every resource requested by `load_scene` that is not
    /// explicitly retained for a successor scene.
    fn unload_scene(&mut self, ctx: &mut EngineContext) -> Result<()>;
}
