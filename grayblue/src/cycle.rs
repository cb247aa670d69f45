use anyhow::Result;
use log::info;

use ember2d::{EngineContext, Frame, Game, Scene, Viewport};

use crate::level::Level;
use crate::variant::LevelVariant;

/// Inset viewport used before any level has exited.
pub const DEFAULT_INSET_VIEWPORT: Viewport = Viewport {
    x: 10.0,
    y: 320.0,
    width: 150.0,
    height: 150.0,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Load requests issued, polling until the resources are cached.
    Loading,
    /// Initialized and running the per-frame update/draw loop.
    Active,
}

/// Drives the two levels through their lifecycle, swapping to the other
/// variant whenever the active level raises an exit. The inset viewport a
/// level exits with is handed to its successor, so its position survives
/// every transition.
pub struct LevelCycle {
    variant: LevelVariant,
    inset_viewport: Viewport,
    level: Level,
    phase: Phase,
}

impl LevelCycle {
    pub fn new(start: LevelVariant) -> Self {
        Self {
            variant: start,
            inset_viewport: DEFAULT_INSET_VIEWPORT,
            level: Level::new(start.config(), DEFAULT_INSET_VIEWPORT),
            phase: Phase::Loading,
        }
    }

    fn switch_level(&mut self, ctx: &mut EngineContext, inset_viewport: Viewport) -> Result<()> {
        self.level.unload_scene(ctx)?;
        self.variant = self.variant.next();
        self.inset_viewport = inset_viewport;
        info!("switching to {:?}", self.variant);
        self.level = Level::new(self.variant.config(), self.inset_viewport);
        self.level.load_scene(ctx)?;
        self.phase = Phase::Loading;
        Ok(())
    }
}

impl Game for LevelCycle {
    fn init(&mut self, ctx: &mut EngineContext) -> Result<()> {
        self.level.load_scene(ctx)
    }

    fn update(&mut self, ctx: &mut EngineContext) -> Result<()> {
        match self.phase {
            Phase::Loading => {
                if self.level.is_loaded(ctx) {
                    self.level.initialize(ctx)?;
                    self.phase = Phase::Active;
                }
                Ok(())
            }
            Phase::Active => {
                self.level.update(ctx)?;
                if let Some(inset_viewport) = self.level.take_exit() {
                    self.switch_level(ctx, inset_viewport)?;
                }
                Ok(())
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        match self.phase {
            Phase::Active => self.level.draw(frame),
            Phase::Loading => {
                frame.clear_canvas([0.9, 0.9, 0.9, 1.0]);
                Ok(())
            }
        }
    }
}
