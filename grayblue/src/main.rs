mod cycle;
mod level;
mod scene_file;
mod variant;

use anyhow::Result;

use ember2d::Engine;

use crate::cycle::LevelCycle;
use crate::variant::LevelVariant;

fn main() -> Result<()> {
    env_logger::init();

    Engine::new()
        .with_title("Gray & Blue")
        .with_size(640, 480)
        .run(LevelCycle::new(LevelVariant::Gray))
}
