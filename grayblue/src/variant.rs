use ember2d::TextFileKind;

pub const GRAY_SCENE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/scene.json");
pub const BLUE_SCENE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/blue_level.xml");
pub const GRAY_BG_CLIP: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/sounds/bg_gray.wav");
pub const BLUE_BG_CLIP: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/sounds/bg_blue.wav");
/// Cue clip shared by both levels; the gray level leaves it cached on unload
/// so the blue level's load finds it already resident.
pub const STEP_CUE_CLIP: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/sounds/step_cue.wav");

/// Everything that distinguishes one level from the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelConfig {
    pub scene_file: &'static str,
    pub scene_format: TextFileKind,
    pub background_clip: &'static str,
    pub cue_clip: &'static str,
    /// When set, continuous motion stays frozen until the first direction
    /// toggle. The gray level animates from the first frame instead.
    pub requires_explicit_start: bool,
    /// Clip path deliberately left cached on unload for the next level.
    pub retained_clip_on_unload: Option<&'static str>,
}

/// The two levels form a closed two-node cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelVariant {
    Gray,
    Blue,
}

impl LevelVariant {
    pub fn next(self) -> Self {
        match self {
            Self::Gray => Self::Blue,
            Self::Blue => Self::Gray,
        }
    }

    pub fn config(self) -> LevelConfig {
        match self {
            Self::Gray => LevelConfig {
                scene_file: GRAY_SCENE,
                scene_format: TextFileKind::Json,
                background_clip: GRAY_BG_CLIP,
                cue_clip: STEP_CUE_CLIP,
                requires_explicit_start: false,
                retained_clip_on_unload: Some(STEP_CUE_CLIP),
            },
            Self::Blue => LevelConfig {
                scene_file: BLUE_SCENE,
                scene_format: TextFileKind::Xml,
                background_clip: BLUE_BG_CLIP,
                cue_clip: STEP_CUE_CLIP,
                requires_explicit_start: true,
                retained_clip_on_unload: None,
            },
        }
    }
}
