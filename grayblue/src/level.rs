use anyhow::Result;
use log::info;

use ember2d::{Camera, EngineContext, Frame, KeyCode, Scene, Square, Vec2, Viewport};

use crate::scene_file::SceneFile;
use crate::variant::LevelConfig;

/// Per-frame x translation of the sliding square.
const TRANSLATE_STEP: f32 = 0.11;
/// Per-frame rotation of the spinning square, in degrees.
const ROTATE_STEP_DEG: f32 = 1.1;
/// Held-key step for the inset viewport, in pixels.
const VIEWPORT_STEP: f32 = 1.0;
/// Release-edge step when nudging the inset viewport left. Bigger than the
/// held step so a single release is visible; the asymmetry is intentional.
const VIEWPORT_LEFT_STEP: f32 = 2.0;
/// Held-key step for world-camera pan and zoom.
const CAMERA_STEP: f32 = 0.5;

/// Wrap bounds for the sliding square. Crossing one bound teleports the
/// square back to the opposite bound at the fixed lane height.
const X_LOW_BOUND: f32 = 9.0;
const X_HIGH_BOUND: f32 = 31.0;
const WRAP_Y: f32 = 60.0;

const CANVAS_CLEAR_COLOR: [f32; 4] = [0.9, 0.9, 0.9, 1.0];
const INSET_BG_COLOR: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
const INSET_WC_CENTER: Vec2 = Vec2 { x: 20.0, y: 60.0 };
const INSET_WC_WIDTH: f32 = 20.0;

/// One screen's worth of game state: two squares, a pannable world camera,
/// and a small inset camera showing the same scene from a fixed center.
///
/// Both levels share this type; everything that differs between them lives
/// in the [`LevelConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    config: LevelConfig,
    // Index 0 slides along x, index 1 spins. Populated by `initialize`.
    squares: Vec<Square>,
    camera: Camera,
    inset_camera: Camera,
    redirect: bool,
    running: bool,
    exit: Option<Viewport>,
}

impl Level {
    /// `inset_viewport` is the rectangle carried over from the previous
    /// level's exit, or the driver's default on the first level.
    pub fn new(config: LevelConfig, inset_viewport: Viewport) -> Self {
        let mut inset_camera = Camera::new(INSET_WC_CENTER, INSET_WC_WIDTH, inset_viewport);
        inset_camera.set_background_color(INSET_BG_COLOR);
        Self {
            config,
            squares: Vec::new(),
            // Placeholder until the scene file supplies the real camera.
            camera: Camera::new(INSET_WC_CENTER, INSET_WC_WIDTH, inset_viewport),
            inset_camera,
            redirect: false,
            running: !config.requires_explicit_start,
            exit: None,
        }
    }

    /// Take the exit request raised by the transition key, if any. The value
    /// is the inset viewport to hand to the next level.
    pub fn take_exit(&mut self) -> Option<Viewport> {
        self.exit.take()
    }

    fn step_motion(&mut self) {
        let (rotate_step, translate_step) = if self.redirect {
            (ROTATE_STEP_DEG, TRANSLATE_STEP)
        } else {
            (-ROTATE_STEP_DEG, -TRANSLATE_STEP)
        };

        self.squares[1].xform_mut().inc_rotation_by_degree(rotate_step);

        let slider = self.squares[0].xform_mut();
        slider.inc_x_pos_by(translate_step);
        if self.redirect {
            if slider.x_pos() > X_HIGH_BOUND {
                slider.set_position(X_LOW_BOUND, WRAP_Y);
            }
        } else if slider.x_pos() < X_LOW_BOUND {
            slider.set_position(X_HIGH_BOUND, WRAP_Y);
        }
    }
}

impl Scene for Level {
    fn load_scene(&mut self, ctx: &mut EngineContext) -> Result<()> {
        ctx.text_files_mut()
            .load(self.config.scene_file, self.config.scene_format)?;
        ctx.audio_mut().load_audio(self.config.background_clip)?;
        ctx.audio_mut().load_audio(self.config.cue_clip)?;
        Ok(())
    }

    fn is_loaded(&self, ctx: &EngineContext) -> bool {
        ctx.text_files().contains(self.config.scene_file)
            && ctx.audio().is_loaded(self.config.background_clip)
            && ctx.audio().is_loaded(self.config.cue_clip)
    }

    fn initialize(&mut self, ctx: &mut EngineContext) -> Result<()> {
        let scene = SceneFile::from_store(ctx.text_files(), self.config.scene_file)?;
        self.camera = scene.camera;
        self.squares = scene.squares;
        info!(
            "initialized level from {} with {} squares",
            self.config.scene_file,
            self.squares.len()
        );
        ctx.audio_mut()
            .play_background_audio(self.config.background_clip)?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext) -> Result<()> {
        if self.running {
            self.step_motion();
        }

        let input = ctx.input();
        let toggle_direction = input.is_key_clicked(KeyCode::KeyJ);
        let transition = input.is_key_clicked(KeyCode::KeyQ);
        let music_off = input.is_key_clicked(KeyCode::KeyR);
        let music_on = input.is_key_clicked(KeyCode::KeyT);
        let inset_left = input.is_key_released(KeyCode::KeyA);
        let inset_right = input.is_key_pressed(KeyCode::KeyD);
        let inset_up = input.is_key_pressed(KeyCode::KeyW);
        let inset_down = input.is_key_pressed(KeyCode::KeyS);
        let pan_left = input.is_key_pressed(KeyCode::KeyC);
        let pan_right = input.is_key_pressed(KeyCode::KeyB);
        let pan_up = input.is_key_pressed(KeyCode::KeyF);
        let pan_down = input.is_key_pressed(KeyCode::KeyV);
        let zoom_in = input.is_key_pressed(KeyCode::KeyZ);
        let zoom_out = input.is_key_pressed(KeyCode::KeyX);

        if toggle_direction {
            self.running = true;
            self.redirect = !self.redirect;
        }

        if transition {
            self.exit = Some(self.inset_camera.viewport());
        }

        if music_off {
            ctx.audio_mut().stop_background_audio();
        }
        if music_on {
            ctx.audio_mut()
                .play_background_audio(self.config.background_clip)?;
        }

        let mut inset_vp = self.inset_camera.viewport();
        if inset_left {
            inset_vp.x -= VIEWPORT_LEFT_STEP;
        }
        if inset_right {
            inset_vp.x += VIEWPORT_STEP;
        }
        if inset_up {
            inset_vp.y += VIEWPORT_STEP;
        }
        if inset_down {
            inset_vp.y -= VIEWPORT_STEP;
        }
        self.inset_camera.set_viewport(inset_vp);

        let mut center = self.camera.wc_center();
        if pan_left {
            center.x -= CAMERA_STEP;
        }
        if pan_right {
            center.x += CAMERA_STEP;
        }
        if pan_up {
            center.y += CAMERA_STEP;
        }
        if pan_down {
            center.y -= CAMERA_STEP;
        }
        self.camera.set_wc_center(center.x, center.y);

        let mut width = self.camera.wc_width();
        if zoom_in {
            width -= CAMERA_STEP;
        }
        if zoom_out {
            width += CAMERA_STEP;
        }
        self.camera.set_wc_width(width);

        Ok(())
    }

    fn draw(&self, frame: &mut Frame) -> Result<()> {
        frame.clear_canvas(CANVAS_CLEAR_COLOR);

        self.camera.setup_view_projection(frame);
        for square in &self.squares {
            square.draw(frame, self.camera.vp_matrix());
        }

        self.inset_camera.setup_view_projection(frame);
        for square in &self.squares {
            square.draw(frame, self.inset_camera.vp_matrix());
        }

        Ok(())
    }

    fn unload_scene(&mut self, ctx: &mut EngineContext) -> Result<()> {
        ctx.audio_mut().stop_background_audio();
        ctx.text_files_mut().unload(self.config.scene_file);

        for clip in [self.config.background_clip, self.config.cue_clip] {
            if self.config.retained_clip_on_unload == Some(clip) {
                info!("leaving clip {clip} cached for the next level");
                continue;
            }
            ctx.audio_mut().unload_audio(clip);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{LevelVariant, GRAY_BG_CLIP, STEP_CUE_CLIP};
    use ember2d::DrawCommand;

    const TEST_VIEWPORT: Viewport = Viewport {
        x: 10.0,
        y: 320.0,
        width: 150.0,
        height: 150.0,
    };

    fn ready_level(variant: LevelVariant) -> (Level, EngineContext) {
        let mut ctx = EngineContext::new();
        let mut level = Level::new(variant.config(), TEST_VIEWPORT);
        level.load_scene(&mut ctx).unwrap();
        assert!(level.is_loaded(&ctx));
        level.initialize(&mut ctx).unwrap();
        (level, ctx)
    }

    fn frame_with_click(level: &mut Level, ctx: &mut EngineContext, key: KeyCode) {
        ctx.begin_frame();
        ctx.input_mut().key_down(key);
        level.update(ctx).unwrap();
        ctx.input_mut().key_up(key);
    }

    fn idle_frame(level: &mut Level, ctx: &mut EngineContext) {
        ctx.begin_frame();
        level.update(ctx).unwrap();
    }

    #[test]
    fn gray_level_animates_from_the_first_frame() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);
        let x0 = level.squares[0].xform().x_pos();
        let rot0 = level.squares[1].xform().rotation;

        idle_frame(&mut level, &mut ctx);

        assert!((level.squares[0].xform().x_pos() - (x0 - TRANSLATE_STEP)).abs() < 1e-5);
        let expected = rot0 - ROTATE_STEP_DEG.to_radians();
        assert!((level.squares[1].xform().rotation - expected).abs() < 1e-6);
    }

    #[test]
    fn blue_level_waits_for_the_direction_key() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Blue);
        let x0 = level.squares[0].xform().x_pos();

        for _ in 0..5 {
            idle_frame(&mut level, &mut ctx);
        }
        assert_eq!(level.squares[0].xform().x_pos(), x0);

        // The first toggle both starts motion and reverses direction. Motion
        // is stepped before keys are read, so the toggle frame itself does
        // not move; the next frame moves right.
        frame_with_click(&mut level, &mut ctx, KeyCode::KeyJ);
        assert_eq!(level.squares[0].xform().x_pos(), x0);
        idle_frame(&mut level, &mut ctx);
        assert!((level.squares[0].xform().x_pos() - (x0 + TRANSLATE_STEP)).abs() < 1e-5);
    }

    #[test]
    fn direction_key_reverses_both_motions() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);
        assert!(!level.redirect);

        frame_with_click(&mut level, &mut ctx, KeyCode::KeyJ);
        assert!(level.redirect);

        let x1 = level.squares[0].xform().x_pos();
        let rot1 = level.squares[1].xform().rotation;
        idle_frame(&mut level, &mut ctx);
        assert!(level.squares[0].xform().x_pos() > x1);
        assert!(level.squares[1].xform().rotation > rot1);

        frame_with_click(&mut level, &mut ctx, KeyCode::KeyJ);
        assert!(!level.redirect);
    }

    #[test]
    fn slider_wraps_once_to_the_opposite_edge() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);
        level.squares[0]
            .xform_mut()
            .set_position(X_HIGH_BOUND, WRAP_Y);

        let mut wraps = 0;
        let mut prev_x = level.squares[0].xform().x_pos();
        for _ in 0..205 {
            idle_frame(&mut level, &mut ctx);
            let x = level.squares[0].xform().x_pos();
            // Moving left, so any upward jump is the wrap.
            if x > prev_x {
                wraps += 1;
                assert_eq!(x, X_HIGH_BOUND);
                assert_eq!(level.squares[0].xform().position.y, WRAP_Y);
            }
            prev_x = x;
        }
        assert_eq!(wraps, 1);
    }

    #[test]
    fn transition_key_fires_once_per_physical_press() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);

        ctx.begin_frame();
        ctx.input_mut().key_down(KeyCode::KeyQ);
        level.update(&mut ctx).unwrap();
        assert_eq!(level.take_exit(), Some(TEST_VIEWPORT));

        // Key still held on later frames; the edge must not refire.
        for _ in 0..3 {
            idle_frame(&mut level, &mut ctx);
            assert_eq!(level.take_exit(), None);
        }

        ctx.input_mut().key_up(KeyCode::KeyQ);
        frame_with_click(&mut level, &mut ctx, KeyCode::KeyQ);
        assert!(level.take_exit().is_some());
    }

    #[test]
    fn transition_snapshots_the_current_inset_viewport() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);

        ctx.begin_frame();
        ctx.input_mut().key_down(KeyCode::KeyD);
        level.update(&mut ctx).unwrap();
        ctx.input_mut().key_up(KeyCode::KeyD);

        frame_with_click(&mut level, &mut ctx, KeyCode::KeyQ);
        let exit = level.take_exit().unwrap();
        assert_eq!(exit.x, TEST_VIEWPORT.x + VIEWPORT_STEP);
    }

    #[test]
    fn inset_viewport_steps_are_asymmetric() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);

        // Left fires on release with the larger step.
        ctx.begin_frame();
        ctx.input_mut().key_down(KeyCode::KeyA);
        level.update(&mut ctx).unwrap();
        assert_eq!(level.inset_camera.viewport().x, TEST_VIEWPORT.x);

        ctx.begin_frame();
        ctx.input_mut().key_up(KeyCode::KeyA);
        level.update(&mut ctx).unwrap();
        assert_eq!(
            level.inset_camera.viewport().x,
            TEST_VIEWPORT.x - VIEWPORT_LEFT_STEP
        );

        // Right/up/down repeat while held with the smaller step.
        ctx.begin_frame();
        ctx.input_mut().key_down(KeyCode::KeyW);
        level.update(&mut ctx).unwrap();
        ctx.begin_frame();
        level.update(&mut ctx).unwrap();
        assert_eq!(
            level.inset_camera.viewport().y,
            TEST_VIEWPORT.y + 2.0 * VIEWPORT_STEP
        );
    }

    #[test]
    fn camera_pan_and_zoom_have_no_bounds() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);
        let center0 = level.camera.wc_center();
        let width0 = level.camera.wc_width();

        ctx.begin_frame();
        ctx.input_mut().key_down(KeyCode::KeyC);
        ctx.input_mut().key_down(KeyCode::KeyF);
        ctx.input_mut().key_down(KeyCode::KeyZ);
        level.update(&mut ctx).unwrap();

        let center = level.camera.wc_center();
        assert_eq!(center.x, center0.x - CAMERA_STEP);
        assert_eq!(center.y, center0.y + CAMERA_STEP);
        assert_eq!(level.camera.wc_width(), width0 - CAMERA_STEP);

        // Zoom keeps shrinking straight through zero; nothing clamps it.
        for _ in 0..100 {
            ctx.begin_frame();
            level.update(&mut ctx).unwrap();
        }
        assert!(level.camera.wc_width() < 0.0);
    }

    #[test]
    fn music_keys_toggle_background_playback() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);
        assert!(ctx.audio().is_background_playing());

        frame_with_click(&mut level, &mut ctx, KeyCode::KeyR);
        assert!(!ctx.audio().is_background_playing());

        frame_with_click(&mut level, &mut ctx, KeyCode::KeyT);
        assert!(ctx.audio().is_background_playing());
    }

    #[test]
    fn draw_does_not_mutate_level_state() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);
        idle_frame(&mut level, &mut ctx);

        let before = level.clone();
        let mut first = Frame::new();
        level.draw(&mut first).unwrap();
        for _ in 0..3 {
            let mut frame = Frame::new();
            level.draw(&mut frame).unwrap();
            assert_eq!(frame.commands(), first.commands());
        }
        assert_eq!(level, before);
    }

    #[test]
    fn draw_renders_both_cameras_over_all_squares() {
        let (level, _ctx) = ready_level(LevelVariant::Gray);

        let mut frame = Frame::new();
        level.draw(&mut frame).unwrap();
        let commands = frame.commands();

        assert_eq!(commands[0], DrawCommand::ClearCanvas(CANVAS_CLEAR_COLOR));
        let viewports: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetViewport(vp) => Some(*vp),
                _ => None,
            })
            .collect();
        assert_eq!(viewports, vec![level.camera.viewport(), TEST_VIEWPORT]);

        let quads = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Quad { .. }))
            .count();
        assert_eq!(quads, 2 * level.squares.len());
        assert_eq!(level.squares.len(), 2);
    }

    #[test]
    fn gray_unload_retains_the_shared_cue_clip() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Gray);

        level.unload_scene(&mut ctx).unwrap();

        assert!(!ctx.audio().is_background_playing());
        assert!(!ctx.text_files().contains(level.config.scene_file));
        assert!(!ctx.audio().is_loaded(GRAY_BG_CLIP));
        assert!(ctx.audio().is_loaded(STEP_CUE_CLIP));

        // The next level finds its cue clip already cached.
        let mut blue = Level::new(LevelVariant::Blue.config(), TEST_VIEWPORT);
        blue.load_scene(&mut ctx).unwrap();
        assert!(blue.is_loaded(&ctx));
    }

    #[test]
    fn blue_unload_releases_everything() {
        let (mut level, mut ctx) = ready_level(LevelVariant::Blue);

        level.unload_scene(&mut ctx).unwrap();

        assert!(!ctx.text_files().contains(level.config.scene_file));
        assert!(!ctx.audio().is_loaded(level.config.background_clip));
        assert!(!ctx.audio().is_loaded(level.config.cue_clip));
    }
}
