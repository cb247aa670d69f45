use anyhow::Result;
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    assets::TextFileStore,
    audio::AudioClips,
    input::InputState,
    render::{Frame, Renderer},
};

/// Configuration values for the engine window and runtime behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Ember2D Game".into(),
            width: 640,
            height: 480,
            vsync: true,
        }
    }
}

/// Main entrypoint for running an Ember2D game.
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine instance with default configuration.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Override the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Override the initial window size in logical pixels.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Enable or disable vertical sync.
    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.config.vsync = vsync;
        self
    }

    /// Run the provided game until the window is closed or the game requests
    /// exit.
    pub fn run<G: Game + 'static>(self, mut game: G) -> Result<()> {
        let config = self.config;

        let event_loop = EventLoop::new()?;
        let mut window_attributes = Window::default_attributes();
        window_attributes.title = config.title.clone();
        window_attributes.inner_size = Some(LogicalSize::new(config.width, config.height).into());
        window_attributes.resizable = false;
        let window = event_loop.create_window(window_attributes)?;

        // Leak the window to get a 'static reference; it lives for the whole
        // program anyway.
        let window: &'static Window = Box::leak(Box::new(window));

        let mut renderer = Renderer::new(window, config.vsync)?;
        let mut ctx = EngineContext::new();
        game.init(&mut ctx)?;

        event_loop.run(move |event, elwt| {
            match event {
                Event::NewEvents(_) => {
                    ctx.begin_frame();
                }
                Event::WindowEvent { event, .. } => {
                    match event {
                        WindowEvent::CloseRequested => {
                            elwt.exit();
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if is_escape_pressed(&event) {
                                elwt.exit();
                            }
                            ctx.input.handle_key(&event);
                        }
                        WindowEvent::Resized(new_size) => {
                            renderer.resize(new_size);
                        }
                        WindowEvent::RedrawRequested => {
                            let mut frame = Frame::new();
                            if let Err(err) = game.draw(&mut frame) {
                                eprintln!("Encountered error during draw: {err:?}");
                                elwt.exit();
                                return;
                            }
                            if let Err(err) = renderer.render(&frame) {
                                eprintln!("Encountered error during present: {err:?}");
                                elwt.exit();
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    if let Err(err) = game.update(&mut ctx) {
                        eprintln!("Encountered error during update: {err:?}");
                        elwt.exit();
                        return;
                    }

                    if ctx.exit_requested {
                        elwt.exit();
                        return;
                    }

                    window.request_redraw();
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn is_escape_pressed(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(event.physical_key, PhysicalKey::Code(KeyCode::Escape))
}

/// Shared context provided to game code each frame.
///
/// Holds every engine service a scene touches outside of drawing: input
/// polling, the audio clip manager, and the text-file store. Drawing goes
/// through `Frame` instead so scene draw code stays free of GPU state.
pub struct EngineContext {
    input: InputState,
    audio: AudioClips,
    text_files: TextFileStore,
    exit_requested: bool,
}

impl EngineContext {
    pub fn new() -> Self {
        Self {
            input: InputState::new(),
            audio: AudioClips::new(),
            text_files: TextFileStore::new(),
            exit_requested: false,
        }
    }

    /// Clear per-frame input edges. Called by the engine at the top of each
    /// frame; tests drive it directly.
    pub fn begin_frame(&mut self) {
        self.input.begin_frame();
    }

    /// Access the current input state.
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Mutable input access for feeding synthetic key events.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Access the audio clip manager.
    pub fn audio(&self) -> &AudioClips {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioClips {
        &mut self.audio
    }

    /// Access the text-file resource store.
    pub fn text_files(&self) -> &TextFileStore {
        &self.text_files
    }

    pub fn text_files_mut(&mut self) -> &mut TextFileStore {
        &mut self.text_files
    }

    /// Request that the engine exit after the current frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait implemented by user code to hook into the engine lifecycle.
pub trait Game {
    /// Called once after the window is created but before the first frame.
    fn init(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    /// Update game state. Called once per frame before drawing.
    fn update(&mut self, ctx: &mut EngineContext) -> Result<()>;

    /// Record the current frame. Called after update when a redraw is
    /// requested.
    fn draw(&mut self, frame: &mut Frame) -> Result<()>;
}
