use std::{collections::HashMap, fs, io::Cursor, path::Path, sync::Arc};

use anyhow::{anyhow, Result};
use log::{debug, warn};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

/// Manages audio clips and looping background playback.
///
/// Clips are cached as raw bytes and only decoded when played, so clip
/// bookkeeping works even on machines without an output device. When no
/// device is available the system runs in a degraded mode: loads and
/// unloads behave normally and playback calls log a warning.
pub struct AudioClips {
    _stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    background: Option<Sink>,
    // Logical playback state; tracked even when no device exists so callers
    // observe the same behavior in degraded mode.
    background_path: Option<String>,
    clips: HashMap<String, Arc<Vec<u8>>>,
}

impl AudioClips {
    pub fn new() -> Self {
        match OutputStream::try_default() {
            Ok((stream, stream_handle)) => Self {
                _stream: Some(stream),
                stream_handle: Some(stream_handle),
                background: None,
                background_path: None,
                clips: HashMap::new(),
            },
            Err(e) => {
                warn!("Failed to initialize audio: {e}. Audio will be unavailable.");
                Self {
                    _stream: None,
                    stream_handle: None,
                    background: None,
                    background_path: None,
                    clips: HashMap::new(),
                }
            }
        }
    }

    /// Check if an output device was acquired.
    pub fn is_available(&self) -> bool {
        self.stream_handle.is_some()
    }

    /// Read a clip file into the cache. Re-loading a cached path is a no-op.
    pub fn load_audio(&mut self, path: &str) -> Result<()> {
        if self.clips.contains_key(path) {
            return Ok(());
        }
        let bytes = fs::read(Path::new(path))
            .map_err(|e| anyhow!("Failed to read audio clip {path}: {e}"))?;
        debug!("loaded audio clip {path}");
        self.clips.insert(path.to_string(), Arc::new(bytes));
        Ok(())
    }

    /// Drop a cached clip. Unknown paths are ignored.
    pub fn unload_audio(&mut self, path: &str) {
        if self.clips.remove(path).is_some() {
            debug!("unloaded audio clip {path}");
        }
    }

    pub fn is_loaded(&self, path: &str) -> bool {
        self.clips.contains_key(path)
    }

    /// Start looping background playback of a previously loaded clip.
    ///
    /// Any background clip already playing is stopped first. The clip must
    /// be in the cache; a missing clip is an error even in degraded mode.
    pub fn play_background_audio(&mut self, path: &str) -> Result<()> {
        let bytes = self
            .clips
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("Audio clip {path} is not loaded"))?;

        self.stop_background_audio();
        self.background_path = Some(path.to_string());

        let Some(stream_handle) = self.stream_handle.as_ref() else {
            warn!("No audio device; skipping background playback of {path}");
            return Ok(());
        };

        let cursor = Cursor::new(bytes.as_ref().clone());
        let source = Decoder::new(cursor)
            .map_err(|e| anyhow!("Failed to decode audio clip {path}: {e}"))?
            .repeat_infinite();

        let sink = Sink::try_new(stream_handle)
            .map_err(|e| anyhow!("Failed to create audio sink: {e}"))?;
        sink.append(source);
        sink.set_volume(0.5);
        self.background = Some(sink);
        Ok(())
    }

    /// Stop background playback if any clip is playing.
    pub fn stop_background_audio(&mut self) {
        self.background_path = None;
        if let Some(sink) = self.background.take() {
            sink.stop();
        }
    }

    pub fn is_background_playing(&self) -> bool {
        self.background_path.is_some()
    }
}

impl Default for AudioClips {
    fn default() -> Self {
        Self::new()
    }
}
