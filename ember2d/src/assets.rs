use std::{collections::HashMap, fs, io, path::Path};

use log::debug;
use thiserror::Error;

/// Format tag for a loaded text resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextFileKind {
    Json,
    Xml,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read text file {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("text file {0} is not loaded")]
    Missing(String),
}

/// Caches the contents of declarative scene files keyed by path.
///
/// Loading is synchronous; callers that follow the request-then-poll
/// lifecycle simply observe `contains` turning true on the next frame.
pub struct TextFileStore {
    files: HashMap<String, (TextFileKind, String)>,
}

impl TextFileStore {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    /// Read a text file into the cache. Re-loading an already cached path is
    /// a no-op.
    pub fn load(&mut self, path: &str, kind: TextFileKind) -> Result<(), AssetError> {
        if self.files.contains_key(path) {
            return Ok(());
        }
        let text = fs::read_to_string(Path::new(path)).map_err(|source| AssetError::Read {
            path: path.to_string(),
            source,
        })?;
        debug!("loaded text file {path}");
        self.files.insert(path.to_string(), (kind, text));
        Ok(())
    }

    /// Drop a cached file. Unknown paths are ignored.
    pub fn unload(&mut self, path: &str) {
        if self.files.remove(path).is_some() {
            debug!("unloaded text file {path}");
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Result<&str, AssetError> {
        self.files
            .get(path)
            .map(|(_, text)| text.as_str())
            .ok_or_else(|| AssetError::Missing(path.to_string()))
    }

    pub fn kind(&self, path: &str) -> Option<TextFileKind> {
        self.files.get(path).map(|(kind, _)| *kind)
    }
}

impl Default for TextFileStore {
    fn default() -> Self {
        Self::new()
    }
}
