// src/pipeline/cache.rs

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use blake3::Hasher;
use tracing::debug;

use crate::config::model::CacheMode;
use crate::errors::Result;

/// Cache directory, relative to the project root.
///
/// Each entry is a file named after the hex `blake3` key holding the
/// compressed bytes.
pub const CACHE_DIR: &str = ".assetpipe/image-cache";

/// Content-addressed store of compressed images.
///
/// Memory entries are always kept; in [`CacheMode::File`] they are also
/// written through to [`CACHE_DIR`] so later runs can reuse them.
#[derive(Debug)]
pub struct ImageCache {
    mode: CacheMode,
    dir: PathBuf,
    memory: Mutex<HashMap<String, Vec<u8>>>,
}

impl ImageCache {
    pub fn new(mode: CacheMode, root: &Path) -> Self {
        Self {
            mode,
            dir: root.join(CACHE_DIR),
            memory: Mutex::new(HashMap::new()),
        }
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Key for `input` compressed with `settings` (encoder + parameters).
    pub fn key(settings: &str, input: &[u8]) -> String {
        let mut hasher = Hasher::new();
        hasher.update(settings.as_bytes());
        hasher.update(&[0]);
        hasher.update(input);
        hasher.finalize().to_hex().to_string()
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // Entries are plain byte vectors; a poisoned map is still consistent.
        self.memory.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(bytes) = self.memory().get(key) {
            return Some(bytes.clone());
        }

        if self.mode != CacheMode::File {
            return None;
        }

        let path = self.dir.join(key);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(key = %key, "image cache hit on disk");
                self.memory().insert(key.to_string(), bytes.clone());
                Some(bytes)
            }
            Err(_) => None,
        }
    }

    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.memory().insert(key.to_string(), bytes.to_vec());

        if self.mode == CacheMode::File {
            fs::create_dir_all(&self.dir)?;
            let tmp = self.dir.join(format!("{key}.tmp"));
            fs::write(&tmp, bytes)?;
            fs::rename(&tmp, self.dir.join(key))?;
            debug!(key = %key, "stored image cache entry");
        }
        Ok(())
    }
}
