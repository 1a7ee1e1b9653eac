//! On-disk transform cache
//!
//! One gzip-compressed JSON file per fingerprint. Entries are written to a
//! temporary name and renamed into place, so a reader only ever sees a
//! complete entry or none at all.

use crate::cache::fingerprint::Fingerprint;
use crate::error::{IconpackError, IconpackResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Content-addressed key/value store backed by a shared directory
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: PathBuf,
}

impl ContentCache {
    /// Open (creating if needed) a cache rooted at `dir`
    ///
    /// Safe to race with other processes opening the same directory.
    pub async fn open(dir: impl Into<PathBuf>) -> IconpackResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            IconpackError::io(format!("creating cache directory {}", dir.display()), e)
        })?;
        debug!("Using transform cache at {}", dir.display());
        Ok(Self { dir })
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `fingerprint`
    pub fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(fingerprint.file_name())
    }

    /// Look up an entry
    ///
    /// Missing, unreadable, truncated or otherwise corrupt entries are all
    /// misses; the next successful `put` replaces them.
    pub async fn get<T: DeserializeOwned>(&self, fingerprint: &Fingerprint) -> Option<T> {
        let path = self.entry_path(fingerprint);

        let compressed = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                debug!("Cache entry {} unreadable: {}", path.display(), e);
                return None;
            }
        };

        match decode(&compressed) {
            Ok(value) => {
                debug!("Cache hit {}", fingerprint);
                Some(value)
            }
            Err(reason) => {
                warn!("Ignoring corrupt cache entry {}: {}", path.display(), reason);
                None
            }
        }
    }

    /// Store an entry, replacing whatever is at its path
    ///
    /// Concurrent writers of the same fingerprint write identical bytes, so
    /// the last rename wins without harm.
    pub async fn put<T: Serialize>(&self, fingerprint: &Fingerprint, value: &T) -> IconpackResult<()> {
        let path = self.entry_path(fingerprint);
        let payload = encode(value).map_err(|e| IconpackError::CacheWrite {
            path: path.clone(),
            source: e,
        })?;

        // The directory may have been removed by an external cleaner since open
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| IconpackError::CacheWrite {
                path: path.clone(),
                source: e,
            })?;

        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", fingerprint.file_name(), Uuid::new_v4()));

        if let Err(e) = fs::write(&tmp_path, &payload).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(IconpackError::CacheWrite { path, source: e });
        }

        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(IconpackError::CacheWrite { path, source: e });
        }

        debug!("Cached {}", fingerprint);
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> std::io::Result<Vec<u8>> {
    let json = serde_json::to_vec(value)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    encoder.finish()
}

fn decode<T: DeserializeOwned>(compressed: &[u8]) -> Result<T, String> {
    let mut json = Vec::new();
    GzDecoder::new(compressed)
        .read_to_end(&mut json)
        .map_err(|e| format!("gzip: {}", e))?;
    serde_json::from_slice(&json).map_err(|e| format!("json: {}", e))
}
