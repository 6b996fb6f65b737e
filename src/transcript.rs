use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{Result, RouterError};
use crate::models::ChatMessage;

/// Shared conversation log backed by a single JSON array file.
///
/// The file is read in full and rewritten in full on every turn. A turn holds
/// the store's lock from load to commit so concurrent requests cannot lose or
/// interleave messages.
pub struct TranscriptStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TranscriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for exclusive access to the transcript
    pub async fn begin_turn(&self) -> TranscriptTurn<'_> {
        TranscriptTurn {
            store: self,
            _guard: self.lock.lock().await,
        }
    }

    /// Read the current transcript outside of a turn
    pub async fn snapshot(&self) -> Result<Vec<ChatMessage>> {
        self.begin_turn().await.load().await
    }

    async fn read(&self) -> Result<Vec<ChatMessage>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No transcript at {}, creating an empty one", self.path.display());
                self.write(&[]).await?;
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(RouterError::Transcript(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&raw).map_err(|e| {
            RouterError::Transcript(format!("Malformed transcript {}: {e}", self.path.display()))
        })
    }

    async fn write(&self, messages: &[ChatMessage]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                RouterError::Transcript(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        let body = serde_json::to_string_pretty(messages)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).await.map_err(|e| {
            RouterError::Transcript(format!("Failed to write {}: {e}", tmp.display()))
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            RouterError::Transcript(format!("Failed to replace {}: {e}", self.path.display()))
        })
    }

    /// Move an unusable transcript aside so a reset does not destroy it
    async fn quarantine(&self) -> Result<Option<PathBuf>> {
        let existing = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(_) => String::from("unreadable"),
        };
        if existing.trim() == "[]" {
            return Ok(None);
        }
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transcript".to_string());
        let stamp = Local::now().format("%Y%m%d%H%M%S%3f");
        let target = self.path.with_file_name(format!("{file_name}.corrupt-{stamp}"));
        fs::rename(&self.path, &target).await.map_err(|e| {
            RouterError::Transcript(format!("Failed to snapshot {}: {e}", self.path.display()))
        })?;
        Ok(Some(target))
    }
}

/// Exclusive handle on the transcript for the duration of one turn
pub struct TranscriptTurn<'a> {
    store: &'a TranscriptStore,
    _guard: MutexGuard<'a, ()>,
}

impl TranscriptTurn<'_> {
    pub async fn load(&self) -> Result<Vec<ChatMessage>> {
        self.store.read().await
    }

    pub async fn commit(&self, messages: &[ChatMessage]) -> Result<()> {
        self.store.write(messages).await
    }

    /// Replace the transcript with an empty one, keeping a copy of the old file
    pub async fn reset(&self) -> Result<()> {
        match self.store.quarantine().await {
            Ok(Some(snapshot)) => tracing::warn!(
                "Transcript reset; previous contents kept at {}",
                snapshot.display()
            ),
            Ok(None) => tracing::warn!("Transcript reset"),
            Err(e) => tracing::warn!("Transcript reset without snapshot: {}", e),
        }
        self.store.write(&[]).await
    }
}
