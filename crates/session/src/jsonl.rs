//! File-backed transcript store — persistent JSON-lines storage.
//!
//! Each line is one JSON-encoded `Turn`. Appends go straight to disk, so
//! a transcript survives the process and stays human-inspectable with
//! nothing more than `cat`. No database required.

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::warn;

use toolweave_core::error::StoreError;
use toolweave_core::session::TranscriptStore;
use toolweave_core::turn::Turn;

/// A JSONL-backed transcript (one JSON object per line).
pub struct JsonlTranscript {
    path: PathBuf,
    // Serializes appends; the loop is single-writer but the file is not.
    write_lock: Mutex<()>,
}

impl JsonlTranscript {
    /// Create a store at the given path. The file is created on first
    /// append; an existing file is continued, not truncated.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_turns(&self) -> Result<Vec<Turn>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            // No file yet means no turns yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Read(e.to_string())),
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Turn>(line) {
                Ok(turn) => Some(turn),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted transcript line");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl TranscriptStore for JsonlTranscript {
    async fn append(&self, turn: Turn) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Append(format!("Failed to create transcript dir: {e}")))?;
        }

        let line = serde_json::to_string(&turn)
            .map_err(|e| StoreError::Append(format!("Failed to encode turn: {e}")))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::Append(e.to_string()))?;

        writeln!(file, "{line}").map_err(|e| StoreError::Append(e.to_string()))?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Turn>, StoreError> {
        self.read_turns()
    }
}
