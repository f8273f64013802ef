//! JSON-based transcript storage.
//!
//! Stores each finished session as a separate JSON file named after its
//! session id.

use super::record::Transcript;
use crate::config::Paths;
use crate::error::{TranscriptError, TranscriptResult};
use crate::types::SessionId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory of saved transcripts.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    /// Open the store under the platform data directory.
    pub fn new() -> TranscriptResult<Self> {
        let paths = Paths::get()?;
        Self::at(paths.transcripts_dir())
    }

    /// Open a store rooted at `dir`, creating it if needed.
    pub fn at(dir: impl Into<PathBuf>) -> TranscriptResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| TranscriptError::DirectoryError(e.to_string()))?;
        Ok(Self { dir })
    }

    /// Directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a transcript, returning the file written.
    pub fn save(&self, transcript: &Transcript) -> TranscriptResult<PathBuf> {
        let file = self.file_for(&transcript.session_id);
        let content = serde_json::to_string_pretty(transcript)?;
        fs::write(&file, content).map_err(|e| TranscriptError::SaveFailed(e.to_string()))?;
        debug!(path = %file.display(), "transcript saved");
        Ok(file)
    }

    /// Load a transcript by session id.
    pub fn load(&self, id: &SessionId) -> TranscriptResult<Transcript> {
        let file = self.file_for(id);
        if !file.exists() {
            return Err(TranscriptError::NotFound(id.to_string()));
        }

        let content =
            fs::read_to_string(&file).map_err(|e| TranscriptError::LoadFailed(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| TranscriptError::LoadFailed(e.to_string()))
    }

    /// Find a transcript by full id or unambiguous id prefix.
    pub fn find(&self, prefix: &str) -> TranscriptResult<Transcript> {
        if let Ok(id) = prefix.parse::<SessionId>() {
            return self.load(&id);
        }

        let matches: Vec<SessionId> = self
            .list_ids()?
            .into_iter()
            .filter(|id| id.to_string().starts_with(prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(TranscriptError::NotFound(prefix.to_string())),
            [id] => self.load(id),
            _ => Err(TranscriptError::LoadFailed(format!(
                "ambiguous prefix '{}': {} matches",
                prefix,
                matches.len()
            ))),
        }
    }

    /// List all stored session ids.
    pub fn list_ids(&self) -> TranscriptResult<Vec<SessionId>> {
        let mut ids = Vec::new();

        for entry in
            fs::read_dir(&self.dir).map_err(|e| TranscriptError::DirectoryError(e.to_string()))?
        {
            let path = entry
                .map_err(|e| TranscriptError::DirectoryError(e.to_string()))?
                .path();

            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(id) = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| stem.parse::<SessionId>().ok())
                {
                    ids.push(id);
                }
            }
        }

        Ok(ids)
    }

    /// List stored transcripts, most recent first. Unreadable files are skipped.
    pub fn list(&self) -> TranscriptResult<Vec<Transcript>> {
        let mut transcripts = Vec::new();
        for id in self.list_ids()? {
            match self.load(&id) {
                Ok(transcript) => transcripts.push(transcript),
                Err(e) => warn!(%id, error = %e, "skipping unreadable transcript"),
            }
        }
        transcripts.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(transcripts)
    }

    /// Delete a stored transcript.
    pub fn delete(&self, id: &SessionId) -> TranscriptResult<()> {
        let file = self.file_for(id);
        if !file.exists() {
            return Err(TranscriptError::NotFound(id.to_string()));
        }
        fs::remove_file(&file).map_err(|e| TranscriptError::SaveFailed(e.to_string()))
    }

    /// Delete every stored transcript, readable or not. Returns how many.
    pub fn clear(&self) -> TranscriptResult<usize> {
        let ids = self.list_ids()?;
        for id in &ids {
            self.delete(id)?;
        }
        debug!(deleted = ids.len(), "transcript store cleared");
        Ok(ids.len())
    }

    fn file_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}
