//! File-backed credential store.
//!
//! One JSON file per enrolled identity, named `<enrollment_id>.json`
//! under the store directory. Mirrors the key-value store layout the
//! platform client persists its user contexts in, so credentials survive
//! process restarts.

use crate::error::EnrollError;
use std::path::{Path, PathBuf};
use weft_sdk::types::Identity;

#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    /// Open the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, EnrollError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| EnrollError::Store {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Look up a persisted identity. `Ok(None)` when never enrolled.
    pub fn get(&self, enrollment_id: &str) -> Result<Option<Identity>, EnrollError> {
        let path = self.entry_path(enrollment_id);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(EnrollError::Store { path, source }),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| EnrollError::Corrupt { path, source })
    }

    /// Persist an identity, replacing any previous entry for its id.
    pub fn put(&self, identity: &Identity) -> Result<(), EnrollError> {
        let path = self.entry_path(&identity.enrollment_id);
        let text = serde_json::to_string_pretty(identity).map_err(|source| EnrollError::Corrupt {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, text).map_err(|source| EnrollError::Store { path, source })
    }

    fn entry_path(&self, enrollment_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", enrollment_id))
    }
}
