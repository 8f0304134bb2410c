//! Durable credential storage.
//!
//! One value under one fixed location: the bearer token as a plain string
//! in a single file. Nothing else is persisted. Reads are lenient (any
//! failure reads as "no credential"); writes surface their errors so the
//! session manager can log and carry on with in-memory state.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// File-backed store for the session credential.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store at the given file path. Nothing is touched on disk
    /// until the first save.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the persisted credential, if any. An unreadable or empty file
    /// counts as absent.
    pub fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim().to_string();
                (!token.is_empty()).then_some(token)
            }
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!("credential file unreadable: {err}");
                }
                None
            }
        }
    }

    /// Persist the credential, creating parent directories as needed.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create credential dir {}", parent.display())
            })?;
        }
        std::fs::write(&self.path, token).with_context(|| {
            format!("failed to write credential file {}", self.path.display())
        })
    }

    /// Remove the persisted credential. Idempotent: a missing file is
    /// already the desired state.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| {
                format!("failed to remove credential file {}", self.path.display())
            }),
        }
    }
}
