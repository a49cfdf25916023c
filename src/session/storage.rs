use super::types::{Session, SessionState, SESSION_VERSION};
use crate::scoring::{Catalog, ScoringError};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Get the default session file path (~/.config/control-score/session.json)
pub fn get_session_path() -> PathBuf {
    crate::config::get_config_dir().join("session.json")
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The file could not be read or parsed.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    /// A stored assessment no longer fits the active catalog.
    #[error("session entry {entry} in {path} no longer matches the catalog: {source}")]
    CatalogMismatch {
        entry: usize,
        path: PathBuf,
        source: ScoringError,
    },
}

/// Read the assessments recorded at `path`.
///
/// A missing file is an empty session. Any version other than
/// `SESSION_VERSION` is rejected rather than migrated.
pub fn load_session_state(path: &Path) -> Result<SessionState> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no session file, starting empty");
        return Ok(SessionState::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open session file at {}", path.display()))?;

    let state: SessionState = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse assessments in {}", path.display()))?;

    if state.version != SESSION_VERSION {
        anyhow::bail!(
            "Unsupported session version {} in {} (expected {})",
            state.version,
            path.display(),
            SESSION_VERSION
        );
    }

    tracing::debug!(entries = state.entries.len(), path = %path.display(), "loaded session");
    Ok(state)
}

/// Load the session at `path` and rebuild its scores against `catalog`.
///
/// Entry numbers in `CatalogMismatch` are 1-based, matching `list` output.
pub fn open_session(path: &Path, catalog: Catalog) -> Result<Session, SessionError> {
    let state = load_session_state(path)?;
    Session::replay(catalog, state).map_err(|(index, source)| SessionError::CatalogMismatch {
        entry: index + 1,
        path: path.to_path_buf(),
        source,
    })
}

/// Persist the recorded assessments; the previous file survives a failed write.
pub fn save_session_state(path: &Path, state: &SessionState) -> Result<()> {
    crate::config::ensure_parent_dir(path)?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, state)
        .context("Failed to serialize assessments")?;
    file.commit()
        .with_context(|| format!("Failed to save session to {}", path.display()))?;

    tracing::debug!(entries = state.entries.len(), path = %path.display(), "saved session");
    Ok(())
}
