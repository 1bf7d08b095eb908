use super::types::{ExamState, STATE_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Get the default state file path (~/.config/examrank/state.json)
pub fn get_state_path() -> PathBuf {
    crate::config::get_config_dir().join("state.json")
}

/// Load the exam state from a JSON file
///
/// If the file doesn't exist, returns a fresh empty state.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_state(path: &Path) -> Result<ExamState> {
    if !path.exists() {
        return Ok(ExamState::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open state file at {}", path.display()))?;

    let state: ExamState = serde_json::from_reader(file).context("Failed to load exam state")?;

    // Version check
    if state.version != STATE_VERSION {
        anyhow::bail!("Unsupported state file version: {}", state.version);
    }

    Ok(state)
}

/// Save the exam state to a JSON file atomically
///
/// Uses atomic-write-file so a failed write never leaves a truncated
/// or mixed snapshot behind; the previous complete state stays
/// authoritative until the commit succeeds.
pub fn save_state(path: &Path, state: &ExamState) -> Result<()> {
    crate::config::ensure_config_dir()?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, state).context("Failed to serialize exam state")?;

    file.commit().context("Failed to save exam state")?;

    Ok(())
}
