// Logging module - transcript logging and data directory helpers
pub mod transcript_logger;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub use transcript_logger::TranscriptLogger;

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = max_chars.saturating_sub(3);
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Default location of chatdesk data (~/.chatdesk), not created
pub fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home_dir.join(".chatdesk"))
}

/// Create `dir` if it does not exist yet and return it
pub fn ensure_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(dir.to_path_buf())
}

/// Get or create the logs directory under the data directory
pub fn get_logs_dir(data_dir: &Path) -> Result<PathBuf> {
    ensure_dir(&data_dir.join("logs"))
}
