//! Batch summary written to `<output_dir>/batch.json` after every sweep, and
//! the stop file that asks a running sweep to end after its current job.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::io::write_json;

pub const BATCH_LOG_FILE: &str = "batch.json";

/// Creating `<output_dir>/STOP` cancels a running sweep between jobs.
pub const STOP_FILE: &str = "STOP";

#[derive(Debug, Clone, Serialize)]
pub struct BatchLog<'a, J> {
    pub started_at: String,
    pub ended_at: String,
    pub duration_ms: u64,
    pub total: usize,
    pub succeeded: usize,
    pub cancelled: bool,
    /// Set when a restore failure stopped the batch.
    pub halted: Option<String>,
    pub jobs: &'a [J],
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

pub fn batch_log_path(output_root: &Path) -> PathBuf {
    output_root.join(BATCH_LOG_FILE)
}

pub fn write_batch_log<J: Serialize>(output_root: &Path, log: &BatchLog<'_, J>) -> Result<PathBuf> {
    let path = batch_log_path(output_root);
    write_json(&path, log)?;
    Ok(path)
}

pub fn stop_file_path(output_root: &Path) -> PathBuf {
    output_root.join(STOP_FILE)
}

pub fn stop_requested(output_root: &Path) -> bool {
    stop_file_path(output_root).exists()
}

/// Remove a leftover stop file. Returns whether one was there.
pub fn clear_stop_request(output_root: &Path) -> Result<bool> {
    let path = stop_file_path(output_root);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
    Ok(true)
}
