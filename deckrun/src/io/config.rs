//! Deckrun configuration stored under `.deckrun/config.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::values::parse_int;
use crate::io::write_atomic;

pub const DEFAULT_CONFIG_PATH: &str = ".deckrun/config.toml";

/// Deckrun configuration (TOML).
///
/// Edited by hand; missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeckConfig {
    /// Parent directory of every job sandbox.
    pub output_dir: PathBuf,

    /// Lines of engine output kept in the summary of a failed job.
    pub tail_lines: usize,

    pub engine: EngineConfig,

    pub files: SandboxFiles,

    /// Tape library: unit number to the file staged for it.
    pub tapes: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable and leading arguments (e.g. `["njoy"]`).
    pub command: Vec<String>,

    /// Wall-clock limit for one invocation.
    pub timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes. 0 keeps
    /// everything, which is the default since NJOY listings routinely exceed
    /// tens of megabytes and `output.log` is the record of the run.
    pub output_limit_bytes: usize,
}

/// File names used inside each sandbox.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SandboxFiles {
    pub input: String,
    pub stdout_log: String,
    pub stderr_log: String,
    pub job_meta: String,
    /// Staged dependencies are named `<tape_prefix><unit>`.
    pub tape_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: vec!["njoy".to_string()],
            timeout_secs: 60 * 60,
            output_limit_bytes: 0,
        }
    }
}

impl Default for SandboxFiles {
    fn default() -> Self {
        Self {
            input: "input.inp".to_string(),
            stdout_log: "output.log".to_string(),
            stderr_log: "error.log".to_string(),
            job_meta: "job.json".to_string(),
            tape_prefix: "tape".to_string(),
        }
    }
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("runs"),
            tail_lines: 20,
            engine: EngineConfig::default(),
            files: SandboxFiles::default(),
            tapes: BTreeMap::new(),
        }
    }
}

impl DeckConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(anyhow!("output_dir must not be empty"));
        }
        if self.engine.timeout_secs == 0 {
            return Err(anyhow!("engine.timeout_secs must be > 0"));
        }
        if self.engine.command.is_empty() || self.engine.command[0].trim().is_empty() {
            return Err(anyhow!("engine.command must be a non-empty array"));
        }
        for (label, name) in [
            ("files.input", &self.files.input),
            ("files.stdout_log", &self.files.stdout_log),
            ("files.stderr_log", &self.files.stderr_log),
            ("files.job_meta", &self.files.job_meta),
        ] {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(anyhow!("{label} must be a plain file name"));
            }
        }
        if self.files.tape_prefix.contains(['/', '\\']) {
            return Err(anyhow!("files.tape_prefix must not contain path separators"));
        }
        self.tape_library().map(|_| ())
    }

    /// Tape library keyed by absolute unit number.
    pub fn tape_library(&self) -> Result<BTreeMap<i64, PathBuf>> {
        self.tapes
            .iter()
            .map(|(unit, path)| {
                let number = parse_int(unit)
                    .filter(|n| *n != 0)
                    .ok_or_else(|| anyhow!("tapes key {unit:?} is not a non-zero unit number"))?;
                Ok((number.abs(), path.clone()))
            })
            .collect()
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DeckConfig::default()`.
pub fn load_config(path: &Path) -> Result<DeckConfig> {
    if !path.exists() {
        let cfg = DeckConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DeckConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &DeckConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}
