//! Per-job sandbox directories under the output root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::io::config::SandboxFiles;
use crate::io::engine::Invocation;
use crate::io::process::CommandOutput;
use crate::io::write_json;

#[derive(Debug, Clone)]
pub struct SandboxPaths {
    pub dir: PathBuf,
    pub input_path: PathBuf,
    pub stdout_log_path: PathBuf,
    pub stderr_log_path: PathBuf,
    pub meta_path: PathBuf,
}

impl SandboxPaths {
    pub fn new(dir: &Path, files: &SandboxFiles) -> Self {
        Self {
            dir: dir.to_path_buf(),
            input_path: dir.join(&files.input),
            stdout_log_path: dir.join(&files.stdout_log),
            stderr_log_path: dir.join(&files.stderr_log),
            meta_path: dir.join(&files.job_meta),
        }
    }
}

/// A file to copy into the sandbox under the engine's name for `unit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub unit: i64,
    pub source: PathBuf,
}

/// Engine-side name for a unit: `tape20` for both 20 and -20.
pub fn tape_name(prefix: &str, unit: i64) -> String {
    format!("{prefix}{}", unit.unsigned_abs())
}

/// Create an empty sandbox directory. Anything left there by an earlier run
/// (tapes, logs, engine output) is removed first.
pub fn prepare(paths: &SandboxPaths) -> Result<()> {
    if paths.dir.exists() {
        debug!(dir = %paths.dir.display(), "clearing previous sandbox");
        fs::remove_dir_all(&paths.dir)
            .with_context(|| format!("clear sandbox {}", paths.dir.display()))?;
    }
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create sandbox {}", paths.dir.display()))
}

/// Copy dependencies into the sandbox. Missing or unreadable sources are
/// skipped and reported as warnings.
pub fn stage(paths: &SandboxPaths, dependencies: &[Dependency], prefix: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    for dep in dependencies {
        let dest = paths.dir.join(tape_name(prefix, dep.unit));
        if !dep.source.is_file() {
            let message = format!(
                "unit {}: source {} not found; not staged",
                dep.unit,
                dep.source.display()
            );
            warn!(unit = dep.unit, source = %dep.source.display(), "dependency missing");
            warnings.push(message);
            continue;
        }
        match fs::copy(&dep.source, &dest) {
            Ok(bytes) => debug!(unit = dep.unit, bytes, dest = %dest.display(), "staged dependency"),
            Err(e) => {
                warn!(unit = dep.unit, err = %e, "failed to stage dependency");
                warnings.push(format!(
                    "unit {}: copy {} failed: {e}",
                    dep.unit,
                    dep.source.display()
                ));
            }
        }
    }
    warnings
}

pub fn write_input(paths: &SandboxPaths, text: &str) -> Result<()> {
    fs::write(&paths.input_path, text)
        .with_context(|| format!("write deck {}", paths.input_path.display()))
}

/// Write the engine's output logs. The stderr log only exists when stderr
/// was non-empty.
pub fn write_logs(paths: &SandboxPaths, invocation: &Invocation) -> Result<()> {
    let mut stdout = invocation.stdout.clone();
    stdout.push_str(&CommandOutput::truncated_notice(
        "stdout",
        invocation.stdout_truncated,
    ));
    if invocation.timed_out {
        stdout.push_str("\n[engine timed out]\n");
    }
    fs::write(&paths.stdout_log_path, stdout)
        .with_context(|| format!("write {}", paths.stdout_log_path.display()))?;

    if !invocation.stderr.is_empty() || invocation.stderr_truncated > 0 {
        let mut stderr = invocation.stderr.clone();
        stderr.push_str(&CommandOutput::truncated_notice(
            "stderr",
            invocation.stderr_truncated,
        ));
        fs::write(&paths.stderr_log_path, stderr)
            .with_context(|| format!("write {}", paths.stderr_log_path.display()))?;
    } else if paths.stderr_log_path.exists() {
        fs::remove_file(&paths.stderr_log_path)
            .with_context(|| format!("remove {}", paths.stderr_log_path.display()))?;
    }
    Ok(())
}

pub fn write_meta<T: Serialize>(paths: &SandboxPaths, meta: &T) -> Result<()> {
    write_json(&paths.meta_path, meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_paths_follow_configured_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = SandboxPaths::new(&temp.path().join("Run_1"), &SandboxFiles::default());

        assert!(paths.dir.ends_with("Run_1"));
        assert!(paths.input_path.ends_with("Run_1/input.inp"));
        assert!(paths.stdout_log_path.ends_with("output.log"));
        assert!(paths.stderr_log_path.ends_with("error.log"));
        assert!(paths.meta_path.ends_with("job.json"));
    }

    #[test]
    fn tape_names_drop_the_sign() {
        assert_eq!(tape_name("tape", 20), "tape20");
        assert_eq!(tape_name("tape", -21), "tape21");
    }

    #[test]
    fn stage_copies_and_reports_missing_sources() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("n-092_U_235.endf");
        fs::write(&source, "endf data").expect("write source");
        let paths = SandboxPaths::new(&temp.path().join("Run_1"), &SandboxFiles::default());
        prepare(&paths).expect("prepare");

        let warnings = stage(
            &paths,
            &[
                Dependency { unit: -20, source },
                Dependency {
                    unit: 22,
                    source: temp.path().join("missing.dat"),
                },
            ],
            "tape",
        );

        assert_eq!(
            fs::read_to_string(paths.dir.join("tape20")).expect("staged"),
            "endf data"
        );
        assert!(!paths.dir.join("tape22").exists());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("unit 22"));
    }

    #[test]
    fn stderr_log_only_when_non_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = SandboxPaths::new(temp.path(), &SandboxFiles::default());

        write_logs(&paths, &Invocation::exited(0)).expect("write");
        assert!(paths.stdout_log_path.exists());
        assert!(!paths.stderr_log_path.exists());

        let failed = Invocation {
            exit_code: Some(77),
            stderr: "fatal error".to_string(),
            ..Invocation::default()
        };
        write_logs(&paths, &failed).expect("write");
        assert_eq!(
            fs::read_to_string(&paths.stderr_log_path).expect("stderr"),
            "fatal error"
        );
    }

    #[test]
    fn prepare_clears_previous_run() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = SandboxPaths::new(&temp.path().join("Run_1"), &SandboxFiles::default());
        prepare(&paths).expect("first prepare");
        fs::write(paths.dir.join("tape21"), "old pendf").expect("old tape");
        fs::write(&paths.stderr_log_path, "old failure").expect("old log");

        prepare(&paths).expect("second prepare");

        assert!(paths.dir.is_dir());
        assert_eq!(fs::read_dir(&paths.dir).expect("read dir").count(), 0);
    }

    #[test]
    fn clean_run_removes_stale_stderr_log() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = SandboxPaths::new(temp.path(), &SandboxFiles::default());
        fs::write(&paths.stderr_log_path, "old failure").expect("old log");

        write_logs(&paths, &Invocation::exited(0)).expect("write");

        assert!(!paths.stderr_log_path.exists());
    }
}
