//! Engine abstraction for deck execution.
//!
//! The [`Engine`] trait decouples the job executor from the actual processing
//! program. Tests use scripted engines that return predetermined exit codes
//! without spawning processes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::io::process::run_command_with_timeout;

/// Parameters for one engine invocation.
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    /// Working directory for the engine process (the job sandbox).
    pub workdir: PathBuf,
    /// Deck text fed on stdin.
    pub input: String,
    /// Maximum time to wait before the child is killed.
    pub timeout: Duration,
    /// Truncate captured output beyond this many bytes.
    pub output_limit_bytes: usize,
}

/// Result of one engine run. A non-zero exit is a result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl Invocation {
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Last `lines` lines of stdout followed by stderr.
    pub fn tail(&self, lines: usize) -> Vec<String> {
        let all: Vec<&str> = self.stdout.lines().chain(self.stderr.lines()).collect();
        all[all.len().saturating_sub(lines)..]
            .iter()
            .map(|line| (*line).to_string())
            .collect()
    }
}

/// Abstraction over deck processing backends.
pub trait Engine {
    /// Run the engine once. Errors mean the engine could not be run at all.
    fn invoke(&self, request: &InvokeRequest) -> Result<Invocation>;
}

/// Engine that spawns an external program (NJOY by default).
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
}

impl ProcessEngine {
    /// Build from a configured command line: program followed by arguments.
    pub fn from_command(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("engine command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Engine for ProcessEngine {
    #[instrument(skip_all, fields(program = %self.program, timeout_secs = request.timeout.as_secs()))]
    fn invoke(&self, request: &InvokeRequest) -> Result<Invocation> {
        info!(workdir = %request.workdir.display(), "starting engine");
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&request.workdir);

        let output = run_command_with_timeout(
            cmd,
            Some(request.input.as_bytes()),
            request.timeout,
            request.output_limit_bytes,
        )
        .with_context(|| format!("run engine {}", self.program))?;

        if output.timed_out {
            warn!(timeout_secs = request.timeout.as_secs(), "engine timed out");
        } else if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "engine failed");
        } else {
            debug!("engine completed successfully");
        }

        Ok(Invocation {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            stdout_truncated: output.stdout_truncated,
            stderr_truncated: output.stderr_truncated,
            timed_out: output.timed_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_takes_last_lines_across_streams() {
        let invocation = Invocation {
            exit_code: Some(1),
            stdout: "a\nb\nc\n".to_string(),
            stderr: "boom\n".to_string(),
            ..Invocation::default()
        };
        assert_eq!(invocation.tail(2), vec!["c".to_string(), "boom".to_string()]);
        assert_eq!(invocation.tail(10).len(), 4);
        assert!(!invocation.succeeded());
    }

    #[test]
    fn timeout_is_never_success() {
        let invocation = Invocation {
            exit_code: Some(0),
            timed_out: true,
            ..Invocation::default()
        };
        assert!(!invocation.succeeded());
        assert!(Invocation::exited(0).succeeded());
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(ProcessEngine::from_command(&[]).is_err());
    }

    /// Verifies the process engine runs in the sandbox with the deck on stdin.
    #[cfg(unix)]
    #[test]
    fn process_engine_runs_in_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("tape20"), "endf").expect("stage");
        let engine = ProcessEngine::from_command(&[
            "sh".to_string(),
            "-c".to_string(),
            "cat tape20; cat".to_string(),
        ])
        .expect("engine");

        let invocation = engine
            .invoke(&InvokeRequest {
                workdir: temp.path().to_path_buf(),
                input: "stop\n".to_string(),
                timeout: Duration::from_secs(10),
                output_limit_bytes: 1024,
            })
            .expect("invoke");

        assert!(invocation.succeeded());
        assert_eq!(invocation.stdout, "endfstop\n");
    }
}
