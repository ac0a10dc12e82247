//! Test-only engine and deck helpers.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::batch::BatchSettings;
use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::values::{Bounds, Values};
use crate::io::config::SandboxFiles;
use crate::io::engine::{Engine, InvokeRequest, Invocation};

/// What the scripted engine does on its next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedRun {
    Exit(i32),
    Panic,
    SpawnError,
}

/// Engine that plays back a script instead of spawning a process and
/// records every request it receives. Clones share the script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    script: Arc<Mutex<VecDeque<ScriptedRun>>>,
    calls: Arc<Mutex<Vec<InvokeRequest>>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<ScriptedRun>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            calls: Arc::default(),
        }
    }

    /// Requests received so far, in order.
    pub fn calls(&self) -> Vec<InvokeRequest> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl Engine for ScriptedEngine {
    fn invoke(&self, request: &InvokeRequest) -> Result<Invocation> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        let next = self
            .script
            .lock()
            .map_err(|_| anyhow!("script lock poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("scripted engine ran out of runs"))?;
        let first_line = request.input.lines().next().unwrap_or_default();
        match next {
            ScriptedRun::Exit(code) => Ok(Invocation {
                exit_code: Some(code),
                stdout: format!("processing {first_line}\n"),
                stderr: if code == 0 {
                    String::new()
                } else {
                    format!("exit {code}\n")
                },
                ..Invocation::default()
            }),
            ScriptedRun::Panic => panic!("scripted engine panic"),
            ScriptedRun::SpawnError => Err(anyhow!("spawn scripted engine: not found")),
        }
    }
}

/// Batch settings rooted at `<root>/runs` with short limits and no tapes.
pub fn settings(root: &Path) -> BatchSettings {
    BatchSettings {
        output_root: root.join("runs"),
        files: SandboxFiles::default(),
        tapes: BTreeMap::new(),
        timeout: Duration::from_secs(5),
        output_limit_bytes: 64 * 1024,
        tail_lines: 5,
    }
}

/// Temporary workspace plus settings rooted in it.
pub fn workspace() -> (TempDir, BatchSettings) {
    let temp = tempfile::tempdir().expect("tempdir");
    let settings = settings(temp.path());
    (temp, settings)
}

const BLOCKS: Bounds = Bounds::new(1, 8);

/// `c1.count` repeated `block_i` groups, each holding one value.
struct Repeat;

impl Schema for Repeat {
    fn groups(&self, values: &Values) -> Vec<Group> {
        let count = values.count("c1", "count", BLOCKS);
        let mut groups = vec![Group::new("c1", "Header").with(
            Field::new("count", count.to_string())
                .describe("Number of blocks")
                .count(BLOCKS),
        )];
        for i in 1..=count {
            groups.push(
                Group::new(format!("block_{i}"), format!("Block #{i}"))
                    .with(Field::new(format!("value_{i}"), "0")),
            );
        }
        groups
    }
}

/// Count-driven module for layout tests: `repeat` followed by `count/` and
/// one line per block.
pub fn repeat_module() -> Module {
    Module::new("REPEAT", "repeat", Repeat)
}
