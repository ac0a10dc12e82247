//! Orchestration for sweeps: one job per plan, strictly sequential.
//!
//! Every job snapshots the deck, applies its assignments, renders, stages a
//! sandbox, invokes the engine and collects its output. The deck is restored
//! from the snapshot after every job, whatever happened in between; a failed
//! restore halts the batch because the deck can no longer be trusted.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::core::deck::Deck;
use crate::core::error::RestoreError;
use crate::core::plan::{Assignment, JobPlan};
use crate::core::snapshot::Snapshot;
use crate::core::values::parse_int;
use crate::io::batch_log::{BatchLog, timestamp, write_batch_log};
use crate::io::config::{DeckConfig, SandboxFiles};
use crate::io::engine::{Engine, InvokeRequest};
use crate::io::sandbox::{self, Dependency, SandboxPaths};

/// Everything a job needs besides the deck and the engine.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Parent of every job sandbox; also holds `batch.json`.
    pub output_root: PathBuf,
    pub files: SandboxFiles,
    /// Tape library keyed by absolute unit number.
    pub tapes: BTreeMap<i64, PathBuf>,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
    /// Lines of engine output kept for failed jobs.
    pub tail_lines: usize,
}

impl BatchSettings {
    pub fn from_config(cfg: &DeckConfig) -> Result<Self> {
        Ok(Self {
            output_root: cfg.output_dir.clone(),
            files: cfg.files.clone(),
            tapes: cfg.tape_library()?,
            timeout: Duration::from_secs(cfg.engine.timeout_secs),
            output_limit_bytes: cfg.engine.output_limit_bytes,
            tail_lines: cfg.tail_lines,
        })
    }
}

/// Job executor phases, in the order a job passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Snapshotting,
    Applying,
    Serializing,
    Staging,
    Invoking,
    Collecting,
    Restoring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    /// Non-zero exit, or killed by a signal (`exit_code` is `None`).
    Failed { exit_code: Option<i32> },
    TimedOut,
    /// The job could not reach or finish the engine call.
    Error { message: String },
}

impl JobStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Succeeded => write!(f, "ok"),
            JobStatus::Failed {
                exit_code: Some(code),
            } => write!(f, "failed (exit {code})"),
            JobStatus::Failed { exit_code: None } => write!(f, "failed (killed)"),
            JobStatus::TimedOut => write!(f, "timed out"),
            JobStatus::Error { message } => write!(f, "error: {message}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub id: usize,
    pub dir_name: String,
    pub sandbox: PathBuf,
    pub assignments: Vec<Assignment>,
    pub status: JobStatus,
    /// Assignments that could not be applied.
    pub skipped: Vec<String>,
    /// Staging problems (missing tapes, failed copies).
    pub warnings: Vec<String>,
    /// Modules replaced by a marker line in the rendered deck.
    pub render_errors: Vec<String>,
    /// Advisory: targets whose value failed validation.
    pub invalid_fields: Vec<String>,
    pub output_tail: Vec<String>,
    pub phases: Vec<Phase>,
    pub duration_ms: u64,
}

impl JobReport {
    pub(crate) fn new(id: usize, dir_name: &str, settings: &BatchSettings) -> Self {
        Self {
            id,
            dir_name: dir_name.to_string(),
            sandbox: settings.output_root.join(dir_name),
            assignments: Vec::new(),
            status: JobStatus::Error {
                message: "job did not run".to_string(),
            },
            skipped: Vec::new(),
            warnings: Vec::new(),
            render_errors: Vec::new(),
            invalid_fields: Vec::new(),
            output_tail: Vec::new(),
            phases: vec![Phase::Idle],
            duration_ms: 0,
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(job = self.id, ?phase, "phase");
        self.phases.push(phase);
    }

    fn skip(&mut self, message: String) {
        warn!(job = self.id, "skipped assignment: {message}");
        self.skipped.push(message);
    }
}

/// Rendered deck and the files to stage for it.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
    pub text: String,
    pub dependencies: Vec<Dependency>,
}

/// Applying: set each value assignment on the deck. File-role assignments
/// leave the field alone and replace the file staged for the unit it holds.
fn apply(
    deck: &mut Deck,
    assignments: &[Assignment],
    report: &mut JobReport,
) -> BTreeMap<i64, PathBuf> {
    report.enter(Phase::Applying);
    let mut overrides = BTreeMap::new();
    for assignment in assignments {
        let target = &assignment.target;
        if assignment.file_role {
            match deck.resolve(target) {
                Ok(field) => match parse_int(&field.value).filter(|unit| *unit != 0) {
                    Some(unit) => {
                        overrides.insert(unit.abs(), PathBuf::from(&assignment.value));
                    }
                    None => report.skip(format!("{target}: field holds no unit number")),
                },
                Err(err) => report.skip(format!("{target}: {err}")),
            }
        } else if let Err(err) = deck.set_value(target, &assignment.value) {
            report.skip(format!("{target}: {err}"));
        }
    }
    overrides
}

/// Serializing: render the deck, record advisory problems and resolve the
/// dependencies to stage.
pub(crate) fn serialize(
    deck: &mut Deck,
    overrides: &BTreeMap<i64, PathBuf>,
    settings: &BatchSettings,
    report: &mut JobReport,
) -> Prepared {
    report.enter(Phase::Serializing);
    let rendered = deck.render();
    report.render_errors = rendered.errors.iter().map(ToString::to_string).collect();
    report.invalid_fields = deck.validate().iter().map(ToString::to_string).collect();
    for message in &report.render_errors {
        warn!(job = report.id, "{message}");
    }

    let mut dependencies = Vec::new();
    for unit in deck.external_inputs() {
        if overrides.contains_key(&unit) {
            continue;
        }
        match settings.tapes.get(&unit) {
            Some(source) => dependencies.push(Dependency {
                unit,
                source: source.clone(),
            }),
            None => {
                warn!(job = report.id, unit, "no tape configured for input unit");
                report
                    .warnings
                    .push(format!("unit {unit}: no tape configured; not staged"));
            }
        }
    }
    dependencies.extend(overrides.iter().map(|(unit, source)| Dependency {
        unit: *unit,
        source: source.clone(),
    }));

    Prepared {
        text: rendered.text,
        dependencies,
    }
}

/// Staging, Invoking and Collecting. Touches only the sandbox, never the deck.
pub(crate) fn launch<E: Engine>(
    prepared: Prepared,
    engine: &E,
    settings: &BatchSettings,
    report: &mut JobReport,
) -> Result<JobStatus> {
    report.enter(Phase::Staging);
    let paths = SandboxPaths::new(&report.sandbox, &settings.files);
    sandbox::prepare(&paths)?;
    let warnings = sandbox::stage(&paths, &prepared.dependencies, &settings.files.tape_prefix);
    report.warnings.extend(warnings);
    sandbox::write_input(&paths, &prepared.text)?;

    report.enter(Phase::Invoking);
    let invocation = engine.invoke(&InvokeRequest {
        workdir: paths.dir.clone(),
        input: prepared.text,
        timeout: settings.timeout,
        output_limit_bytes: settings.output_limit_bytes,
    })?;

    report.enter(Phase::Collecting);
    sandbox::write_logs(&paths, &invocation)?;
    let status = if invocation.timed_out {
        JobStatus::TimedOut
    } else if invocation.succeeded() {
        JobStatus::Succeeded
    } else {
        JobStatus::Failed {
            exit_code: invocation.exit_code,
        }
    };
    if !status.is_success() {
        report.output_tail = invocation.tail(settings.tail_lines);
    }
    Ok(status)
}

/// Write `job.json` when the sandbox exists. Failures only warn.
pub(crate) fn record(report: &JobReport, settings: &BatchSettings) {
    let paths = SandboxPaths::new(&report.sandbox, &settings.files);
    if !paths.dir.is_dir() {
        return;
    }
    if let Err(err) = sandbox::write_meta(&paths, report) {
        warn!(job = report.id, err = %format!("{err:#}"), "failed to write job meta");
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one job against the deck and restore the deck afterwards.
///
/// Engine failures, staging errors and panics in any phase before Restoring
/// are recorded in the report. Only a failed restore is returned as an error.
#[instrument(skip_all, fields(job = plan.id, dir = %plan.dir_name))]
pub fn run_job<E: Engine>(
    deck: &mut Deck,
    plan: &JobPlan,
    engine: &E,
    settings: &BatchSettings,
) -> Result<JobReport, RestoreError> {
    let start = Instant::now();
    info!(assignments = %plan.describe(), "job started");
    let mut report = JobReport::new(plan.id, &plan.dir_name, settings);
    report.assignments = plan.assignments.clone();

    report.enter(Phase::Snapshotting);
    let snapshot = Snapshot::capture(deck);

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<JobStatus> {
        let overrides = apply(deck, &plan.assignments, &mut report);
        let prepared = serialize(deck, &overrides, settings, &mut report);
        launch(prepared, engine, settings, &mut report)
    }));
    report.status = match attempt {
        Ok(Ok(status)) => status,
        Ok(Err(err)) => {
            warn!(err = %format!("{err:#}"), "job error");
            JobStatus::Error {
                message: format!("{err:#}"),
            }
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(%message, "job panicked");
            JobStatus::Error {
                message: format!("panic: {message}"),
            }
        }
    };
    record(&report, settings);

    report.enter(Phase::Restoring);
    if let Err(err) = snapshot.restore(deck) {
        error!(err = %err, "restore failed");
        return Err(err);
    }
    report.enter(Phase::Idle);
    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(status = ?report.status, duration_ms = report.duration_ms, "job finished");
    Ok(report)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub jobs: Vec<JobReport>,
    /// The cancellation flag stopped the batch before every plan ran.
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.jobs.len()
    }

    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|job| job.status.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|job| !job.status.is_success())
    }
}

/// A restore failure stopped the batch. `summary` holds the jobs that
/// finished before it.
#[derive(Debug, thiserror::Error)]
#[error("batch halted after job {job_id}: {source}")]
pub struct BatchHalted {
    pub summary: BatchSummary,
    pub job_id: usize,
    #[source]
    pub source: RestoreError,
}

/// Run every plan in order. `cancel` is checked between jobs; `on_job` sees
/// each report as soon as its job is restored. Writes `batch.json` under
/// the output root when the batch ends.
#[instrument(skip_all, fields(output_root = %settings.output_root.display()))]
pub fn run_batch<E, I, F>(
    deck: &mut Deck,
    plans: I,
    engine: &E,
    settings: &BatchSettings,
    cancel: &AtomicBool,
    mut on_job: F,
) -> Result<BatchSummary, BatchHalted>
where
    E: Engine,
    I: IntoIterator<Item = JobPlan>,
    F: FnMut(&JobReport),
{
    let started_at = Utc::now();
    let start = Instant::now();
    let mut summary = BatchSummary::default();

    for plan in plans {
        if cancel.load(Ordering::SeqCst) {
            info!(completed = summary.total(), "batch cancelled");
            summary.cancelled = true;
            break;
        }
        match run_job(deck, &plan, engine, settings) {
            Ok(report) => {
                on_job(&report);
                summary.jobs.push(report);
            }
            Err(source) => {
                let halted = format!("job {}: {source}", plan.id);
                write_summary(&summary, settings, started_at, start, Some(halted));
                return Err(BatchHalted {
                    summary,
                    job_id: plan.id,
                    source,
                });
            }
        }
    }

    info!(
        total = summary.total(),
        succeeded = summary.succeeded(),
        "batch finished"
    );
    write_summary(&summary, settings, started_at, start, None);
    Ok(summary)
}

fn write_summary(
    summary: &BatchSummary,
    settings: &BatchSettings,
    started_at: chrono::DateTime<Utc>,
    start: Instant,
    halted: Option<String>,
) {
    let log = BatchLog {
        started_at: timestamp(started_at),
        ended_at: timestamp(Utc::now()),
        duration_ms: start.elapsed().as_millis() as u64,
        total: summary.total(),
        succeeded: summary.succeeded(),
        cancelled: summary.cancelled,
        halted,
        jobs: &summary.jobs,
    };
    if let Err(err) = write_batch_log(&settings.output_root, &log) {
        warn!(err = %format!("{err:#}"), "failed to write batch log");
    }
}
