//! Non-swept runs with the engine call on a worker thread.
//!
//! The deck is rendered on the caller's thread; only the rendered text and
//! the staging list cross to the worker. [`SingleRun`] keeps the deck
//! mutably borrowed until it is joined, so the deck cannot change while the
//! engine may still be reading the sandboxed input.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument};

use crate::batch::{self, BatchSettings, JobReport, JobStatus, Phase};
use crate::core::deck::Deck;
use crate::core::plan::dir_name;
use crate::io::engine::Engine;

/// A run in flight. Dropping it detaches the worker; call [`SingleRun::wait`]
/// to get the report.
pub struct SingleRun<'d> {
    deck: &'d mut Deck,
    handle: JoinHandle<JobReport>,
}

impl<'d> SingleRun<'d> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Join the worker and hand the deck back.
    pub fn wait(self) -> Result<(JobReport, &'d mut Deck)> {
        let report = self
            .handle
            .join()
            .map_err(|payload| anyhow!("run worker panicked: {}", batch::panic_message(payload.as_ref())))?;
        Ok((report, self.deck))
    }
}

/// Render `deck` and start staging and invocation on a worker thread.
#[instrument(skip_all, fields(output_root = %settings.output_root.display()))]
pub fn spawn_single<'d, E>(
    deck: &'d mut Deck,
    engine: E,
    settings: BatchSettings,
) -> Result<SingleRun<'d>>
where
    E: Engine + Send + 'static,
{
    let start = Instant::now();
    let name = dir_name(1, &[]);
    let mut report = JobReport::new(1, &name, &settings);
    let prepared = batch::serialize(deck, &BTreeMap::new(), &settings, &mut report);
    info!(dir = %name, "single run started");

    let handle = thread::Builder::new()
        .name("deckrun-single".to_string())
        .spawn(move || {
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                batch::launch(prepared, &engine, &settings, &mut report)
            }));
            report.status = match attempt {
                Ok(Ok(status)) => status,
                Ok(Err(err)) => JobStatus::Error {
                    message: format!("{err:#}"),
                },
                Err(payload) => JobStatus::Error {
                    message: format!("panic: {}", batch::panic_message(payload.as_ref())),
                },
            };
            report.phases.push(Phase::Idle);
            report.duration_ms = start.elapsed().as_millis() as u64;
            batch::record(&report, &settings);
            info!(status = ?report.status, "single run finished");
            report
        })
        .context("spawn run worker")?;

    Ok(SingleRun { deck, handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules;
    use crate::test_support::{ScriptedEngine, ScriptedRun, settings};

    #[test]
    fn single_run_stages_and_reports() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut settings = settings(temp.path());
        let endf = temp.path().join("n-001_H_001.endf");
        std::fs::write(&endf, "endf").expect("write endf");
        settings.tapes.insert(20, endf);
        let mut deck = Deck::from_modules(vec![modules::registry().create("RECONR").expect("reconr")]);
        let engine = ScriptedEngine::new(vec![ScriptedRun::Exit(0)]);

        let run = spawn_single(&mut deck, engine.clone(), settings).expect("spawn");
        let (report, deck) = run.wait().expect("wait");

        assert!(report.status.is_success());
        assert_eq!(report.dir_name, "Run_1");
        assert!(report.sandbox.join("tape20").exists());
        assert!(report.sandbox.join("input.inp").exists());
        assert!(report.sandbox.join("job.json").exists());
        assert_eq!(engine.calls()[0].input, deck.render().text);
    }

    #[test]
    fn failed_exit_keeps_output_tail() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut deck = Deck::from_modules(vec![modules::registry().create("MODER").expect("moder")]);
        let engine = ScriptedEngine::new(vec![ScriptedRun::Exit(2)]);

        let (report, _) = spawn_single(&mut deck, engine, settings(temp.path()))
            .expect("spawn")
            .wait()
            .expect("wait");

        assert_eq!(report.status, JobStatus::Failed { exit_code: Some(2) });
        assert!(!report.output_tail.is_empty());
        assert!(report.warnings.iter().any(|w| w.starts_with("unit 20")));
    }
}
