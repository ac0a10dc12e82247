//! Batch lifecycle tests against built-in modules and a scripted engine.
//!
//! Each test builds a real deck, sweeps it through `run_batch`, and checks
//! the sandboxes on disk and the deck state afterwards.

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use deckrun::batch::{JobStatus, Phase, run_batch};
use deckrun::core::deck::Deck;
use deckrun::core::plan::{Binding, Sweep};
use deckrun::core::target::FieldTarget;
use deckrun::modules;
use deckrun::test_support::{ScriptedEngine, ScriptedRun, repeat_module, workspace};

fn deck(tags: &[&str]) -> Deck {
    let registry = modules::registry();
    Deck::from_modules(
        tags.iter()
            .map(|tag| registry.create(tag).expect("registered"))
            .collect(),
    )
}

fn bind(sweep: &mut Sweep, deck: &Deck, target: &str, values: &[String]) {
    let target: FieldTarget = target.parse().expect("target");
    sweep
        .add(Binding::new(deck, target, values.to_vec()).expect("binding"))
        .expect("add");
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn write(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write fixture");
}

/// Verifies a temperature x file sweep produces four sandboxes, each with
/// its own staged PENDF tape, the library ENDF tape and its deck.
#[test]
fn temperature_by_file_sweep_stages_every_sandbox() {
    let (temp, mut settings) = workspace();
    let endf = temp.path().join("n-092_U_235.endf");
    let pendf_a = temp.path().join("a.pendf");
    let pendf_b = temp.path().join("b.pendf");
    write(&endf, "endf");
    write(&pendf_a, "pendf a");
    write(&pendf_b, "pendf b");
    settings.tapes.insert(20, endf);

    let mut deck = deck(&["BROADR"]);
    let before = deck.render();
    let mut sweep = Sweep::new();
    bind(&mut sweep, &deck, "1:c4_1.temp_1", &strings(&["300", "600"]));
    bind(
        &mut sweep,
        &deck,
        "1:c1.nin",
        &[
            pendf_a.display().to_string(),
            pendf_b.display().to_string(),
        ],
    );
    assert!(sweep.bindings()[1].file_role);
    assert_eq!(sweep.total_jobs(), 4);

    let engine = ScriptedEngine::new(vec![ScriptedRun::Exit(0); 4]);
    let cancel = AtomicBool::new(false);
    let summary = run_batch(&mut deck, sweep.plans(), &engine, &settings, &cancel, |_| {})
        .expect("batch");

    assert_eq!(summary.total(), 4);
    assert_eq!(summary.succeeded(), 4);
    let dirs: Vec<&str> = summary.jobs.iter().map(|j| j.dir_name.as_str()).collect();
    assert_eq!(
        dirs,
        vec![
            "Run_1_temp_1_300_nin_appendf",
            "Run_2_temp_1_300_nin_bppendf",
            "Run_3_temp_1_600_nin_appendf",
            "Run_4_temp_1_600_nin_bppendf",
        ]
    );
    for (job, (temperature, tape)) in summary.jobs.iter().zip([
        ("300", "pendf a"),
        ("300", "pendf b"),
        ("600", "pendf a"),
        ("600", "pendf b"),
    ]) {
        let dir = settings.output_root.join(&job.dir_name);
        assert_eq!(fs::read_to_string(dir.join("tape21")).expect("tape21"), tape);
        assert_eq!(fs::read_to_string(dir.join("tape20")).expect("tape20"), "endf");
        let input = fs::read_to_string(dir.join("input.inp")).expect("input");
        assert!(input.contains(&format!("\n{temperature}/\n")), "{input}");
        // The file binding stages a tape but leaves the unit number alone.
        assert!(input.starts_with("broadr\n20 21 22/\n"));
        assert!(dir.join("output.log").exists());
        assert!(dir.join("job.json").exists());
        assert!(!dir.join("error.log").exists());
        assert!(job.warnings.is_empty(), "{:?}", job.warnings);
    }
    assert!(settings.output_root.join("batch.json").exists());
    assert_eq!(deck.render(), before);
}

/// Verifies a non-zero exit is recorded and the batch moves on, with the
/// deck restored after every job.
#[test]
fn failing_job_does_not_stop_the_batch() {
    let (_temp, settings) = workspace();
    let mut deck = deck(&["RECONR", "BROADR"]);
    let before = deck.render();
    let mut sweep = Sweep::new();
    bind(&mut sweep, &deck, "2:c4_1.temp_1", &strings(&["300", "600", "900"]));

    let engine = ScriptedEngine::new(vec![
        ScriptedRun::Exit(0),
        ScriptedRun::Exit(3),
        ScriptedRun::Exit(0),
    ]);
    let cancel = AtomicBool::new(false);
    let mut seen = Vec::new();
    let summary = run_batch(&mut deck, sweep.plans(), &engine, &settings, &cancel, |report| {
        seen.push(report.id);
    })
    .expect("batch");

    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(summary.succeeded(), 2);
    let failed: Vec<_> = summary.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].status, JobStatus::Failed { exit_code: Some(3) });
    assert!(failed[0].output_tail.iter().any(|line| line == "exit 3"));
    assert!(failed[0].sandbox.join("error.log").exists());
    for job in &summary.jobs {
        assert_eq!(&job.phases[job.phases.len() - 2..], &[Phase::Restoring, Phase::Idle]);
    }
    // RECONR produces unit 21 for BROADR; only the ENDF tape is external.
    assert!(
        summary.jobs[0]
            .warnings
            .iter()
            .all(|w| w.starts_with("unit 20"))
    );
    assert_eq!(deck.render(), before);
}

/// Verifies an engine panic after a structural assignment still restores
/// the original layout, and the next job runs normally.
#[test]
fn panic_mid_job_restores_structural_change() {
    let (_temp, settings) = workspace();
    let mut deck = deck(&["BROADR"]);
    let before = deck.render();
    let mut sweep = Sweep::new();
    bind(&mut sweep, &deck, "1:c_gui.nmat", &strings(&["3", "1"]));

    let engine = ScriptedEngine::new(vec![ScriptedRun::Panic, ScriptedRun::Exit(0)]);
    let cancel = AtomicBool::new(false);
    let summary = run_batch(&mut deck, sweep.plans(), &engine, &settings, &cancel, |_| {})
        .expect("batch");

    let calls = engine.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].input.matches("293.6/").count(), 3);
    assert_eq!(calls[1].input.matches("293.6/").count(), 1);
    match &summary.jobs[0].status {
        JobStatus::Error { message } => assert!(message.contains("panic")),
        other => panic!("expected panic error, got {other:?}"),
    }
    assert!(summary.jobs[1].status.is_success());
    assert_eq!(deck.render(), before);
    assert!(deck.module(0).expect("broadr").group("c2_2").is_none());
}

#[test]
fn selected_jobs_only() {
    let (_temp, settings) = workspace();
    let mut deck = deck(&["HEATR"]);
    let mut sweep = Sweep::new();
    bind(&mut sweep, &deck, "1:c2.matd", &strings(&["125", "9228", "9237"]));

    let engine = ScriptedEngine::new(vec![ScriptedRun::Exit(0)]);
    let cancel = AtomicBool::new(false);
    let plans = sweep.plans().filter(|plan| plan.id == 3);
    let summary =
        run_batch(&mut deck, plans, &engine, &settings, &cancel, |_| {}).expect("batch");

    assert_eq!(summary.total(), 1);
    assert_eq!(summary.jobs[0].dir_name, "Run_3_matd_9237");
    assert!(engine.calls()[0].input.contains("\n9237 0 0 0 0 0/\n"));
}

/// Verifies raising a count from 1 to 3 yields three repeated groups with
/// defaults, and that a sweep over the count restores the single block.
#[test]
fn count_field_drives_repeated_groups() {
    let (_temp, settings) = workspace();
    let mut deck = Deck::from_modules(vec![repeat_module()]);
    deck.set_value(&"1:block_1.value_1".parse().expect("target"), "7")
        .expect("set");
    let before = deck.render();

    let mut grown = deck.clone();
    grown
        .set_value(&"1:c1.count".parse().expect("target"), "3")
        .expect("grow");
    let blocks: Vec<&str> = grown
        .module(0)
        .expect("repeat")
        .groups()
        .iter()
        .map(|g| g.name.as_str())
        .filter(|name| name.starts_with("block_"))
        .collect();
    assert_eq!(blocks, vec!["block_1", "block_2", "block_3"]);
    assert_eq!(grown.render().text, "repeat\n3/\n7/\n0/\n0/\nstop\n");

    let mut sweep = Sweep::new();
    bind(&mut sweep, &deck, "1:c1.count", &strings(&["2", "3"]));
    let engine = ScriptedEngine::new(vec![ScriptedRun::Exit(0); 2]);
    let cancel = AtomicBool::new(false);
    run_batch(&mut deck, sweep.plans(), &engine, &settings, &cancel, |_| {}).expect("batch");

    let calls = engine.calls();
    assert_eq!(calls[0].input, "repeat\n2/\n7/\n0/\nstop\n");
    assert_eq!(calls[1].input, "repeat\n3/\n7/\n0/\n0/\nstop\n");
    assert_eq!(deck.render(), before);
}

/// Verifies sweeping the RECONR material count restores nested comment
/// cards after every job instead of halting the batch.
#[test]
fn material_count_sweep_restores_nested_comments() {
    let (_temp, settings) = workspace();
    let mut deck = deck(&["RECONR"]);
    deck.set_value(&"1:c2.nmat".parse().expect("target"), "2")
        .expect("nmat");
    deck.set_value(&"1:c3_2.ncards_2".parse().expect("target"), "2")
        .expect("ncards_2");
    deck.set_value(&"1:comment_2_1.cards5_2_1".parse().expect("target"), "second")
        .expect("comment");
    let before = deck.render();

    let mut sweep = Sweep::new();
    bind(&mut sweep, &deck, "1:c2.nmat", &strings(&["1", "3"]));
    let engine = ScriptedEngine::new(vec![ScriptedRun::Exit(0); 2]);
    let cancel = AtomicBool::new(false);
    let summary = run_batch(&mut deck, sweep.plans(), &engine, &settings, &cancel, |_| {})
        .expect("batch must not halt");

    assert_eq!(summary.succeeded(), 2);
    assert!(!engine.calls()[0].input.contains("second"));
    assert!(engine.calls()[1].input.contains("'second'/"));
    assert_eq!(deck.render(), before);
    assert!(deck.render().errors.is_empty());
}

/// Verifies a second batch into the same output root starts from empty
/// sandboxes: no error log or tape survives from the first batch.
#[test]
fn rerun_into_same_root_starts_clean() {
    let (temp, mut settings) = workspace();
    let endf = temp.path().join("n-092_U_235.endf");
    write(&endf, "endf");
    settings.tapes.insert(20, endf);
    let cancel = AtomicBool::new(false);

    let mut deck = deck(&["BROADR"]);
    let mut sweep = Sweep::new();
    bind(&mut sweep, &deck, "1:c4_1.temp_1", &strings(&["300"]));

    let engine = ScriptedEngine::new(vec![ScriptedRun::Exit(3)]);
    let failed = run_batch(&mut deck, sweep.plans(), &engine, &settings, &cancel, |_| {})
        .expect("first batch");
    let sandbox = failed.jobs[0].sandbox.clone();
    assert!(sandbox.join("error.log").exists());
    assert!(sandbox.join("tape20").exists());

    settings.tapes.clear();
    let engine = ScriptedEngine::new(vec![ScriptedRun::Exit(0)]);
    let rerun = run_batch(&mut deck, sweep.plans(), &engine, &settings, &cancel, |_| {})
        .expect("second batch");

    assert!(rerun.jobs[0].status.is_success());
    assert_eq!(rerun.jobs[0].sandbox, sandbox);
    assert!(!sandbox.join("error.log").exists());
    assert!(!sandbox.join("tape20").exists());
    assert!(sandbox.join("output.log").exists());
    assert!(sandbox.join("input.inp").exists());
}
