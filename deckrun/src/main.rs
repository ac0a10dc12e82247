//! Deck builder and parameter-sweep runner.
//!
//! Projects are JSON files listing module records (`deckrun new`). Commands
//! render them to engine input, check them, and run them once or across a
//! Cartesian sweep of field values, one sandbox per job under the configured
//! output directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};

use deckrun::batch::{BatchSettings, JobReport, run_batch};
use deckrun::core::deck::Deck;
use deckrun::core::plan::{Binding, Sweep, parse_candidates};
use deckrun::core::target::FieldTarget;
use deckrun::exit_codes;
use deckrun::io::batch_log::{STOP_FILE, clear_stop_request, stop_file_path, stop_requested};
use deckrun::io::config::{DEFAULT_CONFIG_PATH, DeckConfig, load_config, write_config};
use deckrun::io::engine::ProcessEngine;
use deckrun::io::project::{open_deck, write_project};
use deckrun::logging;
use deckrun::modules;
use deckrun::single::spawn_single;

#[derive(Parser)]
#[command(
    name = "deckrun",
    version,
    about = "Build NJOY-style input decks and run parameter sweeps"
)]
struct Cli {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file if missing.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// List built-in module types.
    Modules,
    /// Create a project with default modules, in the given order.
    New {
        #[arg(required = true, value_name = "TYPE")]
        types: Vec<String>,
        /// Project file to write.
        #[arg(short, long)]
        output: PathBuf,
        /// Overwrite an existing project.
        #[arg(short, long)]
        force: bool,
    },
    /// Set field values in a project, rebuilding layouts as needed.
    Set {
        project: PathBuf,
        /// `M:GROUP.FIELD=VALUE`, module numbers starting at 1.
        #[arg(required = true, value_name = "ASSIGNMENT")]
        assignments: Vec<String>,
    },
    /// Print the engine input for a project.
    Render {
        project: PathBuf,
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report fields whose values fail validation.
    Validate { project: PathBuf },
    /// List every settable field of active groups.
    Targets { project: PathBuf },
    /// Run the project once.
    Run { project: PathBuf },
    /// Run every combination of the given values.
    Sweep {
        project: PathBuf,
        /// `M:GROUP.FIELD=V1,V2,...`; repeat for more variables.
        #[arg(long = "var", required = true, value_name = "BINDING")]
        vars: Vec<String>,
        /// Only run these job ids (comma separated).
        #[arg(long, value_delimiter = ',')]
        jobs: Vec<usize>,
        /// Print the job list without running anything.
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Modules => cmd_modules(),
        Command::New {
            types,
            output,
            force,
        } => cmd_new(&types, &output, force),
        Command::Set {
            project,
            assignments,
        } => cmd_set(&project, &assignments),
        Command::Render { project, output } => cmd_render(&project, output.as_deref()),
        Command::Validate { project } => cmd_validate(&project),
        Command::Targets { project } => cmd_targets(&project),
        Command::Run { project } => cmd_run(&cli.config, &project),
        Command::Sweep {
            project,
            vars,
            jobs,
            dry_run,
        } => cmd_sweep(&cli.config, &project, &vars, &jobs, dry_run),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if !force && config_path.exists() {
        println!("{} already exists", config_path.display());
        return Ok(exit_codes::OK);
    }
    write_config(config_path, &DeckConfig::default())?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_modules() -> Result<i32> {
    let registry = modules::registry();
    for tag in registry.tags() {
        if let Some(module) = registry.create(tag) {
            println!("{tag:<8} {}", module.description());
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_new(types: &[String], output: &Path, force: bool) -> Result<i32> {
    if !force && output.exists() {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    let registry = modules::registry();
    let modules = types
        .iter()
        .map(|tag| {
            registry
                .create(tag)
                .ok_or_else(|| anyhow!("unknown module type '{tag}' (see `deckrun modules`)"))
        })
        .collect::<Result<Vec<_>>>()?;
    write_project(output, &Deck::from_modules(modules))?;
    println!("wrote {}", output.display());
    Ok(exit_codes::OK)
}

fn cmd_set(project: &Path, assignments: &[String]) -> Result<i32> {
    let mut deck = load_deck(project)?;
    for raw in assignments {
        let (target, value) = parse_assignment(raw)?;
        deck.set_value(&target, &value)
            .with_context(|| format!("set {target}"))?;
    }
    write_project(project, &deck)?;
    Ok(report_invalid(&mut deck))
}

fn cmd_render(project: &Path, output: Option<&Path>) -> Result<i32> {
    let deck = load_deck(project)?;
    let rendered = deck.render();
    match output {
        Some(path) => {
            fs::write(path, &rendered.text).with_context(|| format!("write {}", path.display()))?
        }
        None => print!("{}", rendered.text),
    }
    for error in &rendered.errors {
        eprintln!("{error}");
    }
    Ok(if rendered.errors.is_empty() {
        exit_codes::OK
    } else {
        exit_codes::INVALID
    })
}

fn cmd_validate(project: &Path) -> Result<i32> {
    let mut deck = load_deck(project)?;
    let rendered = deck.render();
    for error in &rendered.errors {
        println!("{error}");
    }
    let code = report_invalid(&mut deck);
    if code == exit_codes::OK && rendered.errors.is_empty() {
        println!("ok");
        return Ok(exit_codes::OK);
    }
    Ok(exit_codes::INVALID)
}

fn cmd_targets(project: &Path) -> Result<i32> {
    let deck = load_deck(project)?;
    for target in deck.targets() {
        let field = deck.resolve(&target)?;
        let role = if field.is_input_file() {
            " [input file]"
        } else if field.is_output_file() {
            " [output file]"
        } else {
            ""
        };
        println!(
            "{target}\t{:?}\t{}{role}",
            field.value, field.description
        );
    }
    Ok(exit_codes::OK)
}

fn cmd_run(config_path: &Path, project: &Path) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let settings = BatchSettings::from_config(&cfg)?;
    let engine = ProcessEngine::from_command(&cfg.engine.command)?;
    let mut deck = load_deck(project)?;

    let (report, _) = spawn_single(&mut deck, engine, settings)?.wait()?;
    print_job(&report, 1, 1);
    print_failure(&report);
    Ok(if report.status.is_success() {
        exit_codes::OK
    } else {
        exit_codes::JOB_FAILED
    })
}

fn cmd_sweep(
    config_path: &Path,
    project: &Path,
    vars: &[String],
    jobs: &[usize],
    dry_run: bool,
) -> Result<i32> {
    let mut deck = load_deck(project)?;
    let sweep = build_sweep(&deck, vars)?;
    let total = sweep.total_jobs();
    if let Some(id) = jobs.iter().find(|id| **id == 0 || **id > total) {
        bail!("job id {id} is outside 1..={total}");
    }
    let sweep = &sweep;
    let selected = move || {
        sweep
            .plans()
            .filter(move |plan| jobs.is_empty() || jobs.contains(&plan.id))
    };

    if dry_run {
        for plan in selected() {
            println!("{}\t{}\t{}", plan.id, plan.dir_name, plan.describe());
        }
        return Ok(exit_codes::OK);
    }

    let cfg = load_config(config_path)?;
    let settings = BatchSettings::from_config(&cfg)?;
    let engine = ProcessEngine::from_command(&cfg.engine.command)?;
    if clear_stop_request(&settings.output_root)? {
        eprintln!("removed stale {}", stop_file_path(&settings.output_root).display());
    }
    let cancel = AtomicBool::new(false);
    let count = if jobs.is_empty() {
        total
    } else {
        jobs.iter().collect::<BTreeSet<_>>().len()
    };

    let mut done = 0;
    let summary = match run_batch(&mut deck, selected(), &engine, &settings, &cancel, |report| {
        done += 1;
        print_job(report, done, count);
        if stop_requested(&settings.output_root) {
            cancel.store(true, Ordering::SeqCst);
        }
    }) {
        Ok(summary) => summary,
        Err(halted) => {
            eprintln!("{halted}");
            eprintln!(
                "{}/{} jobs succeeded before the batch stopped",
                halted.summary.succeeded(),
                halted.summary.total()
            );
            return Ok(exit_codes::RESTORE_FAILED);
        }
    };

    if summary.cancelled {
        println!(
            "cancelled after {} of {count} jobs ({} found)",
            summary.total(),
            STOP_FILE
        );
        clear_stop_request(&settings.output_root)?;
    }
    println!("{}/{} jobs succeeded", summary.succeeded(), summary.total());
    for report in summary.failed() {
        print_failure(report);
    }
    Ok(if summary.failed().next().is_none() {
        exit_codes::OK
    } else {
        exit_codes::JOB_FAILED
    })
}

fn load_deck(project: &Path) -> Result<Deck> {
    let (deck, skipped) = open_deck(project, &modules::registry())?;
    for message in skipped {
        eprintln!("warning: {}: {message}", project.display());
    }
    Ok(deck)
}

/// Print invalid targets; returns the exit code they imply.
fn report_invalid(deck: &mut Deck) -> i32 {
    let invalid = deck.validate();
    for target in &invalid {
        let value = deck
            .resolve(target)
            .map(|field| field.value.clone())
            .unwrap_or_default();
        println!("invalid: {target} = {value:?}");
    }
    if invalid.is_empty() {
        exit_codes::OK
    } else {
        exit_codes::INVALID
    }
}

/// `M:GROUP.FIELD=VALUE`
fn parse_assignment(raw: &str) -> Result<(FieldTarget, String)> {
    let (target, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected M:GROUP.FIELD=VALUE, got '{raw}'"))?;
    let target: FieldTarget = target
        .trim()
        .parse()
        .with_context(|| format!("parse target in '{raw}'"))?;
    Ok((target, value.trim().to_string()))
}

fn build_sweep(deck: &Deck, vars: &[String]) -> Result<Sweep> {
    let mut sweep = Sweep::new();
    for raw in vars {
        let (target, values) = parse_assignment(raw)?;
        let binding = Binding::new(deck, target, parse_candidates(&values))
            .with_context(|| format!("bind '{raw}'"))?;
        sweep.add(binding).with_context(|| format!("bind '{raw}'"))?;
    }
    Ok(sweep)
}

fn print_job(report: &JobReport, position: usize, total: usize) {
    println!(
        "[{position}/{total}] job {} {} {}",
        report.id, report.dir_name, report.status
    );
    for message in report.skipped.iter().chain(&report.warnings) {
        println!("    warning: {message}");
    }
}

fn print_failure(report: &JobReport) {
    if report.status.is_success() {
        return;
    }
    println!("--- {} ({}) ---", report.dir_name, report.status);
    for line in &report.output_tail {
        println!("    {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["deckrun", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn parse_sweep_with_repeated_vars() {
        let cli = Cli::parse_from([
            "deckrun",
            "sweep",
            "deck.json",
            "--var",
            "1:c4_1.temp_1=300,600",
            "--var",
            "1:c1.nin=a.pendf b.pendf",
            "--jobs",
            "1,3",
            "--config",
            "alt.toml",
        ]);
        let Command::Sweep {
            vars,
            jobs,
            dry_run,
            ..
        } = cli.command
        else {
            panic!("expected sweep");
        };
        assert_eq!(vars.len(), 2);
        assert_eq!(jobs, vec![1, 3]);
        assert!(!dry_run);
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
    }

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        let (target, value) = parse_assignment("2:c3.hk=a=b").expect("parse");
        assert_eq!(target, FieldTarget::new(1, "c3", "hk"));
        assert_eq!(value, "a=b");
        assert!(parse_assignment("2:c3.hk").is_err());
        assert!(parse_assignment("0:c3.hk=1").is_err());
    }

    #[test]
    fn build_sweep_rejects_duplicates() {
        let deck = Deck::from_modules(vec![modules::registry().create("BROADR").expect("broadr")]);
        let vars = vec![
            "1:c4_1.temp_1=300".to_string(),
            "1:c4_1.temp_1=600".to_string(),
        ];
        assert!(build_sweep(&deck, &vars).is_err());
        let sweep = build_sweep(&deck, &vars[..1]).expect("sweep");
        assert_eq!(sweep.total_jobs(), 1);
    }
}
