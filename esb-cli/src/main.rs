//! ESB CLI - run and test Advent of Code solutions under the FIREPLACE protocol
#![deny(clippy::wildcard_enum_match_arm)]

mod cases;
mod config;
mod db;
mod lang;
mod status;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use esb_core::{ExecutionResult, ExecutionStatus, InputSource, Invocation, Part, RunningTime};
use esb_fireplace::Runner;
use tokio::io::{AsyncReadExt, Stderr};
use tracing_subscriber::EnvFilter;

use crate::cases::load_cases;
use crate::config::{Repo, DB_ENV, ROOT_ENV};
use crate::db::{RunFilter, RunRecord, RunStore};
use crate::lang::{pad_day, LangSpec};
use crate::status::{completion, days_header, LangCompletion, LAST_DAY};

/// ESB - Script your way to rescue Christmas
#[derive(Parser)]
#[command(name = "esb", version, about)]
struct Cli {
    /// Repository root (default: $ESB_ROOT, then the nearest directory with an esb.toml)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run any command under the FIREPLACE protocol
    Exec {
        /// Puzzle part
        #[arg(short, long, default_value = "1")]
        part: Part,

        /// Read the puzzle input from a file
        #[arg(long, conflicts_with = "input_text")]
        input: Option<PathBuf>,

        /// Puzzle input text (default: read stdin)
        #[arg(long)]
        input_text: Option<String>,

        /// Working directory
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Extra arguments passed to the solution after --args
        #[arg(long, num_args = 1..)]
        args: Option<Vec<String>>,

        /// Command and arguments (after --)
        #[arg(last = true, required = true)]
        cmd: Vec<String>,
    },

    /// Run solutions on their puzzle inputs
    Run {
        /// Registered language (see esb.toml)
        #[arg(long)]
        lang: String,

        /// Puzzle years (repeatable)
        #[arg(
            long = "year",
            required = true,
            value_parser = clap::value_parser!(u16).range(2015..)
        )]
        years: Vec<u16>,

        /// Puzzle days (repeatable)
        #[arg(
            long = "day",
            required_unless_present = "all_days",
            conflicts_with = "all_days",
            value_parser = clap::value_parser!(u8).range(1..=25)
        )]
        days: Vec<u8>,

        /// Run every day of the selected years
        #[arg(long)]
        all_days: bool,

        /// Parts to run (default: both)
        #[arg(short, long = "part")]
        parts: Vec<Part>,
    },

    /// Run a solution against its example test cases
    Test {
        #[command(flatten)]
        puzzle: PuzzleArgs,

        /// Parts to test (default: both)
        #[arg(short, long = "part")]
        parts: Vec<Part>,

        /// Only run cases whose name contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Record the accepted answer of a puzzle part
    Answer {
        #[arg(long, value_parser = clap::value_parser!(u16).range(2015..))]
        year: u16,

        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=25))]
        day: u8,

        #[arg(short, long)]
        part: Part,

        answer: String,
    },

    /// List recorded runs
    History {
        #[arg(long)]
        year: Option<u16>,

        #[arg(long)]
        day: Option<u8>,

        #[arg(long)]
        lang: Option<String>,

        /// Show last N runs
        #[arg(long, default_value = "20")]
        recent: u32,

        /// Show all runs (ignore --recent)
        #[arg(long)]
        all: bool,
    },

    /// Show solved puzzle parts per year and language
    Status {
        #[arg(long)]
        year: Option<u16>,

        #[arg(long)]
        lang: Option<String>,
    },
}

#[derive(clap::Args)]
struct PuzzleArgs {
    /// Registered language (see esb.toml)
    #[arg(long)]
    lang: String,

    #[arg(long, value_parser = clap::value_parser!(u16).range(2015..))]
    year: u16,

    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=25))]
    day: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let result = run(cli).await;

    if let Err(e) = &result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Exec {
            part,
            input,
            input_text,
            cwd,
            args,
            cmd,
        } => {
            cmd_exec(
                &cli,
                *part,
                input.clone(),
                input_text.clone(),
                cwd.clone(),
                args.clone(),
                cmd.clone(),
            )
            .await
        }

        Commands::Run {
            lang,
            years,
            days,
            all_days: _,
            parts,
        } => cmd_run(&cli, lang, &selected_puzzles(years, days), parts).await,

        Commands::Test {
            puzzle,
            parts,
            filter,
        } => cmd_test(&cli, puzzle, parts, filter.as_deref()).await,

        Commands::Answer {
            year,
            day,
            part,
            answer,
        } => cmd_answer(&cli, *year, *day, *part, answer).await,

        Commands::History {
            year,
            day,
            lang,
            recent,
            all,
        } => {
            let filter = RunFilter {
                year: *year,
                day: *day,
                language: lang.clone(),
                limit: if *all { None } else { Some(*recent) },
            };
            cmd_history(&cli, &filter).await
        }

        Commands::Status { year, lang } => cmd_status(&cli, *year, lang.as_deref()).await,
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_exec(
    cli: &Cli,
    part: Part,
    input: Option<PathBuf>,
    input_text: Option<String>,
    cwd: Option<PathBuf>,
    args: Option<Vec<String>>,
    cmd: Vec<String>,
) -> Result<()> {
    let cwd = match cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let input = match (input, input_text) {
        (Some(path), _) => InputSource::File(path),
        (None, Some(text)) => InputSource::Text(text),
        (None, None) => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read puzzle input from stdin")?;
            InputSource::Text(text)
        }
    };

    let mut invocation = Invocation::new(cmd, part, cwd, input);
    if let Some(args) = args {
        invocation = invocation.with_args(args);
    }

    let result = runner()
        .exec(&invocation)
        .await
        .with_context(|| format!("Failed to run `{}`", invocation.command.join(" ")))?;

    if cli.json {
        println!("{}", serde_json::to_string(&result)?);
    }

    match result.status() {
        ExecutionStatus::Ok => {
            if !cli.json {
                println!("{}", result.answer().unwrap_or_default());
                if let Some(rt) = result.timing() {
                    eprintln!("Running time: {}", rt.humanize(2));
                }
            }
            Ok(())
        }
        ExecutionStatus::InputMissing => bail!("Could not find the puzzle input"),
        ExecutionStatus::ProtocolViolation => {
            bail!("Solution does not follow the FIREPLACE protocol")
        }
    }
}

async fn cmd_run(cli: &Cli, lang: &str, puzzles: &[(u16, u8)], parts: &[Part]) -> Result<()> {
    let repo = open_repo(cli)?;
    let spec = repo.lang(lang)?;
    let store = open_store(&repo).await?;
    let single = puzzles.len() == 1;

    let mut runner = runner();
    let mut reports = Vec::new();
    let mut failures = 0;

    for &(year, day) in puzzles {
        let wd = match solution_dir(&repo, lang, year, day) {
            Ok(wd) => wd,
            Err(e) if !single => {
                tracing::debug!(year, day, "no solution, skipping");
                eprintln!("{e:#}, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };
        build(spec, year, day, &wd).await?;
        let command = spec.prepare_run_command(lang, year, day)?;
        let input = repo.input_path(year, day);

        if !single && !cli.json {
            println!("Year {year} day {}:", pad_day(day));
        }

        for part in selected_parts(parts) {
            let invocation = Invocation::new(
                command.iter().cloned(),
                part,
                &wd,
                InputSource::File(input.clone()),
            );
            let result = runner
                .exec(&invocation)
                .await
                .with_context(|| format!("Failed to run `{}`", command.join(" ")))?;

            let expected = store.answer(year, day, part).await?;
            let verdict = match result.status() {
                ExecutionStatus::Ok => {
                    let answer = result.answer().unwrap_or_default();
                    store
                        .insert_run(&RunRecord {
                            id: None,
                            ran_at: Utc::now(),
                            year,
                            day,
                            language: lang.to_string(),
                            part,
                            answer: answer.to_string(),
                            running_time: result.timing(),
                        })
                        .await
                        .context("Failed to record run")?;
                    verdict(answer, expected.as_deref())
                }
                ExecutionStatus::InputMissing => {
                    eprintln!(
                        "Could not find input for year {year} day {}. Please fetch again.",
                        pad_day(day)
                    );
                    Verdict::Failed
                }
                ExecutionStatus::ProtocolViolation => {
                    eprintln!(
                        "Solution for year {year} day {} does not follow the FIREPLACE protocol.",
                        pad_day(day)
                    );
                    Verdict::Failed
                }
            };

            if let Some(solved) = verdict.solved() {
                store
                    .set_solved(lang, year, day, part, solved, Utc::now())
                    .await
                    .context("Failed to record completion")?;
            }
            if verdict.is_failure() {
                failures += 1;
            }
            if !cli.json {
                print_verdict(part, &result, expected.as_deref(), verdict);
                if result.timing().is_some() {
                    let best = store
                        .best_run(year, day, part, lang)
                        .await?
                        .and_then(|run| run.running_time);
                    if let Some(best) = best {
                        println!("  Best {lang} time: {}", best.humanize(2));
                    }
                }
            }
            let mut report = report_json(part, &result, expected.as_deref(), verdict);
            report["year"] = serde_json::Value::from(year);
            report["day"] = serde_json::Value::from(day);
            reports.push(report);
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string(&reports)?);
    }

    if failures > 0 {
        bail!("{failures} of {} parts failed", reports.len());
    }
    Ok(())
}

async fn cmd_test(
    cli: &Cli,
    puzzle: &PuzzleArgs,
    parts: &[Part],
    filter: Option<&str>,
) -> Result<()> {
    let PuzzleArgs { lang, year, day } = puzzle;
    let (year, day) = (*year, *day);

    let repo = open_repo(cli)?;
    let spec = repo.lang(lang)?;

    let set = load_cases(&repo.tests_dir(year, day))?;
    for skipped in &set.skipped {
        eprintln!(
            "Skipping test {} in {}: {}",
            skipped.name,
            skipped.file.display(),
            skipped.reason
        );
    }

    let parts = selected_parts(parts);
    let selected: Vec<_> = parts
        .iter()
        .flat_map(|part| set.select(*part, filter))
        .collect();
    if selected.is_empty() {
        eprintln!(
            "No test cases found for year {year} day {}",
            pad_day(day)
        );
        return Ok(());
    }

    let wd = solution_dir(&repo, lang, year, day)?;
    build(spec, year, day, &wd).await?;
    let command = spec.prepare_run_command(lang, year, day)?;

    let mut runner = runner();
    let mut reports = Vec::new();
    let mut failures = 0;

    for case in selected {
        tracing::info!(case = %case.name, part = %case.part, "testing");
        let mut invocation = Invocation::new(
            command.iter().cloned(),
            case.part,
            &wd,
            InputSource::Text(case.input.clone()),
        );
        if let Some(args) = &case.args {
            invocation = invocation.with_args(args.iter().cloned());
        }

        let result = runner
            .exec(&invocation)
            .await
            .with_context(|| format!("Failed to run `{}`", command.join(" ")))?;

        let verdict = match result.status() {
            ExecutionStatus::Ok => verdict(result.answer().unwrap_or_default(), Some(&case.answer)),
            ExecutionStatus::InputMissing | ExecutionStatus::ProtocolViolation => Verdict::Failed,
        };
        if verdict.is_failure() {
            failures += 1;
        }

        if !cli.json {
            println!("Test {}:", case.name);
            print_verdict(case.part, &result, Some(&case.answer), verdict);
        }
        let mut report = report_json(case.part, &result, Some(&case.answer), verdict);
        report["name"] = serde_json::Value::from(case.name.as_str());
        reports.push(report);
    }

    if cli.json {
        println!("{}", serde_json::to_string(&reports)?);
    }

    if failures > 0 {
        bail!("{failures} of {} test cases failed", reports.len());
    }
    Ok(())
}

async fn cmd_answer(cli: &Cli, year: u16, day: u8, part: Part, answer: &str) -> Result<()> {
    let repo = open_repo(cli)?;
    let store = open_store(&repo).await?;

    store
        .set_answer(year, day, part, answer, Utc::now())
        .await
        .context("Failed to record answer")?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "year": year, "day": day, "part": part, "answer": answer })
        );
    } else {
        eprintln!(
            "Recorded answer pt{part} for year {year} day {}: {answer}",
            pad_day(day)
        );
    }
    Ok(())
}

async fn cmd_history(cli: &Cli, filter: &RunFilter) -> Result<()> {
    let repo = open_repo(cli)?;
    let store = open_store(&repo).await?;

    let runs = store
        .list_runs(filter)
        .await
        .context("Failed to load run history")?;

    if cli.json {
        println!("{}", serde_json::to_string(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        eprintln!("No runs found");
        return Ok(());
    }

    println!(
        "{:<23}  {:<4}  {:<3}  {:<8}  {:<4}  {:<10}  {}",
        "DATE", "YEAR", "DAY", "LANG", "PART", "TIME", "ANSWER"
    );
    println!("{}", "-".repeat(80));

    for run in &runs {
        let lang = repo
            .config()
            .langs
            .get(&run.language)
            .and_then(|spec| spec.symbol.as_deref())
            .unwrap_or(&run.language);
        println!(
            "{:<23}  {:<4}  {:<3}  {:<8}  {:<4}  {:<10}  {}",
            run.ran_at.format("%Y-%m-%d %H:%M:%S UTC"),
            run.year,
            pad_day(run.day),
            truncate(lang, 8),
            run.part,
            format_running_time(run.running_time),
            run.answer
        );
    }

    Ok(())
}

async fn cmd_status(cli: &Cli, year: Option<u16>, lang: Option<&str>) -> Result<()> {
    let repo = open_repo(cli)?;
    let store = open_store(&repo).await?;

    let rows = store
        .list_solved(year, lang)
        .await
        .context("Failed to load completion")?;
    let summary = completion(&rows);

    if cli.json {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    if summary.is_empty() {
        eprintln!("No solved puzzles recorded");
        return Ok(());
    }

    let mut current_year = None;
    for entry in &summary {
        if current_year != Some(entry.year) {
            if current_year.is_some() {
                println!();
            }
            current_year = Some(entry.year);
            println!("{}", entry.year);
            println!("{:<8}  {}", "", days_header());
        }
        let symbol = repo
            .config()
            .langs
            .get(&entry.language)
            .and_then(|spec| spec.symbol.as_deref())
            .and_then(|symbol| symbol.chars().next())
            .unwrap_or('*');
        let mark = if entry.is_complete() { " *" } else { "" };
        println!(
            "{:<8}  {}  {:>2}/{}{mark}",
            truncate(&entry.language, 8),
            entry.stars_line(symbol),
            entry.stars(),
            LangCompletion::max_stars()
        );
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Runner echoing solution debug output to stderr.
fn runner() -> Runner<Stderr> {
    Runner::with_echo(tokio::io::stderr())
}

fn open_repo(cli: &Cli) -> Result<Repo> {
    let root = cli
        .root
        .clone()
        .or_else(|| std::env::var_os(ROOT_ENV).map(PathBuf::from));
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let repo = Repo::discover(root.as_deref(), &cwd)?;
    tracing::debug!(root = %repo.root().display(), "using repository");
    Ok(repo)
}

async fn open_store(repo: &Repo) -> Result<RunStore> {
    let path = repo.db_path(std::env::var_os(DB_ENV).map(PathBuf::from));
    RunStore::open(&path)
        .await
        .with_context(|| format!("Failed to open run history at {}", path.display()))
}

fn solution_dir(repo: &Repo, lang: &str, year: u16, day: u8) -> Result<PathBuf> {
    let wd = repo.solution_dir(lang, year, day);
    if !wd.is_dir() {
        bail!(
            "No {lang} solution for year {year} day {} (expected {})",
            pad_day(day),
            wd.display()
        );
    }
    Ok(wd)
}

/// Run the language's build step, if any, in the solution directory.
async fn build(spec: &LangSpec, year: u16, day: u8, wd: &Path) -> Result<()> {
    let Some(command) = spec.prepare_build_command(year, day) else {
        return Ok(());
    };
    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };

    tracing::info!(cmd = ?command, cwd = %wd.display(), "building solution");
    let status = tokio::process::Command::new(program)
        .args(args)
        .current_dir(wd)
        .stdin(Stdio::null())
        // stdout is reserved for results
        .stdout(Stdio::from(std::io::stderr()))
        .status()
        .await
        .with_context(|| format!("Failed to start build `{}`", command.join(" ")))?;

    if !status.success() {
        bail!("Build `{}` failed ({})", command.join(" "), status);
    }
    Ok(())
}

/// Every (year, day) pair of the selection, in order. No days means all of them.
fn selected_puzzles(years: &[u16], days: &[u8]) -> Vec<(u16, u8)> {
    let mut years = years.to_vec();
    years.sort();
    years.dedup();

    let mut days = if days.is_empty() {
        (1..=LAST_DAY).collect()
    } else {
        days.to_vec()
    };
    days.sort();
    days.dedup();

    years
        .iter()
        .flat_map(|&year| days.iter().map(move |&day| (year, day)))
        .collect()
}

fn selected_parts(parts: &[Part]) -> Vec<Part> {
    if parts.is_empty() {
        return Part::ALL.to_vec();
    }
    let mut parts = parts.to_vec();
    parts.sort();
    parts.dedup();
    parts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Correct,
    Wrong,
    /// No accepted answer to compare with.
    Unchecked,
    /// No answer at all.
    Failed,
}

impl Verdict {
    fn is_failure(self) -> bool {
        match self {
            Verdict::Wrong | Verdict::Failed => true,
            Verdict::Correct | Verdict::Unchecked => false,
        }
    }

    /// Completion implied by a checked answer.
    fn solved(self) -> Option<bool> {
        match self {
            Verdict::Correct => Some(true),
            Verdict::Wrong => Some(false),
            Verdict::Unchecked | Verdict::Failed => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Wrong => "wrong",
            Verdict::Unchecked => "unchecked",
            Verdict::Failed => "failed",
        }
    }
}

fn verdict(answer: &str, expected: Option<&str>) -> Verdict {
    match expected {
        Some(expected) if expected == answer => Verdict::Correct,
        Some(_) => Verdict::Wrong,
        None => Verdict::Unchecked,
    }
}

fn print_verdict(part: Part, result: &ExecutionResult, expected: Option<&str>, verdict: Verdict) {
    let answer = result.answer().unwrap_or_default();
    let time = result
        .timing()
        .map(|rt| format!(" ({})", rt.humanize(2)))
        .unwrap_or_default();
    match verdict {
        Verdict::Correct => println!("✔ Answer pt{part}: {answer}{time}"),
        Verdict::Wrong => println!(
            "✘ Answer pt{part}: {answer}{time}. Expected: {}",
            expected.unwrap_or_default()
        ),
        Verdict::Unchecked => println!("Answer pt{part}: {answer}{time}"),
        Verdict::Failed => println!("✘ Could not run pt{part} ({})", result.status()),
    }
}

fn report_json(
    part: Part,
    result: &ExecutionResult,
    expected: Option<&str>,
    verdict: Verdict,
) -> serde_json::Value {
    serde_json::json!({
        "part": part,
        "status": result.status(),
        "answer": result.answer(),
        "expected": expected,
        "verdict": verdict.as_str(),
        "running_time": result.timing(),
    })
}

fn format_running_time(running_time: Option<RunningTime>) -> String {
    running_time
        .map(|rt| rt.humanize(2))
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
