//! Solution side of the protocol.
//!
//! A Rust solution only needs two solver functions and a one-line `main`:
//!
//! ```no_run
//! use esb_fireplace::{FireplaceError, FireplaceResult};
//! use std::fmt::Display;
//!
//! fn solve_pt1(input_data: &str, _args: Vec<String>) -> FireplaceResult<impl Display> {
//!     Ok(input_data.lines().count())
//! }
//!
//! fn solve_pt2(_input_data: &str, _args: Vec<String>) -> FireplaceResult<impl Display> {
//!     Ok("December")
//! }
//!
//! fn main() -> Result<(), FireplaceError> {
//!     esb_fireplace::v1_run(solve_pt1, solve_pt2)
//! }
//! ```

use std::ffi::OsString;
use std::fmt::Display;
use std::io::{self, Read, Write};
use std::time::Instant;

use clap::Parser;
use esb_core::protocol::{RUNNING_TIME_TAG, TIME_UNIT};
use esb_core::{MetricPrefix, Part};

use crate::error::{FireplaceError, FireplaceResult};

/// Elf Script Brigade solution runner.
#[derive(Parser, Debug)]
#[command(name = "fireplace")]
pub struct SolutionArgs {
    /// Run solution part 1 or part 2
    #[arg(short, long)]
    pub part: Part,

    /// Additional arguments for running the solutions
    #[arg(short, long, num_args = 0..)]
    pub args: Option<Vec<String>>,
}

/// Run a solution from the process arguments, stdin and stdout.
///
/// Invalid arguments print a usage message and exit with code 2.
pub fn v1_run<F1, F2, T1, T2>(solve_pt1: F1, solve_pt2: F2) -> FireplaceResult<()>
where
    F1: FnOnce(&str, Vec<String>) -> FireplaceResult<T1>,
    F2: FnOnce(&str, Vec<String>) -> FireplaceResult<T2>,
    T1: Display,
    T2: Display,
{
    let args = SolutionArgs::parse();
    solve(args, io::stdin().lock(), io::stdout().lock(), solve_pt1, solve_pt2)
}

/// [`v1_run`] with explicit arguments and streams.
pub fn v1_run_with<I, A, R, W, F1, F2, T1, T2>(
    argv: I,
    input: R,
    output: W,
    solve_pt1: F1,
    solve_pt2: F2,
) -> FireplaceResult<()>
where
    I: IntoIterator<Item = A>,
    A: Into<OsString> + Clone,
    R: Read,
    W: Write,
    F1: FnOnce(&str, Vec<String>) -> FireplaceResult<T1>,
    F2: FnOnce(&str, Vec<String>) -> FireplaceResult<T2>,
    T1: Display,
    T2: Display,
{
    let args = SolutionArgs::try_parse_from(argv)?;
    solve(args, input, output, solve_pt1, solve_pt2)
}

fn solve<R, W, F1, F2, T1, T2>(
    args: SolutionArgs,
    mut input: R,
    mut output: W,
    solve_pt1: F1,
    solve_pt2: F2,
) -> FireplaceResult<()>
where
    R: Read,
    W: Write,
    F1: FnOnce(&str, Vec<String>) -> FireplaceResult<T1>,
    F2: FnOnce(&str, Vec<String>) -> FireplaceResult<T2>,
    T1: Display,
    T2: Display,
{
    let start = Instant::now();

    let mut input_data = String::new();
    input
        .read_to_string(&mut input_data)
        .map_err(FireplaceError::Input)?;
    let input_data = input_data.trim_end();
    let extra = args.args.unwrap_or_default();

    let answer = match args.part {
        Part::One => solve_pt1(input_data, extra)?.to_string(),
        Part::Two => solve_pt2(input_data, extra)?.to_string(),
    };
    let elapsed = start.elapsed().as_nanos();

    let unit = format!("{TIME_UNIT}s");
    let running_time = MetricPrefix::Nano.format(elapsed as f64, &unit, Some(0), false);
    writeln!(output, "{answer}").map_err(FireplaceError::Output)?;
    writeln!(output, "{RUNNING_TIME_TAG} {running_time}").map_err(FireplaceError::Output)?;
    output.flush().map_err(FireplaceError::Output)?;

    Ok(())
}
