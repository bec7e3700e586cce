//! Mock solution used by the runner integration tests.
//!
//! - part 1 answers the trimmed input, or the `--args` words joined by spaces
//! - part 2 answers `2`
//! - `--args fail` makes the solver fail, so the process exits with code 1

use esb_fireplace::{FireplaceError, FireplaceResult};

const PT2_SOLUTION: i32 = 2;

fn solve_pt1(input_data: &str, args: Vec<String>) -> FireplaceResult<String> {
    match args.as_slice() {
        [] => Ok(input_data.trim().to_string()),
        [flag] if flag == "fail" => Err(FireplaceError::solution("asked to fail")),
        words => Ok(words.join(" ")),
    }
}

fn solve_pt2(_input_data: &str, _args: Vec<String>) -> FireplaceResult<i32> {
    Ok(PT2_SOLUTION)
}

fn main() -> Result<(), FireplaceError> {
    esb_fireplace::v1_run(solve_pt1, solve_pt2)
}
