//! FIREPLACE protocol execution.
//!
//! This crate runs solutions that follow the FIREPLACE protocol and provides
//! the helper Rust solutions use to implement it.
//!
//! # Example
//!
//! ```no_run
//! use esb_core::{InputSource, Invocation, Part};
//! use esb_fireplace::Runner;
//!
//! # async fn demo() -> esb_fireplace::FireplaceResult<()> {
//! let invocation = Invocation::new(
//!     ["python", "aoc_2016_01.py"],
//!     Part::One,
//!     "solutions/python/2016/01",
//!     InputSource::File(".cache/2016/01/day_01_input.txt".into()),
//! );
//!
//! let result = Runner::new().exec(&invocation).await?;
//! if let Some(answer) = result.answer() {
//!     println!("answer: {answer}");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod runner;
mod solution;

pub use error::{FireplaceError, FireplaceResult};
pub use runner::{exec_protocol, exec_protocol_from_file, Runner};
pub use solution::{v1_run, v1_run_with, SolutionArgs};
