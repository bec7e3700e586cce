//! # ESB Core
//!
//! Domain types for the FIREPLACE solution protocol.
//!
//! This crate is IO-free: it spawns no processes and touches no files. The
//! runner that executes solutions lives in `esb-fireplace`, and the command
//! line glue (history, language registry) in `esb-cli`.
//!
//! ## Modules
//!
//! - [`units`] - Metric prefix codec for scaled running times
//! - [`protocol`] - Parts, execution results and stdout judgment
//! - [`invocation`] - How a solution is invoked

pub mod invocation;
pub mod protocol;
pub mod units;

pub use invocation::{InputSource, Invocation};
pub use protocol::{
    classify, parse_running_time, ExecutionResult, ExecutionStatus, Part, RunningTime,
    TimingLineError,
};
pub use units::{MetricPrefix, UnitError};
