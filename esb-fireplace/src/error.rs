//! FIREPLACE error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result alias used by the runner and by solutions.
pub type FireplaceResult<T> = Result<T, FireplaceError>;

/// Infrastructure failures around a protocol execution.
///
/// A solution that misbehaves is not an error: it yields an
/// `ExecutionResult` with a `ProtocolViolation` status. These variants cover
/// what prevents a judgment from being made at all.
#[derive(Debug, thiserror::Error)]
pub enum FireplaceError {
    /// The invocation has no program to run.
    #[error("no command specified")]
    EmptyCommand,

    /// The program could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A pipe requested at spawn time was not handed back.
    #[error("child {0} is not piped")]
    MissingPipe(&'static str),

    /// Writing the puzzle input to the child failed.
    #[error("failed to write child stdin: {0}")]
    Stdin(#[source] io::Error),

    /// Reading the child's output failed.
    #[error("failed to read child stdout: {0}")]
    Stdout(#[source] io::Error),

    /// waitpid() failed.
    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),

    /// The input file exists but could not be read.
    #[error("failed to read input {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid solution command line (`--part`, `--args`).
    #[error(transparent)]
    Args(#[from] clap::Error),

    /// The solution could not read its stdin.
    #[error("failed to read puzzle input: {0}")]
    Input(#[source] io::Error),

    /// The solution could not write its answer.
    #[error("failed to write answer: {0}")]
    Output(#[source] io::Error),

    /// A solver gave up.
    #[error("solution failed: {0}")]
    Solution(String),
}

impl FireplaceError {
    /// Build a [`FireplaceError::Solution`] from any message.
    pub fn solution(message: impl fmt::Display) -> Self {
        Self::Solution(message.to_string())
    }
}
