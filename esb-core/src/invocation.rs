//! Invocation of a solution under the FIREPLACE protocol.

use std::path::PathBuf;

use crate::protocol::Part;

/// Flag selecting the puzzle part.
pub const PART_FLAG: &str = "--part";

/// Flag introducing the extra arguments passed in test mode.
pub const ARGS_FLAG: &str = "--args";

/// Where the puzzle input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Input text held in memory (test cases).
    Text(String),
    /// Input stored in a file (cached puzzle input). A missing file is
    /// reported as `InputMissing` rather than an error.
    File(PathBuf),
}

/// Everything needed to run one solution once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Base command line, e.g. `["python", "aoc_2016_01.py"]`.
    pub command: Vec<String>,
    pub part: Part,
    /// Extra words appended after `--args`.
    pub args: Option<Vec<String>>,
    /// Working directory of the child.
    pub cwd: PathBuf,
    pub input: InputSource,
}

impl Invocation {
    pub fn new<I, S>(command: I, part: Part, cwd: impl Into<PathBuf>, input: InputSource) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            part,
            args: None,
            cwd: cwd.into(),
            input,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// The full argument vector:
    /// `<command...> --part <n> [--args <word>...]`.
    pub fn command_line(&self) -> Vec<String> {
        let mut argv = self.command.clone();
        argv.push(PART_FLAG.to_string());
        argv.push(self.part.to_string());
        if let Some(args) = &self.args {
            argv.push(ARGS_FLAG.to_string());
            argv.extend(args.iter().cloned());
        }
        argv
    }
}
