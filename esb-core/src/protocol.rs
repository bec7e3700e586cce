//! FIREPLACE protocol types and outcome judgment.
//!
//! A solution honoring the protocol is invoked with `--part <1|2>`, reads the
//! puzzle input from stdin until EOF and writes to stdout either
//!
//! ```text
//! <answer>\n
//! ```
//!
//! or
//!
//! ```text
//! <answer>\n
//! RT <integer> <unit>\n
//! ```
//!
//! and exits with code 0. [`classify`] turns an exit code and captured stdout
//! into an [`ExecutionResult`].

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::units::{MetricPrefix, UnitError};

/// First token of the running time line.
pub const RUNNING_TIME_TAG: &str = "RT";

/// Long unit name accepted on the running time line.
pub const TIME_UNIT: &str = "second";

/// Unit symbol accepted on the running time line.
pub const TIME_UNIT_SYMBOL: &str = "s";

/// Most stdout lines a conforming solution may write.
pub const MAX_OUTPUT_LINES: usize = 2;

// ============================================================================
// Part
// ============================================================================

/// Which half of a two-part puzzle to solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Part {
    One,
    Two,
}

/// A part number other than 1 or 2.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("part {0} does not exist, expected 1 or 2")]
pub struct InvalidPart(pub String);

impl Part {
    pub const ALL: [Part; 2] = [Part::One, Part::Two];

    pub const fn as_u8(self) -> u8 {
        match self {
            Part::One => 1,
            Part::Two => 2,
        }
    }
}

impl From<Part> for u8 {
    fn from(part: Part) -> Self {
        part.as_u8()
    }
}

impl TryFrom<u8> for Part {
    type Error = InvalidPart;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Part::One),
            2 => Ok(Part::Two),
            other => Err(InvalidPart(other.to_string())),
        }
    }
}

impl FromStr for Part {
    type Err = InvalidPart;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s.trim().parse().map_err(|_| InvalidPart(s.to_string()))?;
        Part::try_from(value)
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

// ============================================================================
// Running time
// ============================================================================

/// Elapsed time reported by a solution: an integer count of `unit` seconds.
///
/// The value is kept exactly as reported; rescaling is only done for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningTime {
    pub value: u64,
    pub unit: MetricPrefix,
}

impl RunningTime {
    pub fn new(value: u64, unit: MetricPrefix) -> Self {
        Self { value, unit }
    }

    pub fn as_seconds(&self) -> f64 {
        self.unit.to_float(self.value as f64)
    }

    /// Best-fit rendering such as `"1.50 μs"`.
    ///
    /// Falls back to the raw value when the magnitude has no prefix.
    pub fn humanize(&self, precision: usize) -> String {
        match MetricPrefix::from_float(self.value as f64, self.unit.exponent()) {
            Ok((mantissa, prefix)) => {
                prefix.format(mantissa, TIME_UNIT_SYMBOL, Some(precision), true)
            }
            Err(_) => self.to_string(),
        }
    }
}

/// Renders the protocol form, e.g. `1500 ns`.
impl fmt::Display for RunningTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.value, self.unit.symbol(), TIME_UNIT_SYMBOL)
    }
}

/// Why a running time line was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimingLineError {
    #[error("expected `RT <integer> <unit>`, got {0:?}")]
    Shape(String),

    #[error("invalid running time {value:?}: {source}")]
    Value {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Parse a `RT <integer> <unit>` line.
pub fn parse_running_time(line: &str) -> Result<RunningTime, TimingLineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [tag, value, unit] = fields.as_slice() else {
        return Err(TimingLineError::Shape(line.to_string()));
    };
    if *tag != RUNNING_TIME_TAG {
        return Err(TimingLineError::Shape(line.to_string()));
    }

    let value = value.parse::<u64>().map_err(|source| TimingLineError::Value {
        value: value.to_string(),
        source,
    })?;
    let unit = MetricPrefix::parse(unit, TIME_UNIT, TIME_UNIT_SYMBOL)?;

    Ok(RunningTime::new(value, unit))
}

// ============================================================================
// Execution result
// ============================================================================

/// Outcome of one protocol execution.
///
/// Exhaustive on purpose: adding a variant must break every `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// The solution honored the protocol.
    Ok,
    /// The input file does not exist. No process was spawned.
    InputMissing,
    /// Wrong exit code, line count, missing trailing newline or bad timing line.
    ProtocolViolation,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Ok => "ok",
            ExecutionStatus::InputMissing => "input missing",
            ExecutionStatus::ProtocolViolation => "protocol violation",
        };
        f.write_str(s)
    }
}

/// Result of running a solution.
///
/// `answer` is present iff the status is [`ExecutionStatus::Ok`], and a
/// running time only accompanies an answer. Fields are private so the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    status: ExecutionStatus,
    answer: Option<String>,
    running_time: Option<RunningTime>,
}

impl ExecutionResult {
    pub fn ok(answer: impl Into<String>, running_time: Option<RunningTime>) -> Self {
        Self {
            status: ExecutionStatus::Ok,
            answer: Some(answer.into()),
            running_time,
        }
    }

    pub fn input_missing() -> Self {
        Self {
            status: ExecutionStatus::InputMissing,
            answer: None,
            running_time: None,
        }
    }

    pub fn protocol_violation() -> Self {
        Self {
            status: ExecutionStatus::ProtocolViolation,
            answer: None,
            running_time: None,
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == ExecutionStatus::Ok
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn timing(&self) -> Option<RunningTime> {
        self.running_time
    }

    pub fn running_time(&self) -> Option<u64> {
        self.running_time.map(|t| t.value)
    }

    pub fn unit(&self) -> Option<MetricPrefix> {
        self.running_time.map(|t| t.unit)
    }

    pub fn into_answer(self) -> Option<String> {
        self.answer
    }
}

/// Judge a finished solution from its exit code and captured stdout.
///
/// `exit_code` is `None` when the process was terminated by a signal.
pub fn classify(exit_code: Option<i32>, stdout: &str) -> ExecutionResult {
    if exit_code != Some(0) {
        return ExecutionResult::protocol_violation();
    }
    let Some(body) = stdout.strip_suffix('\n') else {
        return ExecutionResult::protocol_violation();
    };

    let mut lines = body.split('\n');
    match (lines.next(), lines.next(), lines.next()) {
        (Some(answer), None, None) => ExecutionResult::ok(answer, None),
        (Some(answer), Some(timing), None) => match parse_running_time(timing) {
            Ok(running_time) => ExecutionResult::ok(answer, Some(running_time)),
            Err(_) => ExecutionResult::protocol_violation(),
        },
        _ => ExecutionResult::protocol_violation(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_conversions() {
        assert_eq!(Part::try_from(1), Ok(Part::One));
        assert_eq!(Part::try_from(2), Ok(Part::Two));
        assert!(Part::try_from(0).is_err());
        assert!(Part::try_from(3).is_err());

        assert_eq!("2".parse::<Part>(), Ok(Part::Two));
        assert!("two".parse::<Part>().is_err());

        assert_eq!(Part::One.to_string(), "1");
        assert_eq!(serde_json::to_string(&Part::Two).unwrap(), "2");
    }

    #[test]
    fn test_parse_running_time() {
        let rt = parse_running_time("RT 1500 ns").unwrap();
        assert_eq!(rt, RunningTime::new(1500, MetricPrefix::Nano));

        let rt = parse_running_time("RT 42 nanoseconds").unwrap();
        assert_eq!(rt, RunningTime::new(42, MetricPrefix::Nano));

        let rt = parse_running_time("RT 3 s").unwrap();
        assert_eq!(rt, RunningTime::new(3, MetricPrefix::Base));
    }

    #[test]
    fn test_parse_running_time_errors() {
        assert!(matches!(
            parse_running_time("RT abc ns"),
            Err(TimingLineError::Value { .. })
        ));
        assert!(matches!(
            parse_running_time("RT -5 ns"),
            Err(TimingLineError::Value { .. })
        ));
        assert!(matches!(
            parse_running_time("RT 5 Xs"),
            Err(TimingLineError::Unit(_))
        ));
        assert!(matches!(
            parse_running_time("TR 5 ns"),
            Err(TimingLineError::Shape(_))
        ));
        assert!(matches!(
            parse_running_time("RT 5"),
            Err(TimingLineError::Shape(_))
        ));
        assert!(matches!(
            parse_running_time("RT 5 ns extra"),
            Err(TimingLineError::Shape(_))
        ));
    }

    #[test]
    fn test_classify_single_line() {
        let result = classify(Some(0), "Any input\n");
        assert_eq!(result.status(), ExecutionStatus::Ok);
        assert_eq!(result.answer(), Some("Any input"));
        assert_eq!(result.running_time(), None);
        assert_eq!(result.unit(), None);
    }

    #[test]
    fn test_classify_with_running_time() {
        let result = classify(Some(0), "42\nRT 1500 ns\n");
        assert_eq!(result.status(), ExecutionStatus::Ok);
        assert_eq!(result.answer(), Some("42"));
        assert_eq!(result.running_time(), Some(1500));
        assert_eq!(result.unit(), Some(MetricPrefix::Nano));
    }

    #[test]
    fn test_classify_nonzero_exit() {
        for code in [Some(1), Some(2), None] {
            let result = classify(code, "42\n");
            assert_eq!(result.status(), ExecutionStatus::ProtocolViolation);
            assert_eq!(result.answer(), None);
        }
    }

    #[test]
    fn test_classify_missing_trailing_newline() {
        assert_eq!(classify(Some(0), "42").status(), ExecutionStatus::ProtocolViolation);
        assert_eq!(
            classify(Some(0), "42\nRT 1 ns").status(),
            ExecutionStatus::ProtocolViolation
        );
        assert_eq!(classify(Some(0), "").status(), ExecutionStatus::ProtocolViolation);
    }

    #[test]
    fn test_classify_malformed_timing_line() {
        let result = classify(Some(0), "42\nRT abc ns\n");
        assert_eq!(result.status(), ExecutionStatus::ProtocolViolation);
        assert_eq!(result.answer(), None);
        assert_eq!(result.timing(), None);

        // a second line that is not a timing line at all
        let result = classify(Some(0), "Two lines\ninput\n");
        assert_eq!(result.status(), ExecutionStatus::ProtocolViolation);
    }

    #[test]
    fn test_classify_too_many_lines() {
        let result = classify(Some(0), "debug\n42\nRT 1 ns\n");
        assert_eq!(result.status(), ExecutionStatus::ProtocolViolation);
        assert_eq!(
            classify(Some(0), "a\nb\nc\nd\n").status(),
            ExecutionStatus::ProtocolViolation
        );
    }

    #[test]
    fn test_result_invariants() {
        let ok = ExecutionResult::ok("1", Some(RunningTime::new(5, MetricPrefix::Milli)));
        assert!(ok.is_ok());
        assert_eq!(ok.running_time(), Some(5));
        assert_eq!(ok.unit(), Some(MetricPrefix::Milli));

        for result in [
            ExecutionResult::input_missing(),
            ExecutionResult::protocol_violation(),
        ] {
            assert!(!result.is_ok());
            assert_eq!(result.answer(), None);
            assert_eq!(result.running_time(), None);
            assert_eq!(result.unit(), None);
        }
    }

    #[test]
    fn test_running_time_display() {
        let rt = RunningTime::new(1500, MetricPrefix::Nano);
        assert_eq!(rt.to_string(), "1500 ns");
        assert_eq!(rt.humanize(2), "1.50 μs");
        assert!((rt.as_seconds() - 1.5e-6).abs() < 1e-15);

        // a value with no matching prefix falls back to the raw form
        let huge = RunningTime::new(u64::MAX, MetricPrefix::Quetta);
        assert_eq!(huge.humanize(2), huge.to_string());

        let zero = RunningTime::new(0, MetricPrefix::Nano);
        assert_eq!(zero.humanize(1), "0.0 s");
    }

    #[test]
    fn test_result_serializes_status_snake_case() {
        let json = serde_json::to_value(ExecutionResult::input_missing()).unwrap();
        assert_eq!(json["status"], "input_missing");
        assert!(json["answer"].is_null());
    }
}
