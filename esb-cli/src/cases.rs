//! Example test cases.
//!
//! Cases live in `tests/<year>/<dd>/*.toml`, one table per case:
//!
//! ```toml
//! [test.first_example]
//! input = "R2, L3"
//! answer = 5
//! part = 1
//! args = ["10"]
//! ```
//!
//! `answer` and `args` entries may be any scalar; they are compared and
//! passed as text.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use esb_core::Part;
use serde::{Deserialize, Serialize};

/// A runnable test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub name: String,
    pub file: PathBuf,
    pub part: Part,
    pub input: String,
    pub answer: String,
    pub args: Option<Vec<String>>,
}

/// A case that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCase {
    pub name: String,
    pub file: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct CaseSet {
    pub cases: Vec<TestCase>,
    pub skipped: Vec<SkippedCase>,
}

impl CaseSet {
    /// Cases for `part`, restricted to names containing `filter`.
    pub fn select<'a>(
        &'a self,
        part: Part,
        filter: Option<&'a str>,
    ) -> impl Iterator<Item = &'a TestCase> + 'a {
        self.cases
            .iter()
            .filter(move |case| case.part == part)
            .filter(move |case| filter.map_or(true, |f| case.name.contains(f)))
    }
}

#[derive(Deserialize)]
struct CaseFile {
    #[serde(default)]
    test: BTreeMap<String, toml::Table>,
}

/// Load every `*.toml` file in `dir`, in file name order.
///
/// A missing directory holds no cases.
pub fn load_cases(dir: &Path) -> Result<CaseSet> {
    let mut set = CaseSet::default();
    if !dir.is_dir() {
        return Ok(set);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list test cases in {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: CaseFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        for (name, table) in file.test {
            match parse_case(&name, &path, &table) {
                Ok(case) => set.cases.push(case),
                Err(reason) => {
                    tracing::debug!(case = %name, file = %path.display(), %reason, "skipping case");
                    set.skipped.push(SkippedCase {
                        name,
                        file: path.clone(),
                        reason,
                    });
                }
            }
        }
    }

    Ok(set)
}

fn parse_case(name: &str, file: &Path, table: &toml::Table) -> Result<TestCase, String> {
    let input = match table.get("input") {
        Some(toml::Value::String(input)) => input.clone(),
        Some(other) => return Err(format!("'input' must be a string, found {}", other.type_str())),
        None => return Err("missing 'input'".to_string()),
    };

    let answer = match table.get("answer") {
        Some(value) => scalar_to_string(value)
            .ok_or_else(|| format!("'answer' must be a scalar, found {}", value.type_str()))?,
        None => return Err("missing 'answer'".to_string()),
    };

    let part = match table.get("part") {
        Some(toml::Value::Integer(n)) => u8::try_from(*n)
            .ok()
            .and_then(|n| Part::try_from(n).ok())
            .ok_or_else(|| format!("'part' must be 1 or 2, found {n}"))?,
        Some(other) => return Err(format!("'part' must be an integer, found {}", other.type_str())),
        None => return Err("missing 'part'".to_string()),
    };

    let args = match table.get("args") {
        Some(toml::Value::Array(values)) => Some(
            values
                .iter()
                .map(|value| {
                    scalar_to_string(value)
                        .ok_or_else(|| format!("'args' entries must be scalars, found {}", value.type_str()))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(other) => return Err(format!("'args' must be an array, found {}", other.type_str())),
        None => None,
    };

    Ok(TestCase {
        name: name.to_string(),
        file: file.to_path_buf(),
        part,
        input,
        answer,
        args,
    })
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(n) => Some(n.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(_) | toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}
