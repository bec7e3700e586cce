//! Language registry entries and command preparation.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// How to build and run the solutions of one language.
///
/// Every word of a command may use the `{year}` and `{day}` placeholders;
/// `{day}` expands zero-padded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LangSpec {
    pub run_command: Vec<String>,

    #[serde(default)]
    pub build_command: Option<Vec<String>>,

    /// Short label used in listings.
    #[serde(default)]
    pub symbol: Option<String>,
}

impl LangSpec {
    /// The command that runs the solution for a given day.
    pub fn prepare_run_command(
        &self,
        name: &str,
        year: u16,
        day: u8,
    ) -> Result<Vec<String>, ConfigError> {
        if self.run_command.is_empty() {
            return Err(ConfigError::EmptyRunCommand(name.to_string()));
        }
        Ok(prepare_command(&self.run_command, year, day))
    }

    /// The build step for a given day, if the language needs one.
    pub fn prepare_build_command(&self, year: u16, day: u8) -> Option<Vec<String>> {
        self.build_command
            .as_deref()
            .filter(|command| !command.is_empty())
            .map(|command| prepare_command(command, year, day))
    }
}

pub fn pad_day(day: u8) -> String {
    format!("{day:02}")
}

fn prepare_command(command: &[String], year: u16, day: u8) -> Vec<String> {
    let year = year.to_string();
    let day = pad_day(day);
    command
        .iter()
        .map(|word| word.replace("{year}", &year).replace("{day}", &day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(run: &[&str], build: Option<&[&str]>) -> LangSpec {
        LangSpec {
            run_command: run.iter().map(|s| s.to_string()).collect(),
            build_command: build.map(|b| b.iter().map(|s| s.to_string()).collect()),
            symbol: None,
        }
    }

    #[test]
    fn test_pad_day() {
        assert_eq!(pad_day(1), "01");
        assert_eq!(pad_day(25), "25");
    }

    #[test]
    fn test_run_command_placeholders() {
        let lang = spec(&["python", "aoc_{year}_{day}.py"], None);
        assert_eq!(
            lang.prepare_run_command("python", 2016, 3).unwrap(),
            vec!["python", "aoc_2016_03.py"]
        );
    }

    #[test]
    fn test_repeated_placeholders() {
        let lang = spec(&["{year}/{day}/{day}"], None);
        assert_eq!(
            lang.prepare_run_command("x", 2020, 9).unwrap(),
            vec!["2020/09/09"]
        );
    }

    #[test]
    fn test_empty_run_command() {
        let lang = spec(&[], None);
        assert!(matches!(
            lang.prepare_run_command("nothing", 2020, 1),
            Err(ConfigError::EmptyRunCommand(name)) if name == "nothing"
        ));
    }

    #[test]
    fn test_build_command() {
        let lang = spec(&["./day"], Some(&["go", "build", "-o", "day_{day}"]));
        assert_eq!(
            lang.prepare_build_command(2021, 7),
            Some(vec![
                "go".to_string(),
                "build".to_string(),
                "-o".to_string(),
                "day_07".to_string()
            ])
        );
        assert_eq!(spec(&["./day"], None).prepare_build_command(2021, 7), None);
        assert_eq!(
            spec(&["./day"], Some(&[])).prepare_build_command(2021, 7),
            None
        );
    }
}
