//! Repository configuration.
//!
//! An esb repository is any directory holding an `esb.toml`. The file
//! registers the languages solutions are written in:
//!
//! ```toml
//! db_path = ".cache/esb.db"
//!
//! [langs.python]
//! run_command = ["python", "aoc_{year}_{day}.py"]
//! symbol = "py"
//!
//! [langs.rust]
//! build_command = ["cargo", "build", "--release", "--bin", "aoc_{year}_{day}"]
//! run_command = ["target/release/aoc_{year}_{day}"]
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lang::{pad_day, LangSpec};

pub const CONFIG_FILE: &str = "esb.toml";

/// Overrides root discovery.
pub const ROOT_ENV: &str = "ESB_ROOT";

/// Overrides the history database location.
pub const DB_ENV: &str = "ESB_DB";

pub const CACHE_DIR: &str = ".cache";
pub const SOLUTIONS_DIR: &str = "solutions";
pub const TESTS_DIR: &str = "tests";

const DEFAULT_DB_FILE: &str = "esb.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find esb.toml in {} or any parent directory", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown language '{name}' (registered: {known})")]
    UnknownLang { name: String, known: String },

    #[error("language '{0}' has an empty run_command")]
    EmptyRunCommand(String),
}

/// Contents of `esb.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EsbConfig {
    /// History database, relative to the repository root.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    #[serde(default)]
    pub langs: BTreeMap<String, LangSpec>,
}

/// A loaded repository: its root directory and configuration.
#[derive(Debug, Clone)]
pub struct Repo {
    root: PathBuf,
    config: EsbConfig,
}

impl Repo {
    /// Load the repository at `root`, or search upwards from `start` when no
    /// root is given.
    pub fn discover(root: Option<&Path>, start: &Path) -> Result<Self, ConfigError> {
        match root {
            Some(root) => Self::load(root),
            None => {
                let root = find_root(start).ok_or_else(|| ConfigError::NotFound(start.to_path_buf()))?;
                Self::load(&root)
            }
        }
    }

    /// Load `<root>/esb.toml`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: EsbConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;

        tracing::debug!(root = %root.display(), langs = config.langs.len(), "loaded repository");
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &EsbConfig {
        &self.config
    }

    /// Look up a registered language.
    pub fn lang(&self, name: &str) -> Result<&LangSpec, ConfigError> {
        self.config.langs.get(name).ok_or_else(|| ConfigError::UnknownLang {
            name: name.to_string(),
            known: self.config.langs.keys().cloned().collect::<Vec<_>>().join(", "),
        })
    }

    /// `.cache/<year>/<dd>/day_<dd>_input.txt`
    pub fn input_path(&self, year: u16, day: u8) -> PathBuf {
        self.root
            .join(CACHE_DIR)
            .join(year.to_string())
            .join(pad_day(day))
            .join(format!("day_{}_input.txt", pad_day(day)))
    }

    /// `solutions/<lang>/<year>/<dd>`, the working directory of a solution.
    pub fn solution_dir(&self, lang: &str, year: u16, day: u8) -> PathBuf {
        self.root
            .join(SOLUTIONS_DIR)
            .join(lang)
            .join(year.to_string())
            .join(pad_day(day))
    }

    /// `tests/<year>/<dd>`
    pub fn tests_dir(&self, year: u16, day: u8) -> PathBuf {
        self.root
            .join(TESTS_DIR)
            .join(year.to_string())
            .join(pad_day(day))
    }

    /// History database path. `env_override` (from `ESB_DB`) wins over the
    /// configured path, which wins over `.cache/esb.db`.
    pub fn db_path(&self, env_override: Option<PathBuf>) -> PathBuf {
        if let Some(path) = env_override {
            return path;
        }
        match &self.config.db_path {
            Some(path) => self.root.join(path),
            None => self.root.join(CACHE_DIR).join(DEFAULT_DB_FILE),
        }
    }
}

/// Walk up from `start` to the first directory holding `esb.toml`.
pub fn find_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CONFIG: &str = r#"
[langs.python]
run_command = ["python", "aoc_{year}_{day}.py"]
symbol = "py"

[langs.rust]
build_command = ["cargo", "build", "--release"]
run_command = ["target/release/aoc_{year}_{day}"]
"#;

    fn repo_with(config: &str) -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), config).unwrap();
        let repo = Repo::load(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_load_langs() {
        let (_dir, repo) = repo_with(CONFIG);
        let python = repo.lang("python").unwrap();
        assert_eq!(python.run_command, vec!["python", "aoc_{year}_{day}.py"]);
        assert_eq!(python.build_command, None);
        assert_eq!(python.symbol.as_deref(), Some("py"));
        assert!(repo.lang("rust").unwrap().build_command.is_some());
    }

    #[test]
    fn test_unknown_lang_lists_registered() {
        let (_dir, repo) = repo_with(CONFIG);
        let err = repo.lang("cobol").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown language 'cobol' (registered: python, rust)"
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "color = true\n").unwrap();
        assert!(matches!(
            Repo::load(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_discover_walks_up() {
        let (dir, _) = repo_with(CONFIG);
        let nested = dir.path().join("solutions/python/2016/01");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = Repo::discover(None, &nested).unwrap();
        assert_eq!(repo.root(), dir.path());
    }

    #[test]
    fn test_discover_without_config() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Repo::discover(None, dir.path()),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_explicit_root_skips_search() {
        let (dir, _) = repo_with(CONFIG);
        let other = tempdir().unwrap();
        let repo = Repo::discover(Some(dir.path()), other.path()).unwrap();
        assert_eq!(repo.root(), dir.path());
    }

    #[test]
    fn test_paths() {
        let (dir, repo) = repo_with(CONFIG);
        let root = dir.path();
        assert_eq!(
            repo.input_path(2016, 1),
            root.join(".cache/2016/01/day_01_input.txt")
        );
        assert_eq!(
            repo.solution_dir("python", 2016, 12),
            root.join("solutions/python/2016/12")
        );
        assert_eq!(repo.tests_dir(2023, 25), root.join("tests/2023/25"));
    }

    #[test]
    fn test_db_path_precedence() {
        let (dir, repo) = repo_with(CONFIG);
        assert_eq!(repo.db_path(None), dir.path().join(".cache/esb.db"));
        assert_eq!(
            repo.db_path(Some(PathBuf::from("/tmp/other.db"))),
            PathBuf::from("/tmp/other.db")
        );

        let (dir, repo) = repo_with("db_path = \"history.db\"\n");
        assert_eq!(repo.db_path(None), dir.path().join("history.db"));
    }
}
