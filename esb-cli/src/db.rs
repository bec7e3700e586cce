//! Run history storage.
//!
//! Wraps SQLite access via sqlx. Every successful solution run is recorded
//! together with its answer and reported running time, and accepted answers
//! are kept per puzzle part so later runs can be checked against them.
//! Checked runs also mark the part solved or unsolved for their language.

use std::path::Path;

use chrono::{DateTime, Utc};
use esb_core::{MetricPrefix, Part, RunningTime};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

/// One recorded solution run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    /// Assigned by the database on insert.
    pub id: Option<i64>,
    pub ran_at: DateTime<Utc>,
    pub year: u16,
    pub day: u8,
    pub language: String,
    pub part: Part,
    pub answer: String,
    pub running_time: Option<RunningTime>,
}

/// Selection for [`RunStore::list_runs`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub year: Option<u16>,
    pub day: Option<u8>,
    pub language: Option<String>,
    pub limit: Option<u32>,
}

/// Completion state of one puzzle part in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolvedPart {
    pub language: String,
    pub year: u16,
    pub day: u8,
    pub part: Part,
    pub solved: bool,
    pub updated_at: DateTime<Utc>,
}

/// History database.
#[derive(Clone)]
pub struct RunStore {
    pool: SqlitePool,
}

impl RunStore {
    /// Open or create a database at the given path.
    ///
    /// Runs migrations automatically to ensure schema is up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, sqlx::Error> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                sqlx::Error::Configuration(format!("Failed to create db directory: {}", e).into())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::migrate!().run(&pool).await?;

        tracing::debug!(path = %path.display(), "opened run history");
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Runs
    // =========================================================================

    /// Record a run and return its id.
    pub async fn insert_run(&self, run: &RunRecord) -> Result<i64, sqlx::Error> {
        let running_time = run
            .running_time
            .map(|rt| i64::try_from(rt.value).map_err(|e| sqlx::Error::Encode(Box::new(e))))
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO runs (ran_at, year, day, language, part, answer, running_time, unit)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(run.ran_at.to_rfc3339())
        .bind(i64::from(run.year))
        .bind(i64::from(run.day))
        .bind(&run.language)
        .bind(i64::from(run.part.as_u8()))
        .bind(&run.answer)
        .bind(running_time)
        .bind(run.running_time.map(|rt| rt.unit.exponent()))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Runs matching `filter`, most recent first.
    pub async fn list_runs(&self, filter: &RunFilter) -> Result<Vec<RunRecord>, sqlx::Error> {
        // LIMIT -1 is unbounded in SQLite
        let limit = filter.limit.map_or(-1, i64::from);

        let rows = sqlx::query(
            r#"
            SELECT id, ran_at, year, day, language, part, answer, running_time, unit
            FROM runs
            WHERE (?1 IS NULL OR year = ?1)
              AND (?2 IS NULL OR day = ?2)
              AND (?3 IS NULL OR language = ?3)
            ORDER BY ran_at DESC, id DESC
            LIMIT ?4
            "#,
        )
        .bind(filter.year.map(i64::from))
        .bind(filter.day.map(i64::from))
        .bind(filter.language.as_deref())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_run_row).collect()
    }

    /// Fastest recorded run of a puzzle part in one language.
    pub async fn best_run(
        &self,
        year: u16,
        day: u8,
        part: Part,
        language: &str,
    ) -> Result<Option<RunRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, ran_at, year, day, language, part, answer, running_time, unit
            FROM runs
            WHERE year = ?1 AND day = ?2 AND part = ?3 AND language = ?4
              AND running_time IS NOT NULL
            "#,
        )
        .bind(i64::from(year))
        .bind(i64::from(day))
        .bind(i64::from(part.as_u8()))
        .bind(language)
        .fetch_all(&self.pool)
        .await?;

        let mut best: Option<RunRecord> = None;
        for row in &rows {
            let run = parse_run_row(row)?;
            let faster = match (&best, run.running_time) {
                (Some(current), Some(rt)) => current
                    .running_time
                    .map_or(true, |cur| rt.as_seconds() < cur.as_seconds()),
                (None, Some(_)) => true,
                (Some(_), None) | (None, None) => false,
            };
            if faster {
                best = Some(run);
            }
        }
        Ok(best)
    }

    // =========================================================================
    // Answers
    // =========================================================================

    /// Record the accepted answer for a puzzle part, replacing any previous one.
    pub async fn set_answer(
        &self,
        year: u16,
        day: u8,
        part: Part,
        answer: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO answers (year, day, part, answer, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(i64::from(year))
        .bind(i64::from(day))
        .bind(i64::from(part.as_u8()))
        .bind(answer)
        .bind(recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The accepted answer for a puzzle part, if known.
    pub async fn answer(&self, year: u16, day: u8, part: Part) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT answer FROM answers WHERE year = ?1 AND day = ?2 AND part = ?3")
            .bind(i64::from(year))
            .bind(i64::from(day))
            .bind(i64::from(part.as_u8()))
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.try_get("answer")).transpose()
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Mark a puzzle part solved or unsolved for a language.
    pub async fn set_solved(
        &self,
        language: &str,
        year: u16,
        day: u8,
        part: Part,
        solved: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO solved (language, year, day, part, solved, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(language)
        .bind(i64::from(year))
        .bind(i64::from(day))
        .bind(i64::from(part.as_u8()))
        .bind(solved)
        .bind(updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Completion rows ordered by year, language, day and part.
    pub async fn list_solved(
        &self,
        year: Option<u16>,
        language: Option<&str>,
    ) -> Result<Vec<SolvedPart>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT language, year, day, part, solved, updated_at
            FROM solved
            WHERE (?1 IS NULL OR year = ?1)
              AND (?2 IS NULL OR language = ?2)
            ORDER BY year, language, day, part
            "#,
        )
        .bind(year.map(i64::from))
        .bind(language)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_solved_row).collect()
    }
}

fn decode_error(what: &str, e: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::Decode(format!("Invalid {}: {}", what, e).into())
}

/// Parse a database row into a RunRecord.
fn parse_run_row(row: &SqliteRow) -> Result<RunRecord, sqlx::Error> {
    let id: i64 = row.try_get("id")?;

    let ran_at_str: String = row.try_get("ran_at")?;
    let ran_at = DateTime::parse_from_rfc3339(&ran_at_str)
        .map_err(|e| decode_error("ran_at", e))?
        .with_timezone(&Utc);

    let year = u16::try_from(row.try_get::<i64, _>("year")?).map_err(|e| decode_error("year", e))?;
    let day = u8::try_from(row.try_get::<i64, _>("day")?).map_err(|e| decode_error("day", e))?;

    let part = u8::try_from(row.try_get::<i64, _>("part")?)
        .map_err(|e| decode_error("part", e))
        .and_then(|n| Part::try_from(n).map_err(|e| decode_error("part", e)))?;

    let running_time = match (
        row.try_get::<Option<i64>, _>("running_time")?,
        row.try_get::<Option<i32>, _>("unit")?,
    ) {
        (Some(value), Some(exponent)) => {
            let value = u64::try_from(value).map_err(|e| decode_error("running_time", e))?;
            let unit = MetricPrefix::try_from(exponent).map_err(|e| decode_error("unit", e))?;
            Some(RunningTime::new(value, unit))
        }
        (None, None) => None,
        (Some(_), None) | (None, Some(_)) => {
            return Err(decode_error("running_time", "value and unit must both be set"));
        }
    };

    Ok(RunRecord {
        id: Some(id),
        ran_at,
        year,
        day,
        language: row.try_get("language")?,
        part,
        answer: row.try_get("answer")?,
        running_time,
    })
}

fn parse_solved_row(row: &SqliteRow) -> Result<SolvedPart, sqlx::Error> {
    let updated_at_str: String = row.try_get("updated_at")?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map_err(|e| decode_error("updated_at", e))?
        .with_timezone(&Utc);

    let part = u8::try_from(row.try_get::<i64, _>("part")?)
        .map_err(|e| decode_error("part", e))
        .and_then(|n| Part::try_from(n).map_err(|e| decode_error("part", e)))?;

    Ok(SolvedPart {
        language: row.try_get("language")?,
        year: u16::try_from(row.try_get::<i64, _>("year")?).map_err(|e| decode_error("year", e))?,
        day: u8::try_from(row.try_get::<i64, _>("day")?).map_err(|e| decode_error("day", e))?,
        part,
        solved: row.try_get("solved")?,
        updated_at,
    })
}
