//! Completion summary.
//!
//! Every puzzle day is worth two stars, one per part. The last day only has
//! one puzzle, so solving its first part earns both.

use std::collections::BTreeMap;

use esb_core::Part;
use serde::Serialize;

use crate::db::SolvedPart;
use crate::lang::pad_day;

pub const LAST_DAY: u8 = 25;
pub const STARS_PER_DAY: u8 = 2;

/// Stars earned by one language during one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LangCompletion {
    pub year: u16,
    pub language: String,
    /// Stars per day; index 0 is day 1.
    pub days: Vec<u8>,
}

impl LangCompletion {
    pub fn stars(&self) -> u32 {
        self.days.iter().map(|&stars| u32::from(stars)).sum()
    }

    pub fn max_stars() -> u32 {
        u32::from(LAST_DAY) * u32::from(STARS_PER_DAY)
    }

    pub fn is_complete(&self) -> bool {
        self.stars() == Self::max_stars()
    }

    /// One cell per day, holding `symbol` once per star, aligned with
    /// [`days_header`].
    pub fn stars_line(&self, symbol: char) -> String {
        self.days
            .iter()
            .map(|&stars| {
                let filled = usize::from(stars);
                let empty = usize::from(STARS_PER_DAY).saturating_sub(filled);
                let mut cell = symbol.to_string().repeat(filled);
                cell.push_str(&" ".repeat(empty));
                cell
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// "01 02 ... 25"
pub fn days_header() -> String {
    (1..=LAST_DAY).map(pad_day).collect::<Vec<_>>().join(" ")
}

/// Group completion rows by year and language.
///
/// Languages with only unsolved parts still appear, with no stars.
pub fn completion(rows: &[SolvedPart]) -> Vec<LangCompletion> {
    let mut solved: BTreeMap<(u16, &str), [[bool; 2]; LAST_DAY as usize]> = BTreeMap::new();

    for row in rows {
        let Some(day) = usize::from(row.day).checked_sub(1).filter(|&d| d < usize::from(LAST_DAY))
        else {
            tracing::debug!(year = row.year, day = row.day, "ignoring completion of unknown day");
            continue;
        };
        let parts = solved
            .entry((row.year, row.language.as_str()))
            .or_insert([[false; 2]; LAST_DAY as usize]);
        let part = match row.part {
            Part::One => 0,
            Part::Two => 1,
        };
        parts[day][part] |= row.solved;
    }

    solved
        .into_iter()
        .map(|((year, language), parts)| LangCompletion {
            year,
            language: language.to_string(),
            days: parts
                .iter()
                .zip(1..=LAST_DAY)
                .map(|(&[one, two], day)| day_stars(day, one, two))
                .collect(),
        })
        .collect()
}

fn day_stars(day: u8, one: bool, two: bool) -> u8 {
    if day == LAST_DAY && one {
        return STARS_PER_DAY;
    }
    u8::from(one) + u8::from(two)
}
