use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PeriodMode {
    #[default]
    Week,
    Month,
}

impl PeriodMode {
    pub fn prefix(&self) -> &'static str {
        match self {
            PeriodMode::Week => "week",
            PeriodMode::Month => "month",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            PeriodMode::Week => PeriodMode::Month,
            PeriodMode::Month => PeriodMode::Week,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PeriodError {
    #[error("{mode} offset {offset} is outside the supported calendar range")]
    OutOfRange { mode: &'static str, offset: i64 },
}

/// A displayed week or month, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    mode: PeriodMode,
    start: NaiveDate,
}

impl Period {
    /// Resolves the period `offset` weeks or months away from the one containing `today`.
    ///
    /// Weeks start on Monday; a Sunday belongs to the week that began the
    /// Monday before it. Months start on the 1st and roll the year over in
    /// both directions.
    pub fn resolve(mode: PeriodMode, today: NaiveDate, offset: i64) -> Result<Self, PeriodError> {
        let out_of_range = || PeriodError::OutOfRange {
            mode: mode.prefix(),
            offset,
        };
        let start = match mode {
            PeriodMode::Week => {
                let back = u64::from(today.weekday().num_days_from_monday());
                let monday = today.checked_sub_days(Days::new(back));
                let shift = offset.unsigned_abs().checked_mul(7).map(Days::new);
                match (monday, shift) {
                    (Some(monday), Some(shift)) if offset >= 0 => monday.checked_add_days(shift),
                    (Some(monday), Some(shift)) => monday.checked_sub_days(shift),
                    _ => None,
                }
            }
            PeriodMode::Month => {
                let first = today.with_day(1);
                let shift = u32::try_from(offset.unsigned_abs()).ok().map(Months::new);
                match (first, shift) {
                    (Some(first), Some(shift)) if offset >= 0 => first.checked_add_months(shift),
                    (Some(first), Some(shift)) => first.checked_sub_months(shift),
                    _ => None,
                }
            }
        }
        .ok_or_else(out_of_range)?;
        Ok(Period { mode, start })
    }

    pub fn mode(&self) -> PeriodMode {
        self.mode
    }

    /// Storage key, e.g. `week-2026-10-12` or `month-2026-10-01`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.mode.prefix(), self.start.format("%Y-%m-%d"))
    }

    pub fn day_count(&self) -> usize {
        match self.mode {
            PeriodMode::Week => 7,
            PeriodMode::Month => days_in_month(self.start.year(), self.start.month()) as usize,
        }
    }

    pub fn date_of(&self, day_index: usize) -> Option<NaiveDate> {
        if day_index >= self.day_count() {
            return None;
        }
        self.start.checked_add_days(Days::new(day_index as u64))
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let delta = date.signed_duration_since(self.start).num_days();
        usize::try_from(delta)
            .ok()
            .filter(|idx| *idx < self.day_count())
    }

    /// Number of empty cells before the first day in a Monday-first grid.
    pub fn leading_blanks(&self) -> usize {
        self.start.weekday().num_days_from_monday() as usize
    }

    pub fn day_label(&self, day_index: usize) -> String {
        self.date_of(day_index)
            .map(|d| d.format("%a, %b %-d").to_string())
            .unwrap_or_default()
    }

    pub fn title(&self) -> String {
        match self.mode {
            PeriodMode::Week => format!("Week of {}", self.start.format("%b %-d, %Y")),
            PeriodMode::Month => self.start.format("%B %Y").to_string(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(31)
}
