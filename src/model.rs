//! Core data types shared by every stage of the flow pipeline.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FlowError, Result};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One weekly reporting row for one station, as produced by ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line in the source file, kept for diagnostics.
    pub row: u64,
    pub station_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_count: i64,
    pub subcategory_count: i64,
}

impl RawRecord {
    /// Records are bucketed by the month their reporting period starts in.
    pub fn month_key(&self) -> MonthKey {
        MonthKey::from_date(self.period_start)
    }
}

/// Travel direction on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Outbound, Direction::Inbound];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => write!(f, "outbound"),
            Direction::Inbound => write!(f, "inbound"),
        }
    }
}

/// A calendar month. Orders by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(FlowError::Config(format!(
                "month {month} of {year} is not in 1..=12"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn january(year: i32) -> Self {
        Self { year, month: 1 }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The key `n` months later.
    pub fn offset(&self, n: u32) -> Self {
        let index = self.ordinal() + i64::from(n);
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Months elapsed since year 0, used for window arithmetic.
    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    pub fn abbreviation(&self) -> &'static str {
        MONTH_ABBREVIATIONS[(self.month - 1) as usize]
    }

    /// Short display label such as `Mar 2020`.
    pub fn label(&self) -> String {
        format!("{} {}", self.abbreviation(), self.year)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FlowError::Config(format!("invalid month key '{s}', expected YYYY-MM"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        MonthKey::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// A contiguous run of months. Time steps are 1-based positions in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub start: MonthKey,
    pub months: u32,
}

impl MonthWindow {
    pub fn new(start: MonthKey, months: u32) -> Self {
        Self { start, months }
    }

    pub fn len(&self) -> usize {
        self.months as usize
    }

    pub fn is_empty(&self) -> bool {
        self.months == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = MonthKey> + '_ {
        (0..self.months).map(|i| self.start.offset(i))
    }

    pub fn last(&self) -> Option<MonthKey> {
        self.months.checked_sub(1).map(|n| self.start.offset(n))
    }

    pub fn contains(&self, key: MonthKey) -> bool {
        self.step_of(key).is_some()
    }

    /// 1-based time step of `key`, if it falls inside the window.
    pub fn step_of(&self, key: MonthKey) -> Option<u32> {
        let delta = key.ordinal() - self.start.ordinal();
        if delta >= 0 && delta < i64::from(self.months) {
            Some(delta as u32 + 1)
        } else {
            None
        }
    }

    pub fn key_at(&self, step: u32) -> Option<MonthKey> {
        if step >= 1 && step <= self.months {
            Some(self.start.offset(step - 1))
        } else {
            None
        }
    }

    /// Time steps as x coordinates: `1.0, 2.0, ..., N`.
    pub fn x_positions(&self) -> Vec<f64> {
        (1..=self.months).map(f64::from).collect()
    }
}

/// Monthly ridership for one direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub month: MonthKey,
    pub direction: Direction,
    pub total: i64,
    pub subcategory_amount: i64,
    /// `total - subcategory_amount`. Negative only for malformed source data.
    pub complement_amount: i64,
    /// Number of weekly records summed into this month.
    pub weekly_rows: usize,
}

impl MonthlyAggregate {
    /// A month with no contributing records.
    pub fn empty(month: MonthKey, direction: Direction) -> Self {
        Self {
            month,
            direction,
            total: 0,
            subcategory_amount: 0,
            complement_amount: 0,
            weekly_rows: 0,
        }
    }

    /// False for months synthesized to fill a gap in the source.
    pub fn is_observed(&self) -> bool {
        self.weekly_rows > 0
    }
}

/// One aggregate per month of the window, ascending, for a single direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySeries {
    direction: Direction,
    entries: Vec<MonthlyAggregate>,
}

impl MonthlySeries {
    /// Checks that `entries` covers `window` exactly, in order, for `direction`.
    pub fn new(
        direction: Direction,
        window: &MonthWindow,
        entries: Vec<MonthlyAggregate>,
    ) -> Result<Self> {
        if entries.len() != window.len() {
            return Err(FlowError::Config(format!(
                "{direction} series has {} months, window has {}",
                entries.len(),
                window.len()
            )));
        }
        for (expected, entry) in window.keys().zip(&entries) {
            if entry.month != expected || entry.direction != direction {
                return Err(FlowError::Config(format!(
                    "{direction} series entry {} ({}) does not match window month {expected}",
                    entry.month, entry.direction
                )));
            }
        }
        Ok(Self { direction, entries })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn entries(&self) -> &[MonthlyAggregate] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aggregate at a 1-based time step.
    pub fn at_step(&self, step: u32) -> Option<&MonthlyAggregate> {
        step.checked_sub(1).and_then(|i| self.entries.get(i as usize))
    }

    pub fn totals(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|e| e.total)
    }
}
