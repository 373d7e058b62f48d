//! Time periods, the production period, and day-level validity patterns.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// A half-open time interval `[start, end)` at second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimePeriod {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        TimePeriod { start, end }
    }

    /// Whether `t` falls inside the period.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }

    /// Whether the two periods overlap on a non-empty interval.
    pub fn intersects(&self, other: &TimePeriod) -> bool {
        self.start < other.end && other.start < self.end && !self.is_empty() && !other.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Last date covered by the period (the date of `end - 1s`).
    pub fn last_day(&self) -> NaiveDate {
        (self.end - Duration::seconds(1)).date()
    }
}

/// The half-open day interval `[begin, end)` during which the dataset is
/// valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionPeriod {
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl ProductionPeriod {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Self {
        ProductionPeriod { begin, end }
    }

    /// Last day inside the period.
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().expect("production period end must be a representable date")
    }

    /// Whether the whole period lies strictly before `day`.
    pub fn ends_before(&self, day: NaiveDate) -> bool {
        self.last_day() < day
    }

    /// Whether the whole period lies strictly after `day`.
    pub fn begins_after(&self, day: NaiveDate) -> bool {
        self.begin > day
    }
}

/// The set of days a vehicle journey runs, as an offset bitmap from a
/// reference date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityPattern {
    pub beginning_date: NaiveDate,
    days: Vec<bool>,
}

impl ValidityPattern {
    /// An all-inactive pattern spanning `num_days` from `beginning_date`.
    pub fn new(beginning_date: NaiveDate, num_days: usize) -> Self {
        ValidityPattern { beginning_date, days: vec![false; num_days] }
    }

    /// Build a pattern from the explicit list of active days. Days before
    /// `beginning_date` are ignored.
    pub fn from_dates(beginning_date: NaiveDate, active: &[NaiveDate]) -> Self {
        let mut days = Vec::new();
        for day in active {
            let offset = (*day - beginning_date).num_days();
            if offset < 0 {
                continue;
            }
            let offset = offset as usize;
            if days.len() <= offset {
                days.resize(offset + 1, false);
            }
            days[offset] = true;
        }
        ValidityPattern { beginning_date, days }
    }

    /// Mark `day` as active.
    pub fn add(&mut self, day: NaiveDate) {
        let offset = (day - self.beginning_date).num_days();
        if offset < 0 {
            return;
        }
        let offset = offset as usize;
        if self.days.len() <= offset {
            self.days.resize(offset + 1, false);
        }
        self.days[offset] = true;
    }

    /// Whether the journey runs on `day`.
    pub fn active(&self, day: NaiveDate) -> bool {
        let offset = (day - self.beginning_date).num_days();
        offset >= 0 && (offset as usize) < self.days.len() && self.days[offset as usize]
    }
}
