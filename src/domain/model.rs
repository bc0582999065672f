use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// One calendar month. Months are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Returns `None` unless `year >= 1` and `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if year >= 1 && (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`, or `None` for dates before year 1.
    pub fn containing(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month before this one. `None` below January of year 1.
    pub fn previous(&self) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    /// Unpadded `YYYY-M`, the way progress lines name a month.
    pub fn short_label(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Billed amount for one period, in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingRecord {
    pub period: Period,
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BillingRow {
    pub period: String,
    pub year: i32,
    pub month: u32,
    pub amount: Option<i64>,
}

impl From<&BillingRecord> for BillingRow {
    fn from(record: &BillingRecord) -> Self {
        Self {
            period: record.period.to_string(),
            year: record.period.year(),
            month: record.period.month(),
            amount: record.amount,
        }
    }
}
