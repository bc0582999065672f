//! Resolution of `--target-year-month` values into billing periods.

use crate::domain::model::Period;
use crate::domain::ports::Clock;
use crate::utils::error::ValidationError;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Size of the window produced when no target months are given.
pub const DEFAULT_WINDOW_MONTHS: usize = 12;

// ASCII digits only; `\d` would also accept other Unicode decimal digits.
static YEAR_MONTH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})$").unwrap());

/// Turns the raw option values into an ordered list of periods.
///
/// * `None` (option not given): the current month followed by the 11 months
///   before it, newest first. Rejected if that window reaches below year 1.
/// * `Some(&[])` (option given without a value): rejected.
/// * Otherwise every token is checked in order and the first bad one is
///   reported. Order and duplicates are kept as given.
pub fn resolve_target_periods(
    raw: Option<&[String]>,
    today: NaiveDate,
) -> Result<Vec<Period>, ValidationError> {
    let current = Period::containing(today);

    let Some(tokens) = raw else {
        let window: Vec<Period> = std::iter::successors(current, Period::previous)
            .take(DEFAULT_WINDOW_MONTHS)
            .collect();
        if window.len() < DEFAULT_WINDOW_MONTHS {
            return Err(ValidationError::WindowBeforeYearOne {
                today: today.to_string(),
            });
        }
        return Ok(window);
    };

    if tokens.is_empty() {
        return Err(ValidationError::EmptyOption);
    }

    tokens
        .iter()
        .map(|token| parse_target_period(token, current))
        .collect()
}

/// `current` is `None` when today is before year 1, so every month is ahead of it.
fn parse_target_period(token: &str, current: Option<Period>) -> Result<Period, ValidationError> {
    let caps = YEAR_MONTH_PATTERN
        .captures(token)
        .ok_or_else(|| ValidationError::PatternMismatch {
            value: token.to_string(),
        })?;

    let invalid = || ValidationError::InvalidYearMonth {
        value: token.to_string(),
    };
    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let period = Period::new(year, month).ok_or_else(invalid)?;

    if current.map_or(true, |current| period > current) {
        return Err(ValidationError::FutureMonth {
            value: token.to_string(),
        });
    }

    Ok(period)
}

/// Resolves against the date reported by `clock`.
pub struct PeriodResolver<C: Clock> {
    clock: C,
}

impl<C: Clock> PeriodResolver<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn resolve(&self, raw: Option<&[String]>) -> Result<Vec<Period>, ValidationError> {
        let today = self.clock.today();
        tracing::debug!("Resolving target months against {}", today);
        resolve_target_periods(raw, today)
    }
}
