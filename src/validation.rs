use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    record::Record,
    sanitize::{sanitize, sanitize_currency},
};

pub const MAX_SORT_ORDER: i64 = 1_234_567;
pub const MAX_GAMES: i64 = 99;
pub const MAX_LANE: i64 = 200;
pub const MAX_AVERAGE: i64 = 300;
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2200;

/// The largest amount of money any fee or payout may carry.
pub fn max_money() -> Decimal {
    Decimal::from(999_999)
}

/// Outcome of validating a record.
#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorCode {
    None,
    /// A required field is absent, blank, or sanitizes to blank.
    MissingData,
    /// Every required field is present but at least one is malformed or out
    /// of range.
    InvalidData,
}

impl ErrorCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, ErrorCode::None)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorCode::None => "none",
            ErrorCode::MissingData => "missing data",
            ErrorCode::InvalidData => "invalid data",
        })
    }
}

/// Classifies a record. Missing data takes precedence over invalid data, so
/// `valid` is only consulted when nothing is missing.
pub fn classify(missing: bool, valid: impl FnOnce() -> bool) -> ErrorCode {
    if missing {
        ErrorCode::MissingData
    } else if valid() {
        ErrorCode::None
    } else {
        ErrorCode::InvalidData
    }
}

/// True for an identifier that hasn't been filled in.
pub fn is_blank(id: &str) -> bool {
    id.trim().is_empty()
}

/// True if a required string is absent once sanitized.
pub fn is_missing(value: &str) -> bool {
    sanitize(value).is_empty()
}

pub fn is_missing_opt(value: Option<&str>) -> bool {
    value.is_none_or(is_missing)
}

pub fn is_missing_money(value: &str) -> bool {
    sanitize_currency(value).is_empty()
}

/// A name is valid if it is already in sanitized form and no longer than
/// `max_len` characters.
pub fn is_valid_name(value: &str, max_len: usize) -> bool {
    !value.is_empty()
        && value.chars().count() <= max_len
        && sanitize(value) == value
}

pub fn is_valid_int(value: i64, min: i64, max: i64) -> bool {
    (min..=max).contains(&value)
}

pub fn is_valid_opt_int(value: Option<i64>, min: i64, max: i64) -> bool {
    value.is_some_and(|v| is_valid_int(v, min, max))
}

pub fn is_valid_sort_order(value: i64) -> bool {
    is_valid_int(value, 1, MAX_SORT_ORDER)
}

pub fn is_even(value: i64) -> bool {
    value % 2 == 0
}

pub fn is_odd(value: i64) -> bool {
    value % 2 != 0
}

/// Parses a money string, provided it is already in sanitized form.
pub fn parse_money(value: &str) -> Option<Decimal> {
    if sanitize_currency(value) != value {
        return None;
    }
    value.parse::<Decimal>().ok()
}

/// Checks that `value` is a sanitized decimal string within `[min, max]`.
pub fn is_valid_money(value: &str, min: Decimal, max: Decimal) -> bool {
    parse_money(value).is_some_and(|amount| amount >= min && amount <= max)
}

/// A fee: strictly positive and at most [`max_money`].
pub fn is_valid_fee(value: &str) -> bool {
    parse_money(value)
        .is_some_and(|amount| amount > Decimal::ZERO && amount <= max_money())
}

/// A non-negative amount of at most [`max_money`].
pub fn is_valid_amount(value: &str) -> bool {
    is_valid_money(value, Decimal::ZERO, max_money())
}

pub fn is_valid_date(date: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

static TIME_24H: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").unwrap());

/// A 24 hour `HH:MM` time of day.
pub fn is_valid_time(value: &str) -> bool {
    TIME_24H.is_match(value)
}

/// The result of validating a collection of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<R> {
    pub records: Vec<R>,
    pub error_code: ErrorCode,
}

impl<R> Validated<R> {
    pub fn is_ok(&self) -> bool {
        self.error_code.is_ok()
    }
}

/// Sanitizes and validates a collection, in order, stopping at the first
/// record that fails.
///
/// Every record must share the first record's parent. A record with another
/// parent stops validation with [`ErrorCode::InvalidData`] and the records
/// accepted before it. A record that fails its own validation stops
/// validation with that record's code and no records at all.
pub fn validate_records<R: Record>(records: &[R]) -> Validated<R> {
    let Some(first) = records.first() else {
        return Validated {
            records: Vec::new(),
            error_code: ErrorCode::None,
        };
    };
    let parent_id = first.sanitized().parent_id().to_string();

    let mut accepted = Vec::with_capacity(records.len());
    for record in records {
        let record = record.sanitized();

        if record.parent_id() != parent_id {
            tracing::debug!(
                id = record.id(),
                expected = %parent_id,
                got = record.parent_id(),
                "record has a different parent to the rest of the batch"
            );
            return Validated {
                records: accepted,
                error_code: ErrorCode::InvalidData,
            };
        }

        let error_code = record.validate();
        if !error_code.is_ok() {
            tracing::debug!(id = record.id(), %error_code, "record rejected");
            return Validated {
                records: Vec::new(),
                error_code,
            };
        }

        accepted.push(record);
    }

    Validated {
        records: accepted,
        error_code: ErrorCode::None,
    }
}
