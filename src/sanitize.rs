//! Field sanitizers. These never fail: a value that cannot be salvaged
//! becomes the empty string. Numbers are left alone so that range errors
//! still reach the validators.

use std::collections::HashSet;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::ids::{IdKind, is_valid_id};

static HTML_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").unwrap()
});

static MONEY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?").unwrap());

fn is_allowed_char(c: char) -> bool {
    c.is_alphanumeric() || c == ' ' || "-.,'_#".contains(c)
}

/// Removes markup from `value` (the markup itself, not just its escaping),
/// drops any character outside the allowed set and normalises whitespace.
///
/// ```
/// assert_eq!(kegler::sanitize::sanitize("<script>alert(1)</script>"), "alert1");
/// ```
pub fn sanitize(value: &str) -> String {
    let stripped = ammonia::Builder::empty()
        .clean_content_tags(HashSet::new())
        .clean(value)
        .to_string();
    let stripped = HTML_ENTITY.replace_all(&stripped, "");

    stripped
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| is_allowed_char(*c))
        .collect::<String>()
        .split_whitespace()
        .join(" ")
}

pub fn sanitize_opt(value: Option<&str>) -> Option<String> {
    value.map(sanitize)
}

/// Sanitizes a currency-like string. Currency symbols, grouping commas and
/// whitespace are removed and the leading signed decimal number is kept
/// verbatim. Anything that doesn't start with a number becomes `""`.
pub fn sanitize_currency(value: &str) -> String {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$' && *c != ',')
        .collect();

    match MONEY_PREFIX.find(&compact) {
        Some(m) if m.as_str().parse::<Decimal>().is_ok() => {
            m.as_str().to_string()
        }
        _ => String::new(),
    }
}

/// Blanks out identifiers which aren't well-formed for `kind`.
pub fn sanitize_id(value: &str, kind: IdKind) -> String {
    if is_valid_id(value, kind) {
        value.to_string()
    } else {
        String::new()
    }
}

/// Trims a time-of-day string; an empty time becomes absent.
pub fn sanitize_time(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|time| !time.is_empty())
        .map(str::to_string)
}
