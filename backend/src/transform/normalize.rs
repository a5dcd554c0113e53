//! Typed row construction: presence check, then integer parsing.

use serde_json::Value;

use super::columns::{CanonicalField, ColumnMap};
use super::diagnostics::ExclusionReason;
use crate::models::{PageCandidate, RawRow};

/// Build a [`PageCandidate`] from a raw row.
///
/// Landing page, channel and sessions must be present and truthy. A
/// missing transactions value is not a presence failure; it surfaces as
/// [`ExclusionReason::InvalidNumber`] instead.
pub fn normalize_row(
    index: usize,
    row: &RawRow,
    columns: &ColumnMap,
) -> Result<PageCandidate, ExclusionReason> {
    let landing_page = lookup(row, columns, CanonicalField::LandingPage);
    let channel = lookup(row, columns, CanonicalField::ChannelGrouping);
    let sessions = lookup(row, columns, CanonicalField::Sessions);
    let transactions = lookup(row, columns, CanonicalField::Transactions);

    for (field, value) in [
        (CanonicalField::Sessions, sessions),
        (CanonicalField::ChannelGrouping, channel),
        (CanonicalField::LandingPage, landing_page),
    ] {
        if !is_truthy(value) {
            return Err(ExclusionReason::MissingField(field));
        }
    }

    let sessions =
        parse_int(sessions).ok_or(ExclusionReason::InvalidNumber(CanonicalField::Sessions))?;
    let transactions = parse_int(transactions)
        .ok_or(ExclusionReason::InvalidNumber(CanonicalField::Transactions))?;

    Ok(PageCandidate {
        row: index,
        landing_page: value_text(landing_page),
        channel_grouping: value_text(channel),
        sessions,
        transactions,
    })
}

/// Landing page text of a raw row, if any, for diagnostics.
pub fn landing_page_of(row: &RawRow, columns: &ColumnMap) -> Option<String> {
    match lookup(row, columns, CanonicalField::LandingPage) {
        Value::Null => None,
        value => Some(value_text(value)),
    }
}

fn lookup<'a>(row: &'a RawRow, columns: &ColumnMap, field: CanonicalField) -> &'a Value {
    row.get(columns.header(field)).unwrap_or(&Value::Null)
}

/// Empty strings, zero, `false` and null are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Base-10 integer from the start of a value.
///
/// Leading whitespace and a sign are accepted, parsing stops at the first
/// non-digit (`"12.9"` is 12, `"1,204"` is 1). No leading digit means no
/// number. Fractional JSON numbers are truncated toward zero.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_int_str(s),
        _ => None,
    }
}

fn parse_int_str(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let digits = &rest[..digits_len];
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
