//! Canonical interval text.
//!
//! Intervals are written the way Grafana hosts print them (`1m0s`, `500ms`,
//! `1h0m0s`) and parsed with the same grammar: a sequence of decimal numbers,
//! each followed by one of `ns`, `us`, `µs`, `μs`, `ms`, `s`, `m` or `h`,
//! with an optional leading sign.

use chrono::TimeDelta;
use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Interval text that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIntervalError {
    #[error("empty interval")]
    Empty,
    #[error("missing unit in interval \"{0}\"")]
    MissingUnit(String),
    #[error("unknown unit \"{unit}\" in interval \"{text}\"")]
    UnknownUnit { unit: String, text: String },
    #[error("invalid interval \"{0}\"")]
    Invalid(String),
    #[error("interval \"{0}\" out of range")]
    Overflow(String),
}

/// Formats an interval the way the host prints durations.
pub fn format_interval(interval: TimeDelta) -> String {
    let Some(nanos) = interval.num_nanoseconds() else {
        // beyond ±292 years; keep the sign and fall back to whole seconds
        return format!("{}s", interval.num_seconds());
    };
    let sign = if nanos < 0 { "-" } else { "" };
    let nanos = nanos.unsigned_abs() as u128;

    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{sign}{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{sign}{}µs", fraction(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SECOND {
        return format!("{sign}{}ms", fraction(nanos, NANOS_PER_MILLI));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let seconds = fraction(nanos % NANOS_PER_MINUTE, NANOS_PER_SECOND);

    let mut text = String::from(sign);
    if hours > 0 {
        text.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        text.push_str(&format!("{minutes}m"));
    }
    text.push_str(&format!("{seconds}s"));
    text
}

/// `value / unit` as a decimal without trailing zeros.
fn fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rest = value % unit;
    if rest == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{rest:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Parses interval text such as `30s`, `1m30s`, `1.5h` or `-250ms`.
pub fn parse_interval(text: &str) -> Result<TimeDelta, ParseIntervalError> {
    let mut rest = text;
    let negative = match rest.chars().next() {
        Some('-') => {
            rest = &rest[1..];
            true
        }
        Some('+') => {
            rest = &rest[1..];
            false
        }
        Some(_) => false,
        None => return Err(ParseIntervalError::Empty),
    };

    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(ParseIntervalError::Invalid(text.to_string()));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let (whole, frac) = match number.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (number, ""),
        };
        if (whole.is_empty() && frac.is_empty()) || frac.contains('.') {
            return Err(ParseIntervalError::Invalid(text.to_string()));
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(ParseIntervalError::MissingUnit(text.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| ParseIntervalError::UnknownUnit {
            unit: unit.to_string(),
            text: text.to_string(),
        })?;

        let overflow = || ParseIntervalError::Overflow(text.to_string());
        let whole_value: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut amount = whole_value.checked_mul(scale).ok_or_else(overflow)?;

        // digits past nanosecond precision are dropped
        let mut divisor: u128 = 1;
        let mut frac_value: u128 = 0;
        for digit in frac.bytes().take(20) {
            frac_value = frac_value * 10 + u128::from(digit - b'0');
            divisor *= 10;
        }
        amount = amount.checked_add(frac_value * scale / divisor).ok_or_else(overflow)?;

        total = total.checked_add(amount).ok_or_else(overflow)?;
        rest = tail;
    }

    let nanos = i64::try_from(total).map_err(|_| ParseIntervalError::Overflow(text.to_string()))?;
    Ok(TimeDelta::nanoseconds(if negative { -nanos } else { nanos }))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}
