// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Constant KQL timespan literals.
//!
//! Two notations are recognized:
//!
//! - a number with a unit suffix: `2d`, `1.5h`, `30min`, `10s`, `100ms`,
//!   `5microseconds`, `3ticks`
//! - clock notation: `[-][d.]hh:mm[:ss[.fffffff]]`
//!
//! Values are computed in ticks (100ns) and converted to seconds last so that
//! common sub-second literals such as `100ms` come out exactly as written.

const TICKS_PER_SECOND: f64 = 10_000_000.0;
const TICKS_PER_MINUTE: f64 = 60.0 * TICKS_PER_SECOND;
const TICKS_PER_HOUR: f64 = 60.0 * TICKS_PER_MINUTE;
const TICKS_PER_DAY: f64 = 24.0 * TICKS_PER_HOUR;

const UNITS: &[(&str, f64)] = &[
    ("d", TICKS_PER_DAY),
    ("day", TICKS_PER_DAY),
    ("days", TICKS_PER_DAY),
    ("h", TICKS_PER_HOUR),
    ("hr", TICKS_PER_HOUR),
    ("hrs", TICKS_PER_HOUR),
    ("hour", TICKS_PER_HOUR),
    ("hours", TICKS_PER_HOUR),
    ("m", TICKS_PER_MINUTE),
    ("min", TICKS_PER_MINUTE),
    ("minute", TICKS_PER_MINUTE),
    ("minutes", TICKS_PER_MINUTE),
    ("s", TICKS_PER_SECOND),
    ("sec", TICKS_PER_SECOND),
    ("second", TICKS_PER_SECOND),
    ("seconds", TICKS_PER_SECOND),
    ("ms", 10_000.0),
    ("milli", 10_000.0),
    ("millis", 10_000.0),
    ("millisec", 10_000.0),
    ("millisecond", 10_000.0),
    ("milliseconds", 10_000.0),
    ("micro", 10.0),
    ("micros", 10.0),
    ("microsec", 10.0),
    ("microsecond", 10.0),
    ("microseconds", 10.0),
    ("tick", 1.0),
    ("ticks", 1.0),
];

/// Parse a constant timespan literal and return its length in seconds.
///
/// A bare number is *not* a timespan here; see [`parse_timespan_argument`].
pub fn parse_const_timespan(text: &str) -> Option<f64> {
    let (negative, body) = split_sign(text.trim());
    let ticks = if body.contains(':') {
        parse_clock(body)?
    } else {
        parse_with_unit(body)?
    };
    Some(to_seconds(negative, ticks))
}

/// Parse the body of a `timespan(...)` literal, where a bare number counts days.
pub fn parse_timespan_argument(text: &str) -> Option<f64> {
    if let Some(seconds) = parse_const_timespan(text) {
        return Some(seconds);
    }
    let (negative, body) = split_sign(text.trim());
    let days = parse_unsigned(body)?;
    Some(to_seconds(negative, days * TICKS_PER_DAY))
}

pub fn is_const_timespan(text: &str) -> bool {
    parse_const_timespan(text).is_some()
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

fn to_seconds(negative: bool, ticks: f64) -> f64 {
    let seconds = ticks / TICKS_PER_SECOND;
    if negative {
        -seconds
    } else {
        seconds
    }
}

/// Digits with an optional fractional part. Signs and exponents are rejected.
fn parse_unsigned(text: &str) -> Option<f64> {
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in text.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }
    text.parse::<f64>().ok()
}

fn parse_with_unit(text: &str) -> Option<f64> {
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|&idx| idx > 0)?;
    let (number, unit) = text.split_at(split);
    let value = parse_unsigned(number)?;
    let ticks_per_unit = UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, ticks)| *ticks)?;
    Some(value * ticks_per_unit)
}

fn parse_integer(text: &str, max: Option<u32>) -> Option<f64> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: u32 = text.parse().ok()?;
    match max {
        Some(max) if value > max => None,
        _ => Some(f64::from(value)),
    }
}

fn parse_clock(text: &str) -> Option<f64> {
    let mut parts = text.split(':');
    let head = parts.next()?;
    let minutes = parts.next()?;
    let seconds = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let (days, hours) = match head.split_once('.') {
        Some((days, hours)) => (parse_integer(days, None)?, hours),
        None => (0.0, head),
    };
    let hours = parse_integer(hours, Some(23))?;
    let minutes = parse_integer(minutes, Some(59))?;

    let second_ticks = match seconds {
        None => 0.0,
        Some(seconds) => parse_clock_seconds(seconds)?,
    };

    Some(
        days * TICKS_PER_DAY
            + hours * TICKS_PER_HOUR
            + minutes * TICKS_PER_MINUTE
            + second_ticks,
    )
}

/// `ss` or `ss.fffffff`, in ticks.
fn parse_clock_seconds(text: &str) -> Option<f64> {
    let Some((whole, fraction)) = text.split_once('.') else {
        return Some(parse_integer(text, Some(59))? * TICKS_PER_SECOND);
    };
    let whole = parse_integer(whole, Some(59))?;
    let digits = fraction.len();
    if digits > 7 {
        return None;
    }
    // Ticks per unit of the last fractional digit.
    const SCALE: [f64; 8] = [1e7, 1e6, 1e5, 1e4, 1e3, 1e2, 1e1, 1.0];
    Some(whole * TICKS_PER_SECOND + parse_integer(fraction, None)? * SCALE[digits])
}
