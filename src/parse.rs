//! String parsing helpers shared by the built-in mappers.

use std::borrow::Cow;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_DATE_FORMATS: &[&str] =
    &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

pub const DEFAULT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub const DEFAULT_TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M", "%I:%M %p"];

pub const DEFAULT_TRUE_TOKENS: &[&str] = &["true", "t", "yes", "y", "1"];
pub const DEFAULT_FALSE_TOKENS: &[&str] = &["false", "f", "no", "n", "0"];

/// Day zero of the spreadsheet serial date system.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Explicitly configured number notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberOptions {
    pub decimal_separator: char,
    pub thousands_separator: Option<char>,
}

impl Default for NumberOptions {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            thousands_separator: None,
        }
    }
}

impl NumberOptions {
    /// Rewrites a localized number into the invariant form understood by
    /// `str::parse`, borrowing when nothing needs to change.
    pub fn normalize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        let value = value.trim();
        let needs_rewrite = self.decimal_separator != '.'
            || self
                .thousands_separator
                .is_some_and(|sep| value.contains(sep));
        if !needs_rewrite {
            return Cow::Borrowed(value);
        }
        let mut normalized = String::with_capacity(value.len());
        for ch in value.chars() {
            if Some(ch) == self.thousands_separator {
                continue;
            }
            if ch == self.decimal_separator {
                normalized.push('.');
            } else {
                normalized.push(ch);
            }
        }
        Cow::Owned(normalized)
    }
}

pub fn parse_i64(value: &str, options: &NumberOptions) -> Result<i64> {
    let normalized = options.normalize(value);
    normalized
        .parse::<i64>()
        .with_context(|| format!("Failed to parse '{value}' as integer"))
}

pub fn parse_u64(value: &str, options: &NumberOptions) -> Result<u64> {
    let normalized = options.normalize(value);
    let digits = normalized.strip_prefix('+').unwrap_or(&normalized);
    digits
        .parse::<u64>()
        .with_context(|| format!("Failed to parse '{value}' as unsigned integer"))
}

pub fn parse_f64(value: &str, options: &NumberOptions) -> Result<f64> {
    let normalized = options.normalize(value);
    normalized
        .parse::<f64>()
        .with_context(|| format!("Failed to parse '{value}' as float"))
}

pub fn parse_decimal(value: &str, options: &NumberOptions) -> Result<Decimal> {
    let normalized = options.normalize(value);
    if let Ok(parsed) = normalized.parse::<Decimal>() {
        return Ok(parsed);
    }
    Decimal::from_scientific(&normalized)
        .with_context(|| format!("Failed to parse '{value}' as decimal"))
}

pub fn parse_bool(value: &str, true_tokens: &[String], false_tokens: &[String]) -> Result<bool> {
    let trimmed = value.trim();
    if true_tokens.iter().any(|t| t.eq_ignore_ascii_case(trimmed)) {
        return Ok(true);
    }
    if false_tokens.iter().any(|t| t.eq_ignore_ascii_case(trimmed)) {
        return Ok(false);
    }
    bail!("Failed to parse '{value}' as boolean")
}

pub fn parse_guid(value: &str) -> Result<Uuid> {
    let trimmed = value.trim().trim_matches(|c| matches!(c, '{' | '}'));
    Uuid::parse_str(trimmed).with_context(|| format!("Failed to parse '{value}' as GUID"))
}

pub fn parse_char(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => bail!("Failed to parse '{value}' as a single character"),
    }
}

fn formats_or_default<'a>(formats: &'a [String], defaults: &'a [&'a str]) -> Vec<&'a str> {
    if formats.is_empty() {
        defaults.to_vec()
    } else {
        formats.iter().map(String::as_str).collect()
    }
}

pub fn parse_naive_date(value: &str, formats: &[String]) -> Result<NaiveDate> {
    let trimmed = value.trim();
    for fmt in formats_or_default(formats, DEFAULT_DATE_FORMATS) {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str, formats: &[String]) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in formats_or_default(formats, DEFAULT_DATETIME_FORMATS) {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    if formats.is_empty() {
        // A bare date is midnight on that day.
        if let Ok(date) = parse_naive_date(trimmed, &[]) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

pub fn parse_naive_time(value: &str, formats: &[String]) -> Result<NaiveTime> {
    let trimmed = value.trim();
    for fmt in formats_or_default(formats, DEFAULT_TIME_FORMATS) {
        if let Ok(parsed) = NaiveTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as time"))
}

pub fn parse_datetime_offset(value: &str, formats: &[String]) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    for fmt in formats {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed);
    }
    DateTime::parse_from_rfc2822(trimmed)
        .with_context(|| format!("Failed to parse '{value}' as datetime with offset"))
}

/// Parses `[-][d.]hh:mm[:ss[.fff]]` durations.
pub fn parse_duration(value: &str) -> Result<TimeDelta> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (days, clock) = match body.split_once('.') {
        Some((days, rest)) if rest.contains(':') && !days.contains(':') => (
            days.parse::<i64>()
                .with_context(|| format!("Failed to parse '{value}' as duration"))?,
            rest,
        ),
        _ => (0, body),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        bail!("Failed to parse '{value}' as duration");
    }
    let hours: i64 = parts[0]
        .parse()
        .with_context(|| format!("Failed to parse '{value}' as duration"))?;
    let minutes: i64 = parts[1]
        .parse()
        .with_context(|| format!("Failed to parse '{value}' as duration"))?;
    let seconds: f64 = match parts.get(2) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Failed to parse '{value}' as duration"))?,
        None => 0.0,
    };
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        bail!("Failed to parse '{value}' as duration");
    }
    let millis = ((seconds * 1000.0).round()) as i64;
    let total = Duration::days(days)
        + Duration::hours(hours)
        + Duration::minutes(minutes)
        + Duration::milliseconds(millis);
    Ok(if negative { -total } else { total })
}

/// Converts a spreadsheet serial day number into a timestamp.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let (year, month, day) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?.and_time(NaiveTime::MIN);
    let millis = (serial * SECONDS_PER_DAY * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    epoch.checked_add_signed(Duration::milliseconds(millis as i64))
}

pub fn serial_to_duration(serial: f64) -> Option<TimeDelta> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * SECONDS_PER_DAY * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    Some(Duration::milliseconds(millis as i64))
}

pub fn datetime_to_serial(value: NaiveDateTime) -> f64 {
    let (year, month, day) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or_default();
    let delta = value - epoch;
    delta.num_milliseconds() as f64 / (SECONDS_PER_DAY * 1000.0)
}
