use anyhow::{Context, anyhow};
use chrono::{NaiveDateTime, Utc};

use super::{CellMapper, MapperResult, required_text};
use crate::{
    cell::CellResult,
    parse,
    sheet::CellValue,
    types::TemporalKind,
    value::Value,
};

/// Dates, timestamps and times. Native date-time cells and spreadsheet serial
/// numbers are accepted as well as text in one of the configured formats.
///
/// Naive timestamps read into the UTC and offset kinds are taken to be UTC.
#[derive(Debug, Clone)]
pub struct DateTimeMapper {
    kind: TemporalKind,
    formats: Vec<String>,
}

impl DateTimeMapper {
    /// An empty `formats` list selects the built-in formats for `kind`.
    pub fn new(kind: TemporalKind, formats: Vec<String>) -> Self {
        Self { kind, formats }
    }

    fn from_timestamp(&self, timestamp: NaiveDateTime) -> Value {
        match self.kind {
            TemporalKind::Date => Value::Date(timestamp.date()),
            TemporalKind::DateTime => Value::DateTime(timestamp),
            TemporalKind::DateTimeUtc => Value::DateTimeUtc(timestamp.and_utc()),
            TemporalKind::DateTimeOffset => {
                Value::DateTimeOffset(timestamp.and_utc().fixed_offset())
            }
            TemporalKind::Time => Value::Time(timestamp.time()),
        }
    }

    fn convert(&self, cell: &CellResult<'_>) -> anyhow::Result<Value> {
        if !cell.preserves_formatting() {
            match cell.native_value() {
                CellValue::DateTime(dt) => return Ok(self.from_timestamp(*dt)),
                CellValue::Number(serial) => {
                    let timestamp = parse::serial_to_datetime(*serial)
                        .ok_or_else(|| anyhow!("{serial} is not a valid serial date"))?;
                    return Ok(self.from_timestamp(timestamp));
                }
                _ => {}
            }
        }
        let text = required_text(cell)?;
        match self.kind {
            TemporalKind::Date => parse::parse_naive_date(text, &self.formats)
                .or_else(|_| parse::parse_naive_datetime(text, &[]).map(|dt| dt.date()))
                .map(Value::Date),
            TemporalKind::DateTime => {
                parse::parse_naive_datetime(text, &self.formats).map(Value::DateTime)
            }
            TemporalKind::Time => parse::parse_naive_time(text, &self.formats).map(Value::Time),
            TemporalKind::DateTimeUtc => match parse::parse_datetime_offset(text, &[]) {
                Ok(offset) => Ok(Value::DateTimeUtc(offset.with_timezone(&Utc))),
                Err(_) => parse::parse_naive_datetime(text, &self.formats)
                    .map(|dt| Value::DateTimeUtc(dt.and_utc())),
            },
            TemporalKind::DateTimeOffset => {
                match parse::parse_datetime_offset(text, &self.formats) {
                    Ok(offset) => Ok(Value::DateTimeOffset(offset)),
                    Err(_) => parse::parse_naive_datetime(text, &[])
                        .map(|dt| Value::DateTimeOffset(dt.and_utc().fixed_offset()))
                        .with_context(|| {
                            format!("Failed to parse '{text}' as datetime with offset")
                        }),
                }
            }
        }
    }
}

impl CellMapper for DateTimeMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(self.convert(cell))
    }
}

/// Durations written as `[-][d.]hh:mm[:ss]`, or native numbers counted in
/// days.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationMapper;

impl DurationMapper {
    fn convert(&self, cell: &CellResult<'_>) -> anyhow::Result<Value> {
        if !cell.preserves_formatting()
            && let CellValue::Number(days) = cell.native_value()
        {
            return parse::serial_to_duration(*days)
                .map(Value::Duration)
                .ok_or_else(|| anyhow!("{days} is not a valid duration"));
        }
        parse::parse_duration(required_text(cell)?).map(Value::Duration)
    }
}

impl CellMapper for DurationMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(self.convert(cell))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveTime};

    use super::*;
    use crate::sheet::MemoryRow;

    fn text(value: &str) -> CellResult<'static> {
        CellResult::from_text(Some(0), Some(value.to_string()))
    }

    fn value_of(mapper: &dyn CellMapper, cell: &CellResult<'_>) -> Value {
        match mapper.map(cell, &MapperResult::IgnoreAndContinue) {
            MapperResult::UseAndStop(value) => value,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dates_parse_from_text_and_serials() {
        let mapper = DateTimeMapper::new(TemporalKind::Date, Vec::new());
        let expected = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        assert!(matches!(value_of(&mapper, &text("2023-03-15")), Value::Date(d) if d == expected));

        let row = MemoryRow::new(0, [CellValue::Number(45_000.0)]);
        assert!(matches!(
            value_of(&mapper, &CellResult::from_row(&row, 0)),
            Value::Date(d) if d == expected
        ));
    }

    #[test]
    fn custom_formats_replace_the_defaults() {
        let mapper = DateTimeMapper::new(TemporalKind::DateTime, vec!["%d.%m.%Y %H:%M".into()]);
        let result = mapper.map(&text("15.03.2023 08:30"), &MapperResult::IgnoreAndContinue);
        assert!(result.is_success());
        let result = mapper.map(&text("2023-03-15 08:30:00"), &MapperResult::IgnoreAndContinue);
        assert!(result.is_invalid());
    }

    #[test]
    fn offsets_are_kept_and_naive_values_default_to_utc() {
        let mapper = DateTimeMapper::new(TemporalKind::DateTimeOffset, Vec::new());
        match value_of(&mapper, &text("2024-01-02T03:04:05+02:00")) {
            Value::DateTimeOffset(dt) => assert_eq!(dt.offset().local_minus_utc(), 7200),
            other => panic!("unexpected {other:?}"),
        }
        match value_of(&mapper, &text("2024-01-02 03:04:05")) {
            Value::DateTimeOffset(dt) => assert_eq!(dt.offset().local_minus_utc(), 0),
            other => panic!("unexpected {other:?}"),
        }
        let utc = DateTimeMapper::new(TemporalKind::DateTimeUtc, Vec::new());
        match value_of(&utc, &text("2024-01-02T03:04:05+02:00")) {
            Value::DateTimeUtc(dt) => assert_eq!(dt.to_rfc3339(), "2024-01-02T01:04:05+00:00"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn times_and_durations() {
        let time = DateTimeMapper::new(TemporalKind::Time, Vec::new());
        let expected = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        assert!(matches!(value_of(&time, &text("14:30")), Value::Time(t) if t == expected));

        assert!(matches!(
            value_of(&DurationMapper, &text("1.02:00")),
            Value::Duration(d) if d == Duration::hours(26)
        ));
        let row = MemoryRow::new(0, [CellValue::Number(0.5)]);
        assert!(matches!(
            value_of(&DurationMapper, &CellResult::from_row(&row, 0)),
            Value::Duration(d) if d == Duration::hours(12)
        ));
    }
}
