use anyhow::{Context, anyhow, bail};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use semver::Version;
use url::Url;

use super::{CellMapper, MapperResult, required_text};
use crate::{
    cell::CellResult,
    parse::{self, NumberOptions},
    sheet::CellValue,
    types::{FloatKind, IntegerKind},
    value::Value,
};

/// Passes the cell text through unchanged. The result is tentative so a more
/// specific mapper registered later can still claim the cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMapper;

impl CellMapper for StringMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        let text = cell.string_value().unwrap_or_default().to_string();
        MapperResult::UseIfNoOtherSucceeds(Value::String(text))
    }
}

#[derive(Debug, Clone)]
pub struct BoolMapper {
    true_tokens: Vec<String>,
    false_tokens: Vec<String>,
}

impl Default for BoolMapper {
    fn default() -> Self {
        Self::new(
            parse::DEFAULT_TRUE_TOKENS.iter().map(|t| t.to_string()),
            parse::DEFAULT_FALSE_TOKENS.iter().map(|t| t.to_string()),
        )
    }
}

impl BoolMapper {
    pub fn new<T, F>(true_tokens: T, false_tokens: F) -> Self
    where
        T: IntoIterator<Item = String>,
        F: IntoIterator<Item = String>,
    {
        Self {
            true_tokens: true_tokens.into_iter().collect(),
            false_tokens: false_tokens.into_iter().collect(),
        }
    }

    fn convert(&self, cell: &CellResult<'_>) -> anyhow::Result<Value> {
        match cell.native_value() {
            CellValue::Bool(b) => return Ok(Value::Bool(*b)),
            CellValue::Number(n) if *n == 0.0 || *n == 1.0 => return Ok(Value::Bool(*n == 1.0)),
            _ => {}
        }
        let text = required_text(cell)?;
        parse::parse_bool(text, &self.true_tokens, &self.false_tokens).map(Value::Bool)
    }
}

impl CellMapper for BoolMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(self.convert(cell))
    }
}

/// Parses integers and checks them against the target width.
#[derive(Debug, Clone)]
pub struct IntegerMapper {
    kind: IntegerKind,
    options: NumberOptions,
}

impl IntegerMapper {
    pub fn new(kind: IntegerKind, options: NumberOptions) -> Self {
        Self { kind, options }
    }

    fn convert(&self, cell: &CellResult<'_>) -> anyhow::Result<Value> {
        let parsed: i128 = match cell.native_value() {
            CellValue::Number(n) if !cell.preserves_formatting() => {
                if n.fract() != 0.0 || !n.is_finite() {
                    bail!("{n} is not a whole number");
                }
                *n as i128
            }
            _ => {
                let text = required_text(cell)?;
                let normalized = self.options.normalize(text);
                let digits = normalized.strip_prefix('+').unwrap_or(&normalized);
                digits
                    .parse::<i128>()
                    .with_context(|| format!("Failed to parse '{text}' as integer"))?
            }
        };
        let (min, max) = self.kind.bounds();
        if parsed < min || parsed > max {
            bail!(
                "{parsed} is outside the range of {} ({min}..={max})",
                self.kind.name()
            );
        }
        Ok(if self.kind.is_signed() {
            Value::Int(parsed as i64)
        } else {
            Value::UInt(parsed as u64)
        })
    }
}

impl CellMapper for IntegerMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(self.convert(cell))
    }
}

#[derive(Debug, Clone)]
pub struct FloatMapper {
    kind: FloatKind,
    options: NumberOptions,
}

impl FloatMapper {
    pub fn new(kind: FloatKind, options: NumberOptions) -> Self {
        Self { kind, options }
    }

    fn convert(&self, cell: &CellResult<'_>) -> anyhow::Result<Value> {
        let parsed = match cell.native_value() {
            CellValue::Number(n) if !cell.preserves_formatting() => *n,
            _ => parse::parse_f64(required_text(cell)?, &self.options)?,
        };
        if self.kind == FloatKind::F32 && parsed.is_finite() && parsed.abs() > f64::from(f32::MAX)
        {
            bail!("{parsed} is outside the range of f32");
        }
        Ok(Value::Float(parsed))
    }
}

impl CellMapper for FloatMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(self.convert(cell))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecimalMapper {
    options: NumberOptions,
}

impl DecimalMapper {
    pub fn new(options: NumberOptions) -> Self {
        Self { options }
    }

    fn convert(&self, cell: &CellResult<'_>) -> anyhow::Result<Value> {
        if !cell.preserves_formatting()
            && let CellValue::Number(n) = cell.native_value()
        {
            return Decimal::from_f64(*n)
                .map(Value::Decimal)
                .ok_or_else(|| anyhow!("{n} cannot be represented as a decimal"));
        }
        parse::parse_decimal(required_text(cell)?, &self.options).map(Value::Decimal)
    }
}

impl CellMapper for DecimalMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(self.convert(cell))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CharMapper;

impl CellMapper for CharMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(
            required_text(cell).and_then(|text| parse::parse_char(text).map(Value::Char)),
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GuidMapper;

impl CellMapper for GuidMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(
            required_text(cell).and_then(|text| parse::parse_guid(text).map(Value::Guid)),
        )
    }
}

/// Semantic versions; `1` and `1.2` are read as `1.0.0` and `1.2.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionMapper;

impl VersionMapper {
    fn convert(&self, cell: &CellResult<'_>) -> anyhow::Result<Value> {
        let text = required_text(cell)?.trim();
        let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
        if let Ok(version) = Version::parse(text) {
            return Ok(Value::Version(version));
        }
        let components = text.split('.').count();
        if components < 3 && text.split('.').all(|c| c.parse::<u64>().is_ok()) {
            let padded = format!("{text}{}", ".0".repeat(3 - components));
            if let Ok(version) = Version::parse(&padded) {
                return Ok(Value::Version(version));
            }
        }
        Version::parse(text)
            .map(Value::Version)
            .with_context(|| format!("Failed to parse '{text}' as version"))
    }
}

impl CellMapper for VersionMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(self.convert(cell))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UrlMapper;

impl CellMapper for UrlMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(required_text(cell).and_then(|text| {
            Url::parse(text.trim())
                .map(Value::Url)
                .with_context(|| format!("Failed to parse '{text}' as URL"))
        }))
    }
}
