use std::{collections::HashMap, fmt};

use anyhow::anyhow;

use super::{CellMapper, MapperResult, required_text};
use crate::{
    cell::CellResult,
    types::ParseFn,
    value::{IntoValue, Value},
};

/// Unit enum variants, by name or by zero-based ordinal.
#[derive(Debug, Clone)]
pub struct EnumMapper {
    type_name: &'static str,
    variants: &'static [&'static str],
    ignore_case: bool,
}

impl EnumMapper {
    pub fn new(
        type_name: &'static str,
        variants: &'static [&'static str],
        ignore_case: bool,
    ) -> Self {
        Self {
            type_name,
            variants,
            ignore_case,
        }
    }

    fn convert(&self, cell: &CellResult<'_>) -> anyhow::Result<Value> {
        let text = required_text(cell)?.trim();
        let by_name = self.variants.iter().position(|variant| {
            if self.ignore_case {
                variant.eq_ignore_ascii_case(text)
            } else {
                *variant == text
            }
        });
        if let Some(index) = by_name {
            return Ok(Value::Enum(index));
        }
        match text.parse::<usize>() {
            Ok(index) if index < self.variants.len() => Ok(Value::Enum(index)),
            _ => Err(anyhow!(
                "'{text}' is not a variant of {} (expected one of {})",
                self.type_name,
                self.variants.join(", ")
            )),
        }
    }
}

impl CellMapper for EnumMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(self.convert(cell))
    }
}

/// Delegates to a type's own string parser.
#[derive(Clone, Copy)]
pub struct ParseMapper {
    parse: ParseFn,
}

impl ParseMapper {
    pub fn new(parse: ParseFn) -> Self {
        Self { parse }
    }
}

impl CellMapper for ParseMapper {
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        MapperResult::from_result(required_text(cell).and_then(|text| (self.parse)(text)))
    }
}

impl fmt::Debug for ParseMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParseMapper")
    }
}

/// Lookup table from cell text to a fixed value. A hit ends the chain; a
/// miss abstains so later mappers still run.
#[derive(Debug, Clone)]
pub struct ValueMapMapper<V> {
    entries: HashMap<String, V>,
    ignore_case: bool,
}

impl<V> ValueMapMapper<V>
where
    V: IntoValue + Clone + Send + Sync,
{
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ignore_case: false,
        }
    }

    pub fn ignore_case(self) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
            ignore_case: true,
        }
    }

    fn lookup(&self, key: &str) -> Option<&V> {
        if self.ignore_case {
            self.entries.get(&key.to_lowercase())
        } else {
            self.entries.get(key)
        }
    }
}

impl<V> CellMapper for ValueMapMapper<V>
where
    V: IntoValue + Clone + Send + Sync,
{
    fn map(&self, cell: &CellResult<'_>, _previous: &MapperResult) -> MapperResult {
        let key = cell.string_value().unwrap_or_default();
        match self.lookup(key) {
            Some(value) => MapperResult::UseAndStop(value.clone().into_value()),
            None => MapperResult::IgnoreAndContinue,
        }
    }
}
