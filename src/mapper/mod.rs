//! Value converters and the result protocol that lets several of them
//! compete for one cell.
//!
//! A member's mappers run in registration order. Each returns a
//! [`MapperResult`]; [`MapperChainState`] folds those results into the
//! chain's outcome:
//!
//! - the first [`MapperResult::UseAndStop`] ends the chain immediately;
//! - the first [`MapperResult::UseIfNoOtherSucceeds`] is kept unless a later
//!   mapper stops the chain; later tentative results never displace it;
//! - [`MapperResult::Invalid`] replaces an earlier invalid result but never a
//!   tentative success;
//! - [`MapperResult::IgnoreAndContinue`] leaves the state untouched.

mod lookup;
mod scalar;
mod temporal;

use std::{fmt, ops::ControlFlow};

use anyhow::anyhow;

pub use lookup::{EnumMapper, ParseMapper, ValueMapMapper};
pub use scalar::{
    BoolMapper, CharMapper, DecimalMapper, FloatMapper, GuidMapper, IntegerMapper, StringMapper,
    UrlMapper, VersionMapper,
};
pub use temporal::{DateTimeMapper, DurationMapper};

use crate::{cell::CellResult, value::Value};

#[derive(Debug, Default)]
pub enum MapperResult {
    UseAndStop(Value),
    UseIfNoOtherSucceeds(Value),
    Invalid(anyhow::Error),
    #[default]
    IgnoreAndContinue,
}

impl MapperResult {
    /// `Ok` becomes an authoritative success, `Err` an invalid result.
    pub fn from_result(result: anyhow::Result<Value>) -> Self {
        match result {
            Ok(value) => MapperResult::UseAndStop(value),
            Err(err) => MapperResult::Invalid(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            MapperResult::UseAndStop(_) | MapperResult::UseIfNoOtherSucceeds(_)
        )
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, MapperResult::Invalid(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            MapperResult::UseAndStop(value) | MapperResult::UseIfNoOtherSucceeds(value) => {
                Some(value)
            }
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            MapperResult::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

pub trait CellMapper: Send + Sync {
    /// Attempts to convert `cell`. `previous` is the chain's running result
    /// so far (`IgnoreAndContinue` for the first mapper).
    fn map(&self, cell: &CellResult<'_>, previous: &MapperResult) -> MapperResult;
}

/// Running fold over the results of one mapper chain.
#[derive(Debug, Default)]
pub struct MapperChainState {
    current: MapperResult,
}

impl MapperChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &MapperResult {
        &self.current
    }

    pub fn push(&mut self, result: MapperResult) -> ControlFlow<()> {
        match result {
            MapperResult::UseAndStop(value) => {
                self.current = MapperResult::UseAndStop(value);
                return ControlFlow::Break(());
            }
            MapperResult::UseIfNoOtherSucceeds(value) => {
                if !matches!(self.current, MapperResult::UseIfNoOtherSucceeds(_)) {
                    self.current = MapperResult::UseIfNoOtherSucceeds(value);
                }
            }
            MapperResult::Invalid(err) => {
                if !matches!(self.current, MapperResult::UseIfNoOtherSucceeds(_)) {
                    self.current = MapperResult::Invalid(err);
                }
            }
            MapperResult::IgnoreAndContinue => {}
        }
        ControlFlow::Continue(())
    }

    pub fn finish(self) -> MapperResult {
        self.current
    }
}

/// Folds a precomputed sequence of results the same way a running chain
/// would.
pub fn fold_mapper_results<I>(results: I) -> MapperResult
where
    I: IntoIterator<Item = MapperResult>,
{
    let mut state = MapperChainState::new();
    for result in results {
        if state.push(result).is_break() {
            break;
        }
    }
    state.finish()
}

/// Runs `mappers` against `cell` and returns the chain's outcome.
pub fn run_mappers(mappers: &[Box<dyn CellMapper>], cell: &CellResult<'_>) -> MapperResult {
    let mut state = MapperChainState::new();
    for mapper in mappers {
        let result = mapper.map(cell, state.current());
        if state.push(result).is_break() {
            break;
        }
    }
    state.finish()
}

/// Adapts a closure into a mapper.
pub struct FnMapper<F>(pub F);

impl<F> CellMapper for FnMapper<F>
where
    F: Fn(&CellResult<'_>, &MapperResult) -> MapperResult + Send + Sync,
{
    fn map(&self, cell: &CellResult<'_>, previous: &MapperResult) -> MapperResult {
        (self.0)(cell, previous)
    }
}

impl<F> fmt::Debug for FnMapper<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnMapper")
    }
}

/// The text every parsing mapper starts from; empty cells that reach a
/// parser (no empty fallback configured) are invalid.
pub(crate) fn required_text<'c>(cell: &'c CellResult<'_>) -> anyhow::Result<&'c str> {
    match cell.string_value() {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(anyhow!("Cell is empty")),
    }
}
