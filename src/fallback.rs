//! Recovery policies for empty cells and for cells no mapper accepted.

use std::fmt;

use crate::{
    cell::CellResult,
    error::{MappingError, Result, boxed},
    value::{IntoValue, Value},
};

/// Everything a fallback may inspect. `error` is set only for the invalid
/// fallback and holds the last error reported by the mapper chain.
pub struct FallbackContext<'a> {
    pub sheet: &'a str,
    pub row: usize,
    pub member: &'a str,
    pub cell: &'a CellResult<'a>,
    pub error: Option<anyhow::Error>,
}

impl FallbackContext<'_> {
    /// The row error the pipeline raises when no fallback recovers.
    pub fn into_error(self) -> MappingError {
        let column = self.cell.column_index();
        match self.error {
            None => MappingError::EmptyValue {
                sheet: self.sheet.to_string(),
                row: self.row,
                column,
                member: self.member.to_string(),
            },
            Some(err) => MappingError::InvalidValue {
                sheet: self.sheet.to_string(),
                row: self.row,
                column,
                member: self.member.to_string(),
                value: self.cell.string_value().map(str::to_string),
                source: boxed(err),
            },
        }
    }
}

pub trait Fallback: Send + Sync {
    fn perform(&self, ctx: FallbackContext<'_>) -> Result<Value>;
}

/// Fails the row with `EmptyValue` or `InvalidValue`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrowFallback;

impl Fallback for ThrowFallback {
    fn perform(&self, ctx: FallbackContext<'_>) -> Result<Value> {
        Err(ctx.into_error())
    }
}

#[derive(Debug, Clone)]
pub struct FixedValueFallback<T>(pub T);

impl<T> Fallback for FixedValueFallback<T>
where
    T: IntoValue + Clone + Send + Sync,
{
    fn perform(&self, _ctx: FallbackContext<'_>) -> Result<Value> {
        Ok(self.0.clone().into_value())
    }
}

/// Produces the target type's default value.
#[derive(Clone, Copy)]
pub struct DefaultValueFallback {
    make: fn() -> Value,
}

impl DefaultValueFallback {
    pub fn new(make: fn() -> Value) -> Self {
        Self { make }
    }

    pub fn of<T: Default + IntoValue>() -> Self {
        Self {
            make: || T::default().into_value(),
        }
    }
}

impl Fallback for DefaultValueFallback {
    fn perform(&self, _ctx: FallbackContext<'_>) -> Result<Value> {
        Ok((self.make)())
    }
}

impl fmt::Debug for DefaultValueFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultValueFallback")
    }
}

/// Leaves an optional member unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFallback;

impl Fallback for NullFallback {
    fn perform(&self, _ctx: FallbackContext<'_>) -> Result<Value> {
        Ok(Value::Null)
    }
}

/// Computes the replacement with a closure; a closure error fails the row.
pub struct ComputedFallback<F>(pub F);

impl<F> Fallback for ComputedFallback<F>
where
    F: Fn(&FallbackContext<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    fn perform(&self, ctx: FallbackContext<'_>) -> Result<Value> {
        (self.0)(&ctx).map_err(|err| MappingError::Fallback {
            sheet: ctx.sheet.to_string(),
            row: ctx.row,
            member: ctx.member.to_string(),
            source: boxed(err),
        })
    }
}

impl<F> fmt::Debug for ComputedFallback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComputedFallback")
    }
}
