//! Error taxonomy for class-map construction, sheet binding and row mapping.
//!
//! Configuration problems ([`MappingError::UnsupportedType`],
//! [`MappingError::MissingHeader`], [`MappingError::ColumnNotFound`], ...)
//! surface before the first row is read. Row-level problems
//! ([`MappingError::EmptyValue`], [`MappingError::InvalidValue`], ...) carry
//! the sheet, row, column and member path that failed so the caller can stop
//! or skip precisely.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = MappingError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("cannot map type `{type_name}`: {reason}")]
    UnsupportedType {
        type_name: &'static str,
        reason: String,
    },
    #[error("record type `{type_name}` contains itself through member `{member}`")]
    RecursiveRecord {
        type_name: &'static str,
        member: String,
    },
    #[error("invalid mapping configuration: {0}")]
    Configuration(String),
    #[error("member `{member}` is not declared on `{type_name}`")]
    UnknownMember {
        type_name: &'static str,
        member: String,
    },
    #[error(
        "sheet '{sheet}' has no header row, so member `{member}` cannot locate columns by name"
    )]
    MissingHeader { sheet: String, member: String },
    #[error("sheet '{sheet}': could not find {reference} for member `{member}`")]
    ColumnNotFound {
        sheet: String,
        member: String,
        reference: String,
    },
    #[error("sheet '{sheet}', row {row}{}: member `{member}` has an empty cell", column_suffix(.column))]
    EmptyValue {
        sheet: String,
        row: usize,
        column: Option<usize>,
        member: String,
    },
    #[error(
        "sheet '{sheet}', row {row}{}: member `{member}` cannot use value {value:?}",
        column_suffix(.column)
    )]
    InvalidValue {
        sheet: String,
        row: usize,
        column: Option<usize>,
        member: String,
        value: Option<String>,
        #[source]
        source: BoxError,
    },
    #[error("sheet '{sheet}', row {row}: fallback for member `{member}` failed")]
    Fallback {
        sheet: String,
        row: usize,
        member: String,
        #[source]
        source: BoxError,
    },
    #[error("sheet '{sheet}', row {row}: building member `{member}` failed")]
    Factory {
        sheet: String,
        row: usize,
        member: String,
        #[source]
        source: FactoryError,
    },
    #[error("a {found} value cannot be assigned to `{expected}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Failures raised by collection, dictionary and multidimensional factories.
///
/// `NotStarted` and `AlreadyStarted` signal a lifecycle bug in the caller;
/// the remaining variants are caused by the row's data.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("`{operation}` called before `begin`")]
    NotStarted { operation: &'static str },
    #[error("`begin` called while a container is already being built")]
    AlreadyStarted,
    #[error("index {index} is out of range for a container of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("expected {expected} element(s) but received {found}")]
    Length { expected: usize, found: usize },
    #[error("expected {expected} dimension(s) but received {found}")]
    Rank { expected: usize, found: usize },
    #[error("element at position {position} was never set")]
    MissingElement { position: usize },
    #[error("duplicate key {key}")]
    DuplicateKey { key: String },
    #[error(transparent)]
    Item(#[from] Box<MappingError>),
}

impl From<MappingError> for FactoryError {
    fn from(err: MappingError) -> Self {
        FactoryError::Item(Box::new(err))
    }
}

impl MappingError {
    /// Dotted path of the member the error refers to, if any.
    pub fn member(&self) -> Option<&str> {
        match self {
            MappingError::MissingHeader { member, .. }
            | MappingError::ColumnNotFound { member, .. }
            | MappingError::EmptyValue { member, .. }
            | MappingError::InvalidValue { member, .. }
            | MappingError::Fallback { member, .. }
            | MappingError::Factory { member, .. } => Some(member),
            _ => None,
        }
    }

    /// Prefixes the member path with the enclosing record member.
    pub(crate) fn within(mut self, parent: &str) -> Self {
        match &mut self {
            MappingError::MissingHeader { member, .. }
            | MappingError::ColumnNotFound { member, .. }
            | MappingError::EmptyValue { member, .. }
            | MappingError::InvalidValue { member, .. }
            | MappingError::Fallback { member, .. }
            | MappingError::Factory { member, .. } => *member = format!("{parent}.{member}"),
            _ => {}
        }
        self
    }

    /// Row index for errors raised while mapping a row.
    pub fn row(&self) -> Option<usize> {
        match self {
            MappingError::EmptyValue { row, .. }
            | MappingError::InvalidValue { row, .. }
            | MappingError::Fallback { row, .. }
            | MappingError::Factory { row, .. } => Some(*row),
            _ => None,
        }
    }
}

fn column_suffix(column: &Option<usize>) -> String {
    match column {
        Some(index) => format!(", column {index}"),
        None => String::new(),
    }
}

pub(crate) fn boxed(err: anyhow::Error) -> BoxError {
    err.into()
}
