use std::{cell::OnceCell, fmt};

use crate::{
    format::render_with_format,
    sheet::{CellValue, RowSource},
};

enum Origin<'r> {
    Row(&'r dyn RowSource),
    Text,
}

/// One located cell as seen by transformers, mappers and fallbacks.
///
/// The string and native values are fetched from the row on first access and
/// cached for the lifetime of the result.
pub struct CellResult<'r> {
    column: Option<usize>,
    origin: Origin<'r>,
    preserve_formatting: bool,
    string: OnceCell<Option<String>>,
    native: OnceCell<CellValue>,
}

impl<'r> CellResult<'r> {
    pub fn from_row(row: &'r dyn RowSource, column: usize) -> Self {
        Self {
            column: Some(column),
            origin: Origin::Row(row),
            preserve_formatting: false,
            string: OnceCell::new(),
            native: OnceCell::new(),
        }
    }

    /// A cell whose text is already known, e.g. one entry of a split cell.
    pub fn from_text(column: Option<usize>, text: Option<String>) -> Self {
        let native = match &text {
            Some(s) if !s.is_empty() => CellValue::String(s.clone()),
            _ => CellValue::Empty,
        };
        Self {
            column,
            origin: Origin::Text,
            preserve_formatting: false,
            string: OnceCell::from(text),
            native: OnceCell::from(native),
        }
    }

    /// Stand-in for a cell that lies beyond the end of a short row.
    pub fn missing(column: Option<usize>) -> Self {
        Self::from_text(column, None)
    }

    pub fn with_preserved_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }

    /// Same cell, with its text replaced by a transformer's output. A row
    /// cell keeps its native value only while the text is unchanged.
    pub fn with_text(&self, text: Option<String>) -> CellResult<'r> {
        let unchanged =
            matches!(self.origin, Origin::Row(_)) && text.as_deref() == self.string_value();
        let native = if unchanged {
            self.native_value().clone()
        } else {
            match &text {
                Some(s) if !s.is_empty() => CellValue::String(s.clone()),
                _ => CellValue::Empty,
            }
        };
        CellResult {
            column: self.column,
            origin: match self.origin {
                Origin::Row(row) => Origin::Row(row),
                Origin::Text => Origin::Text,
            },
            preserve_formatting: self.preserve_formatting,
            string: OnceCell::from(text),
            native: OnceCell::from(native),
        }
    }

    pub fn column_index(&self) -> Option<usize> {
        self.column
    }

    pub fn preserves_formatting(&self) -> bool {
        self.preserve_formatting
    }

    pub fn row_index(&self) -> Option<usize> {
        match self.origin {
            Origin::Row(row) => Some(row.row_index()),
            Origin::Text => None,
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        self.string
            .get_or_init(|| match (&self.origin, self.column) {
                (Origin::Row(row), Some(column)) => {
                    if self.preserve_formatting
                        && let Some(format) = row.number_format(column)
                        && let Some(rendered) = render_with_format(self.native_value(), format)
                    {
                        return Some(rendered);
                    }
                    row.string(column)
                }
                _ => None,
            })
            .as_deref()
    }

    pub fn native_value(&self) -> &CellValue {
        self.native.get_or_init(|| match (&self.origin, self.column) {
            (Origin::Row(row), Some(column)) => row.native(column),
            _ => CellValue::Empty,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.string_value().is_none_or(str::is_empty)
    }
}

impl fmt::Debug for CellResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellResult")
            .field("column", &self.column)
            .field("string", &self.string.get())
            .field("native", &self.native.get())
            .field("preserve_formatting", &self.preserve_formatting)
            .finish()
    }
}
