//! Boundary with the physical sheet layer.
//!
//! Readers only need the header table ([`SheetSource`]) and raw per-cell
//! access ([`RowSource`]). [`MemorySheet`] is a self-contained implementation
//! used for tests and for callers that already hold their rows in memory.

use std::{collections::HashMap, io::Read};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::warn;

use crate::parse::datetime_to_serial;

/// A cell's underlying scalar as stored by the sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Renders the value the way the sheet displays it without a number
    /// format.
    pub fn as_display(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::String(s) => Some(s.clone()),
            CellValue::Number(f) => Some(if f.fract() == 0.0 && f.abs() < 1e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }),
            CellValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            CellValue::Error(code) => Some(code.clone()),
        }
    }

    /// Numeric view used by number formats; dates become serial day numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(f) => Some(*f),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::DateTime(dt) => Some(datetime_to_serial(*dt)),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

/// Column name table of a sheet, built once when the sheet is opened.
#[derive(Debug, Clone, Default)]
pub struct HeaderTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl HeaderTable {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if index.contains_key(name) {
                warn!("Duplicate header '{name}' at column {idx}; the first occurrence wins");
                continue;
            }
            index.insert(name.clone(), idx);
        }
        Self { names, index }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub trait SheetSource {
    fn name(&self) -> &str;

    /// `None` when the sheet has no header row.
    fn header(&self) -> Option<&HeaderTable>;

    fn column_count(&self) -> usize;
}

pub trait RowSource {
    fn row_index(&self) -> usize;

    fn field_count(&self) -> usize;

    /// Raw string content of a cell, `None` when the cell is blank or absent.
    fn string(&self, column: usize) -> Option<String>;

    fn native(&self, column: usize) -> CellValue;

    fn number_format(&self, column: usize) -> Option<&str>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRow {
    index: usize,
    cells: Vec<CellValue>,
    formats: Vec<Option<String>>,
}

impl MemoryRow {
    pub fn new<I, V>(index: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        Self {
            index,
            cells: cells.into_iter().map(Into::into).collect(),
            formats: Vec::new(),
        }
    }

    pub fn with_format(mut self, column: usize, format: impl Into<String>) -> Self {
        if self.formats.len() <= column {
            self.formats.resize(column + 1, None);
        }
        self.formats[column] = Some(format.into());
        self
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }
}

impl RowSource for MemoryRow {
    fn row_index(&self) -> usize {
        self.index
    }

    fn field_count(&self) -> usize {
        self.cells.len()
    }

    fn string(&self, column: usize) -> Option<String> {
        self.cells.get(column).and_then(CellValue::as_display)
    }

    fn native(&self, column: usize) -> CellValue {
        self.cells.get(column).cloned().unwrap_or_default()
    }

    fn number_format(&self, column: usize) -> Option<&str> {
        self.formats.get(column).and_then(|f| f.as_deref())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    name: String,
    header: Option<HeaderTable>,
    rows: Vec<MemoryRow>,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header: None,
            rows: Vec::new(),
        }
    }

    pub fn with_header<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = Some(HeaderTable::new(names));
        self
    }

    /// Appends a data row; row indices count data rows from zero.
    pub fn push_row<I, V>(&mut self, cells: I) -> &mut MemoryRow
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let index = self.rows.len();
        self.rows.push(MemoryRow::new(index, cells));
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }

    pub fn with_row<I, V>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.push_row(cells);
        self
    }

    pub fn push_memory_row(&mut self, row: MemoryRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[MemoryRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&MemoryRow> {
        self.rows.get(index)
    }

    /// Loads delimited text; every cell becomes a string (or empty) value.
    pub fn from_csv_reader<R: Read>(
        name: impl Into<String>,
        reader: R,
        delimiter: u8,
        has_headers: bool,
    ) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(reader);
        let mut sheet = MemorySheet::new(name);
        if has_headers {
            let headers = csv_reader
                .headers()
                .context("Reading CSV header row")?
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>();
            sheet.header = Some(HeaderTable::new(headers));
        }
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Reading CSV record {}", idx + 1))?;
            sheet.push_row(record.iter());
        }
        Ok(sheet)
    }
}

impl SheetSource for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> Option<&HeaderTable> {
        self.header.as_ref()
    }

    fn column_count(&self) -> usize {
        let widest_row = self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        let header_len = self.header.as_ref().map_or(0, HeaderTable::len);
        widest_row.max(header_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_table_keeps_first_duplicate() {
        let header = HeaderTable::new(["id", "name", "id"]);
        assert_eq!(header.column_index("id"), Some(0));
        assert_eq!(header.column_name(2), Some("id"));
        assert_eq!(header.column_index("missing"), None);
    }

    #[test]
    fn memory_row_renders_native_values() {
        let row = MemoryRow::new(0, [CellValue::Number(42.0), CellValue::from("x")]);
        assert_eq!(row.string(0).as_deref(), Some("42"));
        assert_eq!(row.string(1).as_deref(), Some("x"));
        assert_eq!(row.string(5), None);
        assert_eq!(row.native(5), CellValue::Empty);
    }

    #[test]
    fn from_csv_reader_builds_header_and_rows() {
        let data = "id,name\n1,Ada\n2,\n";
        let sheet = MemorySheet::from_csv_reader("people", data.as_bytes(), b',', true).unwrap();
        assert_eq!(sheet.name(), "people");
        assert_eq!(sheet.header().unwrap().column_index("name"), Some(1));
        assert_eq!(sheet.rows().len(), 2);
        assert_eq!(sheet.rows()[1].string(1), None);
        assert_eq!(sheet.column_count(), 2);
    }
}
