use itertools::Itertools;

use super::{CellsReader, CellsReaderFactory, ColumnMatcher, NameMatching};
use crate::{
    cell::CellResult,
    sheet::{RowSource, SheetSource},
};

/// Reads a fixed list of columns, one cell per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnsReader {
    columns: Vec<usize>,
}

impl ColumnsReader {
    pub fn new(columns: Vec<usize>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }
}

impl CellsReader for ColumnsReader {
    fn try_get_cells<'r>(&self, row: &'r dyn RowSource) -> Option<Vec<CellResult<'r>>> {
        Some(
            self.columns
                .iter()
                .map(|column| CellResult::from_row(row, *column))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndicesReaderFactory {
    columns: Vec<usize>,
}

impl ColumnIndicesReaderFactory {
    pub fn new(columns: impl IntoIterator<Item = usize>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }
}

impl CellsReaderFactory for ColumnIndicesReaderFactory {
    fn reader(&self, _sheet: &dyn SheetSource) -> Option<Box<dyn CellsReader>> {
        Some(Box::new(ColumnsReader::new(self.columns.clone())))
    }

    fn requires_header(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!("columns {}", self.columns.iter().join(", "))
    }
}

/// Every listed name must be present for the reader to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNamesReaderFactory {
    names: Vec<String>,
    matching: NameMatching,
}

impl ColumnNamesReaderFactory {
    pub fn new<I, S>(names: I, matching: NameMatching) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            matching,
        }
    }
}

impl CellsReaderFactory for ColumnNamesReaderFactory {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellsReader>> {
        let header = sheet.header()?;
        let columns = self
            .names
            .iter()
            .map(|name| self.matching.find(header, name))
            .collect::<Option<Vec<_>>>()?;
        Some(Box::new(ColumnsReader::new(columns)))
    }

    fn requires_header(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("columns '{}'", self.names.join("', '"))
    }
}

/// Every column that has a non-blank header name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllColumnsReaderFactory;

impl CellsReaderFactory for AllColumnsReaderFactory {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellsReader>> {
        let columns = sheet
            .header()?
            .names()
            .iter()
            .positions(|name| !name.trim().is_empty())
            .collect();
        Some(Box::new(ColumnsReader::new(columns)))
    }

    fn requires_header(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        "named columns".to_string()
    }
}

/// Header names selected by a [`ColumnMatcher`]; resolves only when at least
/// one column matches.
#[derive(Debug, Clone)]
pub struct MatchingColumnsReaderFactory {
    matcher: ColumnMatcher,
}

impl MatchingColumnsReaderFactory {
    pub fn new(matcher: ColumnMatcher) -> Self {
        Self { matcher }
    }
}

impl CellsReaderFactory for MatchingColumnsReaderFactory {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellsReader>> {
        let columns = self.matcher.columns(sheet.header()?);
        if columns.is_empty() {
            return None;
        }
        Some(Box::new(ColumnsReader::new(columns)))
    }

    fn requires_header(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("{:?}", self.matcher)
    }
}

/// Union of several multi-column readers. Cells are returned in factory
/// order; a column already produced by an earlier reader is skipped.
#[derive(Default)]
pub struct CompositeCellsReaderFactory {
    factories: Vec<Box<dyn CellsReaderFactory>>,
}

impl CompositeCellsReaderFactory {
    pub fn new(factories: Vec<Box<dyn CellsReaderFactory>>) -> Self {
        Self { factories }
    }

    pub fn push(mut self, factory: impl CellsReaderFactory + 'static) -> Self {
        self.factories.push(Box::new(factory));
        self
    }
}

impl CellsReaderFactory for CompositeCellsReaderFactory {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellsReader>> {
        let readers: Vec<Box<dyn CellsReader>> = self
            .factories
            .iter()
            .filter_map(|factory| factory.reader(sheet))
            .collect();
        if readers.is_empty() {
            return None;
        }
        Some(Box::new(UnionReader { readers }))
    }

    fn requires_header(&self) -> bool {
        !self.factories.is_empty() && self.factories.iter().all(|f| f.requires_header())
    }

    fn describe(&self) -> String {
        self.factories.iter().map(|f| f.describe()).join(" and ")
    }
}

struct UnionReader {
    readers: Vec<Box<dyn CellsReader>>,
}

impl CellsReader for UnionReader {
    fn try_get_cells<'r>(&self, row: &'r dyn RowSource) -> Option<Vec<CellResult<'r>>> {
        let mut cells: Vec<CellResult<'r>> = Vec::new();
        for reader in &self.readers {
            for cell in reader.try_get_cells(row).into_iter().flatten() {
                let duplicate = cell.column_index().is_some()
                    && cells
                        .iter()
                        .any(|seen| seen.column_index() == cell.column_index());
                if !duplicate {
                    cells.push(cell);
                }
            }
        }
        Some(cells)
    }
}
