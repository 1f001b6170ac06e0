use super::{CellReader, CellReaderFactory, ColumnMatcher, NameMatching};
use crate::{
    cell::CellResult,
    sheet::{RowSource, SheetSource},
};

/// Reads one fixed column. Columns beyond the end of a row read as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnReader {
    column: usize,
}

impl ColumnReader {
    pub fn new(column: usize) -> Self {
        Self { column }
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl CellReader for ColumnReader {
    fn try_get_cell<'r>(&self, row: &'r dyn RowSource) -> Option<CellResult<'r>> {
        Some(CellResult::from_row(row, self.column))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndexReaderFactory {
    column: usize,
}

impl ColumnIndexReaderFactory {
    pub fn new(column: usize) -> Self {
        Self { column }
    }
}

impl CellReaderFactory for ColumnIndexReaderFactory {
    fn reader(&self, _sheet: &dyn SheetSource) -> Option<Box<dyn CellReader>> {
        Some(Box::new(ColumnReader::new(self.column)))
    }

    fn requires_header(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!("column {}", self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNameReaderFactory {
    name: String,
    matching: NameMatching,
}

impl ColumnNameReaderFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_matching(name, NameMatching::Exact)
    }

    pub fn with_matching(name: impl Into<String>, matching: NameMatching) -> Self {
        Self {
            name: name.into(),
            matching,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CellReaderFactory for ColumnNameReaderFactory {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellReader>> {
        let column = self.matching.find(sheet.header()?, &self.name)?;
        Some(Box::new(ColumnReader::new(column)))
    }

    fn requires_header(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("column '{}'", self.name)
    }
}

/// The first name in the list that the header contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstOfNamesReaderFactory {
    names: Vec<String>,
    matching: NameMatching,
}

impl FirstOfNamesReaderFactory {
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

impl CellReaderFactory for FirstOfNamesReaderFactory {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellReader>> {
        let header = sheet.header()?;
        let column = self
            .names
            .iter()
            .find_map(|name| self.matching.find(header, name))?;
        Some(Box::new(ColumnReader::new(column)))
    }

    fn requires_header(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("any of the columns '{}'", self.names.join("', '"))
    }
}

/// The first header name accepted by a matcher.
#[derive(Debug, Clone)]
pub struct MatchingColumnReaderFactory {
    matcher: ColumnMatcher,
}

impl MatchingColumnReaderFactory {
    pub fn new(matcher: ColumnMatcher) -> Self {
        Self { matcher }
    }
}

impl CellReaderFactory for MatchingColumnReaderFactory {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellReader>> {
        let column = *self.matcher.columns(sheet.header()?).first()?;
        Some(Box::new(ColumnReader::new(column)))
    }

    fn requires_header(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("a column among {:?}", self.matcher)
    }
}

/// Tries each factory in order; the first one that resolves wins.
#[derive(Default)]
pub struct CompositeReaderFactory {
    factories: Vec<Box<dyn CellReaderFactory>>,
}

impl CompositeReaderFactory {
    pub fn new(factories: Vec<Box<dyn CellReaderFactory>>) -> Self {
        Self { factories }
    }

    pub fn push(mut self, factory: impl CellReaderFactory + 'static) -> Self {
        self.factories.push(Box::new(factory));
        self
    }
}

impl CellReaderFactory for CompositeReaderFactory {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellReader>> {
        self.factories
            .iter()
            .find_map(|factory| factory.reader(sheet))
    }

    fn requires_header(&self) -> bool {
        !self.factories.is_empty() && self.factories.iter().all(|f| f.requires_header())
    }

    fn describe(&self) -> String {
        self.factories
            .iter()
            .map(|f| f.describe())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}
