//! Locating the physical cells behind a member.
//!
//! Factories are configured once per member. [`CellReaderFactory::reader`]
//! resolves names to column indices for one sheet; the reader it returns is
//! then reused for every row of that sheet.

mod matcher;
mod multi;
mod single;
mod split;

pub use matcher::{ColumnMatcher, NameMatching};
pub use multi::{
    AllColumnsReaderFactory, ColumnIndicesReaderFactory, ColumnNamesReaderFactory,
    ColumnsReader, CompositeCellsReaderFactory, MatchingColumnsReaderFactory,
};
pub use single::{
    ColumnIndexReaderFactory, ColumnNameReaderFactory, ColumnReader, CompositeReaderFactory,
    FirstOfNamesReaderFactory, MatchingColumnReaderFactory,
};
pub use split::{Separator, SplitCellsReaderFactory, split_entries};

use crate::{
    cell::CellResult,
    sheet::{RowSource, SheetSource},
};

pub trait CellReaderFactory: Send + Sync {
    /// `None` when the referenced column does not exist on `sheet`.
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellReader>>;

    /// Whether the factory can only resolve columns through a header row.
    fn requires_header(&self) -> bool;

    /// Human readable reference used in "column not found" errors.
    fn describe(&self) -> String;
}

pub trait CellReader: Send + Sync {
    fn try_get_cell<'r>(&self, row: &'r dyn RowSource) -> Option<CellResult<'r>>;
}

pub trait CellsReaderFactory: Send + Sync {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellsReader>>;

    fn requires_header(&self) -> bool;

    fn describe(&self) -> String;
}

pub trait CellsReader: Send + Sync {
    fn try_get_cells<'r>(&self, row: &'r dyn RowSource) -> Option<Vec<CellResult<'r>>>;
}
