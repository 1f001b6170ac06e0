use super::{CellReader, CellReaderFactory, CellsReader, CellsReaderFactory};
use crate::{
    cell::CellResult,
    error::{MappingError, Result},
    sheet::{RowSource, SheetSource},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Separator {
    /// Split on any of these characters.
    Chars(Vec<char>),
    Str(String),
}

impl Separator {
    pub(crate) fn validate(&self) -> Result<()> {
        let valid = match self {
            Separator::Chars(chars) => !chars.is_empty(),
            Separator::Str(s) => !s.is_empty(),
        };
        if valid {
            Ok(())
        } else {
            Err(MappingError::Configuration(
                "a split separator cannot be empty".to_string(),
            ))
        }
    }
}

impl From<char> for Separator {
    fn from(value: char) -> Self {
        Separator::Chars(vec![value])
    }
}

impl From<&str> for Separator {
    fn from(value: &str) -> Self {
        Separator::Str(value.to_string())
    }
}

/// Splits `text`; with both flags off, joining the entries with the
/// separator reproduces `text`.
pub fn split_entries<'a>(
    text: &'a str,
    separator: &Separator,
    trim_entries: bool,
    remove_empty_entries: bool,
) -> Vec<&'a str> {
    let entries: Vec<&'a str> = match separator {
        Separator::Chars(chars) => text.split(|c: char| chars.contains(&c)).collect(),
        Separator::Str(s) => text.split(s.as_str()).collect(),
    };
    entries
        .into_iter()
        .map(|entry| if trim_entries { entry.trim() } else { entry })
        .filter(|entry| !(remove_empty_entries && entry.is_empty()))
        .collect()
}

/// Reads one cell through `inner` and yields one element per delimited
/// entry. An empty cell yields no elements.
pub struct SplitCellsReaderFactory {
    inner: Box<dyn CellReaderFactory>,
    separator: Separator,
    trim_entries: bool,
    remove_empty_entries: bool,
}

impl SplitCellsReaderFactory {
    pub fn new(inner: impl CellReaderFactory + 'static, separator: Separator) -> Result<Self> {
        Self::from_boxed(Box::new(inner), separator)
    }

    pub fn from_boxed(inner: Box<dyn CellReaderFactory>, separator: Separator) -> Result<Self> {
        separator.validate()?;
        Ok(Self {
            inner,
            separator,
            trim_entries: false,
            remove_empty_entries: false,
        })
    }

    pub fn trim_entries(mut self, trim: bool) -> Self {
        self.trim_entries = trim;
        self
    }

    pub fn remove_empty_entries(mut self, remove: bool) -> Self {
        self.remove_empty_entries = remove;
        self
    }

    pub fn separator(&self) -> &Separator {
        &self.separator
    }
}

impl CellsReaderFactory for SplitCellsReaderFactory {
    fn reader(&self, sheet: &dyn SheetSource) -> Option<Box<dyn CellsReader>> {
        let inner = self.inner.reader(sheet)?;
        Some(Box::new(SplitCellsReader {
            inner,
            separator: self.separator.clone(),
            trim_entries: self.trim_entries,
            remove_empty_entries: self.remove_empty_entries,
        }))
    }

    fn requires_header(&self) -> bool {
        self.inner.requires_header()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

struct SplitCellsReader {
    inner: Box<dyn CellReader>,
    separator: Separator,
    trim_entries: bool,
    remove_empty_entries: bool,
}

impl CellsReader for SplitCellsReader {
    fn try_get_cells<'r>(&self, row: &'r dyn RowSource) -> Option<Vec<CellResult<'r>>> {
        let cell = self.inner.try_get_cell(row)?;
        let column = cell.column_index();
        let Some(text) = cell.string_value().filter(|text| !text.is_empty()) else {
            return Some(Vec::new());
        };
        Some(
            split_entries(
                text,
                &self.separator,
                self.trim_entries,
                self.remove_empty_entries,
            )
            .into_iter()
            .map(|entry| CellResult::from_text(column, Some(entry.to_string())))
            .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reader::ColumnNameReaderFactory, sheet::MemorySheet};

    #[test]
    fn split_entries_respects_flags() {
        let comma = Separator::from(',');
        assert_eq!(split_entries("a, b,,c", &comma, false, false), vec!["a", " b", "", "c"]);
        assert_eq!(split_entries("a, b,,c", &comma, true, true), vec!["a", "b", "c"]);
        let multi = Separator::Chars(vec![';', '|']);
        assert_eq!(split_entries("1;2|3", &multi, false, false), vec!["1", "2", "3"]);
        let arrow = Separator::from("->");
        assert_eq!(split_entries("x->y", &arrow, false, false), vec!["x", "y"]);
    }

    #[test]
    fn empty_separators_are_rejected() {
        let err =
            SplitCellsReaderFactory::new(ColumnNameReaderFactory::new("tags"), Separator::from(""))
                .err()
            .unwrap();
        assert!(matches!(err, MappingError::Configuration(_)));
    }

    #[test]
    fn split_reader_yields_one_cell_per_entry() {
        let sheet = MemorySheet::new("s")
            .with_header(["tags"])
            .with_row(["a,b,c"])
            .with_row([""]);
        let factory = SplitCellsReaderFactory::new(ColumnNameReaderFactory::new("tags"), ','.into())
            .unwrap();
        let reader = factory.reader(&sheet).unwrap();
        let cells = reader.try_get_cells(&sheet.rows()[0]).unwrap();
        let values: Vec<&str> = cells.iter().filter_map(|c| c.string_value()).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
        assert!(cells.iter().all(|c| c.column_index() == Some(0)));
        assert!(reader.try_get_cells(&sheet.rows()[1]).unwrap().is_empty());
    }
}
