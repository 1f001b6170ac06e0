//! Per-member conversion pipelines.
//!
//! A [`CellConverter`] turns one located cell into a [`Value`]: empty check,
//! transformers, empty check again, mapper chain, then the invalid fallback
//! or a row error. The member pipelines wrap converters with the readers and
//! factories needed for scalars, collections, dictionaries and grids.

use std::{borrow::Cow, fmt, sync::Arc};

use anyhow::anyhow;

use crate::{
    cell::CellResult,
    class_map::{BoundRecordMap, RecordMap},
    error::{FactoryError, MappingError, Result},
    factory::{CollectionFactory, DictionaryFactory, MultiArrayFactory},
    fallback::{Fallback, FallbackContext},
    mapper::{CellMapper, MapperResult, run_mappers},
    reader::{
        CellReader, CellReaderFactory, CellsReader, CellsReaderFactory, Separator, split_entries,
    },
    sheet::{HeaderTable, RowSource, SheetSource},
    transform::{CellTransformer, apply_transformers},
    value::Value,
};

/// Where a conversion is happening, for fallbacks and error messages.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub sheet: &'a str,
    pub row: usize,
    pub member: &'a str,
}

impl<'a> RowContext<'a> {
    fn fallback<'c>(
        &self,
        cell: &'c CellResult<'c>,
        error: Option<anyhow::Error>,
    ) -> FallbackContext<'c>
    where
        'a: 'c,
    {
        FallbackContext {
            sheet: self.sheet,
            row: self.row,
            member: self.member,
            cell,
            error,
        }
    }

    fn factory_error(&self, source: FactoryError) -> MappingError {
        MappingError::Factory {
            sheet: self.sheet.to_string(),
            row: self.row,
            member: self.member.to_string(),
            source,
        }
    }
}

/// Transformers, mappers and fallbacks for a single cell.
#[derive(Default)]
pub struct CellConverter {
    transformers: Vec<Box<dyn CellTransformer>>,
    mappers: Vec<Box<dyn CellMapper>>,
    empty_fallback: Option<Box<dyn Fallback>>,
    invalid_fallback: Option<Box<dyn Fallback>>,
}

impl CellConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapper(mut self, mapper: impl CellMapper + 'static) -> Self {
        self.mappers.push(Box::new(mapper));
        self
    }

    pub fn with_transformer(mut self, transformer: impl CellTransformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    pub fn with_empty_fallback(mut self, fallback: impl Fallback + 'static) -> Self {
        self.empty_fallback = Some(Box::new(fallback));
        self
    }

    pub fn with_invalid_fallback(mut self, fallback: impl Fallback + 'static) -> Self {
        self.invalid_fallback = Some(Box::new(fallback));
        self
    }

    /// Appends a mapper after the ones already registered.
    pub fn add_mapper(&mut self, mapper: impl CellMapper + 'static) -> &mut Self {
        self.mappers.push(Box::new(mapper));
        self
    }

    /// Replaces the whole mapper chain.
    pub fn set_mappers(&mut self, mappers: Vec<Box<dyn CellMapper>>) -> &mut Self {
        self.mappers = mappers;
        self
    }

    pub fn clear_mappers(&mut self) -> &mut Self {
        self.mappers.clear();
        self
    }

    pub fn mapper_count(&self) -> usize {
        self.mappers.len()
    }

    pub fn add_transformer(&mut self, transformer: impl CellTransformer + 'static) -> &mut Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    pub fn clear_transformers(&mut self) -> &mut Self {
        self.transformers.clear();
        self
    }

    pub fn transformer_count(&self) -> usize {
        self.transformers.len()
    }

    pub fn set_empty_fallback(&mut self, fallback: impl Fallback + 'static) -> &mut Self {
        self.empty_fallback = Some(Box::new(fallback));
        self
    }

    /// Without an empty fallback, empty cells go through the mapper chain.
    pub fn clear_empty_fallback(&mut self) -> &mut Self {
        self.empty_fallback = None;
        self
    }

    pub fn set_invalid_fallback(&mut self, fallback: impl Fallback + 'static) -> &mut Self {
        self.invalid_fallback = Some(Box::new(fallback));
        self
    }

    pub fn clear_invalid_fallback(&mut self) -> &mut Self {
        self.invalid_fallback = None;
        self
    }

    pub fn has_empty_fallback(&self) -> bool {
        self.empty_fallback.is_some()
    }

    pub fn has_invalid_fallback(&self) -> bool {
        self.invalid_fallback.is_some()
    }

    pub(crate) fn push_boxed_mapper(&mut self, mapper: Box<dyn CellMapper>) {
        self.mappers.push(mapper);
    }

    pub(crate) fn push_boxed_transformer(&mut self, transformer: Box<dyn CellTransformer>) {
        self.transformers.push(transformer);
    }

    pub(crate) fn set_boxed_empty_fallback(&mut self, fallback: Box<dyn Fallback>) {
        self.empty_fallback = Some(fallback);
    }

    pub fn convert(&self, cell: &CellResult<'_>, ctx: &RowContext<'_>) -> Result<Value> {
        if cell.is_empty()
            && let Some(fallback) = &self.empty_fallback
        {
            return fallback.perform(ctx.fallback(cell, None));
        }

        let rewritten;
        let cell = if self.transformers.is_empty() {
            cell
        } else {
            let text = cell
                .string_value()
                .and_then(|raw| apply_transformers(&self.transformers, raw))
                .map(Cow::into_owned);
            rewritten = cell.with_text(text);
            &rewritten
        };

        if cell.is_empty()
            && let Some(fallback) = &self.empty_fallback
        {
            return fallback.perform(ctx.fallback(cell, None));
        }

        match run_mappers(&self.mappers, cell) {
            MapperResult::UseAndStop(value) | MapperResult::UseIfNoOtherSucceeds(value) => {
                Ok(value)
            }
            MapperResult::Invalid(err) => self.invalid(cell, ctx, err),
            MapperResult::IgnoreAndContinue => {
                self.invalid(cell, ctx, anyhow!("No mapper accepted the value"))
            }
        }
    }

    fn invalid(
        &self,
        cell: &CellResult<'_>,
        ctx: &RowContext<'_>,
        err: anyhow::Error,
    ) -> Result<Value> {
        let fallback_ctx = ctx.fallback(cell, Some(err));
        match &self.invalid_fallback {
            Some(fallback) => fallback.perform(fallback_ctx),
            None => Err(fallback_ctx.into_error()),
        }
    }
}

impl fmt::Debug for CellConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellConverter")
            .field("transformers", &self.transformers.len())
            .field("mappers", &self.mappers.len())
            .field("empty_fallback", &self.empty_fallback.is_some())
            .field("invalid_fallback", &self.invalid_fallback.is_some())
            .finish()
    }
}

/// A member read from one cell.
pub struct ValuePipeline {
    reader: Box<dyn CellReaderFactory>,
    converter: CellConverter,
    preserve_formatting: bool,
}

impl ValuePipeline {
    pub fn new(reader: impl CellReaderFactory + 'static, converter: CellConverter) -> Self {
        Self::from_boxed(Box::new(reader), converter)
    }

    pub fn from_boxed(reader: Box<dyn CellReaderFactory>, converter: CellConverter) -> Self {
        Self {
            reader,
            converter,
            preserve_formatting: false,
        }
    }

    pub fn set_reader(&mut self, reader: impl CellReaderFactory + 'static) -> &mut Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn reader(&self) -> &dyn CellReaderFactory {
        self.reader.as_ref()
    }

    pub fn converter(&self) -> &CellConverter {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut CellConverter {
        &mut self.converter
    }

    /// Render numeric and date cells through their number format before
    /// mapping.
    pub fn set_preserve_formatting(&mut self, preserve: bool) -> &mut Self {
        self.preserve_formatting = preserve;
        self
    }

    pub fn preserves_formatting(&self) -> bool {
        self.preserve_formatting
    }

    fn read(
        &self,
        reader: &dyn CellReader,
        row: &dyn RowSource,
        ctx: &RowContext<'_>,
    ) -> Result<Value> {
        let cell = reader
            .try_get_cell(row)
            .unwrap_or_else(|| CellResult::missing(None))
            .with_preserved_formatting(self.preserve_formatting);
        self.converter.convert(&cell, ctx)
    }
}

/// A member built from several cells, one element each.
pub struct CollectionPipeline {
    reader: Box<dyn CellsReaderFactory>,
    element: CellConverter,
    factory: fn() -> Box<dyn CollectionFactory>,
    empty_fallback: Option<Box<dyn Fallback>>,
}

impl CollectionPipeline {
    pub fn new(
        reader: impl CellsReaderFactory + 'static,
        element: CellConverter,
        factory: fn() -> Box<dyn CollectionFactory>,
    ) -> Self {
        Self::from_boxed(Box::new(reader), element, factory)
    }

    pub fn from_boxed(
        reader: Box<dyn CellsReaderFactory>,
        element: CellConverter,
        factory: fn() -> Box<dyn CollectionFactory>,
    ) -> Self {
        Self {
            reader,
            element,
            factory,
            empty_fallback: None,
        }
    }

    pub fn set_reader(&mut self, reader: impl CellsReaderFactory + 'static) -> &mut Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn reader(&self) -> &dyn CellsReaderFactory {
        self.reader.as_ref()
    }

    pub fn element(&self) -> &CellConverter {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut CellConverter {
        &mut self.element
    }

    /// Used when every located cell is empty. Without one, such rows build
    /// an empty container.
    pub fn set_empty_fallback(&mut self, fallback: impl Fallback + 'static) -> &mut Self {
        self.empty_fallback = Some(Box::new(fallback));
        self
    }

    pub(crate) fn set_boxed_empty_fallback(&mut self, fallback: Box<dyn Fallback>) {
        self.empty_fallback = Some(fallback);
    }

    fn read(
        &self,
        reader: &dyn CellsReader,
        row: &dyn RowSource,
        ctx: &RowContext<'_>,
    ) -> Result<Value> {
        let cells = reader.try_get_cells(row).unwrap_or_default();
        let cells = if cells.iter().all(CellResult::is_empty) {
            if let Some(fallback) = &self.empty_fallback {
                let cell = CellResult::missing(cells.first().and_then(CellResult::column_index));
                return fallback.perform(ctx.fallback(&cell, None));
            }
            Vec::new()
        } else {
            cells
        };

        let mut factory = (self.factory)();
        factory
            .begin(cells.len())
            .map_err(|err| ctx.factory_error(err))?;
        for (index, cell) in cells.iter().enumerate() {
            let member = format!("{}[{index}]", ctx.member);
            let value = self.element.convert(
                cell,
                &RowContext {
                    member: &member,
                    ..*ctx
                },
            )?;
            factory.add(value).map_err(|err| ctx.factory_error(err))?;
        }
        factory.end().map_err(|err| ctx.factory_error(err))
    }
}

/// A member keyed by header name; each located column becomes one entry.
pub struct DictionaryPipeline {
    reader: Box<dyn CellsReaderFactory>,
    key: CellConverter,
    value: CellConverter,
    factory: fn() -> Box<dyn DictionaryFactory>,
    empty_fallback: Option<Box<dyn Fallback>>,
}

impl DictionaryPipeline {
    pub fn new(
        reader: impl CellsReaderFactory + 'static,
        key: CellConverter,
        value: CellConverter,
        factory: fn() -> Box<dyn DictionaryFactory>,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            key,
            value,
            factory,
            empty_fallback: None,
        }
    }

    pub fn set_reader(&mut self, reader: impl CellsReaderFactory + 'static) -> &mut Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn reader(&self) -> &dyn CellsReaderFactory {
        self.reader.as_ref()
    }

    pub fn key_mut(&mut self) -> &mut CellConverter {
        &mut self.key
    }

    pub fn value_mut(&mut self) -> &mut CellConverter {
        &mut self.value
    }

    pub fn set_empty_fallback(&mut self, fallback: impl Fallback + 'static) -> &mut Self {
        self.empty_fallback = Some(Box::new(fallback));
        self
    }

    pub(crate) fn set_boxed_empty_fallback(&mut self, fallback: Box<dyn Fallback>) {
        self.empty_fallback = Some(fallback);
    }

    fn read(
        &self,
        reader: &dyn CellsReader,
        header: Option<&HeaderTable>,
        row: &dyn RowSource,
        ctx: &RowContext<'_>,
    ) -> Result<Value> {
        let cells = reader.try_get_cells(row).unwrap_or_default();
        if cells.iter().all(CellResult::is_empty)
            && let Some(fallback) = &self.empty_fallback
        {
            let cell = CellResult::missing(cells.first().and_then(CellResult::column_index));
            return fallback.perform(ctx.fallback(&cell, None));
        }

        let mut factory = (self.factory)();
        factory
            .begin(cells.len())
            .map_err(|err| ctx.factory_error(err))?;
        for cell in &cells {
            let column = cell.column_index();
            let name = column
                .and_then(|index| header.and_then(|header| header.column_name(index)))
                .map(str::to_string)
                .or_else(|| column.map(|index| index.to_string()));
            let member = format!("{}[{}]", ctx.member, name.as_deref().unwrap_or("?"));
            let entry_ctx = RowContext {
                member: &member,
                ..*ctx
            };
            let key = self
                .key
                .convert(&CellResult::from_text(column, name), &entry_ctx)?;
            let value = self.value.convert(cell, &entry_ctx)?;
            factory
                .add(key, value)
                .map_err(|err| ctx.factory_error(err))?;
        }
        factory.end().map_err(|err| ctx.factory_error(err))
    }
}

/// A two-dimensional member: each located column is one row of the grid and
/// its delimited entries are that row's elements.
pub struct MultiArrayPipeline {
    reader: Box<dyn CellsReaderFactory>,
    separator: Separator,
    trim_entries: bool,
    element: CellConverter,
    factory: fn() -> Box<dyn MultiArrayFactory>,
}

impl MultiArrayPipeline {
    pub fn new(
        reader: impl CellsReaderFactory + 'static,
        separator: Separator,
        element: CellConverter,
        factory: fn() -> Box<dyn MultiArrayFactory>,
    ) -> Result<Self> {
        separator.validate()?;
        Ok(Self {
            reader: Box::new(reader),
            separator,
            trim_entries: false,
            element,
            factory,
        })
    }

    pub fn trim_entries(mut self, trim: bool) -> Self {
        self.trim_entries = trim;
        self
    }

    pub fn set_reader(&mut self, reader: impl CellsReaderFactory + 'static) -> &mut Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn reader(&self) -> &dyn CellsReaderFactory {
        self.reader.as_ref()
    }

    pub fn element_mut(&mut self) -> &mut CellConverter {
        &mut self.element
    }

    fn read(
        &self,
        reader: &dyn CellsReader,
        row: &dyn RowSource,
        ctx: &RowContext<'_>,
    ) -> Result<Value> {
        let cells = reader.try_get_cells(row).unwrap_or_default();
        let rows: Vec<Vec<&str>> = cells
            .iter()
            .map(|cell| match cell.string_value() {
                Some(text) if !text.is_empty() => {
                    split_entries(text, &self.separator, self.trim_entries, false)
                }
                _ => Vec::new(),
            })
            .collect();
        let columns = rows.first().map_or(0, Vec::len);
        if let Some(ragged) = rows.iter().find(|entries| entries.len() != columns) {
            return Err(ctx.factory_error(FactoryError::Length {
                expected: columns,
                found: ragged.len(),
            }));
        }

        let mut factory = (self.factory)();
        factory
            .begin(&[rows.len(), columns])
            .map_err(|err| ctx.factory_error(err))?;
        for (row_index, (entries, cell)) in rows.iter().zip(&cells).enumerate() {
            for (column_index, entry) in entries.iter().enumerate() {
                let member = format!("{}[{row_index}][{column_index}]", ctx.member);
                let element = CellResult::from_text(cell.column_index(), Some(entry.to_string()));
                let value = self.element.convert(
                    &element,
                    &RowContext {
                        member: &member,
                        ..*ctx
                    },
                )?;
                factory
                    .set(&[row_index, column_index], value)
                    .map_err(|err| ctx.factory_error(err))?;
            }
        }
        factory.end().map_err(|err| ctx.factory_error(err))
    }
}

/// A nested record mapped from the same row.
pub struct ObjectPipeline {
    map: Arc<dyn RecordMap>,
    null_on_empty: bool,
}

impl ObjectPipeline {
    pub fn new(map: Arc<dyn RecordMap>) -> Self {
        Self {
            map,
            null_on_empty: false,
        }
    }

    pub fn map(&self) -> &dyn RecordMap {
        self.map.as_ref()
    }

    pub(crate) fn replace_map(&mut self, map: Arc<dyn RecordMap>) {
        self.map = map;
    }

    /// When set, a row whose nested cells are all empty maps to
    /// [`Value::Null`] instead of a record.
    pub fn set_null_on_empty(&mut self, null_on_empty: bool) -> &mut Self {
        self.null_on_empty = null_on_empty;
        self
    }

    pub fn null_on_empty(&self) -> bool {
        self.null_on_empty
    }
}

/// How a member's value is produced.
pub enum MemberPipeline {
    Value(ValuePipeline),
    Collection(CollectionPipeline),
    Dictionary(DictionaryPipeline),
    MultiArray(MultiArrayPipeline),
    Object(ObjectPipeline),
}

impl MemberPipeline {
    pub fn shape_name(&self) -> &'static str {
        match self {
            MemberPipeline::Value(_) => "value",
            MemberPipeline::Collection(_) => "collection",
            MemberPipeline::Dictionary(_) => "dictionary",
            MemberPipeline::MultiArray(_) => "multidimensional array",
            MemberPipeline::Object(_) => "object",
        }
    }

    fn locate(&self) -> Option<(bool, String)> {
        match self {
            MemberPipeline::Value(p) => Some((p.reader.requires_header(), p.reader.describe())),
            MemberPipeline::Collection(p) => {
                Some((p.reader.requires_header(), p.reader.describe()))
            }
            MemberPipeline::Dictionary(p) => {
                Some((p.reader.requires_header(), p.reader.describe()))
            }
            MemberPipeline::MultiArray(p) => {
                Some((p.reader.requires_header(), p.reader.describe()))
            }
            MemberPipeline::Object(_) => None,
        }
    }

    /// Resolves readers against `sheet`. `Ok(None)` means the referenced
    /// columns are absent; the caller decides whether that is an error.
    pub(crate) fn bind<'s>(
        &'s self,
        sheet: &'s dyn SheetSource,
        member: &str,
    ) -> Result<Binding<'s>> {
        if let Some((true, _)) = self.locate()
            && sheet.header().is_none()
        {
            return Err(MappingError::MissingHeader {
                sheet: sheet.name().to_string(),
                member: member.to_string(),
            });
        }
        let bound = match self {
            MemberPipeline::Value(pipeline) => pipeline
                .reader
                .reader(sheet)
                .map(|reader| BoundPipeline::Value { pipeline, reader }),
            MemberPipeline::Collection(pipeline) => pipeline
                .reader
                .reader(sheet)
                .map(|reader| BoundPipeline::Collection { pipeline, reader }),
            MemberPipeline::Dictionary(pipeline) => {
                pipeline
                    .reader
                    .reader(sheet)
                    .map(|reader| BoundPipeline::Dictionary {
                        pipeline,
                        reader,
                        header: sheet.header(),
                    })
            }
            MemberPipeline::MultiArray(pipeline) => pipeline
                .reader
                .reader(sheet)
                .map(|reader| BoundPipeline::MultiArray { pipeline, reader }),
            MemberPipeline::Object(object) => Some(BoundPipeline::Object {
                map: object
                    .map
                    .bind_erased(sheet)
                    .map_err(|err| err.within(member))?,
                null_on_empty: object.null_on_empty,
            }),
        };
        Ok(match bound {
            Some(bound) => Binding::Bound(bound),
            None => Binding::NotFound(self.locate().map(|(_, r)| r).unwrap_or_default()),
        })
    }
}

impl fmt::Debug for MemberPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.locate() {
            Some((_, reference)) => write!(f, "{} from {reference}", self.shape_name()),
            None => f.write_str(self.shape_name()),
        }
    }
}

pub(crate) enum Binding<'s> {
    Bound(BoundPipeline<'s>),
    NotFound(String),
}

/// A member pipeline whose readers are resolved for one sheet.
pub(crate) enum BoundPipeline<'s> {
    Value {
        pipeline: &'s ValuePipeline,
        reader: Box<dyn CellReader>,
    },
    Collection {
        pipeline: &'s CollectionPipeline,
        reader: Box<dyn CellsReader>,
    },
    Dictionary {
        pipeline: &'s DictionaryPipeline,
        reader: Box<dyn CellsReader>,
        header: Option<&'s HeaderTable>,
    },
    MultiArray {
        pipeline: &'s MultiArrayPipeline,
        reader: Box<dyn CellsReader>,
    },
    Object {
        map: Box<dyn BoundRecordMap + 's>,
        null_on_empty: bool,
    },
}

impl BoundPipeline<'_> {
    pub(crate) fn read(&self, row: &dyn RowSource, ctx: &RowContext<'_>) -> Result<Value> {
        match self {
            BoundPipeline::Value { pipeline, reader } => pipeline.read(reader.as_ref(), row, ctx),
            BoundPipeline::Collection { pipeline, reader } => {
                pipeline.read(reader.as_ref(), row, ctx)
            }
            BoundPipeline::Dictionary {
                pipeline,
                reader,
                header,
            } => pipeline.read(reader.as_ref(), *header, row, ctx),
            BoundPipeline::MultiArray { pipeline, reader } => {
                pipeline.read(reader.as_ref(), row, ctx)
            }
            BoundPipeline::Object { map, null_on_empty } => {
                if *null_on_empty && map.is_empty_row(row) {
                    return Ok(Value::Null);
                }
                map.map_value(row).map_err(|err| err.within(ctx.member))
            }
        }
    }

    /// Whether every cell this member would read on `row` is empty.
    pub(crate) fn is_empty(&self, row: &dyn RowSource) -> bool {
        fn all_empty(cells: Option<Vec<CellResult<'_>>>) -> bool {
            cells.is_none_or(|cells| cells.iter().all(CellResult::is_empty))
        }
        match self {
            BoundPipeline::Value { reader, .. } => reader
                .try_get_cell(row)
                .is_none_or(|cell| cell.is_empty()),
            BoundPipeline::Collection { reader, .. }
            | BoundPipeline::Dictionary { reader, .. }
            | BoundPipeline::MultiArray { reader, .. } => all_empty(reader.try_get_cells(row)),
            BoundPipeline::Object { map, .. } => map.is_empty_row(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fallback::{FixedValueFallback, NullFallback, ThrowFallback},
        mapper::{BoolMapper, DateTimeMapper, DecimalMapper, FnMapper, IntegerMapper, StringMapper},
        parse::NumberOptions,
        sheet::MemoryRow,
        sheet::CellValue,
        transform::{FnTransformer, PlaceholderTransformer, ReplaceTransformer, TrimTransformer},
        types::{IntegerKind, TemporalKind},
    };

    fn ctx() -> RowContext<'static> {
        RowContext {
            sheet: "Sheet1",
            row: 3,
            member: "count",
        }
    }

    fn text(value: &str) -> CellResult<'static> {
        CellResult::from_text(Some(0), Some(value.to_string()))
    }

    fn int_converter() -> CellConverter {
        CellConverter::new()
            .with_mapper(IntegerMapper::new(IntegerKind::I32, NumberOptions::default()))
    }

    #[test]
    fn empty_cells_go_to_the_empty_fallback_before_mappers() {
        let converter = int_converter().with_empty_fallback(FixedValueFallback(-1i32));
        let value = converter.convert(&CellResult::missing(Some(0)), &ctx()).unwrap();
        assert!(matches!(value, Value::Int(-1)));

        let throwing = int_converter().with_empty_fallback(ThrowFallback);
        let err = throwing.convert(&text(""), &ctx()).unwrap_err();
        assert!(matches!(err, MappingError::EmptyValue { row: 3, .. }));
    }

    #[test]
    fn transformers_can_empty_a_cell() {
        let converter = int_converter()
            .with_transformer(TrimTransformer)
            .with_transformer(PlaceholderTransformer::with_tokens(Vec::<String>::new()))
            .with_empty_fallback(NullFallback);
        assert!(converter.convert(&text("  n/a "), &ctx()).unwrap().is_null());
        assert!(matches!(
            converter.convert(&text(" 42 "), &ctx()).unwrap(),
            Value::Int(42)
        ));
    }

    #[test]
    fn unparsable_values_use_the_invalid_fallback_or_fail() {
        let strict = int_converter();
        let err = strict.convert(&text("abc"), &ctx()).unwrap_err();
        match err {
            MappingError::InvalidValue { value, member, .. } => {
                assert_eq!(value.as_deref(), Some("abc"));
                assert_eq!(member, "count");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let lenient = int_converter().with_invalid_fallback(FixedValueFallback(0i32));
        assert!(matches!(
            lenient.convert(&text("abc"), &ctx()).unwrap(),
            Value::Int(0)
        ));
    }

    #[test]
    fn no_mapper_means_invalid() {
        let converter = CellConverter::new();
        let err = converter.convert(&text("x"), &ctx()).unwrap_err();
        let MappingError::InvalidValue { source, .. } = err else {
            panic!("expected invalid value");
        };
        assert_eq!(source.to_string(), "No mapper accepted the value");
    }

    #[test]
    fn tentative_results_lose_to_definite_ones() {
        let converter = CellConverter::new()
            .with_mapper(StringMapper)
            .with_mapper(FnMapper(|cell: &CellResult<'_>, _: &MapperResult| {
                match cell.string_value() {
                    Some("special") => MapperResult::UseAndStop(Value::Int(1)),
                    _ => MapperResult::IgnoreAndContinue,
                }
            }));
        assert!(matches!(
            converter.convert(&text("special"), &ctx()).unwrap(),
            Value::Int(1)
        ));
        assert!(matches!(
            converter.convert(&text("plain"), &ctx()).unwrap(),
            Value::String(ref s) if s == "plain"
        ));
    }

    #[test]
    fn value_pipeline_reads_short_rows_as_empty() {
        let pipeline = ValuePipeline::new(
            crate::reader::ColumnIndexReaderFactory::new(4),
            int_converter().with_empty_fallback(NullFallback),
        );
        let row = MemoryRow::new(1, ["1"]);
        let reader = crate::reader::ColumnReader::new(4);
        assert!(pipeline.read(&reader, &row, &ctx()).unwrap().is_null());
    }

    fn convert_row_cell(converter: &CellConverter, native: CellValue) -> Result<Value> {
        let row = MemoryRow::new(0, [native]);
        converter.convert(&CellResult::from_row(&row, 0), &ctx())
    }

    #[test]
    fn transformers_rewrite_native_numbers() {
        let converter = int_converter().with_transformer(ReplaceTransformer::new("42", "7"));
        assert!(matches!(
            convert_row_cell(&converter, CellValue::Number(42.0)).unwrap(),
            Value::Int(7)
        ));
        assert!(matches!(
            convert_row_cell(&converter, CellValue::Number(5.0)).unwrap(),
            Value::Int(5)
        ));
    }

    #[test]
    fn transformers_rewrite_native_booleans() {
        let converter = CellConverter::new()
            .with_mapper(BoolMapper::new(
                ["yes".to_string()],
                ["no".to_string()],
            ))
            .with_transformer(ReplaceTransformer::new("TRUE", "no"));
        assert!(matches!(
            convert_row_cell(&converter, CellValue::Bool(true)).unwrap(),
            Value::Bool(false)
        ));
        assert!(matches!(
            convert_row_cell(&converter, CellValue::Bool(false)).unwrap(),
            Value::Bool(false)
        ));
    }

    #[test]
    fn transformers_rewrite_native_decimals() {
        let converter = CellConverter::new()
            .with_mapper(DecimalMapper::new(NumberOptions::default()))
            .with_transformer(FnTransformer(|_: &str| Some("12.50".to_string())));
        let Value::Decimal(decimal) = convert_row_cell(&converter, CellValue::Number(3.0)).unwrap()
        else {
            panic!("expected a decimal");
        };
        assert_eq!(decimal.to_string(), "12.50");
    }

    #[test]
    fn transformers_rewrite_native_dates() {
        let converter = CellConverter::new()
            .with_mapper(DateTimeMapper::new(TemporalKind::Date, vec!["%Y-%m-%d".to_string()]))
            .with_transformer(FnTransformer(|_: &str| Some("2020-05-06".to_string())));
        let stored = chrono::NaiveDate::from_ymd_opt(1999, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap();
        let Value::Date(date) = convert_row_cell(&converter, CellValue::DateTime(stored)).unwrap()
        else {
            panic!("expected a date");
        };
        assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2020, 5, 6).unwrap());
    }

    #[test]
    fn transformers_clearing_a_native_cell_reach_the_empty_fallback() {
        let converter = int_converter()
            .with_transformer(ReplaceTransformer::clearing("0"))
            .with_empty_fallback(NullFallback);
        assert!(convert_row_cell(&converter, CellValue::Number(0.0)).unwrap().is_null());
    }
}
