//! Class maps: the resolved member pipelines of one record type, and their
//! binding to a concrete sheet.

use std::{
    any::{Any, TypeId, type_name},
    fmt,
    sync::Arc,
};

use log::{debug, info, trace};

use crate::{
    error::{MappingError, Result},
    pipeline::{
        Binding, BoundPipeline, CollectionPipeline, DictionaryPipeline, MemberPipeline,
        MultiArrayPipeline, RowContext, ValuePipeline,
    },
    record::{Assign, Record},
    sheet::{RowSource, SheetSource},
    value::Value,
};

/// One record member: its pipeline and the setter that stores the result.
pub struct MemberMap<R> {
    name: &'static str,
    type_name: &'static str,
    optional: bool,
    pipeline: MemberPipeline,
    assign: Assign<R>,
}

impl<R: Record> MemberMap<R> {
    pub(crate) fn new(
        name: &'static str,
        type_name: &'static str,
        pipeline: MemberPipeline,
        assign: Assign<R>,
    ) -> Self {
        Self {
            name,
            type_name,
            optional: false,
            pipeline,
            assign,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Optional members whose columns are missing from a sheet are skipped
    /// and keep their default value.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn set_optional(&mut self, optional: bool) -> &mut Self {
        self.optional = optional;
        self
    }

    pub fn pipeline(&self) -> &MemberPipeline {
        &self.pipeline
    }

    pub fn set_pipeline(&mut self, pipeline: MemberPipeline) -> &mut Self {
        self.pipeline = pipeline;
        self
    }

    pub fn value_mut(&mut self) -> Option<&mut ValuePipeline> {
        match &mut self.pipeline {
            MemberPipeline::Value(pipeline) => Some(pipeline),
            _ => None,
        }
    }

    pub fn collection_mut(&mut self) -> Option<&mut CollectionPipeline> {
        match &mut self.pipeline {
            MemberPipeline::Collection(pipeline) => Some(pipeline),
            _ => None,
        }
    }

    pub fn dictionary_mut(&mut self) -> Option<&mut DictionaryPipeline> {
        match &mut self.pipeline {
            MemberPipeline::Dictionary(pipeline) => Some(pipeline),
            _ => None,
        }
    }

    pub fn multi_array_mut(&mut self) -> Option<&mut MultiArrayPipeline> {
        match &mut self.pipeline {
            MemberPipeline::MultiArray(pipeline) => Some(pipeline),
            _ => None,
        }
    }

    /// The class map used for a nested record member.
    pub fn nested_map<N: Record>(&self) -> Option<&ClassMap<N>> {
        match &self.pipeline {
            MemberPipeline::Object(object) => object.map().as_any().downcast_ref::<ClassMap<N>>(),
            _ => None,
        }
    }

    /// Replaces the class map of a nested record member.
    pub fn set_nested_map<N: Record>(&mut self, map: ClassMap<N>) -> Result<&mut Self> {
        match &mut self.pipeline {
            MemberPipeline::Object(object) if object.map().record_type() == TypeId::of::<N>() => {
                object.replace_map(Arc::new(map));
            }
            _ => {
                return Err(MappingError::Configuration(format!(
                    "member `{}` is not a nested `{}`",
                    self.name,
                    type_name::<N>()
                )));
            }
        }
        Ok(self)
    }
}

impl<R> fmt::Debug for MemberMap<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMap")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .field("optional", &self.optional)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

/// The resolved mapping of record type `R`.
pub struct ClassMap<R> {
    members: Vec<MemberMap<R>>,
}

impl<R: Record> ClassMap<R> {
    pub(crate) fn from_members(members: Vec<MemberMap<R>>) -> Self {
        Self { members }
    }

    pub fn type_name(&self) -> &'static str {
        type_name::<R>()
    }

    pub fn members(&self) -> &[MemberMap<R>] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberMap<R>> {
        self.members.iter().find(|member| member.name == name)
    }

    pub fn member_mut(&mut self, name: &str) -> Result<&mut MemberMap<R>> {
        self.members
            .iter_mut()
            .find(|member| member.name == name)
            .ok_or_else(|| MappingError::UnknownMember {
                type_name: type_name::<R>(),
                member: name.to_string(),
            })
    }

    /// Stops mapping `name`; the member keeps its default value.
    pub fn ignore_member(&mut self, name: &str) -> Result<()> {
        let before = self.members.len();
        self.members.retain(|member| member.name != name);
        if self.members.len() == before {
            return Err(MappingError::UnknownMember {
                type_name: type_name::<R>(),
                member: name.to_string(),
            });
        }
        Ok(())
    }

    /// Resolves every member's columns on `sheet`.
    ///
    /// Fails with [`MappingError::MissingHeader`] when a member locates
    /// columns by name on a sheet without a header row, and with
    /// [`MappingError::ColumnNotFound`] when a required member's column is
    /// absent.
    pub fn bind<'s>(&'s self, sheet: &'s dyn SheetSource) -> Result<BoundClassMap<'s, R>> {
        let mut members = Vec::with_capacity(self.members.len());
        let mut skipped = Vec::new();
        for member in &self.members {
            let binding = match member.pipeline.bind(sheet, member.name) {
                Ok(binding) => binding,
                Err(err) if member.optional && is_locating_error(&err) => {
                    debug!("Skipping optional member '{}': {err}", member.name);
                    skipped.push(member.name);
                    continue;
                }
                Err(err) => return Err(err),
            };
            match binding {
                Binding::Bound(bound) => members.push((member, bound)),
                Binding::NotFound(_) if member.optional => {
                    debug!(
                        "Optional member '{}' has no column on sheet '{}'",
                        member.name,
                        sheet.name()
                    );
                    skipped.push(member.name);
                }
                Binding::NotFound(reference) => {
                    return Err(MappingError::ColumnNotFound {
                        sheet: sheet.name().to_string(),
                        member: member.name.to_string(),
                        reference,
                    });
                }
            }
        }
        info!(
            "Bound {} to sheet '{}' ({} member(s), {} skipped)",
            type_name::<R>(),
            sheet.name(),
            members.len(),
            skipped.len()
        );
        Ok(BoundClassMap {
            sheet,
            members,
            skipped,
        })
    }

    /// Binds and maps a single row. Prefer [`ClassMap::bind`] when mapping
    /// many rows of the same sheet.
    pub fn map_row(&self, sheet: &dyn SheetSource, row: &dyn RowSource) -> Result<R> {
        self.bind(sheet)?.map_row(row)
    }
}

fn is_locating_error(err: &MappingError) -> bool {
    matches!(
        err,
        MappingError::MissingHeader { .. } | MappingError::ColumnNotFound { .. }
    )
}

impl<R> fmt::Debug for ClassMap<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMap")
            .field("type", &type_name::<R>())
            .field("members", &self.members)
            .finish()
    }
}

/// A class map whose readers are resolved for one sheet. Reused for every
/// row of that sheet.
pub struct BoundClassMap<'s, R> {
    sheet: &'s dyn SheetSource,
    members: Vec<(&'s MemberMap<R>, BoundPipeline<'s>)>,
    skipped: Vec<&'static str>,
}

impl<'s, R: Record> BoundClassMap<'s, R> {
    pub fn sheet_name(&self) -> &str {
        self.sheet.name()
    }

    pub fn bound_members(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.members.iter().map(|(member, _)| member.name)
    }

    /// Optional members left unmapped because their columns are absent.
    pub fn skipped_members(&self) -> &[&'static str] {
        &self.skipped
    }

    pub fn map_row(&self, row: &dyn RowSource) -> Result<R> {
        let mut record = R::default();
        let sheet = self.sheet.name();
        let row_index = row.row_index();
        trace!("Mapping row {row_index} of sheet '{sheet}'");
        for (member, bound) in &self.members {
            let ctx = RowContext {
                sheet,
                row: row_index,
                member: member.name,
            };
            let value = bound.read(row, &ctx)?;
            (member.assign)(&mut record, value).map_err(|err| MappingError::InvalidValue {
                sheet: sheet.to_string(),
                row: row_index,
                column: None,
                member: member.name.to_string(),
                value: None,
                source: Box::new(err),
            })?;
        }
        Ok(record)
    }

    /// Maps `rows` lazily, one result per row.
    pub fn map_rows<'a, I, S>(&'a self, rows: I) -> impl Iterator<Item = Result<R>> + 'a
    where
        I: IntoIterator<Item = &'a S>,
        I::IntoIter: 'a,
        S: RowSource + 'a,
    {
        rows.into_iter().map(move |row| self.map_row(row))
    }
}

/// Type-erased class map, used for nested record members.
pub trait RecordMap: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn record_type(&self) -> TypeId;

    fn bind_erased<'s>(
        &'s self,
        sheet: &'s dyn SheetSource,
    ) -> Result<Box<dyn BoundRecordMap + 's>>;

    fn as_any(&self) -> &dyn Any;
}

pub trait BoundRecordMap {
    fn map_value(&self, row: &dyn RowSource) -> Result<Value>;

    /// Whether every cell the bound members read on `row` is empty.
    fn is_empty_row(&self, row: &dyn RowSource) -> bool;
}

impl<R: Record> RecordMap for ClassMap<R> {
    fn type_name(&self) -> &'static str {
        type_name::<R>()
    }

    fn record_type(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn bind_erased<'s>(
        &'s self,
        sheet: &'s dyn SheetSource,
    ) -> Result<Box<dyn BoundRecordMap + 's>> {
        Ok(Box::new(self.bind(sheet)?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<R: Record> BoundRecordMap for BoundClassMap<'_, R> {
    fn map_value(&self, row: &dyn RowSource) -> Result<Value> {
        self.map_row(row).map(Value::object)
    }

    fn is_empty_row(&self, row: &dyn RowSource) -> bool {
        self.members.iter().all(|(_, bound)| bound.is_empty(row))
    }
}
