//! Automatic class-map construction.
//!
//! Each declared member is classified from its [`TypeInfo`] in a fixed
//! order: nullable wrapper, scalar (primitive, enum or parsable), grid,
//! collection, dictionary or pair sequence, nested record. Anything else is
//! [`MappingError::UnsupportedType`]. Nested record maps are cached per
//! `(type, column prefix)` and a record that contains itself is rejected.

use std::{
    any::{TypeId, type_name},
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::debug;

use crate::{
    class_map::{ClassMap, MemberMap, RecordMap},
    error::{MappingError, Result},
    fallback::{DefaultValueFallback, Fallback, NullFallback, ThrowFallback},
    mapper::{
        BoolMapper, CellMapper, CharMapper, DateTimeMapper, DecimalMapper, DurationMapper,
        EnumMapper, FloatMapper, GuidMapper, IntegerMapper, ParseMapper, StringMapper, UrlMapper,
        VersionMapper,
    },
    options::{AutomapOptions, FallbackStrategy, NestedNaming},
    pipeline::{
        CellConverter, CollectionPipeline, DictionaryPipeline, MemberPipeline, MultiArrayPipeline,
        ObjectPipeline, ValuePipeline,
    },
    reader::{
        AllColumnsReaderFactory, ColumnMatcher, ColumnNameReaderFactory,
        MatchingColumnsReaderFactory, Separator, SplitCellsReaderFactory,
    },
    record::{MemberDecl, Members, Record},
    transform::{PlaceholderTransformer, TrimTransformer},
    types::{PrimitiveKind, TemporalKind, TypeInfo, TypeKind},
};

/// Builds class maps from member type descriptions.
#[derive(Default)]
pub struct Resolver {
    options: AutomapOptions,
    cache: HashMap<(TypeId, String), Arc<dyn RecordMap>>,
    building: Vec<TypeId>,
}

impl Resolver {
    pub fn new(options: AutomapOptions) -> Self {
        Self {
            options,
            cache: HashMap::new(),
            building: Vec::new(),
        }
    }

    pub fn options(&self) -> &AutomapOptions {
        &self.options
    }

    /// Number of nested class maps built so far.
    pub fn cached_maps(&self) -> usize {
        self.cache.len()
    }

    pub fn build_class_map<R: Record>(&mut self) -> Result<ClassMap<R>> {
        self.build_record::<R>("")
    }

    fn build_record<R: Record>(&mut self, prefix: &str) -> Result<ClassMap<R>> {
        self.building.push(TypeId::of::<R>());
        let result = self.build_members::<R>(prefix);
        self.building.pop();
        result
    }

    fn build_members<R: Record>(&mut self, prefix: &str) -> Result<ClassMap<R>> {
        let mut members = Members::<R>::new();
        R::describe(&mut members);

        let mut seen = HashSet::new();
        let mut maps = Vec::with_capacity(members.len());
        for decl in members.into_decls() {
            if !seen.insert(decl.name) {
                return Err(MappingError::Configuration(format!(
                    "member `{}` is declared twice on `{}`",
                    decl.name,
                    type_name::<R>()
                )));
            }
            maps.push(self.resolve_member(decl, prefix)?);
        }
        debug!(
            "Built class map for {} with {} member(s)",
            type_name::<R>(),
            maps.len()
        );
        Ok(ClassMap::from_members(maps))
    }

    pub(crate) fn nested_map<R: Record>(
        &mut self,
        prefix: &str,
        member: &str,
    ) -> Result<Arc<dyn RecordMap>> {
        let type_id = TypeId::of::<R>();
        if self.building.contains(&type_id) {
            return Err(MappingError::RecursiveRecord {
                type_name: type_name::<R>(),
                member: member.to_string(),
            });
        }
        let key = (type_id, prefix.to_string());
        if let Some(map) = self.cache.get(&key) {
            debug!("Reusing class map for {} (prefix '{prefix}')", type_name::<R>());
            return Ok(Arc::clone(map));
        }
        let map: Arc<dyn RecordMap> = Arc::new(self.build_record::<R>(prefix)?);
        self.cache.insert(key, Arc::clone(&map));
        Ok(map)
    }

    fn resolve_member<R: Record>(
        &mut self,
        decl: MemberDecl<R>,
        prefix: &str,
    ) -> Result<MemberMap<R>> {
        let MemberDecl { name, info, assign } = decl;
        let column = format!("{prefix}{name}");
        let (target, nullable) = match &info.kind {
            TypeKind::Nullable(inner) => (inner.as_ref(), true),
            _ => (&info, false),
        };

        let pipeline = match &target.kind {
            TypeKind::Nullable(_) => {
                return Err(unsupported(&info, "nested optional types are ambiguous"));
            }
            TypeKind::Primitive(_) | TypeKind::Enum(_) | TypeKind::Parsable(_) => {
                let mut pipeline = ValuePipeline::new(
                    self.column_reader(&column),
                    self.scalar_converter(target, nullable)?,
                );
                pipeline.set_preserve_formatting(self.options.preserve_formatting);
                MemberPipeline::Value(pipeline)
            }
            TypeKind::MultiArray(array) => {
                let matching = self.options.name_matching;
                let wanted = column.clone();
                let reader = MatchingColumnsReaderFactory::new(ColumnMatcher::predicate(
                    move |header| matching.matches_prefix(header, &wanted),
                ));
                MemberPipeline::MultiArray(
                    MultiArrayPipeline::new(
                        reader,
                        self.separator(),
                        self.element_converter(&array.element)?,
                        array.factory,
                    )?
                    .trim_entries(self.options.trim_entries),
                )
            }
            TypeKind::Collection(collection) => {
                let reader =
                    SplitCellsReaderFactory::new(self.column_reader(&column), self.separator())?
                        .trim_entries(self.options.trim_entries)
                        .remove_empty_entries(self.options.remove_empty_entries);
                let mut pipeline = CollectionPipeline::new(
                    reader,
                    self.element_converter(&collection.element)?,
                    collection.factory,
                );
                if nullable {
                    pipeline.set_empty_fallback(NullFallback);
                }
                MemberPipeline::Collection(pipeline)
            }
            TypeKind::Dictionary(dictionary) | TypeKind::PairSequence(dictionary) => {
                let mut pipeline = DictionaryPipeline::new(
                    AllColumnsReaderFactory,
                    self.key_converter(&dictionary.key)?,
                    self.element_converter(&dictionary.value)?,
                    dictionary.factory,
                );
                if nullable {
                    pipeline.set_empty_fallback(NullFallback);
                }
                MemberPipeline::Dictionary(pipeline)
            }
            TypeKind::Record(record) => {
                let nested_prefix = match &self.options.nested_naming {
                    NestedNaming::Flat => prefix.to_string(),
                    NestedNaming::Prefixed { separator } => format!("{prefix}{name}{separator}"),
                };
                let mut object = ObjectPipeline::new((record.build)(self, &nested_prefix, name)?);
                object.set_null_on_empty(nullable);
                MemberPipeline::Object(object)
            }
            TypeKind::Abstract { reason } => return Err(unsupported(&info, reason)),
        };

        debug!(
            "Member '{name}' of {} resolved as {} ({})",
            type_name::<R>(),
            pipeline.shape_name(),
            target.kind.shape_name()
        );
        let mut member = MemberMap::new(name, info.name, pipeline, assign);
        member.set_optional(nullable);
        Ok(member)
    }

    fn column_reader(&self, column: &str) -> ColumnNameReaderFactory {
        ColumnNameReaderFactory::with_matching(column, self.options.name_matching)
    }

    fn separator(&self) -> Separator {
        Separator::Chars(self.options.separators.clone())
    }

    /// Converter for collection elements and dictionary values.
    fn element_converter(&self, info: &TypeInfo) -> Result<CellConverter> {
        match &info.kind {
            TypeKind::Nullable(inner) => match inner.kind {
                TypeKind::Primitive(_) | TypeKind::Enum(_) | TypeKind::Parsable(_) => {
                    self.scalar_converter(inner, true)
                }
                _ => Err(unsupported(info, "only optional scalars can be elements")),
            },
            TypeKind::Primitive(_) | TypeKind::Enum(_) | TypeKind::Parsable(_) => {
                self.scalar_converter(info, false)
            }
            TypeKind::Record(_) => Err(unsupported(
                info,
                "records cannot be built from a single cell",
            )),
            TypeKind::Abstract { reason } => Err(unsupported(info, reason)),
            _ => Err(unsupported(info, "nested containers are not supported")),
        }
    }

    fn scalar_mapper(&self, info: &TypeInfo) -> Result<Box<dyn CellMapper>> {
        Ok(match &info.kind {
            TypeKind::Primitive(kind) => self.primitive_mapper(*kind),
            TypeKind::Enum(e) => Box::new(EnumMapper::new(
                info.name,
                e.variants,
                self.options.enum_ignore_case,
            )),
            TypeKind::Parsable(parse) => Box::new(ParseMapper::new(*parse)),
            _ => return Err(unsupported(info, "expected a scalar type")),
        })
    }

    fn scalar_converter(&self, info: &TypeInfo, nullable: bool) -> Result<CellConverter> {
        let mapper = self.scalar_mapper(info)?;
        let mut converter = CellConverter::new();
        if self.options.trim_values {
            converter.push_boxed_transformer(Box::new(TrimTransformer));
        }
        if self.options.empty_placeholders || !self.options.placeholders.is_empty() {
            converter.push_boxed_transformer(Box::new(PlaceholderTransformer::with_tokens(
                self.options.placeholders.clone(),
            )));
        }
        converter.push_boxed_mapper(mapper);
        converter.set_boxed_empty_fallback(self.empty_fallback(info, nullable));
        Ok(converter)
    }

    /// Dictionary keys come from header names, so the cell-value
    /// transformers do not apply to them.
    fn key_converter(&self, info: &TypeInfo) -> Result<CellConverter> {
        let mut converter = CellConverter::new();
        converter.push_boxed_mapper(self.scalar_mapper(info)?);
        converter.set_boxed_empty_fallback(self.empty_fallback(info, false));
        Ok(converter)
    }

    fn empty_fallback(&self, info: &TypeInfo, nullable: bool) -> Box<dyn Fallback> {
        if nullable {
            return Box::new(NullFallback);
        }
        let is_string = matches!(info.kind, TypeKind::Primitive(PrimitiveKind::String));
        match (self.options.fallback_strategy, info.default_value) {
            (_, Some(make)) if is_string => Box::new(DefaultValueFallback::new(make)),
            (FallbackStrategy::SetToDefault, Some(make)) => {
                Box::new(DefaultValueFallback::new(make))
            }
            _ => Box::new(ThrowFallback),
        }
    }

    fn primitive_mapper(&self, kind: PrimitiveKind) -> Box<dyn CellMapper> {
        let options = &self.options;
        match kind {
            PrimitiveKind::Bool => Box::new(BoolMapper::new(
                options.true_tokens.clone(),
                options.false_tokens.clone(),
            )),
            PrimitiveKind::Integer(kind) => {
                Box::new(IntegerMapper::new(kind, options.number.clone()))
            }
            PrimitiveKind::Float(kind) => Box::new(FloatMapper::new(kind, options.number.clone())),
            PrimitiveKind::Decimal => Box::new(DecimalMapper::new(options.number.clone())),
            PrimitiveKind::Char => Box::new(CharMapper),
            PrimitiveKind::String => Box::new(StringMapper),
            PrimitiveKind::Guid => Box::new(GuidMapper),
            PrimitiveKind::Version => Box::new(VersionMapper),
            PrimitiveKind::Url => Box::new(UrlMapper),
            PrimitiveKind::Temporal(kind) => {
                let formats = match kind {
                    TemporalKind::Date => &options.date_formats,
                    TemporalKind::Time => &options.time_formats,
                    TemporalKind::DateTime
                    | TemporalKind::DateTimeUtc
                    | TemporalKind::DateTimeOffset => &options.datetime_formats,
                };
                Box::new(DateTimeMapper::new(kind, formats.clone()))
            }
            PrimitiveKind::Duration => Box::new(DurationMapper),
        }
    }
}

fn unsupported(info: &TypeInfo, reason: &str) -> MappingError {
    MappingError::UnsupportedType {
        type_name: info.name,
        reason: reason.to_string(),
    }
}

/// Entry point used by nested record members; see [`RecordInfo`](crate::RecordInfo).
pub fn nested_record_map<R: Record>(
    resolver: &mut Resolver,
    prefix: &str,
    member: &str,
) -> Result<Arc<dyn RecordMap>> {
    resolver.nested_map::<R>(prefix, member)
}

/// Builds the class map of `R` with default options and the given empty-cell
/// strategy.
pub fn build_class_map<R: Record>(strategy: FallbackStrategy) -> Result<ClassMap<R>> {
    Resolver::new(AutomapOptions::default().with_fallback_strategy(strategy)).build_class_map()
}
