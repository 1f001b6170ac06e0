//! Runtime descriptions of mappable types.
//!
//! Every member type implements [`Mapped`], which reports the type's shape
//! as a [`TypeInfo`]. The resolver classifies members purely from this
//! description: nullable wrappers, primitives, enums, parsable types,
//! two-dimensional grids, collections, dictionaries, custom pair sequences,
//! nested records and abstract types.
//!
//! Standard library, `chrono`, `uuid`, `semver`, `url`, `rust_decimal` and
//! `indexmap` types are covered here. Application types opt in with
//! [`mapped_record!`](crate::mapped_record), [`mapped_enum!`](crate::mapped_enum),
//! [`mapped_parsable!`](crate::mapped_parsable),
//! [`mapped_collection!`](crate::mapped_collection),
//! [`mapped_pairs!`](crate::mapped_pairs) and
//! [`mapped_abstract!`](crate::mapped_abstract).

use std::{
    any::{TypeId, type_name},
    collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque},
    fmt,
    hash::Hash,
    sync::Arc,
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use indexmap::{IndexMap, IndexSet};
use rust_decimal::Decimal;
use semver::Version;
use url::Url;
use uuid::Uuid;

use crate::{
    class_map::RecordMap,
    error::Result,
    factory::{
        self, CollectionFactory, CollectionStrategy, DictionaryFactory, DictionaryStrategy, Grid,
        MultiArrayFactory,
    },
    record::Record,
    resolver::{Resolver, nested_record_map},
    value::{FromValue, IntoValue, Value},
};

/// Parses cell text into a [`Value`] holding the target type.
pub type ParseFn = fn(&str) -> anyhow::Result<Value>;

/// Builds (or fetches from the resolver's cache) the class map of a nested
/// record. Arguments are the column prefix and the member being resolved.
pub type NestedMapFn = fn(&mut Resolver, &str, &str) -> Result<Arc<dyn RecordMap>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
}

impl IntegerKind {
    pub fn bounds(self) -> (i128, i128) {
        match self {
            IntegerKind::I8 => (i8::MIN.into(), i8::MAX.into()),
            IntegerKind::I16 => (i16::MIN.into(), i16::MAX.into()),
            IntegerKind::I32 => (i32::MIN.into(), i32::MAX.into()),
            IntegerKind::I64 => (i64::MIN.into(), i64::MAX.into()),
            IntegerKind::Isize => (isize::MIN as i128, isize::MAX as i128),
            IntegerKind::U8 => (0, u8::MAX.into()),
            IntegerKind::U16 => (0, u16::MAX.into()),
            IntegerKind::U32 => (0, u32::MAX.into()),
            IntegerKind::U64 => (0, u64::MAX.into()),
            IntegerKind::Usize => (0, usize::MAX as i128),
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntegerKind::I8
                | IntegerKind::I16
                | IntegerKind::I32
                | IntegerKind::I64
                | IntegerKind::Isize
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            IntegerKind::I8 => "i8",
            IntegerKind::I16 => "i16",
            IntegerKind::I32 => "i32",
            IntegerKind::I64 => "i64",
            IntegerKind::Isize => "isize",
            IntegerKind::U8 => "u8",
            IntegerKind::U16 => "u16",
            IntegerKind::U32 => "u32",
            IntegerKind::U64 => "u64",
            IntegerKind::Usize => "usize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    DateTime,
    DateTimeUtc,
    DateTimeOffset,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Integer(IntegerKind),
    Float(FloatKind),
    Decimal,
    Char,
    String,
    Guid,
    Version,
    Url,
    Temporal(TemporalKind),
    Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct EnumInfo {
    pub variants: &'static [&'static str],
}

#[derive(Clone)]
pub struct CollectionInfo {
    pub strategy: CollectionStrategy,
    pub element: Box<TypeInfo>,
    pub factory: fn() -> Box<dyn CollectionFactory>,
}

#[derive(Clone)]
pub struct DictionaryInfo {
    pub strategy: DictionaryStrategy,
    pub key: Box<TypeInfo>,
    pub value: Box<TypeInfo>,
    pub factory: fn() -> Box<dyn DictionaryFactory>,
}

#[derive(Clone)]
pub struct MultiArrayInfo {
    pub rank: usize,
    pub element: Box<TypeInfo>,
    pub factory: fn() -> Box<dyn MultiArrayFactory>,
}

#[derive(Clone, Copy)]
pub struct RecordInfo {
    pub build: NestedMapFn,
}

impl RecordInfo {
    pub fn of<R: Record>() -> Self {
        Self {
            build: nested_record_map::<R>,
        }
    }
}

#[derive(Clone)]
pub enum TypeKind {
    Nullable(Box<TypeInfo>),
    Primitive(PrimitiveKind),
    Enum(EnumInfo),
    Parsable(ParseFn),
    MultiArray(MultiArrayInfo),
    Collection(CollectionInfo),
    Dictionary(DictionaryInfo),
    /// An application type built from `(key, value)` pairs.
    PairSequence(DictionaryInfo),
    Record(RecordInfo),
    Abstract { reason: &'static str },
}

impl TypeKind {
    pub fn shape_name(&self) -> &'static str {
        match self {
            TypeKind::Nullable(_) => "nullable",
            TypeKind::Primitive(_) => "primitive",
            TypeKind::Enum(_) => "enum",
            TypeKind::Parsable(_) => "parsable",
            TypeKind::MultiArray(_) => "multidimensional array",
            TypeKind::Collection(_) => "collection",
            TypeKind::Dictionary(_) => "dictionary",
            TypeKind::PairSequence(_) => "pair sequence",
            TypeKind::Record(_) => "record",
            TypeKind::Abstract { .. } => "abstract",
        }
    }
}

#[derive(Clone)]
pub struct TypeInfo {
    pub name: &'static str,
    pub type_id: TypeId,
    pub kind: TypeKind,
    /// Value used by the `SetToDefault` strategy, when the type has one.
    pub default_value: Option<fn() -> Value>,
}

impl TypeInfo {
    pub fn of<T: 'static>(kind: TypeKind) -> Self {
        Self {
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            kind,
            default_value: None,
        }
    }

    pub fn with_default(mut self, make: fn() -> Value) -> Self {
        self.default_value = Some(make);
        self
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self.kind, TypeKind::Nullable(_))
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("shape", &self.kind.shape_name())
            .finish()
    }
}

/// A type that can be the target of a record member.
pub trait Mapped: FromValue + Send + 'static {
    fn type_info() -> TypeInfo;
}

fn default_of<T: Default + IntoValue>() -> Value {
    T::default().into_value()
}

macro_rules! primitive_types {
    ($($ty:ty => $kind:expr),* $(,)?) => {$(
        impl Mapped for $ty {
            fn type_info() -> TypeInfo {
                TypeInfo::of::<$ty>(TypeKind::Primitive($kind)).with_default(default_of::<$ty>)
            }
        }
    )*};
}

primitive_types!(
    bool => PrimitiveKind::Bool,
    i8 => PrimitiveKind::Integer(IntegerKind::I8),
    i16 => PrimitiveKind::Integer(IntegerKind::I16),
    i32 => PrimitiveKind::Integer(IntegerKind::I32),
    i64 => PrimitiveKind::Integer(IntegerKind::I64),
    isize => PrimitiveKind::Integer(IntegerKind::Isize),
    u8 => PrimitiveKind::Integer(IntegerKind::U8),
    u16 => PrimitiveKind::Integer(IntegerKind::U16),
    u32 => PrimitiveKind::Integer(IntegerKind::U32),
    u64 => PrimitiveKind::Integer(IntegerKind::U64),
    usize => PrimitiveKind::Integer(IntegerKind::Usize),
    f32 => PrimitiveKind::Float(FloatKind::F32),
    f64 => PrimitiveKind::Float(FloatKind::F64),
    Decimal => PrimitiveKind::Decimal,
    char => PrimitiveKind::Char,
    String => PrimitiveKind::String,
    Uuid => PrimitiveKind::Guid,
    NaiveDate => PrimitiveKind::Temporal(TemporalKind::Date),
    NaiveDateTime => PrimitiveKind::Temporal(TemporalKind::DateTime),
    DateTime<Utc> => PrimitiveKind::Temporal(TemporalKind::DateTimeUtc),
    DateTime<FixedOffset> => PrimitiveKind::Temporal(TemporalKind::DateTimeOffset),
    NaiveTime => PrimitiveKind::Temporal(TemporalKind::Time),
    TimeDelta => PrimitiveKind::Duration,
);

impl Mapped for Version {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Version>(TypeKind::Primitive(PrimitiveKind::Version))
    }
}

impl Mapped for Url {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Url>(TypeKind::Primitive(PrimitiveKind::Url))
    }
}

impl<T: Mapped> Mapped for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Option<T>>(TypeKind::Nullable(Box::new(T::type_info())))
            .with_default(|| Value::Null)
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

/// Boxing is transparent; it mostly exists to allow self-referencing
/// records, which the resolver then rejects.
impl<T: Mapped> Mapped for Box<T> {
    fn type_info() -> TypeInfo {
        TypeInfo {
            name: type_name::<Box<T>>(),
            ..T::type_info()
        }
    }
}

macro_rules! object_values {
    ($([$($generics:tt)*] $ty:ty),* $(,)?) => {$(
        impl<$($generics)*> FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                value.into_object()
            }
        }
    )*};
}

object_values!(
    [T: 'static] Vec<T>,
    [T: 'static, const N: usize] [T; N],
    [T: 'static] Box<[T]>,
    [T: 'static] VecDeque<T>,
    [T: 'static] LinkedList<T>,
    [T: 'static] BinaryHeap<T>,
    [T: 'static] HashSet<T>,
    [T: 'static] BTreeSet<T>,
    [T: 'static] IndexSet<T>,
    [T: 'static] Arc<[T]>,
    [T: 'static] Arc<HashSet<T>>,
    [T: 'static] Arc<BTreeSet<T>>,
    [K: 'static, V: 'static] HashMap<K, V>,
    [K: 'static, V: 'static] BTreeMap<K, V>,
    [K: 'static, V: 'static] IndexMap<K, V>,
    [K: 'static, V: 'static] Arc<HashMap<K, V>>,
    [K: 'static, V: 'static] Arc<BTreeMap<K, V>>,
    [K: 'static, V: 'static] Arc<IndexMap<K, V>>,
    [T: 'static] Grid<T>,
);

#[doc(hidden)]
pub fn collection_info<T: Mapped>(
    strategy: CollectionStrategy,
    factory: fn() -> Box<dyn CollectionFactory>,
) -> TypeKind {
    TypeKind::Collection(CollectionInfo {
        strategy,
        element: Box::new(T::type_info()),
        factory,
    })
}

#[doc(hidden)]
pub fn dictionary_info<K: Mapped, V: Mapped>(
    strategy: DictionaryStrategy,
    factory: fn() -> Box<dyn DictionaryFactory>,
) -> DictionaryInfo {
    DictionaryInfo {
        strategy,
        key: Box::new(K::type_info()),
        value: Box::new(V::type_info()),
        factory,
    }
}

impl<T: Mapped> Mapped for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::Vec,
            factory::vec_factory::<T>,
        ))
        .with_default(|| Value::object(Vec::<T>::new()))
    }
}

impl<T: Mapped, const N: usize> Mapped for [T; N] {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::Array { len: N },
            factory::array_factory::<T, N>,
        ))
    }
}

impl<T: Mapped> Mapped for Box<[T]> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::BoxedSlice,
            factory::boxed_slice_factory::<T>,
        ))
        .with_default(|| Value::object(Box::<[T]>::default()))
    }
}

impl<T: Mapped> Mapped for VecDeque<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::VecDeque,
            factory::vec_deque_factory::<T>,
        ))
        .with_default(|| Value::object(VecDeque::<T>::new()))
    }
}

impl<T: Mapped> Mapped for LinkedList<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::LinkedList,
            factory::linked_list_factory::<T>,
        ))
        .with_default(|| Value::object(LinkedList::<T>::new()))
    }
}

impl<T: Mapped + Ord> Mapped for BinaryHeap<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::BinaryHeap,
            factory::binary_heap_factory::<T>,
        ))
        .with_default(|| Value::object(BinaryHeap::<T>::new()))
    }
}

impl<T: Mapped + Eq + Hash> Mapped for HashSet<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::HashSet,
            factory::hash_set_factory::<T>,
        ))
        .with_default(|| Value::object(HashSet::<T>::new()))
    }
}

impl<T: Mapped + Ord> Mapped for BTreeSet<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::BTreeSet,
            factory::btree_set_factory::<T>,
        ))
        .with_default(|| Value::object(BTreeSet::<T>::new()))
    }
}

impl<T: Mapped + Eq + Hash> Mapped for IndexSet<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::IndexSet,
            factory::index_set_factory::<T>,
        ))
        .with_default(|| Value::object(IndexSet::<T>::new()))
    }
}

impl<T: Mapped + Sync> Mapped for Arc<[T]> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::FrozenSlice,
            factory::frozen_slice_factory::<T>,
        ))
        .with_default(|| Value::object(Arc::<[T]>::from(Vec::new())))
    }
}

impl<T: Mapped + Eq + Hash + Sync> Mapped for Arc<HashSet<T>> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::FrozenHashSet,
            factory::frozen_hash_set_factory::<T>,
        ))
        .with_default(|| Value::object(Arc::new(HashSet::<T>::new())))
    }
}

impl<T: Mapped + Ord + Sync> Mapped for Arc<BTreeSet<T>> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(collection_info::<T>(
            CollectionStrategy::FrozenBTreeSet,
            factory::frozen_btree_set_factory::<T>,
        ))
        .with_default(|| Value::object(Arc::new(BTreeSet::<T>::new())))
    }
}

impl<K: Mapped + Eq + Hash, V: Mapped> Mapped for HashMap<K, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(TypeKind::Dictionary(dictionary_info::<K, V>(
            DictionaryStrategy::HashMap,
            factory::hash_map_factory::<K, V>,
        )))
        .with_default(|| Value::object(HashMap::<K, V>::new()))
    }
}

impl<K: Mapped + Ord, V: Mapped> Mapped for BTreeMap<K, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(TypeKind::Dictionary(dictionary_info::<K, V>(
            DictionaryStrategy::BTreeMap,
            factory::btree_map_factory::<K, V>,
        )))
        .with_default(|| Value::object(BTreeMap::<K, V>::new()))
    }
}

impl<K: Mapped + Eq + Hash, V: Mapped> Mapped for IndexMap<K, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(TypeKind::Dictionary(dictionary_info::<K, V>(
            DictionaryStrategy::IndexMap,
            factory::index_map_factory::<K, V>,
        )))
        .with_default(|| Value::object(IndexMap::<K, V>::new()))
    }
}

impl<K: Mapped + Eq + Hash + Sync, V: Mapped + Sync> Mapped for Arc<HashMap<K, V>> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(TypeKind::Dictionary(dictionary_info::<K, V>(
            DictionaryStrategy::FrozenHashMap,
            factory::frozen_hash_map_factory::<K, V>,
        )))
        .with_default(|| Value::object(Arc::new(HashMap::<K, V>::new())))
    }
}

impl<K: Mapped + Ord + Sync, V: Mapped + Sync> Mapped for Arc<BTreeMap<K, V>> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(TypeKind::Dictionary(dictionary_info::<K, V>(
            DictionaryStrategy::FrozenBTreeMap,
            factory::frozen_btree_map_factory::<K, V>,
        )))
        .with_default(|| Value::object(Arc::new(BTreeMap::<K, V>::new())))
    }
}

impl<K: Mapped + Eq + Hash + Sync, V: Mapped + Sync> Mapped for Arc<IndexMap<K, V>> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(TypeKind::Dictionary(dictionary_info::<K, V>(
            DictionaryStrategy::FrozenIndexMap,
            factory::frozen_index_map_factory::<K, V>,
        )))
        .with_default(|| Value::object(Arc::new(IndexMap::<K, V>::new())))
    }
}

impl<T: Mapped> Mapped for Grid<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>(TypeKind::MultiArray(MultiArrayInfo {
            rank: 2,
            element: Box::new(T::type_info()),
            factory: factory::grid_factory::<T>,
        }))
    }
}

#[doc(hidden)]
pub fn parse_failure(text: &str, type_name: &str, err: impl fmt::Display) -> anyhow::Error {
    anyhow::anyhow!("Failed to parse '{text}' as {type_name}: {err}")
}

/// Declares a record type and its members.
///
/// ```ignore
/// #[derive(Default)]
/// struct Person { name: String, age: Option<u32> }
/// mapped_record!(Person { name: String, age: Option<u32> });
/// ```
///
/// The single-argument form `mapped_record!(Person)` only makes the type
/// usable as a nested member; the caller then implements [`Record`] by hand.
#[macro_export]
macro_rules! mapped_record {
    ($ty:ident { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn describe(members: &mut $crate::Members<Self>) {
                $(
                    members.member::<$fty>(
                        stringify!($field),
                        |record: &mut $ty, value: $fty| record.$field = value,
                    );
                )*
            }
        }
        $crate::mapped_record!($ty);
    };
    ($ty:ty) => {
        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                value.into_object()
            }
        }

        impl $crate::Mapped for $ty {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::of::<$ty>($crate::TypeKind::Record(
                    $crate::RecordInfo::of::<$ty>(),
                ))
            }
        }
    };
}

/// Maps a fieldless enum by variant name or zero-based ordinal.
#[macro_export]
macro_rules! mapped_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::FromValue for $ty {
            #[allow(unused_assignments)]
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                match value {
                    $crate::Value::Enum(index) => {
                        let mut position = 0usize;
                        $(
                            if index == position {
                                return Ok($ty::$variant);
                            }
                            position += 1;
                        )+
                        Err($crate::MappingError::TypeMismatch {
                            expected: stringify!($ty),
                            found: "out-of-range enum ordinal",
                        })
                    }
                    other => Err($crate::MappingError::TypeMismatch {
                        expected: stringify!($ty),
                        found: other.kind_name(),
                    }),
                }
            }
        }

        impl $crate::IntoValue for $ty {
            fn into_value(self) -> $crate::Value {
                let name = match self {
                    $($ty::$variant => stringify!($variant)),+
                };
                let variants: &[&str] = &[$(stringify!($variant)),+];
                $crate::Value::Enum(variants.iter().position(|v| *v == name).unwrap_or_default())
            }
        }

        impl $crate::Mapped for $ty {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::of::<$ty>($crate::TypeKind::Enum($crate::EnumInfo {
                    variants: &[$(stringify!($variant)),+],
                }))
            }
        }
    };
}

/// Maps types through their `FromStr` implementation.
#[macro_export]
macro_rules! mapped_parsable {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                value.into_object()
            }
        }

        impl $crate::Mapped for $ty {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::of::<$ty>($crate::TypeKind::Parsable(|text: &str| {
                    text.trim()
                        .parse::<$ty>()
                        .map($crate::Value::object)
                        .map_err(|err| $crate::types::parse_failure(text, stringify!($ty), err))
                }))
            }
        }
    )+};
}

/// Maps an application collection type with element type `$elem`, built
/// either through `FromIterator` (`from_iter`) or `Default + Extend`
/// (`extend`).
#[macro_export]
macro_rules! mapped_collection {
    (from_iter $ty:ty : $elem:ty) => {
        $crate::mapped_collection!(@impl $ty, $elem, FromIterator, from_iter_factory);
    };
    (extend $ty:ty : $elem:ty) => {
        $crate::mapped_collection!(@impl $ty, $elem, DefaultExtend, extend_factory);
    };
    (@impl $ty:ty, $elem:ty, $strategy:ident, $factory:ident) => {
        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                value.into_object()
            }
        }

        impl $crate::Mapped for $ty {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::of::<$ty>($crate::types::collection_info::<$elem>(
                    $crate::factory::CollectionStrategy::$strategy,
                    $crate::factory::$factory::<$elem, $ty>,
                ))
            }
        }
    };
}

/// Maps an application type built from `($key, $value)` pairs.
#[macro_export]
macro_rules! mapped_pairs {
    (from_iter $ty:ty : $key:ty => $value:ty) => {
        $crate::mapped_pairs!(@impl $ty, $key, $value, FromIterator, from_iter_pairs_factory);
    };
    (extend $ty:ty : $key:ty => $value:ty) => {
        $crate::mapped_pairs!(@impl $ty, $key, $value, DefaultExtend, extend_pairs_factory);
    };
    (@impl $ty:ty, $key:ty, $value:ty, $strategy:ident, $factory:ident) => {
        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                value.into_object()
            }
        }

        impl $crate::Mapped for $ty {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::of::<$ty>($crate::TypeKind::PairSequence(
                    $crate::types::dictionary_info::<$key, $value>(
                        $crate::factory::DictionaryStrategy::$strategy,
                        $crate::factory::$factory::<$key, $value, $ty>,
                    ),
                ))
            }
        }
    };
}

/// Marks a type that cannot be built from cells; resolving a member of this
/// type fails with `UnsupportedType`.
#[macro_export]
macro_rules! mapped_abstract {
    ($ty:ty, $reason:expr) => {
        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                Err($crate::MappingError::TypeMismatch {
                    expected: stringify!($ty),
                    found: value.kind_name(),
                })
            }
        }

        impl $crate::Mapped for $ty {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::of::<$ty>($crate::TypeKind::Abstract { reason: $reason })
            }
        }
    };
}

mapped_parsable!(
    std::net::IpAddr,
    std::net::Ipv4Addr,
    std::net::Ipv6Addr,
    std::net::SocketAddr,
);
