//! Type-driven mapping of spreadsheet and CSV rows into strongly typed
//! records.
//!
//! A [`Resolver`] inspects a [`Record`]'s members and builds a [`ClassMap`]:
//! one pipeline per member that locates cells, preprocesses their text, runs
//! a chain of mappers and falls back on empty or invalid input. Binding the
//! class map to a sheet resolves column names once; every row is then mapped
//! independently.
//!
//! ```ignore
//! use row_mapper::{MemorySheet, Resolver, mapped_record};
//!
//! #[derive(Default)]
//! struct Person { name: String, age: Option<u32> }
//! mapped_record!(Person { name: String, age: Option<u32> });
//!
//! let sheet = MemorySheet::new("People")
//!     .with_header(["Name", "Age"])
//!     .with_row(["Ada", "36"]);
//! let map = Resolver::default().build_class_map::<Person>()?;
//! let bound = map.bind(&sheet)?;
//! let people: Vec<Person> = bound.map_rows(sheet.rows()).collect::<Result<_, _>>()?;
//! ```

pub mod cell;
pub mod class_map;
pub mod error;
pub mod factory;
pub mod fallback;
pub mod format;
pub mod mapper;
pub mod options;
pub mod parse;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod resolver;
pub mod sheet;
pub mod transform;
pub mod types;
pub mod value;

pub use cell::CellResult;
pub use class_map::{BoundClassMap, BoundRecordMap, ClassMap, MemberMap, RecordMap};
pub use error::{FactoryError, MappingError, Result};
pub use factory::Grid;
pub use fallback::{
    ComputedFallback, DefaultValueFallback, Fallback, FallbackContext, FixedValueFallback,
    NullFallback, ThrowFallback,
};
pub use mapper::{CellMapper, MapperResult};
pub use options::{AutomapOptions, FallbackStrategy, NestedNaming};
pub use pipeline::{CellConverter, MemberPipeline, RowContext};
pub use reader::NameMatching;
pub use record::{Members, Record, describe_members};
pub use resolver::{Resolver, build_class_map};
pub use sheet::{CellValue, HeaderTable, MemoryRow, MemorySheet, RowSource, SheetSource};
pub use types::{EnumInfo, Mapped, RecordInfo, TypeInfo, TypeKind};
pub use value::{FromValue, IntoValue, Value};
