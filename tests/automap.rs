mod common;

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use common::{fixture_sheet, init_logging, sheet};
use row_mapper::{
    AutomapOptions, FallbackStrategy, FixedValueFallback, Grid, MappingError, NestedNaming,
    Resolver, build_class_map, mapped_abstract, mapped_enum, mapped_parsable, mapped_record,
    reader::{ColumnMatcher, ColumnNamesReaderFactory, MatchingColumnsReaderFactory, NameMatching},
};

#[derive(Debug, Default)]
struct Reading {
    value: i32,
}
mapped_record!(Reading { value: i32 });

#[derive(Debug, Default)]
struct OptionalReading {
    value: Option<i32>,
}
mapped_record!(OptionalReading { value: Option<i32> });

#[test]
fn integer_member_reads_its_column() {
    init_logging();
    let sheet = sheet("Readings", &["Value"], &[&["42"]]);
    let map = build_class_map::<Reading>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    let reading = map.map_row(&sheet, &sheet.rows()[0]).unwrap();
    assert_eq!(reading.value, 42);
}

#[test]
fn empty_primitive_cell_fails_the_row_by_default() {
    init_logging();
    let sheet = sheet("Readings", &["Value"], &[&["7"], &[""]]);
    let map = build_class_map::<Reading>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    let bound = map.bind(&sheet).unwrap();
    let results: Vec<_> = bound.map_rows(sheet.rows()).collect();
    assert_eq!(results[0].as_ref().unwrap().value, 7);
    match &results[1] {
        Err(MappingError::EmptyValue {
            sheet,
            row,
            column,
            member,
        }) => {
            assert_eq!(sheet, "Readings");
            assert_eq!(*row, 1);
            assert_eq!(*column, Some(0));
            assert_eq!(member, "value");
        }
        other => panic!("expected an empty value error, got {other:?}"),
    }
}

#[test]
fn set_to_default_strategy_fills_empty_primitives() {
    let sheet = sheet("Readings", &["Value"], &[&[""]]);
    let map = build_class_map::<Reading>(FallbackStrategy::SetToDefault).unwrap();
    assert_eq!(map.map_row(&sheet, &sheet.rows()[0]).unwrap().value, 0);
}

#[test]
fn nullable_member_maps_empty_to_none() {
    let sheet = sheet("Readings", &["Value"], &[&[""], &["-3"]]);
    let map = build_class_map::<OptionalReading>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    let bound = map.bind(&sheet).unwrap();
    assert_eq!(bound.map_row(&sheet.rows()[0]).unwrap().value, None);
    assert_eq!(bound.map_row(&sheet.rows()[1]).unwrap().value, Some(-3));
}

#[test]
fn nullable_member_is_skipped_when_its_column_is_missing() {
    let sheet = sheet("Readings", &["Other"], &[&["1"]]);
    let map = build_class_map::<OptionalReading>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    let bound = map.bind(&sheet).unwrap();
    assert_eq!(bound.skipped_members(), &["value"]);
    assert_eq!(bound.map_row(&sheet.rows()[0]).unwrap().value, None);
}

#[test]
fn required_member_without_column_fails_at_bind_time() {
    let sheet = sheet("Readings", &["Other"], &[&["1"]]);
    let map = build_class_map::<Reading>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    let err = map.bind(&sheet).err().expect("bind should fail");
    assert!(matches!(
        err,
        MappingError::ColumnNotFound { ref member, .. } if member == "value"
    ));
}

#[test]
fn name_lookup_without_header_fails_to_bind() {
    let sheet = row_mapper::MemorySheet::new("Raw").with_row(["1"]);
    let map = build_class_map::<Reading>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    assert!(matches!(
        map.bind(&sheet).err(),
        Some(MappingError::MissingHeader { .. })
    ));
}

#[derive(Debug, Default)]
struct Tagged {
    tags: Vec<String>,
    codes: Box<[String]>,
    ids: Option<BTreeSet<u32>>,
}
mapped_record!(Tagged {
    tags: Vec<String>,
    codes: Box<[String]>,
    ids: Option<BTreeSet<u32>>,
});

#[test]
fn delimited_cells_become_collections() {
    let sheet = sheet(
        "Tags",
        &["Tags", "Codes", "Ids"],
        &[&["a,b,c", "x, y", "3,1,2"], &["", "z", ""]],
    );
    let map = build_class_map::<Tagged>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    let bound = map.bind(&sheet).unwrap();

    let first = bound.map_row(&sheet.rows()[0]).unwrap();
    assert_eq!(first.tags, vec!["a", "b", "c"]);
    assert_eq!(&*first.codes, &["x".to_string(), "y".to_string()]);
    assert_eq!(
        first.ids.unwrap().into_iter().collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let second = bound.map_row(&sheet.rows()[1]).unwrap();
    assert!(second.tags.is_empty());
    assert_eq!(second.ids, None);
}

#[test]
fn collections_can_read_one_element_per_column() {
    let sheet = sheet("Tags", &["T1", "T2", "Codes"], &[&["red", "blue", "q"]]);
    let mut map = build_class_map::<Tagged>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    map.member_mut("tags")
        .unwrap()
        .collection_mut()
        .unwrap()
        .set_reader(ColumnNamesReaderFactory::new(["T1", "T2"], NameMatching::Exact));
    let tagged = map.map_row(&sheet, &sheet.rows()[0]).unwrap();
    assert_eq!(tagged.tags, vec!["red", "blue"]);
    assert_eq!(tagged.ids, None);
}

#[test]
fn bad_collection_element_names_its_position() {
    let sheet = sheet("Tags", &["Tags", "Codes", "Ids"], &[&["a", "b", "1,x"]]);
    let map = build_class_map::<Tagged>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    let err = map.map_row(&sheet, &sheet.rows()[0]).unwrap_err();
    assert_eq!(err.member(), Some("ids[1]"));
}

#[derive(Debug, Default)]
struct Scores {
    name: String,
    scores: HashMap<String, i32>,
}
mapped_record!(Scores {
    name: String,
    scores: HashMap<String, i32>,
});

fn score_map() -> row_mapper::ClassMap<Scores> {
    let mut map = build_class_map::<Scores>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    map.member_mut("scores")
        .unwrap()
        .dictionary_mut()
        .unwrap()
        .set_reader(MatchingColumnsReaderFactory::new(
            ColumnMatcher::regex("^score_").unwrap(),
        ));
    map
}

#[test]
fn dictionary_entries_are_keyed_by_header() {
    let sheet = sheet(
        "Scores",
        &["name", "score_math", "score_art"],
        &[&["Ada", "90", "85"]],
    );
    let scores = score_map().map_row(&sheet, &sheet.rows()[0]).unwrap();
    assert_eq!(scores.name, "Ada");
    assert_eq!(scores.scores.len(), 2);
    assert_eq!(scores.scores["score_math"], 90);
    assert_eq!(scores.scores["score_art"], 85);
}

#[test]
fn unparsable_dictionary_value_fails_unless_recovered() {
    let sheet = sheet(
        "Scores",
        &["name", "score_math", "score_art"],
        &[&["Bob", "x", "70"]],
    );
    let err = score_map().map_row(&sheet, &sheet.rows()[0]).unwrap_err();
    match err {
        MappingError::InvalidValue { member, value, .. } => {
            assert_eq!(member, "scores[score_math]");
            assert_eq!(value.as_deref(), Some("x"));
        }
        other => panic!("expected invalid value, got {other:?}"),
    }

    let mut map = score_map();
    map.member_mut("scores")
        .unwrap()
        .dictionary_mut()
        .unwrap()
        .value_mut()
        .set_invalid_fallback(FixedValueFallback(-1i32));
    let scores = map.map_row(&sheet, &sheet.rows()[0]).unwrap();
    assert_eq!(scores.scores["score_math"], -1);
    assert_eq!(scores.scores["score_art"], 70);
}

#[derive(Debug, Default)]
struct Address {
    city: String,
    zip: Option<String>,
}
mapped_record!(Address {
    city: String,
    zip: Option<String>,
});

#[derive(Debug, Default)]
struct Person {
    name: String,
    address: Address,
}
mapped_record!(Person {
    name: String,
    address: Address,
});

#[test]
fn nested_records_read_flat_columns_by_default() {
    let sheet = sheet("People", &["Name", "City"], &[&["Ada", "London"]]);
    let map = Resolver::default().build_class_map::<Person>().unwrap();
    assert!(map.member("address").unwrap().nested_map::<Address>().is_some());
    let person = map.map_row(&sheet, &sheet.rows()[0]).unwrap();
    assert_eq!(person.name, "Ada");
    assert_eq!(person.address.city, "London");
    assert_eq!(person.address.zip, None);
}

#[test]
fn nested_records_can_use_prefixed_columns() {
    let sheet = sheet(
        "People",
        &["Name", "Address.City", "Address.Zip", "City"],
        &[&["Ada", "London", "N1", "wrong"]],
    );
    let options = AutomapOptions::default().with_nested_naming(NestedNaming::Prefixed {
        separator: ".".to_string(),
    });
    let map = Resolver::new(options).build_class_map::<Person>().unwrap();
    let person = map.map_row(&sheet, &sheet.rows()[0]).unwrap();
    assert_eq!(person.address.city, "London");
    assert_eq!(person.address.zip.as_deref(), Some("N1"));
}

#[test]
fn nested_errors_carry_the_member_path() {
    let sheet = sheet("People", &["Name"], &[&["Ada"]]);
    let map = Resolver::default().build_class_map::<Person>().unwrap();
    let err = map.bind(&sheet).err().expect("bind should fail");
    assert_eq!(err.member(), Some("address.city"));
}

#[test]
fn nested_maps_can_be_replaced() {
    let sheet = sheet("People", &["Name", "Town"], &[&["Ada", "London"]]);
    let mut resolver = Resolver::default();
    let mut address = resolver.build_class_map::<Address>().unwrap();
    address
        .member_mut("city")
        .unwrap()
        .value_mut()
        .unwrap()
        .set_reader(row_mapper::reader::ColumnNameReaderFactory::new("Town"));
    let mut map = resolver.build_class_map::<Person>().unwrap();
    map.member_mut("address")
        .unwrap()
        .set_nested_map(address)
        .unwrap();
    assert!(map.member_mut("name").unwrap().set_nested_map(Address::default_map()).is_err());
    let person = map.map_row(&sheet, &sheet.rows()[0]).unwrap();
    assert_eq!(person.address.city, "London");
}

impl Address {
    fn default_map() -> row_mapper::ClassMap<Address> {
        Resolver::default().build_class_map::<Address>().unwrap()
    }
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    parent: Option<Box<Node>>,
}
mapped_record!(Node {
    name: String,
    parent: Option<Box<Node>>,
});

#[test]
fn self_referencing_records_are_rejected() {
    let err = Resolver::default().build_class_map::<Node>().unwrap_err();
    assert!(matches!(
        err,
        MappingError::RecursiveRecord { ref member, .. } if member == "parent"
    ));
}

#[derive(Debug, Default)]
struct Handle;
mapped_abstract!(Handle, "handles are opened at runtime");

#[derive(Debug, Default)]
struct Holder {
    handle: Handle,
}
mapped_record!(Holder { handle: Handle });

#[derive(Debug, Default)]
struct Households {
    addresses: Vec<Address>,
}
mapped_record!(Households {
    addresses: Vec<Address>,
});

#[test]
fn unsupported_shapes_fail_before_any_row() {
    let err = Resolver::default().build_class_map::<Holder>().unwrap_err();
    assert!(matches!(
        err,
        MappingError::UnsupportedType { ref reason, .. } if reason.contains("opened at runtime")
    ));
    assert!(matches!(
        Resolver::default().build_class_map::<Households>(),
        Err(MappingError::UnsupportedType { .. })
    ));
}

#[derive(Debug, Default, PartialEq)]
enum Level {
    #[default]
    Low,
    High,
}
mapped_enum!(Level { Low, High });

#[derive(Debug, PartialEq)]
struct Sku(String);

impl FromStr for Sku {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("SKU-") {
            Some(rest) if !rest.is_empty() => Ok(Sku(rest.to_string())),
            _ => Err("missing SKU- prefix".to_string()),
        }
    }
}
mapped_parsable!(Sku);

#[derive(Debug, Default)]
struct Item {
    level: Level,
    sku: Option<Sku>,
    active: bool,
    price: rust_decimal::Decimal,
    grid: Option<Grid<u8>>,
}
mapped_record!(Item {
    level: Level,
    sku: Option<Sku>,
    active: bool,
    price: rust_decimal::Decimal,
    grid: Option<Grid<u8>>,
});

#[test]
fn enums_parsables_and_scalars() {
    let sheet = sheet(
        "Items",
        &["Level", "Sku", "Active", "Price", "Grid 0", "Grid 1"],
        &[
            &["HIGH", "SKU-42", "yes", "9.50", "1,2", "3,4"],
            &["0", "", "no", "1", "5,6", "7,8"],
        ],
    );
    let map = build_class_map::<Item>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    let bound = map.bind(&sheet).unwrap();

    let first = bound.map_row(&sheet.rows()[0]).unwrap();
    assert_eq!(first.level, Level::High);
    assert_eq!(first.sku, Some(Sku("42".to_string())));
    assert!(first.active);
    assert_eq!(first.price.to_string(), "9.50");
    let grid = first.grid.unwrap();
    assert_eq!(grid.dimensions(), [2, 2]);
    assert_eq!(grid.row(1), Some(&[3u8, 4][..]));

    let second = bound.map_row(&sheet.rows()[1]).unwrap();
    assert_eq!(second.level, Level::Low);
    assert_eq!(second.sku, None);
    assert!(!second.active);
}

#[test]
fn ragged_grid_is_a_row_error() {
    let sheet = sheet(
        "Items",
        &["Level", "Sku", "Active", "Price", "Grid 0", "Grid 1"],
        &[&["low", "", "no", "1", "1,2", "3"]],
    );
    let map = build_class_map::<Item>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    assert!(matches!(
        map.map_row(&sheet, &sheet.rows()[0]),
        Err(MappingError::Factory { ref member, .. }) if member == "grid"
    ));
}

#[test]
fn parse_failures_surface_the_parser_message() {
    let sheet = sheet(
        "Items",
        &["Level", "Sku", "Active", "Price"],
        &[&["low", "42", "no", "1"]],
    );
    let map = build_class_map::<Item>(FallbackStrategy::ThrowIfPrimitive).unwrap();
    let err = map.map_row(&sheet, &sheet.rows()[0]).unwrap_err();
    let MappingError::InvalidValue { member, source, .. } = err else {
        panic!("expected invalid value");
    };
    assert_eq!(member, "sku");
    assert!(source.to_string().contains("missing SKU- prefix"));
}

#[derive(Debug, Default)]
struct Contact {
    name: String,
    age: Option<u8>,
    email: String,
    tags: Vec<String>,
    address: Address,
}
mapped_record!(Contact {
    name: String,
    age: Option<u8>,
    email: String,
    tags: Vec<String>,
    address: Address,
});

#[test]
fn csv_fixture_maps_every_row() {
    init_logging();
    let sheet = fixture_sheet("people.csv");
    let map = Resolver::default().build_class_map::<Contact>().unwrap();
    let bound = map.bind(&sheet).unwrap();
    let contacts = bound
        .map_rows(sheet.rows())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(contacts.len(), 3);
    assert_eq!(contacts[0].tags, vec!["math", "poetry"]);
    assert_eq!(contacts[1].age, None);
    assert!(contacts[1].tags.is_empty());
    assert_eq!(contacts[2].email, "");
    assert_eq!(contacts[2].address.zip.as_deref(), Some("22201"));
}

#[derive(Debug, Default)]
struct PostalAddress {
    city: String,
    zip: i32,
}
mapped_record!(PostalAddress { city: String, zip: i32 });

#[derive(Debug, Default)]
struct Resident {
    name: String,
    address: Option<PostalAddress>,
}
mapped_record!(Resident {
    name: String,
    address: Option<PostalAddress>,
});

#[test]
fn optional_nested_record_is_none_when_its_cells_are_empty() {
    let sheet = sheet(
        "Residents",
        &["Name", "City", "Zip"],
        &[&["Ada", "", ""], &["Bob", "Paris", "75"], &["Cy", "Rome", ""]],
    );
    let map = Resolver::default().build_class_map::<Resident>().unwrap();
    let bound = map.bind(&sheet).unwrap();

    let ada = bound.map_row(&sheet.rows()[0]).unwrap();
    assert_eq!(ada.name, "Ada");
    assert!(ada.address.is_none());

    let bob = bound.map_row(&sheet.rows()[1]).unwrap();
    let address = bob.address.unwrap();
    assert_eq!(address.city, "Paris");
    assert_eq!(address.zip, 75);

    let err = bound.map_row(&sheet.rows()[2]).unwrap_err();
    assert!(matches!(
        err,
        MappingError::EmptyValue { ref member, column: Some(2), .. } if member == "address.zip"
    ));
}

#[derive(Debug, Default)]
struct Counts {
    counts: HashMap<String, i32>,
}
mapped_record!(Counts {
    counts: HashMap<String, i32>,
});

#[test]
fn dictionary_keys_ignore_value_placeholders() {
    let sheet = sheet("Counts", &["NA", " B "], &[&["1", " 2 "]]);
    let options = AutomapOptions {
        empty_placeholders: true,
        trim_values: true,
        ..AutomapOptions::default()
    };
    let map = Resolver::new(options).build_class_map::<Counts>().unwrap();
    let counts = map.map_row(&sheet, &sheet.rows()[0]).unwrap().counts;
    assert_eq!(counts.len(), 2);
    assert_eq!(counts["NA"], 1);
    assert_eq!(counts[" B "], 2);
}
