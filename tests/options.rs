mod common;

use chrono::NaiveDate;
use common::{TestWorkspace, init_logging, sheet};
use row_mapper::{
    AutomapOptions, FallbackStrategy, NameMatching, NestedNaming, Resolver, mapped_record,
};

#[derive(Debug, Default)]
struct Shipment {
    shipped: NaiveDate,
    signed: bool,
    weight: f64,
    note: Option<String>,
    count: u32,
}
mapped_record!(Shipment {
    shipped: NaiveDate,
    signed: bool,
    weight: f64,
    note: Option<String>,
    count: u32,
});

const OPTIONS_YAML: &str = r#"
fallback_strategy: set_to_default
date_formats: ["%d/%m/%Y"]
true_tokens: ["ja"]
false_tokens: ["nein"]
placeholders: ["unknown"]
number:
  decimal_separator: ","
  thousands_separator: "."
"#;

#[test]
fn options_loaded_from_yaml_drive_the_resolver() {
    init_logging();
    let workspace = TestWorkspace::new();
    let path = workspace.write("automap.yaml", OPTIONS_YAML);
    let options = AutomapOptions::load(&path).unwrap();
    assert_eq!(options.fallback_strategy, FallbackStrategy::SetToDefault);
    assert_eq!(options.name_matching, NameMatching::Normalized);

    let sheet = sheet(
        "Shipments",
        &["Shipped", "Signed", "Weight", "Note", "Count"],
        &[
            &["24/12/2023", "ja", "1.234,5", "unknown", ""],
            &["01/02/2024", "nein", "2,25", "fragile", "3"],
        ],
    );
    let map = Resolver::new(options).build_class_map::<Shipment>().unwrap();
    let bound = map.bind(&sheet).unwrap();

    let first = bound.map_row(&sheet.rows()[0]).unwrap();
    assert_eq!(first.shipped, NaiveDate::from_ymd_opt(2023, 12, 24).unwrap());
    assert!(first.signed);
    assert!((first.weight - 1234.5).abs() < f64::EPSILON);
    assert_eq!(first.note, None);
    assert_eq!(first.count, 0);

    let second = bound.map_row(&sheet.rows()[1]).unwrap();
    assert!(!second.signed);
    assert_eq!(second.note.as_deref(), Some("fragile"));
    assert_eq!(second.count, 3);
}

#[test]
fn saved_options_load_back_unchanged() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("saved.yaml");
    let options = AutomapOptions::default()
        .with_nested_naming(NestedNaming::Prefixed {
            separator: "_".to_string(),
        })
        .with_name_matching(NameMatching::CaseInsensitive);
    options.save(&path).unwrap();
    assert_eq!(AutomapOptions::load(&path).unwrap(), options);
}

#[test]
fn missing_options_file_names_the_path() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("absent.yaml");
    let err = AutomapOptions::load(&path).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Opening YAML file"));
    assert!(message.contains("absent.yaml"));
}

#[test]
fn malformed_options_report_the_parse_step() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("bad.yaml", "separators: 12\n");
    let err = AutomapOptions::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Parsing automap options"));
}
