mod common;

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use proptest::prelude::*;
use row_mapper::mapper::{FnMapper, IntegerMapper, fold_mapper_results};
use row_mapper::transform::CellTransformer;
use row_mapper::types::IntegerKind;
use row_mapper::{
    AutomapOptions, CellConverter, CellResult, CellValue, FixedValueFallback, MapperResult,
    MappingError, MemoryRow, MemorySheet, Resolver, RowContext, Value,
};

const CTX: RowContext<'static> = RowContext {
    sheet: "Sheet1",
    row: 4,
    member: "amount",
};

fn text(value: &str) -> CellResult<'static> {
    CellResult::from_text(Some(2), Some(value.to_string()))
}

#[derive(Debug, Clone)]
enum Step {
    Stop(i64),
    Tentative(i64),
    Invalid,
    Ignore,
}

impl Step {
    fn result(&self) -> MapperResult {
        match self {
            Step::Stop(v) => MapperResult::UseAndStop(Value::Int(*v)),
            Step::Tentative(v) => MapperResult::UseIfNoOtherSucceeds(Value::Int(*v)),
            Step::Invalid => MapperResult::Invalid(anyhow!("rejected")),
            Step::Ignore => MapperResult::IgnoreAndContinue,
        }
    }
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        any::<i64>().prop_map(Step::Stop),
        any::<i64>().prop_map(Step::Tentative),
        Just(Step::Invalid),
        Just(Step::Ignore),
    ]
}

fn int_of(result: &MapperResult) -> Option<i64> {
    match result.value() {
        Some(Value::Int(v)) => Some(*v),
        _ => None,
    }
}

proptest! {
    #[test]
    fn first_definite_result_wins(steps in prop::collection::vec(step(), 0..12)) {
        let folded = fold_mapper_results(steps.iter().map(Step::result));
        let first_stop = steps.iter().find_map(|s| match s {
            Step::Stop(v) => Some(*v),
            _ => None,
        });
        let before_stop = steps
            .iter()
            .take_while(|s| !matches!(s, Step::Stop(_)))
            .collect::<Vec<_>>();
        let first_tentative = before_stop.iter().find_map(|s| match s {
            Step::Tentative(v) => Some(*v),
            _ => None,
        });

        match (first_stop, first_tentative) {
            (Some(v), _) => {
                prop_assert!(matches!(folded, MapperResult::UseAndStop(_)));
                prop_assert_eq!(int_of(&folded), Some(v));
            }
            (None, Some(v)) => {
                prop_assert!(matches!(folded, MapperResult::UseIfNoOtherSucceeds(_)));
                prop_assert_eq!(int_of(&folded), Some(v));
            }
            (None, None) if steps.iter().any(|s| matches!(s, Step::Invalid)) => {
                prop_assert!(folded.is_invalid());
            }
            (None, None) => {
                prop_assert!(matches!(folded, MapperResult::IgnoreAndContinue));
            }
        }
    }
}

fn counting_mapper(
    calls: Arc<AtomicUsize>,
) -> FnMapper<impl Fn(&CellResult<'_>, &MapperResult) -> MapperResult + Send + Sync> {
    FnMapper(move |_cell: &CellResult<'_>, _previous: &MapperResult| {
        calls.fetch_add(1, Ordering::SeqCst);
        MapperResult::UseAndStop(Value::Int(1))
    })
}

struct CountingTransformer(Arc<AtomicUsize>);

impl CellTransformer for CountingTransformer {
    fn transform<'a>(&self, value: Cow<'a, str>) -> Option<Cow<'a, str>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Some(value)
    }
}

#[test]
fn empty_cells_skip_transformers_and_mappers_when_a_fallback_exists() {
    common::init_logging();
    let mapped = Arc::new(AtomicUsize::new(0));
    let transformed = Arc::new(AtomicUsize::new(0));
    let converter = CellConverter::new()
        .with_transformer(CountingTransformer(Arc::clone(&transformed)))
        .with_mapper(counting_mapper(Arc::clone(&mapped)))
        .with_empty_fallback(FixedValueFallback(7i64));

    let value = converter.convert(&text(""), &CTX).unwrap();
    assert!(matches!(value, Value::Int(7)));
    assert_eq!(mapped.load(Ordering::SeqCst), 0);
    assert_eq!(transformed.load(Ordering::SeqCst), 0);

    let value = converter.convert(&text("9"), &CTX).unwrap();
    assert!(matches!(value, Value::Int(1)));
    assert_eq!(mapped.load(Ordering::SeqCst), 1);
    assert_eq!(transformed.load(Ordering::SeqCst), 1);
}

#[test]
fn later_mappers_do_not_run_after_a_definite_result() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let converter = CellConverter::new()
        .with_mapper(counting_mapper(Arc::clone(&first)))
        .with_mapper(counting_mapper(Arc::clone(&second)));
    converter.convert(&text("x"), &CTX).unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[test]
fn custom_mapper_can_rescue_what_the_parser_rejects() {
    let converter = CellConverter::new()
        .with_mapper(IntegerMapper::new(IntegerKind::I32, Default::default()))
        .with_mapper(FnMapper(|cell: &CellResult<'_>, previous: &MapperResult| {
            match cell.string_value() {
                Some("n/a") if previous.is_invalid() => {
                    MapperResult::UseAndStop(Value::Int(-1))
                }
                _ => MapperResult::IgnoreAndContinue,
            }
        }));

    assert!(matches!(converter.convert(&text("12"), &CTX).unwrap(), Value::Int(12)));
    assert!(matches!(converter.convert(&text("n/a"), &CTX).unwrap(), Value::Int(-1)));

    let err = converter.convert(&text("abc"), &CTX).unwrap_err();
    match err {
        MappingError::InvalidValue {
            sheet,
            row,
            column,
            member,
            value,
            ..
        } => {
            assert_eq!(sheet, "Sheet1");
            assert_eq!(row, 4);
            assert_eq!(column, Some(2));
            assert_eq!(member, "amount");
            assert_eq!(value.as_deref(), Some("abc"));
        }
        other => panic!("expected invalid value, got {other:?}"),
    }
}

#[test]
fn invalid_fallback_replaces_rejected_values() {
    let converter = CellConverter::new()
        .with_mapper(IntegerMapper::new(IntegerKind::U8, Default::default()))
        .with_invalid_fallback(FixedValueFallback(0u8));
    assert!(matches!(converter.convert(&text("300"), &CTX).unwrap(), Value::UInt(0)));
}

#[derive(Debug, Default)]
struct Tally {
    count: Option<i32>,
    shipped: Option<bool>,
    ratio: Option<rust_decimal::Decimal>,
    seen: Option<chrono::NaiveDate>,
}
row_mapper::mapped_record!(Tally {
    count: Option<i32>,
    shipped: Option<bool>,
    ratio: Option<rust_decimal::Decimal>,
    seen: Option<chrono::NaiveDate>,
});

#[test]
fn placeholders_apply_to_native_cells() {
    let stamp = chrono::NaiveDate::from_ymd_opt(2021, 3, 4)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap();
    let later = stamp + chrono::Duration::days(1);
    let mut sheet = MemorySheet::new("Tally").with_header(["Count", "Shipped", "Ratio", "Seen"]);
    sheet.push_memory_row(MemoryRow::new(
        0,
        [
            CellValue::Number(0.0),
            CellValue::Bool(false),
            CellValue::Number(0.0),
            CellValue::DateTime(stamp),
        ],
    ));
    sheet.push_memory_row(MemoryRow::new(
        1,
        [
            CellValue::Number(5.0),
            CellValue::Bool(true),
            CellValue::Number(0.25),
            CellValue::DateTime(later),
        ],
    ));
    let options = AutomapOptions {
        placeholders: vec![
            "0".to_string(),
            "FALSE".to_string(),
            "2021-03-04 00:00:00".to_string(),
        ],
        ..AutomapOptions::default()
    };
    let map = Resolver::new(options).build_class_map::<Tally>().unwrap();
    let bound = map.bind(&sheet).unwrap();

    let cleared = bound.map_row(&sheet.rows()[0]).unwrap();
    assert_eq!(cleared.count, None);
    assert_eq!(cleared.shipped, None);
    assert_eq!(cleared.ratio, None);
    assert_eq!(cleared.seen, None);

    let kept = bound.map_row(&sheet.rows()[1]).unwrap();
    assert_eq!(kept.count, Some(5));
    assert_eq!(kept.shipped, Some(true));
    assert_eq!(kept.ratio.map(|r| r.to_string()), Some("0.25".to_string()));
    assert_eq!(kept.seen, Some(later.date()));
}
