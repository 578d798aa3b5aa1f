//! Integration tests for typedframe.

use std::io::Write;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use serde_json::{Value, json};
use tempfile::NamedTempFile;

use typedframe::error::{CoercionReason, TypedFrameError};
use typedframe::frame::{Categorical, Cell, Column, DType, DataFrame};
use typedframe::input::CsvReader;
use typedframe::validate::IndexMismatch;
use typedframe::{
    ExpectedType, Schema, SchemaRegistry, TableBackend, TableType, TypedFrame, Validator,
    ValidatorConfig,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn validator() -> Validator<TableBackend> {
    init_logging();
    Validator::default()
}

fn point() -> Arc<TableType> {
    TableType::builder("Point")
        .required("x", ExpectedType::Float64)
        .required("y", ExpectedType::Float64)
        .build()
        .unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_a_conforming_frame() {
    let df = DataFrame::new(vec![
        ("x", Column::from(vec![0.5, 1.5])),
        ("y", Column::from(vec![2.0, 3.0])),
    ])
    .unwrap();
    let validated = validator().construct(&point(), df).unwrap();
    assert_eq!(validated.frame().width(), 2);
}

#[test]
fn test_scenario_b_missing_column() {
    let df = DataFrame::new(vec![("x", Column::from(vec![0.5]))]).unwrap();
    let err = validator().construct(&point(), df).unwrap_err();
    let mismatch = err.as_schema_mismatch().expect("schema mismatch");
    assert!(mismatch.contains("y", &ExpectedType::Float64));
    assert_eq!(mismatch.columns().collect::<Vec<_>>(), vec!["y"]);
    assert!(err.to_string().starts_with("Dataframe doesn't match schema"));
}

#[test]
fn test_scenario_c_optional_column() {
    let table = TableType::builder("Flagged")
        .required("x", ExpectedType::Int64)
        .optional("flag", ExpectedType::Boolean)
        .build()
        .unwrap();
    let df = DataFrame::new(vec![("x", Column::from(vec![1i64, 2]))]).unwrap();

    let constructed = validator().construct(&table, df.clone()).unwrap();
    assert!(!constructed.frame().contains("flag"));

    let converted = validator().convert(&table, &df, true).unwrap();
    let flag = converted.frame().column("flag").expect("flag added");
    assert_eq!(flag.dtype(), DType::Boolean);
    assert_eq!(flag.null_count(), 2);

    let without = validator().convert(&table, &df, false).unwrap();
    assert!(!without.frame().contains("flag"));
}

#[test]
fn test_scenario_d_unknown_categories() {
    let table = TableType::builder("Cat")
        .required("col", ExpectedType::categorical(["foo", "bar"]))
        .build()
        .unwrap();

    let df = DataFrame::new(vec![("col", Column::from(vec!["foo", "bar", "buzz"]))]).unwrap();
    let err = validator().convert(&table, &df, true).unwrap_err();
    match &err {
        TypedFrameError::Coercion {
            column,
            reason: CoercionReason::UnknownCategories(values),
        } => {
            assert_eq!(column, "col");
            assert_eq!(values, &vec!["buzz".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("buzz"));

    // Declared domain is wider even though "buzz" is never realized.
    let wide = Categorical::from_labels(&["foo", "bar"], &["foo", "bar", "buzz"]);
    let df = DataFrame::new(vec![("col", Column::from(wide))]).unwrap();
    let err = validator().construct(&table, df.clone()).unwrap_err();
    assert!(
        err.as_schema_mismatch()
            .unwrap()
            .contains("col", &ExpectedType::categorical(["foo", "bar"]))
    );

    // Conversion narrows the domain to exactly the declared labels.
    let narrowed = validator().convert(&table, &df, true).unwrap();
    assert_eq!(
        narrowed.frame().dtypes()["col"],
        DType::Categorical {
            categories: vec![json!("foo"), json!("bar")],
            ordered: true,
        }
    );
}

#[test]
fn test_scenario_e_index() {
    let table = TableType::builder("Indexed")
        .required("foo", ExpectedType::Boolean)
        .index("bar", ExpectedType::DateTime)
        .build()
        .unwrap();
    let df = DataFrame::new(vec![("foo", Column::from(vec![true, false]))]).unwrap();

    let err = validator().construct(&table, df.clone()).unwrap_err();
    let mismatch = err.as_schema_mismatch().unwrap();
    assert!(mismatch.differences.is_empty());
    assert!(mismatch.index.contains(&IndexMismatch::Name {
        expected: "bar".to_string(),
        actual: None,
    }));

    let converted = validator().convert(&table, &df, true).unwrap();
    let index = converted.frame().index();
    assert_eq!(index.name(), Some("bar"));
    assert_eq!(index.dtype(), DType::DateTime);
}

#[test]
fn test_index_from_text_and_type_mismatch() {
    let table = TableType::builder("Indexed")
        .required("foo", ExpectedType::Boolean)
        .index("bar", ExpectedType::DateTime)
        .build()
        .unwrap();
    let df = DataFrame::new(vec![("foo", Column::from(vec![true, false]))])
        .unwrap()
        .with_index(Some("bar"), Column::from(vec!["2021-06-03", "2021-05-31"]))
        .unwrap();

    let err = validator().construct(&table, df.clone()).unwrap_err();
    let mismatch = err.as_schema_mismatch().unwrap();
    assert_eq!(
        mismatch.index,
        vec![IndexMismatch::Type {
            expected: ExpectedType::DateTime,
            actual: "object".to_string(),
        }]
    );

    let converted = validator().convert(&table, &df, true).unwrap();
    let first = NaiveDate::from_ymd_opt(2021, 6, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(converted.frame().index().values().cell(0), Cell::DateTime(first));
}

// =============================================================================
// Inheritance
// =============================================================================

#[test]
fn test_single_inheritance() {
    let parent = TableType::builder("Parent")
        .required("foo", ExpectedType::Boolean)
        .build()
        .unwrap();
    let child = TableType::builder("Child")
        .parent(&parent)
        .required("bar", ExpectedType::Boolean)
        .build()
        .unwrap();

    let full = DataFrame::new(vec![
        ("foo", Column::from(vec![true])),
        ("bar", Column::from(vec![false])),
    ])
    .unwrap();
    assert!(validator().construct(&child, full).is_ok());

    let partial = DataFrame::new(vec![("bar", Column::from(vec![false]))]).unwrap();
    let err = validator().construct(&child, partial).unwrap_err();
    assert!(err.as_schema_mismatch().unwrap().contains("foo", &ExpectedType::Boolean));
}

#[test]
fn test_mixin_inheritance() {
    let audited = TableType::builder("Audited")
        .required("updated", ExpectedType::DateTimeUtc)
        .build()
        .unwrap();
    let keyed = TableType::builder("Keyed")
        .required("id", ExpectedType::Int64)
        .build()
        .unwrap();
    let users = TableType::builder("Users")
        .parent(&keyed)
        .parent(&audited)
        .required("name", ExpectedType::Utf8)
        .build()
        .unwrap();

    assert_eq!(users.chain_names(), vec!["Users", "Keyed", "Audited"]);

    let df = DataFrame::new(vec![
        ("id", Column::from(vec!["7"])),
        ("name", Column::from(vec!["ada"])),
        ("updated", Column::from(vec!["2021-05-31T12:00:00Z"])),
    ])
    .unwrap();
    let converted = validator().convert(&users, &df, true).unwrap();
    assert_eq!(
        converted.frame().column("updated").unwrap().cell(0),
        Cell::DateTimeUtc(Utc.with_ymd_and_hms(2021, 5, 31, 12, 0, 0).unwrap())
    );
}

/// Root/Left/Right/Down, where Right redeclares Root's column.
fn diamond() -> Arc<TableType> {
    let root = TableType::builder("Root")
        .required("root", ExpectedType::Boolean)
        .build()
        .unwrap();
    let left = TableType::builder("Left")
        .parent(&root)
        .required("left", ExpectedType::Boolean)
        .build()
        .unwrap();
    let right = TableType::builder("Right")
        .parent(&root)
        .required("root", ExpectedType::Object)
        .required("right", ExpectedType::Boolean)
        .build()
        .unwrap();
    TableType::builder("Down")
        .parent(&left)
        .parent(&right)
        .build()
        .unwrap()
}

#[test]
fn test_diamond_first_parent_wins() {
    let down = diamond();
    assert_eq!(down.chain_names(), vec!["Down", "Left", "Right", "Root"]);
    assert_eq!(down.resolve(false)["root"], ExpectedType::Boolean);

    let df = DataFrame::new(vec![
        ("root", Column::from(vec![true])),
        ("left", Column::from(vec![true])),
        ("right", Column::from(vec![true])),
    ])
    .unwrap();
    assert!(validator().construct(&down, df).is_ok());
}

#[test]
fn test_diamond_missing_column() {
    let df = DataFrame::new(vec![
        ("root", Column::from(vec![true])),
        ("left", Column::from(vec![true])),
    ])
    .unwrap();
    let err = validator().construct(&diamond(), df).unwrap_err();
    let mismatch = err.as_schema_mismatch().unwrap();
    assert!(mismatch.contains("right", &ExpectedType::Boolean));
    assert_eq!(mismatch.differences.len(), 1);
}

#[test]
fn test_diamond_rejects_text_in_bool_column() {
    let df = DataFrame::new(vec![
        ("root", Column::from(vec![true])),
        ("left", Column::from(vec![true])),
        ("right", Column::from(vec!["string"])),
    ])
    .unwrap();
    let err = validator().construct(&diamond(), df).unwrap_err();
    let mismatch = err.as_schema_mismatch().unwrap();
    assert!(mismatch.contains("right", &ExpectedType::Boolean));
    assert!(!mismatch.contains("root", &ExpectedType::Object));
    assert!(err.to_string().contains("Expected: {left: bool, root: bool, right: bool}"));
}

// =============================================================================
// Column kinds
// =============================================================================

#[test]
fn test_present_optional_column_must_match() {
    let table = TableType::builder("Flagged")
        .optional("flag", ExpectedType::Boolean)
        .build()
        .unwrap();
    let df = DataFrame::new(vec![("flag", Column::from(vec![1i64]))]).unwrap();
    let err = validator().construct(&table, df.clone()).unwrap_err();
    assert!(err.as_schema_mismatch().unwrap().contains("flag", &ExpectedType::Boolean));

    let converted = validator().convert(&table, &df, true).unwrap();
    assert_eq!(converted.frame().column("flag"), Some(&Column::from(vec![true])));
}

#[test]
fn test_naive_and_utc_datetimes_differ() {
    let table = TableType::builder("Events")
        .required("at", ExpectedType::DateTimeUtc)
        .build()
        .unwrap();
    let naive = NaiveDate::from_ymd_opt(2021, 5, 31)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    let df = DataFrame::new(vec![("at", Column::from(vec![naive]))]).unwrap();

    let err = validator().construct(&table, df.clone()).unwrap_err();
    assert!(err.as_schema_mismatch().unwrap().contains("at", &ExpectedType::DateTimeUtc));

    let converted = validator().convert(&table, &df, true).unwrap();
    assert_eq!(
        converted.frame().column("at").unwrap().cell(0),
        Cell::DateTimeUtc(Utc.from_utc_datetime(&naive))
    );

    let naive_table = TableType::builder("NaiveEvents")
        .required("at", ExpectedType::DateTime)
        .build()
        .unwrap();
    let err = validator()
        .construct(&naive_table, converted.into_frame())
        .unwrap_err();
    assert!(err.as_schema_mismatch().is_some());
}

#[test]
fn test_list_and_map_columns() {
    let table = TableType::builder("Nested")
        .required("tags", ExpectedType::List)
        .required("attrs", ExpectedType::Map)
        .build()
        .unwrap();
    let df = DataFrame::new(vec![
        ("tags", Column::from(vec![json!(["this"]), Value::Null])),
        ("attrs", Column::from(vec![json!({"this": "that"}), json!({})])),
    ])
    .unwrap();
    assert!(validator().construct(&table, df.clone()).is_ok());
    assert!(validator().convert(&table, &df, true).is_ok());

    let bad = DataFrame::new(vec![
        ("tags", Column::from(vec![json!("not a list"), Value::Null])),
        ("attrs", Column::from(vec![json!({}), json!({})])),
    ])
    .unwrap();
    let err = validator().convert(&table, &bad, true).unwrap_err();
    assert!(matches!(
        err,
        TypedFrameError::Coercion {
            reason: CoercionReason::Unrepresentable { .. },
            ..
        }
    ));
}

#[test]
fn test_unrepresentable_value_names_column() {
    let df = DataFrame::new(vec![
        ("x", Column::from(vec!["1.0", "oops"])),
        ("y", Column::from(vec!["1.0", "2.0"])),
    ])
    .unwrap();
    let err = validator().convert(&point(), &df, true).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to convert column 'x': value 'oops' is not representable as float64"
    );
}

// =============================================================================
// Entry points
// =============================================================================

#[test]
fn test_foreign_value_is_rejected() {
    let err = validator()
        .construct_any(&point(), "not a frame".to_string())
        .unwrap_err();
    assert!(matches!(err, TypedFrameError::BackendType { backend: "table", .. }));
    assert!(err.to_string().contains("is not an instance of table frame"));

    let df = DataFrame::new(vec![
        ("x", Column::from(vec![0.5])),
        ("y", Column::from(vec![0.5])),
    ])
    .unwrap();
    assert!(validator().construct_any(&point(), df).is_ok());
}

#[test]
fn test_fill_missing_optional_skips_categoricals() {
    let table = TableType::builder("Optional")
        .optional("kind", ExpectedType::categorical(["a", "b"]))
        .optional("note", ExpectedType::Utf8)
        .build()
        .unwrap();
    let validator = Validator::with_config(
        TableBackend,
        ValidatorConfig {
            fill_missing_optional: true,
            ..ValidatorConfig::default()
        },
    );
    let df = DataFrame::new(vec![("other", Column::from(vec![1i64]))]).unwrap();
    let validated = validator.construct(&table, df).unwrap();
    assert!(validated.frame().contains("note"));
    assert!(!validated.frame().contains("kind"));
}

struct Points;

static POINTS: Lazy<Arc<TableType>> = Lazy::new(point);

impl Schema for Points {
    fn table_type() -> Arc<TableType> {
        Arc::clone(&POINTS)
    }
}

fn spread(points: &TypedFrame<Points>) -> usize {
    points.frame().height()
}

#[test]
fn test_typed_frame_marker() {
    let df = DataFrame::new(vec![
        ("x", Column::from(vec!["1", "2", "3"])),
        ("y", Column::from(vec!["4", "5", "6"])),
    ])
    .unwrap();
    assert!(TypedFrame::<Points>::new(df.clone()).is_err());
    let points = TypedFrame::<Points>::convert(&df).unwrap();
    assert_eq!(spread(&points), 3);
    assert!(Arc::ptr_eq(points.validated().table(), &POINTS));
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_csv_pipeline() {
    let content = "id,price,status,placed\n\
                   1,9.5,open,2021-06-03\n\
                   2,NA,closed,2021-05-31 12:00:00\n";
    let file = create_test_file(content);

    let orders = TableType::builder("Orders")
        .required("id", ExpectedType::Int64)
        .required("price", ExpectedType::Float64)
        .required("status", ExpectedType::categorical(["open", "closed"]))
        .optional("placed", ExpectedType::DateTime)
        .build()
        .unwrap();

    let df = CsvReader::new().read_file(file.path()).unwrap();
    assert!(validator().construct(&orders, df.clone()).is_err());

    let typed = validator().convert(&orders, &df, true).unwrap();
    let frame = typed.frame();
    assert_eq!(frame.column("id"), Some(&Column::from(vec![1i64, 2])));
    assert_eq!(frame.column("price"), Some(&Column::from(vec![Some(9.5), None])));
    let noon = NaiveDate::from_ymd_opt(2021, 5, 31)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    assert_eq!(frame.column("placed").unwrap().cell(1), Cell::DateTime(noon));
}

#[test]
fn test_csv_missing_file() {
    let err = CsvReader::new().read_file("/nonexistent/orders.csv").unwrap_err();
    assert!(matches!(err, TypedFrameError::Io { .. }));
}

#[test]
fn test_registry_from_file() {
    let json = r#"[
        {"name": "Down", "required": {"down": "boolean"}, "parents": ["Left", "Right"]},
        {"name": "Left", "required": {"left": "utf8"}, "parents": ["Root"]},
        {"name": "Right", "required": {"root": "object"}, "parents": ["Root"]},
        {"name": "Root", "required": {"root": "int64"},
         "optional": {"kind": {"categorical": ["a", "b"]}},
         "index": {"name": "id", "dtype": "uint32"}}
    ]"#;
    let file = create_test_file(json);
    let registry = SchemaRegistry::from_file(file.path()).unwrap();
    assert_eq!(registry.len(), 4);

    let down = registry.get("Down").unwrap();
    assert_eq!(down.chain_names(), vec!["Down", "Left", "Right", "Root"]);
    let schema = down.effective_schema();
    // Left inherits Root's declaration and is listed before Right.
    assert_eq!(schema.required["root"], ExpectedType::Int64);
    assert_eq!(schema.full["kind"], ExpectedType::categorical(["a", "b"]));
    assert_eq!(down.resolve_index().unwrap().dtype, ExpectedType::UInt32);
}
