use std::path::PathBuf;

use sqlbridge::catalog::{functions, Catalog, CatalogError, FunctionKind};
use sqlbridge::schema::{FieldSpec, FieldType, Schema, StructuralType};
use sqlbridge::Dialect;

fn fixtures(dir: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(dir)
}

#[test]
fn test_builtin_tables() {
    let catalog = Catalog::with_builtin_tables("default");
    assert_eq!(catalog.len(), 3);
    let namespaces: Vec<_> = catalog.namespaces().collect();
    assert_eq!(namespaces, vec!["default", "dwh", "rta"]);

    let table1 = catalog.resolve("table1").unwrap();
    assert_eq!(table1.qualified_name(), "default.table1");
    let names: Vec<_> = table1.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c", "arr", "ts"]);

    let updates = catalog.resolve("rta.agent_state_updates").unwrap();
    assert_eq!(
        updates.row_type.field("ts", true).map(|f| &f.ty),
        Some(&StructuralType::Int64)
    );
}

#[test]
fn test_load_dir_merges_into_namespace() {
    let mut catalog = Catalog::with_builtin_tables("default");
    let loaded = catalog.load_dir(fixtures("schemas")).unwrap();
    assert_eq!(loaded, 2);

    // dwh already held dim_agent; loading adds to it.
    assert!(catalog.contains_table("dwh.dim_agent"));
    assert!(catalog.contains_table("dwh.trips"));
    assert!(catalog.contains_table("dwh.drivers"));
    assert_eq!(catalog.len(), 5);
}

#[test]
fn test_load_dir_stops_at_malformed_document() {
    let mut catalog = Catalog::new("default");
    let err = catalog.load_dir(fixtures("broken")).unwrap_err();
    assert!(matches!(err, CatalogError::Schema(_)));
    assert!(catalog.is_empty());
}

#[test]
fn test_load_missing_dir() {
    let mut catalog = Catalog::new("default");
    let err = catalog.load_dir(fixtures("no_such_dir")).unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
}

#[test]
fn test_contains_table_needs_two_segments() {
    let catalog = Catalog::with_builtin_tables("default");
    assert!(catalog.contains_table("default.table1"));
    assert!(catalog.contains_table("DWH.Dim_Agent"));
    assert!(!catalog.contains_table("table1"));
    assert!(!catalog.contains_table("hive.dwh.dim_agent"));
    assert!(!catalog.contains_table("dwh.missing"));
}

#[test]
fn test_reregistering_replaces_row_type() {
    let mut catalog = Catalog::new("default");
    catalog.register("dwh", "t", StructuralType::Struct(vec![]));
    catalog.register(
        "dwh",
        "t",
        StructuralType::Struct(vec![sqlbridge::schema::StructField::new(
            "x",
            StructuralType::Int32,
        )]),
    );
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.resolve("dwh.t").unwrap().columns().len(), 1);
}

#[test]
fn test_register_logical_schema() {
    let schema = Schema::simple(
        0,
        vec![
            FieldSpec::new("ts", FieldType::Datetime)
                .dimension()
                .build()
                .unwrap(),
            FieldSpec::new("fare", FieldType::Double)
                .metric()
                .build()
                .unwrap(),
        ],
    )
    .unwrap();

    let mut catalog = Catalog::new("default");
    catalog.register_schema("rides", "fares", &schema).unwrap();
    let table = catalog.resolve("rides.fares").unwrap();
    assert_eq!(
        table.row_type.field("fare", true).map(|f| &f.ty),
        Some(&StructuralType::Double)
    );
}

#[test]
fn test_unknown_table() {
    let catalog = Catalog::with_builtin_tables("default");
    let err = catalog.resolve("dwh.nothing").unwrap_err();
    assert_eq!(err.to_string(), "Table not found: dwh.nothing");
}

#[test]
fn test_function_tables() {
    assert!(functions::is_available("date_parse", Dialect::Presto));
    assert!(!functions::is_available("date_parse", Dialect::Hive));
    assert!(functions::is_available("percentile_approx", Dialect::Hive));
    assert!(functions::is_available("LOWER", Dialect::Hive));

    let count = functions::lookup("count").unwrap();
    assert_eq!(count.kind, FunctionKind::Aggregate);
    assert!(count.accepts(0) && count.accepts(1));
    assert!(!count.accepts(2));

    assert_eq!(
        functions::equivalent("approx_percentile", Dialect::Hive),
        Some("percentile_approx")
    );
    assert!(functions::all(Dialect::Hive).all(|f| f.available_in(Dialect::Hive)));
}
