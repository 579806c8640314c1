use std::path::PathBuf;

use sqlbridge::schema::{DataTypeDocument, SchemaDocument, SchemaError, StructuralType};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_load_document_from_file() {
    let doc = SchemaDocument::from_file(fixture("schemas/dwh_trips.json")).unwrap();
    assert_eq!(doc.qualified_name(), "dwh.trips");
    assert_eq!(doc.storage_type.as_deref(), Some("hive"));
    assert_eq!(doc.columns.len(), 9);
    assert!(matches!(
        doc.columns[7].nested_data_types,
        DataTypeDocument::Map { .. }
    ));
}

#[test]
fn test_storage_type_is_optional() {
    let doc = SchemaDocument::from_file(fixture("schemas/dwh_drivers.json")).unwrap();
    assert_eq!(doc.storage_type, None);
    let row = doc.row_type().unwrap();
    assert_eq!(
        row.field("active", true).map(|f| &f.ty),
        Some(&StructuralType::Boolean)
    );
}

#[test]
fn test_row_type_keeps_column_order() {
    let doc = SchemaDocument::from_file(fixture("schemas/dwh_trips.json")).unwrap();
    let row = doc.row_type().unwrap();
    assert_eq!(
        row.to_string(),
        "STRUCT<uuid: VARCHAR, city_id: INTEGER, fare: DOUBLE, distance: BIGINT, \
         request_at: VARCHAR, completed_at: TIMESTAMP, tags: ARRAY<VARCHAR>, \
         attrs: MAP<VARCHAR, DOUBLE>, pickup: STRUCT<lat: DOUBLE, lng: DOUBLE>>"
    );
}

#[test]
fn test_flattened_row_type() {
    let doc = SchemaDocument::from_file(fixture("schemas/dwh_trips.json")).unwrap();
    let flat = doc.row_type().unwrap().flatten();
    assert_eq!(flat.get("pickup.lat"), Some(&StructuralType::Double));
    assert_eq!(
        flat.get("tags"),
        Some(&StructuralType::array(StructuralType::String))
    );
    assert!(!flat.contains_key("pickup"));
}

#[test]
fn test_malformed_document_is_rejected() {
    let err = SchemaDocument::from_file(fixture("broken/bad_array.json")).unwrap_err();
    assert!(matches!(err, SchemaError::Json(_)));
    assert!(err.to_string().contains("elementType"));
}

#[test]
fn test_missing_file() {
    let err = SchemaDocument::from_file(fixture("schemas/nope.json")).unwrap_err();
    assert!(matches!(err, SchemaError::Io { .. }));
}

#[test]
fn test_type_names_ignore_case() {
    let json = r#"{"tableName": "t", "database": "d", "columns": [
        {"name": "a", "nestedDataTypes": {"type": "INT"}},
        {"name": "b", "nestedDataTypes": {"type": "array", "elementType": {"type": "Long"}}}
    ]}"#;
    let row = SchemaDocument::from_json(json).unwrap().row_type().unwrap();
    assert_eq!(row.field("a", true).unwrap().ty, StructuralType::Int32);
    assert_eq!(
        row.field("B", false).unwrap().ty,
        StructuralType::array(StructuralType::Int64)
    );
}
