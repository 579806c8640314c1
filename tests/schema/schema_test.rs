use sqlbridge::schema::{
    build_flat_fields, Field, FieldSpec, FieldType, Schema, SchemaError, StructuralType,
};

fn dim(name: &str, t: FieldType) -> Field {
    FieldSpec::new(name, t).dimension().build().unwrap()
}

fn metric(name: &str, t: FieldType) -> Field {
    FieldSpec::new(name, t).metric().build().unwrap()
}

const RIDES: &str = r#"{
    "timeField": "requestedAt",
    "fields": [
        {"name": "requestedAt", "type": "datetime", "dimension": true},
        {"name": "fare", "type": "double", "metric": true},
        {"name": "rider", "type": "nested", "fields": [
            {"name": "uuid", "type": "string", "dimension": true},
            {"name": "rating", "type": "float", "metric": true, "dimension": true}
        ]},
        {"name": "stops", "type": "array", "dimension": true,
         "itemField": {"name": "stop", "type": "string", "dimension": true}},
        {"name": "raw", "type": "object", "index": false}
    ],
    "aliases": [{"field": "rider.uuid", "aliases": ["rider_id"]}],
    "requiredFilters": [{"field": "rider.uuid", "filters": ["requestedAt"]}]
}"#;

#[test]
fn test_schema_from_json() {
    let schema: Schema = serde_json::from_str(RIDES).unwrap();
    assert_eq!(schema.time_field(), "requestedAt");
    assert_eq!(schema.fields().len(), 5);

    let keys: Vec<_> = schema.flat_fields().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["fare", "raw", "requestedAt", "rider.rating", "rider.uuid", "stops"]
    );
    assert_eq!(schema.resolve("rider_id").map(|(path, _)| path), Some("rider.uuid"));
    assert_eq!(schema.required_filters()[0].filters, vec!["requestedAt"]);
}

#[test]
fn test_metrics_and_dimensions_partition_flags() {
    let schema: Schema = serde_json::from_str(RIDES).unwrap();
    let metrics: Vec<_> = schema.all_metrics().keys().map(String::as_str).collect();
    let dims: Vec<_> = schema.all_dimensions().keys().map(String::as_str).collect();
    assert_eq!(metrics, vec!["fare", "rider.rating"]);
    assert_eq!(dims, vec!["requestedAt", "rider.rating", "rider.uuid", "stops"]);
    assert!(!schema.all_metrics().contains_key("raw"));
    assert!(!schema.all_dimensions().contains_key("raw"));
}

#[test]
fn test_flat_fields_skip_containers_with_children() {
    let nested = FieldSpec::new("outer", FieldType::Nested)
        .fields(vec![FieldSpec::new("inner", FieldType::Object)
            .fields(vec![metric("leaf", FieldType::Long)])
            .build()
            .unwrap()])
        .build()
        .unwrap();
    let empty_object = FieldSpec::new("bag", FieldType::Object)
        .not_indexed()
        .build()
        .unwrap();

    let flat = build_flat_fields(&[nested, empty_object]);
    let keys: Vec<_> = flat.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["bag", "outer.inner.leaf"]);
    assert_eq!(flat["outer.inner.leaf"].field_type(), FieldType::Long);
}

#[test]
fn test_array_requires_item_field() {
    let err = FieldSpec::new("stops", FieldType::Array)
        .dimension()
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidField { ref field, .. } if field == "stops"));
    assert!(err.to_string().contains("itemField"));
}

#[test]
fn test_item_field_only_on_arrays() {
    let err = FieldSpec::new("name", FieldType::String)
        .dimension()
        .item(dim("x", FieldType::String))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("itemField must be null"));
}

#[test]
fn test_indexed_container_needs_children() {
    let err = FieldSpec::new("rider", FieldType::Nested)
        .fields(vec![])
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidField { .. }));

    let unindexed = FieldSpec::new("rider", FieldType::Nested)
        .not_indexed()
        .build();
    assert!(unindexed.is_ok());
}

#[test]
fn test_indexed_leaf_must_be_metric_or_dimension() {
    let err = FieldSpec::new("note", FieldType::Text).build().unwrap_err();
    assert!(err.to_string().contains("metric or dimension"));
}

#[test]
fn test_boolean_cardinality_is_two() {
    let field = dim("active", FieldType::Boolean);
    assert_eq!(field.cardinality(), Some(2));
}

#[test]
fn test_geo_shape_needs_options() {
    assert!(FieldSpec::new("area", FieldType::GeoShape)
        .dimension()
        .build()
        .is_err());

    let field = FieldSpec::new("area", FieldType::GeoShape)
        .dimension()
        .geo_shape(Default::default())
        .build()
        .unwrap();
    assert_eq!(field.geo_shape().unwrap().tree, "geohash");
    assert!(field.to_structural_type().is_err());
}

#[test]
fn test_unknown_field_type_in_json() {
    let json = r#"{"timeField": "a", "fields": [{"name": "a", "type": "uuid", "dimension": true}]}"#;
    let err = serde_json::from_str::<Schema>(json).unwrap_err();
    assert!(err.to_string().contains("Unrecognized field type: uuid"));
}

#[test]
fn test_structural_types() {
    let schema: Schema = serde_json::from_str(RIDES).unwrap();
    let types: Vec<_> = schema
        .fields()
        .iter()
        .map(|f| f.to_structural_type().unwrap())
        .collect();

    assert_eq!(types[0], StructuralType::Timestamp);
    assert_eq!(types[1], StructuralType::Double);
    assert!(matches!(&types[2], StructuralType::Struct(fields) if fields.len() == 2));
    assert_eq!(types[3], StructuralType::array(StructuralType::String));
    assert_eq!(
        types[4],
        StructuralType::map(StructuralType::String, StructuralType::String)
    );
}

#[test]
fn test_pretty_print_lists_every_field() {
    let schema: Schema = serde_json::from_str(RIDES).unwrap();
    let tree = schema.to_string();
    assert!(tree.starts_with(".\n"));
    assert!(tree.contains("3.1 uuid : STRING (dimension)"));
    assert!(tree.contains("3.2 rating : FLOAT (metric, dimension)"));
    assert!(tree.contains("4 stops : ARRAY[STRING] (dimension)"));
}
