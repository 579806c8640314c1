//! Schema documents: the externally produced per-table column descriptions.
//!
//! ```json
//! {
//!   "tableName": "trips",
//!   "database": "dwh",
//!   "storageType": "hive",
//!   "columns": [
//!     {"name": "uuid", "nestedDataTypes": {"type": "string"}},
//!     {"name": "tags", "nestedDataTypes": {"type": "ARRAY", "elementType": {"type": "string"}}},
//!     {"name": "attrs", "nestedDataTypes": {
//!         "type": "MAP", "keyType": {"type": "string"}, "valueType": {"type": "double"}}},
//!     {"name": "pickup", "nestedDataTypes": {"type": "STRUCT", "attributes": [
//!         {"attributeName": "lat", "attributeDataType": {"type": "double"}}]}}
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::path::Path;

use super::field::FieldType;
use super::types::{StructField, StructuralType};
use super::SchemaError;

/// One table's schema document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub table_name: String,
    pub database: String,
    #[serde(default)]
    pub storage_type: Option<String>,
    pub columns: Vec<ColumnDocument>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDocument {
    pub name: String,
    pub nested_data_types: DataTypeDocument,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDocument {
    pub attribute_name: String,
    pub attribute_data_type: DataTypeDocument,
}

/// A column type as written in a schema document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDataType")]
pub enum DataTypeDocument {
    Simple(String),
    Array(Box<DataTypeDocument>),
    Map {
        key: Box<DataTypeDocument>,
        value: Box<DataTypeDocument>,
    },
    Struct(Vec<AttributeDocument>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataType {
    #[serde(rename = "type")]
    kind: String,
    element_type: Option<Box<DataTypeDocument>>,
    key_type: Option<Box<DataTypeDocument>>,
    value_type: Option<Box<DataTypeDocument>>,
    attributes: Option<Vec<AttributeDocument>>,
}

impl TryFrom<RawDataType> for DataTypeDocument {
    type Error = SchemaError;

    fn try_from(raw: RawDataType) -> Result<Self, Self::Error> {
        let missing = |what: &str| SchemaError::MalformedDocument(format!(
            "{} type requires `{}`",
            raw.kind, what
        ));
        match raw.kind.to_ascii_uppercase().as_str() {
            "ARRAY" => Ok(DataTypeDocument::Array(
                raw.element_type.clone().ok_or_else(|| missing("elementType"))?,
            )),
            "MAP" => Ok(DataTypeDocument::Map {
                key: raw.key_type.clone().ok_or_else(|| missing("keyType"))?,
                value: raw.value_type.clone().ok_or_else(|| missing("valueType"))?,
            }),
            "STRUCT" => Ok(DataTypeDocument::Struct(
                raw.attributes.clone().ok_or_else(|| missing("attributes"))?,
            )),
            _ => Ok(DataTypeDocument::Simple(raw.kind)),
        }
    }
}

impl DataTypeDocument {
    /// Field type this document type corresponds to.
    pub fn field_type(&self) -> Result<FieldType, SchemaError> {
        match self {
            DataTypeDocument::Array(_) => Ok(FieldType::Array),
            DataTypeDocument::Map { .. } => Ok(FieldType::Object),
            DataTypeDocument::Struct(_) => Ok(FieldType::Nested),
            DataTypeDocument::Simple(name) => simple_field_type(name),
        }
    }

    pub fn to_structural_type(&self) -> Result<StructuralType, SchemaError> {
        match self {
            DataTypeDocument::Array(item) => Ok(StructuralType::array(item.to_structural_type()?)),
            DataTypeDocument::Map { key, value } => Ok(StructuralType::map(
                key.to_structural_type()?,
                value.to_structural_type()?,
            )),
            DataTypeDocument::Struct(attributes) => Ok(StructuralType::Struct(
                attributes
                    .iter()
                    .map(|a| {
                        Ok(StructField::new(
                            a.attribute_name.clone(),
                            a.attribute_data_type.to_structural_type()?,
                        ))
                    })
                    .collect::<Result<_, SchemaError>>()?,
            )),
            DataTypeDocument::Simple(name) => match simple_field_type(name)? {
                FieldType::Text | FieldType::String => Ok(StructuralType::String),
                FieldType::Float | FieldType::Double => Ok(StructuralType::Double),
                FieldType::Short | FieldType::Integer => Ok(StructuralType::Int32),
                FieldType::Long => Ok(StructuralType::Int64),
                FieldType::Boolean => Ok(StructuralType::Boolean),
                FieldType::Datetime => Ok(StructuralType::Timestamp),
                other => Err(SchemaError::UnsupportedDocumentType {
                    type_name: name.clone(),
                    field_type: other,
                }),
            },
        }
    }
}

/// Primitive document type names; `binary` narrows to string.
fn simple_field_type(name: &str) -> Result<FieldType, SchemaError> {
    match name.to_ascii_lowercase().as_str() {
        "timestamp" | "date" => Ok(FieldType::Datetime),
        "bigint" => Ok(FieldType::Long),
        "int" => Ok(FieldType::Integer),
        "binary" => Ok(FieldType::String),
        _ => name.parse(),
    }
}

impl SchemaDocument {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Row type of the table: an ordered struct of its columns.
    pub fn row_type(&self) -> Result<StructuralType, SchemaError> {
        let fields = self
            .columns
            .iter()
            .map(|c| {
                c.nested_data_types
                    .to_structural_type()
                    .map(|ty| StructField::new(c.name.clone(), ty))
                    .map_err(|e| SchemaError::InColumn {
                        table: self.qualified_name(),
                        column: c.name.clone(),
                        source: Box::new(e),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StructuralType::Struct(fields))
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIPS: &str = r#"{
        "tableName": "trips",
        "database": "dwh",
        "storageType": "hive",
        "columns": [
            {"name": "uuid", "nestedDataTypes": {"type": "string"}},
            {"name": "fare", "nestedDataTypes": {"type": "DOUBLE"}},
            {"name": "created", "nestedDataTypes": {"type": "date"}},
            {"name": "seq", "nestedDataTypes": {"type": "bigint"}},
            {"name": "blob", "nestedDataTypes": {"type": "BINARY"}},
            {"name": "tags", "nestedDataTypes": {"type": "ARRAY", "elementType": {"type": "string"}}},
            {"name": "attrs", "nestedDataTypes": {
                "type": "MAP", "keyType": {"type": "string"}, "valueType": {"type": "int"}}},
            {"name": "pickup", "nestedDataTypes": {"type": "STRUCT", "attributes": [
                {"attributeName": "lat", "attributeDataType": {"type": "double"}},
                {"attributeName": "time", "attributeDataType": {"type": "timestamp"}}
            ]}}
        ]
    }"#;

    #[test]
    fn test_row_type() {
        let doc = SchemaDocument::from_json(TRIPS).unwrap();
        assert_eq!(doc.qualified_name(), "dwh.trips");
        let row = doc.row_type().unwrap();
        let get = |name: &str| row.field(name, true).unwrap().ty.clone();
        assert_eq!(get("uuid"), StructuralType::String);
        assert_eq!(get("fare"), StructuralType::Double);
        assert_eq!(get("created"), StructuralType::Timestamp);
        assert_eq!(get("seq"), StructuralType::Int64);
        assert_eq!(get("blob"), StructuralType::String);
        assert_eq!(get("tags"), StructuralType::array(StructuralType::String));
        assert_eq!(
            get("attrs"),
            StructuralType::map(StructuralType::String, StructuralType::Int32)
        );
        assert_eq!(
            get("pickup"),
            StructuralType::Struct(vec![
                StructField::new("lat", StructuralType::Double),
                StructField::new("time", StructuralType::Timestamp),
            ])
        );
    }

    #[test]
    fn test_field_types() {
        let doc = SchemaDocument::from_json(TRIPS).unwrap();
        let kinds: Vec<_> = doc
            .columns
            .iter()
            .map(|c| c.nested_data_types.field_type().unwrap())
            .collect();
        assert_eq!(kinds[5], FieldType::Array);
        assert_eq!(kinds[6], FieldType::Object);
        assert_eq!(kinds[7], FieldType::Nested);
    }

    #[test]
    fn test_unknown_type_fails() {
        let json = r#"{"tableName": "t", "database": "d", "columns": [
            {"name": "x", "nestedDataTypes": {"type": "varchar2"}}]}"#;
        let err = SchemaDocument::from_json(json).unwrap().row_type().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("d.t"), "{message}");
        assert!(message.contains("x"), "{message}");
    }

    #[test]
    fn test_geo_shape_unsupported() {
        let json = r#"{"tableName": "t", "database": "d", "columns": [
            {"name": "x", "nestedDataTypes": {"type": "geo_shape"}}]}"#;
        let err = SchemaDocument::from_json(json).unwrap().row_type().unwrap_err();
        assert!(matches!(err, SchemaError::InColumn { .. }));
    }

    #[test]
    fn test_array_requires_element_type() {
        let json = r#"{"tableName": "t", "database": "d", "columns": [
            {"name": "x", "nestedDataTypes": {"type": "ARRAY"}}]}"#;
        let err = SchemaDocument::from_json(json).unwrap_err();
        assert!(err.to_string().contains("elementType"));
    }
}
