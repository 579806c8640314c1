//! Logical schema fields.
//!
//! A [`Field`] is built from a [`FieldSpec`] (plain configuration struct with
//! explicit defaults) and validated once, in [`Field::new`]. Every `Field` in
//! existence therefore satisfies the field invariants:
//!
//! - ARRAY fields carry exactly one item field and no child list
//! - OBJECT/NESTED fields carry a non-empty child list when indexed
//! - non-container indexed fields are a metric, a dimension, or both
//! - BOOLEAN fields have cardinality 2
//! - GEO_SHAPE fields carry geo-shape options

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::types::{StructField, StructuralType};
use super::SchemaError;

/// Type of a logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Object,
    Array,
    Text,
    String,
    Float,
    Double,
    Short,
    Integer,
    Long,
    Boolean,
    Datetime,
    GeoShape,
    Nested,
}

impl FieldType {
    pub const ALL: [FieldType; 13] = [
        FieldType::Object,
        FieldType::Array,
        FieldType::Text,
        FieldType::String,
        FieldType::Float,
        FieldType::Double,
        FieldType::Short,
        FieldType::Integer,
        FieldType::Long,
        FieldType::Boolean,
        FieldType::Datetime,
        FieldType::GeoShape,
        FieldType::Nested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Text => "text",
            FieldType::String => "string",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Short => "short",
            FieldType::Integer => "integer",
            FieldType::Long => "long",
            FieldType::Boolean => "boolean",
            FieldType::Datetime => "datetime",
            FieldType::GeoShape => "geo_shape",
            FieldType::Nested => "nested",
        }
    }

    /// Whether fields of this type hold named child fields.
    pub fn has_complex_children(&self) -> bool {
        matches!(self, FieldType::Object | FieldType::Nested)
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SchemaError::UnrecognizedFieldType(s.to_string()))
    }
}

impl TryFrom<String> for FieldType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Options for geo-shape fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoShape {
    pub tree: String,
    pub precision: String,
}

impl Default for GeoShape {
    fn default() -> Self {
        Self {
            tree: "geohash".to_string(),
            precision: "50m".to_string(),
        }
    }
}

/// Unvalidated field definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub dimension: bool,
    pub metric: bool,
    pub optional: bool,
    pub fields: Option<Vec<Field>>,
    pub item_field: Option<Box<Field>>,
    pub cardinality: Option<u64>,
    pub index: bool,
    pub geo_shape: Option<GeoShape>,
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            field_type: FieldType::String,
            dimension: false,
            metric: false,
            optional: true,
            fields: None,
            item_field: None,
            cardinality: None,
            index: true,
            geo_shape: None,
        }
    }
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Default::default()
        }
    }

    pub fn dimension(mut self) -> Self {
        self.dimension = true;
        self
    }

    pub fn metric(mut self) -> Self {
        self.metric = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    pub fn not_indexed(mut self) -> Self {
        self.index = false;
        self
    }

    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn item(mut self, item: Field) -> Self {
        self.item_field = Some(Box::new(item));
        self
    }

    pub fn geo_shape(mut self, options: GeoShape) -> Self {
        self.geo_shape = Some(options);
        self
    }

    pub fn build(self) -> Result<Field, SchemaError> {
        Field::new(self)
    }
}

/// A validated logical schema field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "FieldSpec")]
pub struct Field {
    name: String,
    field_type: FieldType,
    dimension: bool,
    metric: bool,
    optional: bool,
    fields: Option<Vec<Field>>,
    item_field: Option<Box<Field>>,
    cardinality: Option<u64>,
    index: bool,
    geo_shape: Option<GeoShape>,
}

impl TryFrom<FieldSpec> for Field {
    type Error = SchemaError;

    fn try_from(spec: FieldSpec) -> Result<Self, Self::Error> {
        Field::new(spec)
    }
}

impl Field {
    /// Validate a field definition.
    pub fn new(spec: FieldSpec) -> Result<Self, SchemaError> {
        let FieldSpec {
            name,
            field_type,
            dimension,
            metric,
            optional,
            fields,
            item_field,
            cardinality,
            index,
            geo_shape,
        } = spec;

        let complex = field_type.has_complex_children();

        if !complex && !metric && !dimension && index {
            return Err(SchemaError::InvalidField {
                field: name,
                reason: "must be metric or dimension or both".into(),
            });
        }

        let cardinality = if field_type == FieldType::Boolean {
            Some(2)
        } else {
            cardinality
        };

        match (field_type, &item_field) {
            (FieldType::Array, None) => {
                return Err(SchemaError::InvalidField {
                    field: name,
                    reason: "array field must have itemField specified".into(),
                })
            }
            (t, Some(_)) if t != FieldType::Array => {
                return Err(SchemaError::InvalidField {
                    field: name,
                    reason: "itemField must be null for non-array type".into(),
                })
            }
            _ => {}
        }

        if complex {
            let empty = fields.as_ref().map_or(true, Vec::is_empty);
            if empty && index {
                return Err(SchemaError::InvalidField {
                    field: name,
                    reason: "object or nested field must have fields specified and contain at \
                             least one field"
                        .into(),
                });
            }
        } else if fields.is_some() {
            return Err(SchemaError::InvalidField {
                field: name,
                reason: "fields must be null for non-object or non-nested type".into(),
            });
        }

        if field_type == FieldType::GeoShape && geo_shape.is_none() {
            return Err(SchemaError::InvalidField {
                field: name,
                reason: "geo shape field must specify options in `geoShape`".into(),
            });
        }

        Ok(Self {
            name,
            field_type,
            dimension,
            metric,
            optional,
            fields,
            item_field,
            cardinality,
            index,
            geo_shape,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_dimension(&self) -> bool {
        self.dimension
    }

    pub fn is_metric(&self) -> bool {
        self.metric
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_indexed(&self) -> bool {
        self.index
    }

    pub fn cardinality(&self) -> Option<u64> {
        self.cardinality
    }

    pub fn geo_shape(&self) -> Option<&GeoShape> {
        self.geo_shape.as_ref()
    }

    pub fn item_field(&self) -> Option<&Field> {
        self.item_field.as_deref()
    }

    /// Child fields; empty for non-container fields.
    pub fn fields(&self) -> &[Field] {
        self.fields.as_deref().unwrap_or(&[])
    }

    pub fn has_complex_children(&self) -> bool {
        self.field_type.has_complex_children()
    }

    /// Map this field to the structural type the engine resolves against.
    pub fn to_structural_type(&self) -> Result<StructuralType, SchemaError> {
        let ty = match self.field_type {
            FieldType::Text | FieldType::String => StructuralType::String,
            FieldType::Float | FieldType::Double => StructuralType::Double,
            FieldType::Short | FieldType::Integer => StructuralType::Int32,
            FieldType::Long => StructuralType::Int64,
            FieldType::Boolean => StructuralType::Boolean,
            FieldType::Datetime => StructuralType::Timestamp,
            FieldType::Array => {
                let item = self.item_field().ok_or_else(|| SchemaError::InvalidField {
                    field: self.name.clone(),
                    reason: "array field must have itemField specified".into(),
                })?;
                StructuralType::array(item.to_structural_type()?)
            }
            FieldType::Object => {
                StructuralType::map(StructuralType::String, self.object_value_type()?)
            }
            FieldType::Nested => StructuralType::Struct(
                self.fields()
                    .iter()
                    .map(|child| {
                        Ok(StructField {
                            name: child.name.clone(),
                            ty: child.to_structural_type()?,
                            nullable: child.optional,
                        })
                    })
                    .collect::<Result<_, SchemaError>>()?,
            ),
            FieldType::GeoShape => {
                return Err(SchemaError::UnsupportedFieldType {
                    field: self.name.clone(),
                    field_type: self.field_type,
                })
            }
        };
        Ok(ty)
    }

    /// Value type of an OBJECT field viewed as a string-keyed map.
    fn object_value_type(&self) -> Result<StructuralType, SchemaError> {
        let mut children = self.fields().iter();
        let Some(first) = children.next() else {
            return Ok(StructuralType::String);
        };
        let value = first.to_structural_type()?;
        for child in children {
            if child.to_structural_type()? != value {
                return Err(SchemaError::InvalidField {
                    field: self.name.clone(),
                    reason: "object children must share one value type".into(),
                });
            }
        }
        Ok(value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({}, {}", self.name, self.field_type)?;
        if let Some(item) = self.item_field() {
            write!(f, "[{}]", item.field_type)?;
        }
        match (self.metric, self.dimension) {
            (true, true) => write!(f, ", metric|dimension")?,
            (true, false) => write!(f, ", metric")?,
            (false, true) => write!(f, ", dimension")?,
            (false, false) => {}
        }
        write!(f, ")")
    }
}
