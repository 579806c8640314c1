//! Structural types: the resolved shape of a column as the engine sees it.

use std::collections::BTreeMap;
use std::fmt;

/// The structural type of a column or expression.
///
/// Produced from logical schema fields and schema documents, consumed by
/// the validator when resolving identifier paths and typing operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralType {
    String,
    Double,
    Int32,
    Int64,
    Boolean,
    Timestamp,
    Array(Box<StructuralType>),
    Map(Box<StructuralType>, Box<StructuralType>),
    /// Ordered struct of named children.
    Struct(Vec<StructField>),
}

/// A named member of a struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub ty: StructuralType,
    pub nullable: bool,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: StructuralType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: true,
        }
    }
}

/// Coarse grouping used for compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Numeric,
    String,
    Boolean,
    Temporal,
    Complex,
}

impl StructuralType {
    pub fn array(item: StructuralType) -> Self {
        StructuralType::Array(Box::new(item))
    }

    pub fn map(key: StructuralType, value: StructuralType) -> Self {
        StructuralType::Map(Box::new(key), Box::new(value))
    }

    pub fn family(&self) -> TypeFamily {
        match self {
            StructuralType::String => TypeFamily::String,
            StructuralType::Double | StructuralType::Int32 | StructuralType::Int64 => {
                TypeFamily::Numeric
            }
            StructuralType::Boolean => TypeFamily::Boolean,
            StructuralType::Timestamp => TypeFamily::Temporal,
            StructuralType::Array(_) | StructuralType::Map(..) | StructuralType::Struct(_) => {
                TypeFamily::Complex
            }
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, StructuralType::Int32 | StructuralType::Int64)
    }

    pub fn is_numeric(&self) -> bool {
        self.family() == TypeFamily::Numeric
    }

    /// Look up a direct child of a struct type, optionally ignoring case.
    pub fn field(&self, name: &str, case_sensitive: bool) -> Option<&StructField> {
        match self {
            StructuralType::Struct(fields) => fields.iter().find(|f| {
                if case_sensitive {
                    f.name == name
                } else {
                    f.name.eq_ignore_ascii_case(name)
                }
            }),
            _ => None,
        }
    }

    /// Flatten nested struct members into dot-joined paths.
    ///
    /// Only true leaves are recorded; arrays and maps are leaves.
    pub fn flatten(&self) -> BTreeMap<String, StructuralType> {
        let mut out = BTreeMap::new();
        let mut path = Vec::new();
        flatten_into(self, &mut path, &mut out);
        out
    }
}

fn flatten_into<'a>(
    ty: &'a StructuralType,
    path: &mut Vec<&'a str>,
    out: &mut BTreeMap<String, StructuralType>,
) {
    match ty {
        StructuralType::Struct(fields) if !fields.is_empty() => {
            for field in fields {
                path.push(&field.name);
                flatten_into(&field.ty, path, out);
                path.pop();
            }
        }
        other => {
            if !path.is_empty() {
                out.insert(path.join("."), other.clone());
            }
        }
    }
}

impl fmt::Display for StructuralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralType::String => write!(f, "VARCHAR"),
            StructuralType::Double => write!(f, "DOUBLE"),
            StructuralType::Int32 => write!(f, "INTEGER"),
            StructuralType::Int64 => write!(f, "BIGINT"),
            StructuralType::Boolean => write!(f, "BOOLEAN"),
            StructuralType::Timestamp => write!(f, "TIMESTAMP"),
            StructuralType::Array(item) => write!(f, "ARRAY<{}>", item),
            StructuralType::Map(k, v) => write!(f, "MAP<{}, {}>", k, v),
            StructuralType::Struct(fields) => {
                write!(f, "STRUCT<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                write!(f, ">")
            }
        }
    }
}
