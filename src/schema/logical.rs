//! Logical schemas: an immutable field tree plus derived lookup tables.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use super::field::{Field, FieldType};
use super::SchemaError;

const MAX_PRINT_DEPTH: usize = 32;

/// Alternate names for a field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Alias {
    pub field: String,
    pub aliases: Vec<String>,
}

/// Filters that must co-occur when grouping by `field`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequiredFilter {
    pub field: String,
    pub filters: Vec<String>,
}

/// Unvalidated schema definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaSpec {
    pub time_field: String,
    pub required_filters: Vec<RequiredFilter>,
    pub fields: Vec<Field>,
    pub aliases: Vec<Alias>,
}

/// A validated, immutable logical schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "SchemaSpec")]
pub struct Schema {
    time_field: String,
    required_filters: Vec<RequiredFilter>,
    fields: Vec<Field>,
    aliases: Vec<Alias>,
    flat_fields: BTreeMap<String, Field>,
    flat_aliases: BTreeMap<String, Alias>,
    flat_dimensions: BTreeMap<String, Field>,
    flat_metrics: BTreeMap<String, Field>,
}

impl TryFrom<SchemaSpec> for Schema {
    type Error = SchemaError;

    fn try_from(spec: SchemaSpec) -> Result<Self, Self::Error> {
        Schema::new(spec)
    }
}

impl Schema {
    pub fn new(spec: SchemaSpec) -> Result<Self, SchemaError> {
        let SchemaSpec {
            time_field,
            required_filters,
            fields,
            aliases,
        } = spec;

        if fields.is_empty() {
            return Err(SchemaError::NoFields);
        }

        let flat_fields = build_flat_fields(&fields);

        let mut flat_aliases: BTreeMap<String, Alias> = BTreeMap::new();
        for alias in &aliases {
            if !flat_fields.contains_key(&alias.field) {
                return Err(SchemaError::UnknownField {
                    field: alias.field.clone(),
                    context: "alias".into(),
                });
            }
            for name in &alias.aliases {
                if let Some(existing) = flat_aliases.get(name) {
                    if existing.field != alias.field {
                        return Err(SchemaError::ConflictingAlias {
                            alias: name.clone(),
                            first: existing.field.clone(),
                            second: alias.field.clone(),
                        });
                    }
                }
                flat_aliases.insert(name.clone(), alias.clone());
            }
        }

        for filter in &required_filters {
            if !flat_fields.contains_key(&filter.field) {
                return Err(SchemaError::UnknownField {
                    field: filter.field.clone(),
                    context: "required filter".into(),
                });
            }
        }

        let subset = |pick: fn(&Field) -> bool| -> BTreeMap<String, Field> {
            flat_fields
                .iter()
                .filter(|(_, f)| pick(f))
                .map(|(k, f)| (k.clone(), f.clone()))
                .collect()
        };
        let flat_dimensions = subset(Field::is_dimension);
        let flat_metrics = subset(Field::is_metric);

        Ok(Self {
            time_field,
            required_filters,
            fields,
            aliases,
            flat_fields,
            flat_aliases,
            flat_dimensions,
            flat_metrics,
        })
    }

    /// Schema with no filters or aliases, timed by the field at `time_field_index`.
    pub fn simple(time_field_index: usize, fields: Vec<Field>) -> Result<Self, SchemaError> {
        let time_field = fields
            .get(time_field_index)
            .map(|f| f.name().to_string())
            .ok_or(SchemaError::NoFields)?;
        Schema::new(SchemaSpec {
            time_field,
            fields,
            ..Default::default()
        })
    }

    pub fn time_field(&self) -> &str {
        &self.time_field
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn required_filters(&self) -> &[RequiredFilter] {
        &self.required_filters
    }

    /// Dot-joined path to leaf field.
    pub fn flat_fields(&self) -> &BTreeMap<String, Field> {
        &self.flat_fields
    }

    /// Alias name to the alias rule declaring it.
    pub fn flat_aliases(&self) -> &BTreeMap<String, Alias> {
        &self.flat_aliases
    }

    pub fn all_dimensions(&self) -> &BTreeMap<String, Field> {
        &self.flat_dimensions
    }

    pub fn all_metrics(&self) -> &BTreeMap<String, Field> {
        &self.flat_metrics
    }

    /// Resolve a flat path or alias to its leaf field.
    pub fn resolve(&self, name: &str) -> Option<(&str, &Field)> {
        if let Some((path, field)) = self.flat_fields.get_key_value(name) {
            return Some((path.as_str(), field));
        }
        let alias = self.flat_aliases.get(name)?;
        self.flat_fields
            .get_key_value(&alias.field)
            .map(|(path, field)| (path.as_str(), field))
    }

    /// Numbered tree rendering of the field hierarchy.
    pub fn pretty_print(&self) -> Result<String, SchemaError> {
        pretty_print(&self.fields)
    }
}

/// Depth-first traversal recording only true leaves.
///
/// A field is a leaf when it is not a container, or when it is a container
/// without declared children.
pub fn build_flat_fields(fields: &[Field]) -> BTreeMap<String, Field> {
    fn visit<'a>(
        fields: &'a [Field],
        path: &mut Vec<&'a str>,
        out: &mut BTreeMap<String, Field>,
    ) {
        for field in fields {
            path.push(field.name());
            if field.has_complex_children() && !field.fields().is_empty() {
                visit(field.fields(), path, out);
            } else {
                out.insert(path.join("."), field.clone());
            }
            path.pop();
        }
    }

    let mut out = BTreeMap::new();
    visit(fields, &mut Vec::new(), &mut out);
    out
}

/// Render a field list as a numbered tree.
pub fn pretty_print(fields: &[Field]) -> Result<String, SchemaError> {
    let mut out = String::from(".\n");
    print_level(fields, &mut out, &mut Vec::new(), "")?;
    Ok(out)
}

fn print_level(
    fields: &[Field],
    out: &mut String,
    open: &mut Vec<bool>,
    parent_number: &str,
) -> Result<(), SchemaError> {
    if open.len() > MAX_PRINT_DEPTH {
        return Err(SchemaError::TooDeep(MAX_PRINT_DEPTH));
    }

    for (i, field) in fields.iter().enumerate() {
        let last = i + 1 == fields.len();
        for &continues in open.iter() {
            out.push_str(if continues { "│  " } else { "   " });
        }
        out.push_str(if last { "└─" } else { "├─" });

        let number = format!("{}{}", parent_number, i + 1);
        out.push_str(&format!(" {} {} : {}", number, field.name(), field.field_type()));
        if field.field_type() == FieldType::Array {
            if let Some(item) = field.item_field() {
                out.push_str(&format!("[{}]", item.field_type()));
            }
        }
        match (field.is_metric(), field.is_dimension()) {
            (true, true) => out.push_str(" (metric, dimension)"),
            (true, false) => out.push_str(" (metric)"),
            (false, true) => out.push_str(" (dimension)"),
            (false, false) => {}
        }
        out.push('\n');

        if !field.fields().is_empty() {
            open.push(!last);
            print_level(field.fields(), out, open, &format!("{}.", number))?;
            open.pop();
        }
    }
    Ok(())
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pretty_print() {
            Ok(tree) => f.write_str(&tree),
            Err(_) => Err(fmt::Error),
        }
    }
}
