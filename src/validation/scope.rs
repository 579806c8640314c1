//! Name scopes: the relations a query level can see.

use crate::catalog::Table;
use crate::schema::StructuralType;
use crate::sql::ast::Name;

/// An output column of a relation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Column {
    pub name: String,
    /// `None` when the column's type could not be inferred.
    pub ty: Option<StructuralType>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: Option<StructuralType>) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A relation in a FROM clause.
#[derive(Debug, Clone)]
pub(crate) struct Relation {
    /// Name the relation is referenced by: its alias, or the table name.
    pub alias: String,
    /// `namespace.table` for catalog tables.
    pub qualified: Option<String>,
    pub columns: Vec<Column>,
    /// A relation whose columns are unknown; resolves every name.
    pub opaque: bool,
}

impl Relation {
    pub fn new(alias: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            alias: alias.into(),
            qualified: None,
            columns,
            opaque: false,
        }
    }

    pub fn table(alias: impl Into<String>, table: &Table) -> Self {
        let columns = table
            .columns()
            .iter()
            .map(|field| Column::new(field.name.clone(), Some(field.ty.clone())))
            .collect();
        Self {
            qualified: Some(table.qualified_name()),
            ..Self::new(alias, columns)
        }
    }

    /// Placeholder for a relation that failed to resolve.
    pub fn opaque(alias: impl Into<String>) -> Self {
        Self {
            opaque: true,
            ..Self::new(alias, Vec::new())
        }
    }

    /// Rename the leading columns, as `AS t (a, b)` does.
    pub fn rename_columns(&mut self, names: &[String]) {
        for (column, name) in self.columns.iter_mut().zip(names) {
            column.name = name.clone();
        }
    }

    fn column(&self, name: &str, case_sensitive: bool) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| same(&c.name, name, case_sensitive))
    }

    fn is_named(&self, names: &[Name], case_sensitive: bool) -> usize {
        if let Some(first) = names.first() {
            if !self.alias.is_empty() && first.matches(&self.alias, case_sensitive) {
                return 1;
            }
        }
        if let (Some(qualified), [ns, table, ..]) = (&self.qualified, names) {
            let dotted = format!("{}.{}", ns.value, table.value);
            if same(qualified, &dotted, case_sensitive) {
                return 2;
            }
        }
        0
    }
}

/// Outcome of resolving a name in one scope.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lookup {
    Found(Option<StructuralType>),
    Missing,
    Ambiguous(Vec<String>),
}

/// One query level.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    pub relations: Vec<Relation>,
    /// Select-list aliases, visible to GROUP BY, HAVING and ORDER BY.
    pub aliases: Vec<Column>,
}

impl Scope {
    pub fn relation(&self, names: &[Name], case_sensitive: bool) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|r| r.is_named(names, case_sensitive) == names.len())
    }

    /// Resolve a column reference, possibly qualified and possibly a path
    /// into a struct column.
    pub fn resolve(&self, names: &[Name], case_sensitive: bool) -> Lookup {
        // Qualified by relation: t.col.path or ns.t.col.path
        for relation in &self.relations {
            let skip = relation.is_named(names, case_sensitive);
            if skip == 0 || skip >= names.len() {
                continue;
            }
            if relation.opaque {
                return Lookup::Found(None);
            }
            if let Some(column) = relation.column(&names[skip].value, case_sensitive) {
                return field_path(column.ty.as_ref(), &names[skip + 1..], case_sensitive);
            }
        }

        // Unqualified: col.path
        let Some(first) = names.first() else {
            return Lookup::Missing;
        };
        let candidates: Vec<(&Relation, &Column)> = self
            .relations
            .iter()
            .filter_map(|r| r.column(&first.value, case_sensitive).map(|c| (r, c)))
            .collect();
        match candidates.as_slice() {
            [(_, column)] => field_path(column.ty.as_ref(), &names[1..], case_sensitive),
            [] => {
                if self.relations.iter().any(|r| r.opaque) {
                    return Lookup::Found(None);
                }
                match self.alias(names, case_sensitive) {
                    Some(alias) => Lookup::Found(alias.ty.clone()),
                    None => Lookup::Missing,
                }
            }
            many => Lookup::Ambiguous(
                many.iter()
                    .map(|(r, c)| format!("{}.{}", r.alias, c.name))
                    .collect(),
            ),
        }
    }

    fn alias(&self, names: &[Name], case_sensitive: bool) -> Option<&Column> {
        let [name] = names else {
            return None;
        };
        self.aliases
            .iter()
            .find(|c| name.matches(&c.name, case_sensitive))
    }
}

fn field_path(ty: Option<&StructuralType>, path: &[Name], case_sensitive: bool) -> Lookup {
    let mut current = ty;
    for name in path {
        match current {
            None => return Lookup::Found(None),
            Some(ty) => match ty.field(&name.value, case_sensitive) {
                Some(field) => current = Some(&field.ty),
                None => return Lookup::Missing,
            },
        }
    }
    Lookup::Found(current.cloned())
}

pub(crate) fn same(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}
