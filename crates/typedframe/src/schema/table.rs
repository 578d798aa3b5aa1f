//! Table types: schema declarations composed through explicit parents.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::SchemaError;

use super::types::{ExpectedType, IndexSpec};

/// Mapping from column name to expected type.
pub type ColumnTypes = IndexMap<String, ExpectedType>;

/// A declared table shape.
///
/// A table type carries its own `required` and `optional` column
/// declarations, an optional index declaration, and a priority-ordered list
/// of parents whose declarations it inherits. The chain is the C3
/// linearization of that hierarchy. Both the chain and the effective schema
/// are computed once when the type is built.
pub struct TableType {
    name: String,
    index: Option<IndexSpec>,
    parents: Vec<Arc<TableType>>,
    /// Ancestors in linearized order, excluding `self`.
    ancestors: Vec<Arc<TableType>>,
    schema: EffectiveSchema,
}

/// Required and required ∪ optional columns of a resolved table type.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSchema {
    pub required: ColumnTypes,
    pub full: ColumnTypes,
}

impl EffectiveSchema {
    /// Columns declared optional and not required by any chain member.
    pub fn optional_only(&self) -> impl Iterator<Item = (&String, &ExpectedType)> {
        self.full
            .iter()
            .filter(|(name, _)| !self.required.contains_key(*name))
    }
}

impl TableType {
    /// Start declaring a table type.
    pub fn builder(name: impl Into<String>) -> TableTypeBuilder {
        TableTypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index declared by this type itself.
    pub fn own_index(&self) -> Option<&IndexSpec> {
        self.index.as_ref()
    }

    pub fn parents(&self) -> &[Arc<TableType>] {
        &self.parents
    }

    /// The C3 chain: this type followed by its linearized ancestors.
    pub fn chain(&self) -> impl Iterator<Item = &TableType> {
        std::iter::once(self).chain(self.ancestors.iter().map(Arc::as_ref))
    }

    /// Names along the C3 chain.
    pub fn chain_names(&self) -> Vec<&str> {
        self.chain().map(TableType::name).collect()
    }

    /// Merge this type's declarations with everything it inherits.
    ///
    /// A column declared by this type keeps its own type. Any other column
    /// takes the type it resolves to in the first listed parent that has it,
    /// so an earlier parent's inherited declaration beats a later parent's own
    /// one. Within one type, an optional declaration overrides a required one
    /// of the same name. Columns are ordered by first appearance, own
    /// declarations first.
    pub fn resolve(&self, include_optional: bool) -> ColumnTypes {
        if include_optional {
            self.schema.full.clone()
        } else {
            self.schema.required.clone()
        }
    }

    /// Both resolved mappings at once.
    pub fn effective_schema(&self) -> EffectiveSchema {
        self.schema.clone()
    }

    /// The own index declaration, else the one the first listed parent resolves.
    pub fn resolve_index(&self) -> Option<&IndexSpec> {
        self.index
            .as_ref()
            .or_else(|| self.parents.iter().find_map(|parent| parent.resolve_index()))
    }
}

impl fmt::Debug for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableType")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("index", &self.index)
            .field("chain", &self.chain_names())
            .finish()
    }
}

/// Builder for [`TableType`].
#[derive(Debug)]
pub struct TableTypeBuilder {
    name: String,
    required: ColumnTypes,
    optional: ColumnTypes,
    index: Option<IndexSpec>,
    parents: Vec<Arc<TableType>>,
}

impl TableTypeBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: ColumnTypes::new(),
            optional: ColumnTypes::new(),
            index: None,
            parents: Vec::new(),
        }
    }

    /// Declare a required column.
    pub fn required(mut self, name: impl Into<String>, dtype: ExpectedType) -> Self {
        self.required.insert(name.into(), dtype);
        self
    }

    /// Declare an optional column.
    pub fn optional(mut self, name: impl Into<String>, dtype: ExpectedType) -> Self {
        self.optional.insert(name.into(), dtype);
        self
    }

    /// Declare the row index.
    pub fn index(mut self, name: impl Into<String>, dtype: ExpectedType) -> Self {
        self.index = Some(IndexSpec::new(name, dtype));
        self
    }

    /// Inherit from `parent`. Parents added earlier take priority.
    pub fn parent(mut self, parent: &Arc<TableType>) -> Self {
        self.parents.push(Arc::clone(parent));
        self
    }

    /// Freeze the declaration and linearize its ancestors.
    pub fn build(self) -> Result<Arc<TableType>, SchemaError> {
        let ancestors = linearize(&self.name, &self.parents)?;
        log::debug!(
            "built table type '{}' with {} ancestor(s)",
            self.name,
            ancestors.len()
        );

        let mut own_full = self.required.clone();
        own_full.extend(self.optional);
        let schema = EffectiveSchema {
            required: inherit(self.required, self.parents.iter().map(|p| &p.schema.required)),
            full: inherit(own_full, self.parents.iter().map(|p| &p.schema.full)),
        };

        Ok(Arc::new(TableType {
            name: self.name,
            index: self.index,
            parents: self.parents,
            ancestors,
            schema,
        }))
    }
}

/// Extend `own` with the entries of `inherited`; the first declaration of a name wins.
fn inherit<'a>(own: ColumnTypes, inherited: impl Iterator<Item = &'a ColumnTypes>) -> ColumnTypes {
    let mut merged = own;
    for columns in inherited {
        for (name, dtype) in columns {
            merged.entry(name.clone()).or_insert_with(|| dtype.clone());
        }
    }
    merged
}

/// C3 linearization of `parents`, excluding the type being built.
fn linearize(name: &str, parents: &[Arc<TableType>]) -> Result<Vec<Arc<TableType>>, SchemaError> {
    for (i, parent) in parents.iter().enumerate() {
        if parents[..i].iter().any(|p| Arc::ptr_eq(p, parent)) {
            return Err(SchemaError::DuplicateParent {
                table: name.to_string(),
                parent: parent.name.clone(),
            });
        }
    }

    let mut sequences: Vec<Vec<Arc<TableType>>> = parents
        .iter()
        .map(|parent| {
            std::iter::once(Arc::clone(parent))
                .chain(parent.ancestors.iter().cloned())
                .collect()
        })
        .collect();
    sequences.push(parents.to_vec());

    let mut result = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Ok(result);
        }

        // First head that does not appear in the tail of any sequence.
        let candidate = sequences
            .iter()
            .map(|seq| &seq[0])
            .find(|head| {
                !sequences
                    .iter()
                    .any(|seq| seq[1..].iter().any(|t| Arc::ptr_eq(t, head)))
            })
            .cloned();

        let Some(next) = candidate else {
            return Err(SchemaError::InconsistentHierarchy {
                table: name.to_string(),
            });
        };

        for seq in &mut sequences {
            if Arc::ptr_eq(&seq[0], &next) {
                seq.remove(0);
            }
        }
        result.push(next);
    }
}
