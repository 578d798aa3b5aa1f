//! Table declarations loaded from JSON.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError, TypedFrameError};

use super::table::{ColumnTypes, TableType};
use super::types::IndexSpec;

/// Serialized form of one table declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub required: ColumnTypes,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub optional: ColumnTypes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexSpec>,
    /// Parent names in priority order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// A set of named table types.
///
/// Declarations may list their parents in any file order; the registry
/// builds parents before children.
///
/// ```
/// use typedframe::{ExpectedType, SchemaRegistry};
///
/// let registry = SchemaRegistry::from_json(r#"[
///     {"name": "Child", "required": {"bar": "boolean"}, "parents": ["Parent"]},
///     {"name": "Parent", "required": {"foo": "boolean"}}
/// ]"#).unwrap();
///
/// let child = registry.get("Child").unwrap();
/// assert_eq!(child.resolve(false)["foo"], ExpectedType::Boolean);
/// ```
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: IndexMap<String, Arc<TableType>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of declarations.
    pub fn from_json(json: &str) -> Result<Self> {
        let declarations: Vec<TableDeclaration> = serde_json::from_str(json)?;
        Self::from_declarations(declarations)
    }

    /// Read a JSON array of declarations from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| TypedFrameError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Build every declaration, parents first.
    pub fn from_declarations(declarations: Vec<TableDeclaration>) -> Result<Self> {
        let mut pending: IndexMap<String, TableDeclaration> = IndexMap::new();
        for declaration in declarations {
            if pending.contains_key(&declaration.name) {
                return Err(SchemaError::DuplicateTable(declaration.name).into());
            }
            pending.insert(declaration.name.clone(), declaration);
        }

        for declaration in pending.values() {
            if let Some(parent) = declaration
                .parents
                .iter()
                .find(|p| !pending.contains_key(*p))
            {
                return Err(SchemaError::UnknownParent {
                    table: declaration.name.clone(),
                    parent: parent.clone(),
                }
                .into());
            }
        }

        let mut registry = Self::new();
        let mut visiting = HashSet::new();
        let names: Vec<String> = pending.keys().cloned().collect();
        for name in &names {
            registry.build_declared(name, &pending, &mut visiting)?;
        }

        log::debug!("registered {} table type(s)", registry.tables.len());
        Ok(registry)
    }

    fn build_declared(
        &mut self,
        name: &str,
        pending: &IndexMap<String, TableDeclaration>,
        visiting: &mut HashSet<String>,
    ) -> Result<Arc<TableType>> {
        if let Some(table) = self.tables.get(name) {
            return Ok(Arc::clone(table));
        }
        if !visiting.insert(name.to_string()) {
            return Err(SchemaError::Cycle(name.to_string()).into());
        }

        // Presence was checked before any build started.
        let Some(declaration) = pending.get(name) else {
            return Err(SchemaError::Cycle(name.to_string()).into());
        };

        let mut builder = TableType::builder(&declaration.name);
        for parent in &declaration.parents {
            let parent = self.build_declared(parent, pending, visiting)?;
            builder = builder.parent(&parent);
        }
        for (column, dtype) in &declaration.required {
            builder = builder.required(column, dtype.clone());
        }
        for (column, dtype) in &declaration.optional {
            builder = builder.optional(column, dtype.clone());
        }
        if let Some(index) = &declaration.index {
            builder = builder.index(&index.name, index.dtype.clone());
        }

        let table = builder.build()?;
        visiting.remove(name);
        self.tables.insert(name.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// Register an already built table type under its own name.
    pub fn insert(&mut self, table: Arc<TableType>) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(SchemaError::DuplicateTable(table.name().to_string()).into());
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<TableType>> {
        self.tables.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
