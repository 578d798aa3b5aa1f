//! Schema declarations and their resolution along ancestor chains.

mod registry;
mod table;
mod types;

pub use registry::{SchemaRegistry, TableDeclaration};
pub use table::{ColumnTypes, EffectiveSchema, TableType, TableTypeBuilder};
pub use types::{ExpectedType, IndexSpec};
