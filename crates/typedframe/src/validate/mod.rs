//! Strict construction and best-effort conversion against table types.

mod mismatch;
mod validated;
mod validator;

pub use mismatch::{ColumnMismatch, IndexMismatch, SchemaMismatch};
pub use validated::{Schema, TypedFrame, ValidatedFrame};
pub use validator::{Validator, ValidatorConfig};
