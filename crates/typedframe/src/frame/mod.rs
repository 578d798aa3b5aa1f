//! In-memory columnar frame backing [`TableBackend`](crate::backend::TableBackend).
//!
//! The frame keeps a named row index, generic object columns and
//! categoricals with an explicit category list. Every column type admits
//! nulls.

mod cast;
mod column;
mod dataframe;

pub use cast::{cast, to_categorical};
pub use column::{Categorical, Cell, Column, DType};
pub use dataframe::{DataFrame, Index};
