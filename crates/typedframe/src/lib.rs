//! typedframe: declared schemas for tabular data frames.
//!
//! A [`TableType`] declares the columns a frame must carry, the columns it
//! may carry, and optionally its row index. Table types inherit from an
//! ordered list of parents; a type's own declarations win, then those of
//! its parents in the order they are listed.
//!
//! A [`Validator`] then either checks a frame strictly (`construct`) or
//! coerces a copy of it towards the schema (`convert`). Frame libraries are
//! reached through the [`Backend`] trait; the crate ships a backend over
//! its own [`DataFrame`](frame::DataFrame) and, with the `arrow` feature,
//! one over arrow record batches.
//!
//! # Example
//!
//! ```
//! use typedframe::{ExpectedType, TableBackend, TableType, Validator};
//! use typedframe::input::CsvReader;
//!
//! let base = TableType::builder("Base")
//!     .required("id", ExpectedType::Int64)
//!     .build()
//!     .unwrap();
//! let orders = TableType::builder("Orders")
//!     .parent(&base)
//!     .required("status", ExpectedType::categorical(["open", "closed"]))
//!     .optional("placed", ExpectedType::DateTime)
//!     .build()
//!     .unwrap();
//!
//! let df = CsvReader::new()
//!     .read_bytes(b"id,status\n1,open\n2,closed\n")
//!     .unwrap();
//!
//! let validator: Validator<TableBackend> = Validator::default();
//! let typed = validator.convert(&orders, &df, true).unwrap();
//! assert_eq!(typed.frame().column_names(), vec!["id", "status", "placed"]);
//! ```

pub mod backend;
pub mod error;
pub mod frame;
pub mod input;
pub mod schema;
pub mod validate;

#[cfg(feature = "arrow")]
pub use backend::ArrowBackend;
pub use backend::{Backend, TableBackend, TypeNormalizer};
pub use error::{Result, SchemaError, TypedFrameError};
pub use schema::{EffectiveSchema, ExpectedType, IndexSpec, SchemaRegistry, TableType};
pub use validate::{
    Schema, SchemaMismatch, TypedFrame, ValidatedFrame, Validator, ValidatorConfig,
};
