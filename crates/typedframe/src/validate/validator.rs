//! Strict construction and best-effort conversion of frames.

use std::any::{Any, type_name};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::backend::{Backend, RealizedValue, TypeNormalizer};
use crate::error::{CategoricalViolation, CoercionReason, Result, TypedFrameError};
use crate::schema::{ExpectedType, TableType};

use super::mismatch::{IndexMismatch, SchemaMismatch};
use super::validated::ValidatedFrame;

/// Validator configuration.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Add declared-but-absent optional columns, null-filled, on construction.
    pub fill_missing_optional: bool,
    /// Maximum offending categorical values listed in a coercion error.
    pub max_reported_values: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            fill_missing_optional: false,
            max_reported_values: 10,
        }
    }
}

/// Checks frames of one backend against table types.
///
/// ```
/// use typedframe::{ExpectedType, TableBackend, TableType, Validator};
/// use typedframe::frame::{Column, DataFrame};
///
/// let table = TableType::builder("Trades")
///     .required("price", ExpectedType::Float64)
///     .build()
///     .unwrap();
/// let df = DataFrame::new(vec![("price", Column::from(vec!["1.5", "2"]))]).unwrap();
///
/// let validator: Validator<TableBackend> = Validator::default();
/// assert!(validator.construct(&table, df.clone()).is_err());
/// let typed = validator.convert(&table, &df, true).unwrap();
/// assert_eq!(typed.frame().column("price"), Some(&Column::from(vec![1.5, 2.0])));
/// ```
#[derive(Debug, Clone)]
pub struct Validator<B: Backend> {
    backend: B,
    config: ValidatorConfig,
}

impl<B: Backend + Default> Default for Validator<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B: Backend> Validator<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ValidatorConfig::default())
    }

    pub fn with_config(backend: B, config: ValidatorConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Compare column and index types of `frame` against `table`.
    ///
    /// Every mismatch is collected; categorical invariants are not checked.
    pub fn check(&self, table: &TableType, frame: &B::Frame) -> std::result::Result<(), SchemaMismatch> {
        let dtypes = self.backend.dtypes(frame);
        let schema = table.effective_schema();

        let actual: IndexMap<String, String> = dtypes
            .iter()
            .map(|(name, dtype)| (name.clone(), B::Normalizer::normalize_actual(dtype).to_string()))
            .collect();
        let mut mismatch = SchemaMismatch::new(table.name(), actual, schema.full.clone());

        for (name, expected) in &schema.required {
            match dtypes.get(name) {
                Some(dtype) if !B::Normalizer::types_mismatch(dtype, expected) => {}
                _ => mismatch.push_column(name, expected),
            }
        }

        for (name, expected) in schema.optional_only() {
            if let Some(dtype) = dtypes.get(name) {
                if B::Normalizer::types_mismatch(dtype, expected) {
                    mismatch.push_column(name, expected);
                }
            }
        }

        if let Some(spec) = table.resolve_index() {
            match self.backend.index(frame) {
                Some(index) => {
                    if index.name.as_deref() != Some(spec.name.as_str()) {
                        mismatch.push_index(IndexMismatch::Name {
                            expected: spec.name.clone(),
                            actual: index.name.clone(),
                        });
                    }
                    if B::Normalizer::types_mismatch(&index.dtype, &spec.dtype) {
                        mismatch.push_index(IndexMismatch::Type {
                            expected: spec.dtype.clone(),
                            actual: B::Normalizer::normalize_actual(&index.dtype).to_string(),
                        });
                    }
                }
                None => mismatch.push_index(IndexMismatch::Name {
                    expected: spec.name.clone(),
                    actual: None,
                }),
            }
        }

        if mismatch.is_empty() {
            Ok(())
        } else {
            Err(mismatch)
        }
    }

    /// Wrap `frame` if it conforms to `table` exactly.
    pub fn construct(&self, table: &Arc<TableType>, mut frame: B::Frame) -> Result<ValidatedFrame<B>> {
        if let Err(mismatch) = self.check(table, &frame) {
            log::debug!(
                "'{}' rejected by {} backend: {} column(s), {} index mismatch(es)",
                table.name(),
                B::NAME,
                mismatch.differences.len(),
                mismatch.index.len()
            );
            return Err(mismatch.into());
        }

        for column in self.backend.categorical_columns(&frame) {
            if !self.backend.categories_are_strings(&frame, &column) {
                return Err(TypedFrameError::CategoricalInvariant {
                    column,
                    violation: CategoricalViolation::NonStringCategories,
                });
            }
            if self.backend.has_null(&frame, &column) {
                return Err(TypedFrameError::CategoricalInvariant {
                    column,
                    violation: CategoricalViolation::NullValues,
                });
            }
        }

        if self.config.fill_missing_optional {
            self.add_missing_optional(table, &mut frame)?;
        }

        log::debug!("'{}' validated by {} backend", table.name(), B::NAME);
        Ok(ValidatedFrame::from_parts(Arc::clone(table), frame))
    }

    /// Like [`construct`](Self::construct), for a value of unknown type.
    pub fn construct_any<V: Any>(&self, table: &Arc<TableType>, value: V) -> Result<ValidatedFrame<B>> {
        let wrong_type = || TypedFrameError::BackendType {
            backend: B::NAME,
            actual: type_name::<V>().to_string(),
        };
        if !self.backend.is_backend_frame(&value) {
            return Err(wrong_type());
        }
        let boxed: Box<dyn Any> = Box::new(value);
        let frame = boxed.downcast::<B::Frame>().map_err(|_| wrong_type())?;
        self.construct(table, *frame)
    }

    /// Coerce a copy of `frame` towards `table`, then construct.
    ///
    /// With `add_optional_columns`, absent optional columns are added
    /// null-filled first. Categorical columns must only hold declared labels.
    pub fn convert(
        &self,
        table: &Arc<TableType>,
        frame: &B::Frame,
        add_optional_columns: bool,
    ) -> Result<ValidatedFrame<B>> {
        let mut frame = frame.clone();
        if add_optional_columns {
            self.add_missing_optional(table, &mut frame)?;
        }

        let full = table.resolve(true);
        for name in self.backend.dtypes(&frame).into_keys() {
            let Some(expected) = full.get(&name) else {
                continue;
            };
            match expected {
                ExpectedType::Categorical(labels) => {
                    self.check_categories(&frame, &name, labels)?;
                    self.backend.to_categorical(&mut frame, &name, labels)?;
                }
                other => self.backend.cast_column(&mut frame, &name, other)?,
            }
            log::trace!("cast column '{name}' to {expected}");
        }

        if let Some(index) = table.resolve_index() {
            self.backend.set_index(&mut frame, &index.name, &index.dtype)?;
            log::trace!("cast index '{}' to {}", index.name, index.dtype);
        }

        self.construct(table, frame)
    }

    /// Fail when a column realizes values outside `labels`.
    fn check_categories(&self, frame: &B::Frame, name: &str, labels: &[String]) -> Result<()> {
        let unknown: Vec<RealizedValue> = self
            .backend
            .distinct_values(frame, name)
            .into_iter()
            .filter(|value| !matches!(value, RealizedValue::Text(s) if labels.contains(s)))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }

        log::debug!("column '{name}' has {} unknown categories", unknown.len());
        let reported = unknown
            .iter()
            .take(self.config.max_reported_values)
            .map(RealizedValue::to_string)
            .collect();
        Err(TypedFrameError::coercion(name, CoercionReason::UnknownCategories(reported)))
    }

    fn add_missing_optional(&self, table: &TableType, frame: &mut B::Frame) -> Result<()> {
        let schema = table.effective_schema();
        let present = self.backend.dtypes(frame);
        for (name, expected) in schema.optional_only() {
            if present.contains_key(name) {
                continue;
            }
            if self.backend.supports_null_column(expected) {
                self.backend.add_null_column(frame, name, expected)?;
                log::debug!("added null column '{name}' of {expected}");
            } else {
                log::warn!(
                    "optional column '{name}' of {expected} left absent: {} backend has no null form for it",
                    B::NAME
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TableBackend;
    use crate::frame::{Categorical, Column, DType, DataFrame};
    use serde_json::json;

    fn table() -> Arc<TableType> {
        TableType::builder("MyTable")
            .required("foo", ExpectedType::Float64)
            .required("bar", ExpectedType::Boolean)
            .optional("note", ExpectedType::Utf8)
            .build()
            .unwrap()
    }

    fn validator() -> Validator<TableBackend> {
        Validator::default()
    }

    #[test]
    fn test_construct_accepts_conforming_frame() {
        let df = DataFrame::new(vec![
            ("foo", Column::from(vec![1.0, 2.0])),
            ("bar", Column::from(vec![true, false])),
        ])
        .unwrap();
        let validated = validator().construct(&table(), df.clone()).unwrap();
        assert_eq!(validated.frame(), &df);
        assert_eq!(validated.table().name(), "MyTable");
    }

    #[test]
    fn test_construct_collects_every_mismatch() {
        let df = DataFrame::new(vec![
            ("foo", Column::from(vec![1i64, 2])),
            ("note", Column::from(vec![1i64, 2])),
        ])
        .unwrap();
        let err = validator().construct(&table(), df).unwrap_err();
        let mismatch = err.as_schema_mismatch().unwrap();
        assert!(mismatch.contains("foo", &ExpectedType::Float64));
        assert!(mismatch.contains("bar", &ExpectedType::Boolean));
        assert!(mismatch.contains("note", &ExpectedType::Utf8));
        assert_eq!(mismatch.differences.len(), 3);
    }

    #[test]
    fn test_construct_rejects_categorical_with_nulls() {
        let table = TableType::builder("Cats")
            .required("c", ExpectedType::categorical(["foo", "bar"]))
            .build()
            .unwrap();
        let df = DataFrame::new(vec![(
            "c",
            Column::from(Categorical::from_labels(&["foo", "buzz"], &["foo", "bar"])),
        )])
        .unwrap();
        let err = validator().construct(&table, df).unwrap_err();
        assert!(matches!(
            err,
            TypedFrameError::CategoricalInvariant {
                violation: CategoricalViolation::NullValues,
                ..
            }
        ));
    }

    #[test]
    fn test_construct_rejects_non_string_categories() {
        let table = TableType::builder("Plain").build().unwrap();
        let df = DataFrame::new(vec![(
            "c",
            Column::from(Categorical::new(&[json!(1)], vec![json!(1)], false)),
        )])
        .unwrap();
        let err = validator().construct(&table, df).unwrap_err();
        assert!(matches!(
            err,
            TypedFrameError::CategoricalInvariant {
                violation: CategoricalViolation::NonStringCategories,
                ..
            }
        ));
    }

    #[test]
    fn test_construct_any_rejects_foreign_values() {
        let err = validator()
            .construct_any(&table(), vec![1, 2, 3])
            .unwrap_err();
        match err {
            TypedFrameError::BackendType { backend, actual } => {
                assert_eq!(backend, "table");
                assert!(actual.contains("Vec"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_convert_leaves_input_untouched() {
        let df = DataFrame::new(vec![
            ("foo", Column::from(vec!["1.5", "2"])),
            ("bar", Column::from(vec!["true", "no"])),
        ])
        .unwrap();
        let validated = validator().convert(&table(), &df, true).unwrap();
        assert_eq!(df.dtypes()["foo"], DType::Object);
        assert_eq!(validated.frame().dtypes()["foo"], DType::Float64);
        assert_eq!(validated.frame().dtypes()["note"], DType::Object);
    }

    #[test]
    fn test_convert_caps_reported_categories() {
        let table = TableType::builder("Cats")
            .required("c", ExpectedType::categorical(["a"]))
            .build()
            .unwrap();
        let df = DataFrame::new(vec![("c", Column::from(vec!["x", "y", "z", "a"]))]).unwrap();
        let validator = Validator::with_config(
            TableBackend,
            ValidatorConfig {
                max_reported_values: 2,
                ..ValidatorConfig::default()
            },
        );
        match validator.convert(&table, &df, false).unwrap_err() {
            TypedFrameError::Coercion {
                column,
                reason: CoercionReason::UnknownCategories(values),
            } => {
                assert_eq!(column, "c");
                assert_eq!(values, vec!["x", "y"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fill_missing_optional_on_construct() {
        let df = DataFrame::new(vec![
            ("foo", Column::from(vec![1.0])),
            ("bar", Column::from(vec![true])),
        ])
        .unwrap();
        let validator = Validator::with_config(
            TableBackend,
            ValidatorConfig {
                fill_missing_optional: true,
                ..ValidatorConfig::default()
            },
        );
        let validated = validator.construct(&table(), df).unwrap();
        assert!(validated.frame().column("note").unwrap().cell(0).is_null());
    }
}
