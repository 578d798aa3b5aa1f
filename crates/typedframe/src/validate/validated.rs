//! Frames that are known to satisfy a table type.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::backend::{Backend, TableBackend};
use crate::error::Result;
use crate::schema::TableType;

use super::validator::Validator;

/// A backend frame paired with the table type it satisfies.
///
/// Only a [`Validator`] creates one, so holding a `ValidatedFrame` means
/// the frame passed construction. The frame is never mutated afterwards.
pub struct ValidatedFrame<B: Backend> {
    table: Arc<TableType>,
    frame: B::Frame,
}

impl<B: Backend> ValidatedFrame<B> {
    pub(crate) fn from_parts(table: Arc<TableType>, frame: B::Frame) -> Self {
        Self { table, frame }
    }

    pub fn frame(&self) -> &B::Frame {
        &self.frame
    }

    pub fn table(&self) -> &Arc<TableType> {
        &self.table
    }

    pub fn into_frame(self) -> B::Frame {
        self.frame
    }
}

impl<B: Backend + Default> ValidatedFrame<B> {
    /// Construct with a default validator.
    pub fn new(table: &Arc<TableType>, frame: B::Frame) -> Result<Self> {
        Validator::<B>::default().construct(table, frame)
    }

    /// Convert with a default validator, adding optional columns.
    pub fn convert(table: &Arc<TableType>, frame: &B::Frame) -> Result<Self> {
        Validator::<B>::default().convert(table, frame, true)
    }
}

impl<B: Backend> Clone for ValidatedFrame<B> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            frame: self.frame.clone(),
        }
    }
}

impl<B: Backend> fmt::Debug for ValidatedFrame<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedFrame")
            .field("table", &self.table.name())
            .field("frame", &self.frame)
            .finish()
    }
}

/// A Rust type that names a table type.
///
/// ```
/// use std::sync::Arc;
/// use once_cell::sync::Lazy;
/// use typedframe::{ExpectedType, Schema, TableType, TypedFrame};
/// use typedframe::frame::{Column, DataFrame};
///
/// struct Prices;
///
/// static PRICES: Lazy<Arc<TableType>> = Lazy::new(|| {
///     TableType::builder("Prices")
///         .required("close", ExpectedType::Float64)
///         .build()
///         .unwrap()
/// });
///
/// impl Schema for Prices {
///     fn table_type() -> Arc<TableType> {
///         Arc::clone(&PRICES)
///     }
/// }
///
/// fn last_close(prices: &TypedFrame<Prices>) -> usize {
///     prices.frame().height()
/// }
///
/// let df = DataFrame::new(vec![("close", Column::from(vec![1.0, 2.0]))]).unwrap();
/// let prices: TypedFrame<Prices> = TypedFrame::new(df).unwrap();
/// assert_eq!(last_close(&prices), 2);
/// ```
pub trait Schema {
    fn table_type() -> Arc<TableType>;
}

/// A validated frame whose table type is fixed by `T`.
pub struct TypedFrame<T: Schema, B: Backend = TableBackend> {
    inner: ValidatedFrame<B>,
    _schema: PhantomData<fn() -> T>,
}

impl<T: Schema, B: Backend> TypedFrame<T, B> {
    /// Construct with an explicit validator.
    pub fn construct_with(validator: &Validator<B>, frame: B::Frame) -> Result<Self> {
        validator.construct(&T::table_type(), frame).map(Self::wrap)
    }

    /// Convert with an explicit validator.
    pub fn convert_with(validator: &Validator<B>, frame: &B::Frame, add_optional_columns: bool) -> Result<Self> {
        validator
            .convert(&T::table_type(), frame, add_optional_columns)
            .map(Self::wrap)
    }

    fn wrap(inner: ValidatedFrame<B>) -> Self {
        Self {
            inner,
            _schema: PhantomData,
        }
    }

    pub fn frame(&self) -> &B::Frame {
        self.inner.frame()
    }

    pub fn validated(&self) -> &ValidatedFrame<B> {
        &self.inner
    }

    pub fn into_validated(self) -> ValidatedFrame<B> {
        self.inner
    }

    pub fn into_frame(self) -> B::Frame {
        self.inner.into_frame()
    }
}

impl<T: Schema, B: Backend + Default> TypedFrame<T, B> {
    pub fn new(frame: B::Frame) -> Result<Self> {
        Self::construct_with(&Validator::default(), frame)
    }

    pub fn convert(frame: &B::Frame) -> Result<Self> {
        Self::convert_with(&Validator::default(), frame, true)
    }
}

impl<T: Schema, B: Backend> Clone for TypedFrame<T, B> {
    fn clone(&self) -> Self {
        Self::wrap(self.inner.clone())
    }
}

impl<T: Schema, B: Backend> fmt::Debug for TypedFrame<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedFrame").field(&self.inner).finish()
    }
}
