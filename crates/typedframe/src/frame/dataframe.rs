//! A small columnar data frame with a named row index.

use indexmap::IndexMap;

use crate::error::{Result, TypedFrameError};

use super::column::{Column, DType};

/// Row index of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    name: Option<String>,
    values: Column,
}

impl Index {
    pub fn new(name: Option<String>, values: Column) -> Self {
        Self { name, values }
    }

    /// Unnamed `0..len` integer index.
    pub fn range(len: usize) -> Self {
        Self {
            name: None,
            values: Column::Int64((0..len as i64).map(Some).collect()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn values(&self) -> &Column {
        &self.values
    }

    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Columns of equal length keyed by name, in insertion order, plus a row index.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    columns: IndexMap<String, Column>,
    index: Index,
}

impl DataFrame {
    /// Create a frame from named columns with a default range index.
    ///
    /// ```
    /// use typedframe::frame::{Column, DataFrame};
    ///
    /// let df = DataFrame::new(vec![
    ///     ("x", Column::from(vec![0.5, 1.5])),
    ///     ("y", Column::from(vec![2.0, 3.0])),
    /// ]).unwrap();
    /// assert_eq!(df.height(), 2);
    /// ```
    pub fn new<S: Into<String>>(columns: Vec<(S, Column)>) -> Result<Self> {
        let mut frame = Self::empty();
        let mut height = None;
        for (name, column) in columns {
            let name = name.into();
            match height {
                None => height = Some(column.len()),
                Some(h) if h != column.len() => {
                    return Err(shape_error(&name, column.len(), h));
                }
                Some(_) => {}
            }
            if frame.columns.contains_key(&name) {
                return Err(TypedFrameError::InvalidFrame(format!(
                    "duplicate column '{name}'"
                )));
            }
            frame.columns.insert(name, column);
        }
        frame.index = Index::range(height.unwrap_or(0));
        Ok(frame)
    }

    /// A frame with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            columns: IndexMap::new(),
            index: Index::range(0),
        }
    }

    /// Replace the row index, builder style.
    pub fn with_index(mut self, name: Option<&str>, values: Column) -> Result<Self> {
        self.set_index(Index::new(name.map(str::to_string), values))?;
        Ok(self)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.index.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Column name to data type, in column order.
    pub fn dtypes(&self) -> IndexMap<String, DType> {
        self.columns
            .iter()
            .map(|(n, c)| (n.clone(), c.dtype()))
            .collect()
    }

    /// Insert a column, or replace the one with the same name in place.
    pub fn insert_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if column.len() != self.height() && (self.width() > 0 || !self.index.is_empty()) {
            return Err(shape_error(&name, column.len(), self.height()));
        }
        if self.width() == 0 && self.index.is_empty() {
            self.index = Index::range(column.len());
        }
        self.columns.insert(name, column);
        Ok(())
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn set_index(&mut self, index: Index) -> Result<()> {
        if self.width() > 0 && index.len() != self.height() {
            return Err(shape_error("<index>", index.len(), self.height()));
        }
        self.index = index;
        Ok(())
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::empty()
    }
}

fn shape_error(name: &str, len: usize, height: usize) -> TypedFrameError {
    TypedFrameError::InvalidFrame(format!(
        "column '{name}' has {len} rows, frame has {height}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_has_range_index() {
        let df = DataFrame::new(vec![("a", Column::from(vec![1i64, 2, 3]))]).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.index().name(), None);
        assert_eq!(df.index().dtype(), DType::Int64);
    }

    #[test]
    fn test_length_mismatch() {
        let err = DataFrame::new(vec![
            ("a", Column::from(vec![1i64, 2])),
            ("b", Column::from(vec![1i64])),
        ])
        .unwrap_err();
        assert!(matches!(err, TypedFrameError::InvalidFrame(_)));
    }

    #[test]
    fn test_insert_and_replace() {
        let mut df = DataFrame::new(vec![("a", Column::from(vec![true, false]))]).unwrap();
        df.insert_column("b", Column::from(vec![1.0, 2.0])).unwrap();
        df.insert_column("a", Column::from(vec![1i8, 0])).unwrap();
        assert_eq!(df.column_names(), vec!["a", "b"]);
        assert_eq!(df.dtypes()["a"], DType::Int8);
        assert!(df.insert_column("c", Column::from(vec![1.0])).is_err());
    }

    #[test]
    fn test_insert_into_empty_frame() {
        let mut df = DataFrame::empty();
        df.insert_column("a", Column::from(vec!["x", "y"])).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_with_index() {
        let df = DataFrame::new(vec![("foo", Column::from(vec![true, false]))])
            .unwrap()
            .with_index(Some("bar"), Column::from(vec!["2021-06-03", "2021-05-31"]))
            .unwrap();
        assert_eq!(df.index().name(), Some("bar"));
        assert_eq!(df.index().dtype(), DType::Object);
    }
}
