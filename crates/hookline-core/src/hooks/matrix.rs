//! Matrix expansion
//!
//! A matrix turns one hook into several parameterized invocations. It is
//! declared either as named axes (`vars`), expanded as a Cartesian product,
//! or as explicit `rows` used verbatim.
//!
//! ```
//! use hookline_core::hooks::matrix::{expand, Matrix};
//!
//! let matrix = Matrix::new()
//!     .with_axis("os", ["linux", "osx"])
//!     .with_axis("arch", ["x86_64", "aarch_64"]);
//!
//! let cells = expand(&matrix, false, &Matrix::default()).unwrap();
//! assert_eq!(cells.len(), 4);
//! assert_eq!(cells[0]["os"], "linux");
//! assert_eq!(cells[0]["arch"], "x86_64");
//! assert_eq!(cells[1]["arch"], "aarch_64");
//! ```

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use super::types::Bindings;

/// Matrix declaration that cannot be expanded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// An axis declares no values
    #[error("axis '{axis}' has no values")]
    EmptyAxis { axis: String },

    /// The same axis name is declared twice
    #[error("axis '{axis}' is declared more than once")]
    DuplicateAxis { axis: String },

    /// An explicit row has no entries
    #[error("row {index} is empty")]
    EmptyRow { index: usize },

    /// Rows do not share the same keys
    #[error("row {index} does not declare the same keys as row 0")]
    InconsistentRow { index: usize },

    /// Both `vars` and `rows` are declared
    #[error("a matrix may declare either vars or rows, not both")]
    MixedDeclaration,
}

/// A named axis with its ordered values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixAxis {
    pub name: String,
    pub values: Vec<String>,
}

impl MatrixAxis {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Matrix specification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    /// Axes in declaration order
    #[serde(default, with = "axes", skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<MatrixAxis>,
    /// Explicit cells
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Bindings>,
}

impl Matrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an axis
    pub fn with_axis<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vars.push(MatrixAxis::new(name, values));
        self
    }

    /// Append an explicit row
    pub fn with_row<I, K, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.rows
            .push(row.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.rows.is_empty()
    }

    /// Number of cells this matrix expands to, without validation
    pub fn cardinality(&self) -> usize {
        if !self.rows.is_empty() {
            self.rows.len()
        } else {
            self.vars.iter().map(|axis| axis.values.len()).product()
        }
    }

    /// Check the declaration without expanding it
    pub fn validate(&self) -> Result<(), MatrixError> {
        if !self.vars.is_empty() && !self.rows.is_empty() {
            return Err(MatrixError::MixedDeclaration);
        }

        let mut seen = BTreeSet::new();
        for axis in &self.vars {
            if !seen.insert(axis.name.as_str()) {
                return Err(MatrixError::DuplicateAxis {
                    axis: axis.name.clone(),
                });
            }
            if axis.values.is_empty() {
                return Err(MatrixError::EmptyAxis {
                    axis: axis.name.clone(),
                });
            }
        }

        if let Some(first) = self.rows.first() {
            for (index, row) in self.rows.iter().enumerate() {
                if row.is_empty() {
                    return Err(MatrixError::EmptyRow { index });
                }
                if !row.keys().eq(first.keys()) {
                    return Err(MatrixError::InconsistentRow { index });
                }
            }
        }

        Ok(())
    }
}

/// Expand a matrix into its ordered cells.
///
/// When `apply_default_matrix` is set and `matrix` is empty, `default_matrix`
/// is used instead. A matrix without axes yields exactly one empty cell.
/// Axes expand in declaration order, the last axis varying fastest.
pub fn expand(
    matrix: &Matrix,
    apply_default_matrix: bool,
    default_matrix: &Matrix,
) -> Result<Vec<Bindings>, MatrixError> {
    let matrix = if apply_default_matrix && matrix.is_empty() {
        default_matrix
    } else {
        matrix
    };

    matrix.validate()?;

    if !matrix.rows.is_empty() {
        return Ok(matrix.rows.clone());
    }

    let mut cells = vec![Bindings::new()];
    for axis in &matrix.vars {
        let mut next = Vec::with_capacity(cells.len() * axis.values.len());
        for cell in &cells {
            for value in &axis.values {
                let mut extended = cell.clone();
                extended.insert(axis.name.clone(), value.clone());
                next.push(extended);
            }
        }
        cells = next;
    }

    Ok(cells)
}

/// Serde support for axes as an order-preserving map
mod axes {
    use super::*;

    pub fn serialize<S>(axes: &[MatrixAxis], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(axes.len()))?;
        for axis in axes {
            map.serialize_entry(&axis.name, &axis.values)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<MatrixAxis>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(AxesVisitor)
    }

    struct AxesVisitor;

    impl<'de> Visitor<'de> for AxesVisitor {
        type Value = Vec<MatrixAxis>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a map of axis names to lists of values")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut axes: Vec<MatrixAxis> = Vec::new();
            while let Some((name, values)) = access.next_entry::<String, Vec<String>>()? {
                if axes.iter().any(|axis| axis.name == name) {
                    return Err(serde::de::Error::custom(format!(
                        "axis '{}' is declared more than once",
                        name
                    )));
                }
                axes.push(MatrixAxis { name, values });
            }
            Ok(axes)
        }
    }
}
