//! Module: db::row
//! Responsibility: row-type handles and immutable row tuples.
//! Does not own: table or index topology (see `model`).
//! Boundary: row types compare by interned identity, never structurally.

mod row_type;


use crate::{db::hkey::HKey, value::Value};
use std::fmt;

// re-exports
pub use row_type::{RowType, RowTypeId, RowTypeKind};
pub(crate) use row_type::TypeRegistry;

///
/// Row
///
/// Immutable tuple over one row type. Rows read from storage (and rows
/// derived from them) carry the originating hkey.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row {
    row_type: RowType,
    values: Vec<Value>,
    hkey: Option<HKey>,
}

impl Row {
    #[must_use]
    pub fn new(row_type: RowType, values: Vec<Value>, hkey: Option<HKey>) -> Self {
        debug_assert_eq!(
            values.len(),
            row_type.width(),
            "row width must match its row type"
        );

        Self {
            row_type,
            values,
            hkey,
        }
    }

    /// Concatenate parent and child fields under a flattened row type,
    /// NULL-filling whichever side is absent.
    #[must_use]
    pub fn flattened(
        row_type: RowType,
        parent: Option<&Self>,
        child: Option<&Self>,
        hkey: Option<HKey>,
    ) -> Self {
        let (parent_width, child_width) = match row_type.kind() {
            RowTypeKind::Flattened { parent, child } => (parent.width(), child.width()),
            _ => (0, row_type.width()),
        };

        let mut values = Vec::with_capacity(parent_width + child_width);
        match parent {
            Some(row) => values.extend_from_slice(row.values()),
            None => values.resize(parent_width, Value::Null),
        }
        match child {
            Some(row) => values.extend_from_slice(row.values()),
            None => values.resize(parent_width + child_width, Value::Null),
        }

        Self::new(row_type, values, hkey)
    }

    #[must_use]
    pub const fn row_type(&self) -> &RowType {
        &self.row_type
    }

    #[must_use]
    pub const fn values(&self) -> &[Value] {
        self.values.as_slice()
    }

    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub const fn hkey(&self) -> Option<&HKey> {
        self.hkey.as_ref()
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.row_type.name())?;
        for (index, value) in self.values.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}
