use crate::{
    model::{GroupId, TableId},
    value::Value,
};

///
/// TablePathEntry
///
/// One step of a table's root-to-self path: which table, its ordinal, and
/// how many key values its hkey segment holds.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TablePathEntry {
    pub table: TableId,
    pub ordinal: u32,
    pub pk_arity: usize,
}

///
/// TableModel
///
/// User table definition. `join_columns` are the child's columns holding
/// the parent's primary key, in parent key order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableModel {
    pub id: TableId,
    pub name: String,
    pub ordinal: u32,
    pub group: GroupId,
    pub columns: Vec<String>,
    pub primary_key: Vec<usize>,
    pub parent: Option<TableId>,
    pub join_columns: Vec<usize>,

    /// Root-to-self path; the last entry is this table.
    pub path: Vec<TablePathEntry>,
}

impl TableModel {
    /// Number of hkey segments of this table's rows.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.path.len()
    }

    /// True when `self` is a proper ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.group == other.group
            && self.depth() < other.depth()
            && other.path[self.depth() - 1].table == self.id
    }

    /// Primary key values of one row of this table.
    #[must_use]
    pub fn pk_values(&self, values: &[Value]) -> Vec<Value> {
        self.primary_key
            .iter()
            .map(|&column| values.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Parent key values referenced by one row of this table.
    #[must_use]
    pub fn parent_key_values(&self, values: &[Value]) -> Vec<Value> {
        self.join_columns
            .iter()
            .map(|&column| values.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }
}
