use crate::{
    db::hkey::{HKey, HKeyError},
    model::{GroupId, IndexId, TableId, TablePathEntry},
    value::Value,
};

///
/// IndexJoinType
///
/// Outer-join direction of a group index. `Left` keeps every row of the
/// indexed branch's root (children absent → NULL), `Right` keeps every row
/// of the branch's leaf (ancestors absent → NULL).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexJoinType {
    Left,
    Right,
}

///
/// IndexKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexKind {
    Table,
    Group {
        join: IndexJoinType,
        /// Path position of the rootmost indexed table.
        branch_start: usize,
    },
}

///
/// IndexColumn
///
/// One declared column: its table, column position, and the position of
/// that table on the index path.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexColumn {
    pub table: TableId,
    pub column: usize,
    pub path_position: usize,
}

///
/// IndexModel
///
/// Table or group index. Index rows hold the declared columns followed by
/// the key values of every segment of the leaf table's hkey.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexModel {
    pub id: IndexId,
    pub name: String,
    pub group: GroupId,
    pub kind: IndexKind,
    pub unique: bool,
    pub columns: Vec<IndexColumn>,

    /// Group-root-to-leaf path; the last entry is the indexed (leaf) table.
    pub path: Vec<TablePathEntry>,
    pub(crate) column_names: Vec<String>,
}

impl IndexModel {
    #[must_use]
    pub const fn declared_len(&self) -> usize {
        self.columns.len()
    }

    /// Number of trailing hkey-completion columns.
    #[must_use]
    pub fn completion_len(&self) -> usize {
        self.path.iter().map(|entry| entry.pk_arity).sum()
    }

    #[must_use]
    pub fn row_width(&self) -> usize {
        self.declared_len() + self.completion_len()
    }

    #[must_use]
    pub const fn is_group_index(&self) -> bool {
        matches!(self.kind, IndexKind::Group { .. })
    }

    /// The table whose hkey a full-depth entry reconstructs.
    #[must_use]
    pub fn leaf(&self) -> Option<&TablePathEntry> {
        self.path.last()
    }

    /// Path position of `table`, if it lies on this index's path.
    #[must_use]
    pub fn path_position(&self, table: TableId) -> Option<usize> {
        self.path.iter().position(|entry| entry.table == table)
    }

    pub(crate) fn row_column_names(&self) -> Vec<String> {
        self.column_names.clone()
    }

    /// Completion values for an owner hkey, NULL-padded to the leaf depth.
    pub(crate) fn completion_values(&self, hkey: &HKey) -> Vec<Value> {
        let mut values = hkey.values().to_vec();
        values.resize(self.completion_len(), Value::Null);

        values
    }

    /// Reconstruct the owner hkey from an index row.
    ///
    /// `owner_depth` is the number of path segments present in the entry.
    pub fn owner_hkey(&self, row: &[Value], owner_depth: usize) -> Result<HKey, HKeyError> {
        let mut hkey = HKey::new();
        let mut offset = self.declared_len();

        for entry in self.path.iter().take(owner_depth) {
            let end = offset + entry.pk_arity;
            let values = row.get(offset..end).unwrap_or_default();
            hkey.push_segment(entry.ordinal, values.iter().cloned())?;
            offset = end;
        }

        Ok(hkey)
    }
}
