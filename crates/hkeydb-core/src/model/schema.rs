use crate::{
    MAX_HKEY_DEPTH,
    db::row::{RowType, TypeRegistry},
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{
        GroupId, IndexColumn, IndexId, IndexJoinType, IndexKind, IndexModel, TableId, TableModel,
        TablePathEntry,
    },
};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("unknown {kind} '{name}'")]
    UnknownName { kind: &'static str, name: String },

    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("table '{table}' must declare a primary key")]
    EmptyPrimaryKey { table: String },

    #[error("table '{table}' joins {found} columns to a parent key of {expected}")]
    JoinArityMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("table '{table}' and its parent belong to different groups")]
    ParentInOtherGroup { table: String },

    #[error("table '{table}' exceeds max hkey depth of {max}")]
    TooDeep { table: String, max: usize },

    #[error("group '{group}' already has root table '{root}'")]
    MultipleRoots { group: String, root: String },

    #[error("index '{index}' must declare at least one column")]
    EmptyIndex { index: String },

    #[error("group index '{index}' columns must lie on one branch of one group")]
    NotOneBranch { index: String },

    #[error("too many {kind} definitions for a 32-bit id")]
    TooMany { kind: &'static str },
}

impl From<SchemaError> for InternalError {
    fn from(err: SchemaError) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Schema,
            err.to_string(),
        )
    }
}

///
/// ParentSpec
///
/// Parent linkage for a child table: the parent and the child columns that
/// hold the parent's primary key.
///

#[derive(Clone, Copy, Debug)]
pub struct ParentSpec<'a> {
    pub table: TableId,
    pub join_columns: &'a [&'a str],
}

///
/// GroupModel
///
/// A cluster of tables stored together in hkey order.
///

#[derive(Debug)]
pub struct GroupModel {
    pub id: GroupId,
    pub name: String,
    pub root: Option<TableId>,
    table_types: Vec<RowType>,
    indexes: Vec<IndexId>,
}

impl GroupModel {
    /// Row types of this group's tables, in definition order.
    #[must_use]
    pub fn table_types(&self) -> &[RowType] {
        &self.table_types
    }

    /// Row type of the group table with the given ordinal.
    #[must_use]
    pub fn table_type_by_ordinal(&self, ordinal: u32) -> Option<&RowType> {
        self.table_types.iter().find(|row_type| {
            row_type
                .table_model()
                .is_some_and(|table| table.ordinal == ordinal)
        })
    }

    #[must_use]
    pub fn table_type(&self, table: TableId) -> Option<&RowType> {
        self.table_types.iter().find(|row_type| {
            row_type
                .table_model()
                .is_some_and(|model| model.id == table)
        })
    }

    #[must_use]
    pub fn indexes(&self) -> &[IndexId] {
        &self.indexes
    }
}

///
/// Schema
///
/// Immutable catalog plus the row types interned for it.
///

#[derive(Debug)]
pub struct Schema {
    tables: Vec<Arc<TableModel>>,
    table_types: Vec<RowType>,
    indexes: Vec<Arc<IndexModel>>,
    index_types: Vec<RowType>,
    groups: Vec<Arc<GroupModel>>,
}

impl Schema {
    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&Arc<TableModel>> {
        self.tables.get(id.0 as usize)
    }

    #[must_use]
    pub fn table_type(&self, id: TableId) -> Option<&RowType> {
        self.table_types.get(id.0 as usize)
    }

    #[must_use]
    pub fn index(&self, id: IndexId) -> Option<&Arc<IndexModel>> {
        self.indexes.get(id.0 as usize)
    }

    #[must_use]
    pub fn index_type(&self, id: IndexId) -> Option<&RowType> {
        self.index_types.get(id.0 as usize)
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Arc<GroupModel>> {
        self.groups.get(id.0 as usize)
    }

    #[must_use]
    pub fn tables(&self) -> &[Arc<TableModel>] {
        &self.tables
    }

    pub fn indexes_in_group(&self, group: GroupId) -> impl Iterator<Item = &Arc<IndexModel>> {
        self.indexes.iter().filter(move |index| index.group == group)
    }

    #[must_use]
    pub fn table_by_name(&self, name: &str) -> Option<&Arc<TableModel>> {
        self.tables.iter().find(|table| table.name == name)
    }
}

///
/// SchemaBuilder
///
/// Table ordinals are assigned in definition order, starting at 1.
///

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    groups: Vec<(String, Option<TableId>)>,
    tables: Vec<TableModel>,
    indexes: Vec<IndexModel>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&mut self, name: &str) -> Result<GroupId, SchemaError> {
        if self.groups.iter().any(|(existing, _)| existing == name) {
            return Err(SchemaError::DuplicateName {
                kind: "group",
                name: name.to_string(),
            });
        }
        let id = GroupId(index_u32("group", self.groups.len())?);
        self.groups.push((name.to_string(), None));

        Ok(id)
    }

    pub fn table(
        &mut self,
        group: GroupId,
        name: &str,
        columns: &[&str],
        primary_key: &[&str],
        parent: Option<ParentSpec<'_>>,
    ) -> Result<TableId, SchemaError> {
        if self.tables.iter().any(|table| table.name == name) {
            return Err(SchemaError::DuplicateName {
                kind: "table",
                name: name.to_string(),
            });
        }
        let group_name = self.group_name(group)?;
        let columns: Vec<String> = columns.iter().map(ToString::to_string).collect();
        if primary_key.is_empty() {
            return Err(SchemaError::EmptyPrimaryKey {
                table: name.to_string(),
            });
        }
        let primary_key = resolve_columns(name, &columns, primary_key)?;

        let id = TableId(index_u32("table", self.tables.len())?);
        let ordinal = index_u32("table", self.tables.len() + 1)?;
        let own = TablePathEntry {
            table: id,
            ordinal,
            pk_arity: primary_key.len(),
        };

        let (parent_id, join_columns, path) = match parent {
            None => {
                if let Some(root) = self.groups[group.0 as usize].1 {
                    return Err(SchemaError::MultipleRoots {
                        group: group_name,
                        root: self.tables[root.0 as usize].name.clone(),
                    });
                }
                self.groups[group.0 as usize].1 = Some(id);
                (None, Vec::new(), vec![own])
            }
            Some(spec) => {
                let parent_model = self.table_model(spec.table)?;
                if parent_model.group != group {
                    return Err(SchemaError::ParentInOtherGroup {
                        table: name.to_string(),
                    });
                }
                let join_columns = resolve_columns(name, &columns, spec.join_columns)?;
                if join_columns.len() != parent_model.primary_key.len() {
                    return Err(SchemaError::JoinArityMismatch {
                        table: name.to_string(),
                        expected: parent_model.primary_key.len(),
                        found: join_columns.len(),
                    });
                }
                let mut path = parent_model.path.clone();
                path.push(own);
                (Some(spec.table), join_columns, path)
            }
        };

        if path.len() > MAX_HKEY_DEPTH {
            return Err(SchemaError::TooDeep {
                table: name.to_string(),
                max: MAX_HKEY_DEPTH,
            });
        }

        self.tables.push(TableModel {
            id,
            name: name.to_string(),
            ordinal,
            group,
            columns,
            primary_key,
            parent: parent_id,
            join_columns,
            path,
        });

        Ok(id)
    }

    /// Declare an index over columns of one table.
    pub fn index(
        &mut self,
        name: &str,
        table: TableId,
        columns: &[&str],
        unique: bool,
    ) -> Result<IndexId, SchemaError> {
        let pairs: Vec<(TableId, &str)> = columns.iter().map(|column| (table, *column)).collect();

        self.push_index(name, &pairs, unique, None)
    }

    /// Declare a group index over columns from one root-to-leaf branch.
    pub fn group_index(
        &mut self,
        name: &str,
        columns: &[(TableId, &str)],
        join: IndexJoinType,
    ) -> Result<IndexId, SchemaError> {
        self.push_index(name, columns, false, Some(join))
    }

    pub fn build(self) -> Result<Arc<Schema>, SchemaError> {
        let registry = TypeRegistry::new();

        let tables: Vec<Arc<TableModel>> = self.tables.into_iter().map(Arc::new).collect();
        let table_types: Vec<RowType> = tables
            .iter()
            .map(|table| RowType::for_table(&registry, Arc::clone(table)))
            .collect();
        let indexes: Vec<Arc<IndexModel>> = self.indexes.into_iter().map(Arc::new).collect();
        let index_types: Vec<RowType> = indexes
            .iter()
            .map(|index| RowType::for_index(&registry, Arc::clone(index)))
            .collect();

        let groups: Vec<Arc<GroupModel>> = self
            .groups
            .into_iter()
            .enumerate()
            .map(|(position, (name, root))| -> Result<_, SchemaError> {
                let id = GroupId(index_u32("group", position)?);
                Ok(Arc::new(GroupModel {
                    id,
                    name,
                    root,
                    table_types: table_types
                        .iter()
                        .filter(|row_type| row_type.group() == Some(id))
                        .cloned()
                        .collect(),
                    indexes: indexes
                        .iter()
                        .filter(|index| index.group == id)
                        .map(|index| index.id)
                        .collect(),
                }))
            })
            .collect::<Result<_, SchemaError>>()?;

        Ok(Arc::new(Schema {
            tables,
            table_types,
            indexes,
            index_types,
            groups,
        }))
    }

    // Shared validation for table and group indexes.
    fn push_index(
        &mut self,
        name: &str,
        columns: &[(TableId, &str)],
        unique: bool,
        join: Option<IndexJoinType>,
    ) -> Result<IndexId, SchemaError> {
        if self.indexes.iter().any(|index| index.name == name) {
            return Err(SchemaError::DuplicateName {
                kind: "index",
                name: name.to_string(),
            });
        }
        if columns.is_empty() {
            return Err(SchemaError::EmptyIndex {
                index: name.to_string(),
            });
        }

        // The leaf is the deepest declared table; every other table must be
        // one of its ancestors.
        let mut leaf = self.table_model(columns[0].0)?;
        for (table, _) in columns {
            let candidate = self.table_model(*table)?;
            if candidate.depth() > leaf.depth() {
                leaf = candidate;
            }
        }
        let leaf = leaf.clone();

        let mut declared = Vec::with_capacity(columns.len());
        let mut column_names = Vec::with_capacity(columns.len());
        let mut branch_start = leaf.depth() - 1;
        for (table, column) in columns {
            let model = self.table_model(*table)?;
            let path_position = leaf
                .path
                .iter()
                .position(|entry| entry.table == *table)
                .ok_or_else(|| SchemaError::NotOneBranch {
                    index: name.to_string(),
                })?;
            let position = resolve_columns(&model.name, &model.columns, &[column])?[0];
            branch_start = branch_start.min(path_position);
            column_names.push(format!("{}.{}", model.name, model.columns[position]));
            declared.push(IndexColumn {
                table: *table,
                column: position,
                path_position,
            });
        }

        for entry in &leaf.path {
            let model = self.table_model(entry.table)?;
            for &pk in &model.primary_key {
                column_names.push(format!("hkey.{}.{}", model.name, model.columns[pk]));
            }
        }

        let kind = match join {
            None => IndexKind::Table,
            Some(join) => IndexKind::Group { join, branch_start },
        };
        let id = IndexId(index_u32("index", self.indexes.len())?);
        self.indexes.push(IndexModel {
            id,
            name: name.to_string(),
            group: leaf.group,
            kind,
            unique,
            columns: declared,
            path: leaf.path.clone(),
            column_names,
        });

        Ok(id)
    }

    fn table_model(&self, id: TableId) -> Result<&TableModel, SchemaError> {
        self.tables
            .get(id.0 as usize)
            .ok_or_else(|| SchemaError::UnknownName {
                kind: "table",
                name: id.to_string(),
            })
    }

    fn group_name(&self, id: GroupId) -> Result<String, SchemaError> {
        self.groups
            .get(id.0 as usize)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| SchemaError::UnknownName {
                kind: "group",
                name: id.to_string(),
            })
    }
}

fn resolve_columns(
    table: &str,
    columns: &[String],
    names: &[&str],
) -> Result<Vec<usize>, SchemaError> {
    names
        .iter()
        .map(|name| {
            columns
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| SchemaError::UnknownColumn {
                    table: table.to_string(),
                    column: (*name).to_string(),
                })
        })
        .collect()
}

pub(super) fn index_u32(kind: &'static str, position: usize) -> Result<u32, SchemaError> {
    u32::try_from(position).map_err(|_| SchemaError::TooMany { kind })
}
