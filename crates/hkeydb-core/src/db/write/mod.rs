//! Module: db::write
//! Responsibility: row insertion and the derived state it keeps consistent.
//! Does not own: reads (see `executor`) or schema validation (see `model`).
//! Boundary: the only code that mutates group, primary-key, and index trees.

mod group_index;


use crate::{
    config::ExecConfig,
    db::{
        codec::encode_values,
        data::{StoredIndexEntry, StoredRow},
        direction::Direction,
        hkey::HKey,
        row::RowType,
        store::{KeyValueStore, StoreEntry, TreeId, owned_bound_ref, prefix_envelope},
    },
    error::InternalError,
    model::{IndexModel, Schema, TableId, TableModel, TablePathEntry},
    serialize::{deserialize, serialize},
    value::Value,
};
use std::{iter, ops::Bound, sync::Arc};

///
/// Writer
///
/// Inserts rows into their group tree under a derived hkey.
///
/// Each insert also maintains the table's primary-key map, its table index
/// entries, and every group index of the group. A child whose parent is not
/// stored yet is an orphan: its parent segment carries the foreign key and
/// every higher segment is NULL-keyed. When the parent arrives, its orphans
/// (and their subtrees) are re-keyed under it.
///

#[derive(Clone)]
pub struct Writer {
    schema: Arc<Schema>,
    store: Arc<dyn KeyValueStore>,
    config: Arc<ExecConfig>,
}

impl Writer {
    #[must_use]
    pub fn new(schema: Arc<Schema>, store: Arc<dyn KeyValueStore>, config: Arc<ExecConfig>) -> Self {
        Self {
            schema,
            store,
            config,
        }
    }

    /// Insert one row and return the hkey it was stored under.
    pub fn insert(&self, table: TableId, values: Vec<Value>) -> Result<HKey, InternalError> {
        let table = self.table(table)?;
        let hkey = self.insert_row(table, values)?;
        group_index::rebuild(&self.schema, self.store.as_ref(), table.group)?;

        Ok(hkey)
    }

    /// Insert rows in order, stopping at the first error.
    ///
    /// Group indexes are rebuilt once for the whole batch, including the
    /// rows stored before a failing one.
    pub fn insert_all(
        &self,
        table: TableId,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Result<(), InternalError> {
        let table = self.table(table)?;

        let mut stored = false;
        let mut outcome = Ok(());
        for values in rows {
            match self.insert_row(table, values) {
                Ok(_) => stored = true,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        if stored {
            group_index::rebuild(&self.schema, self.store.as_ref(), table.group)?;
        }

        outcome
    }

    // Everything an insert maintains except group indexes.
    fn insert_row(&self, table: &TableModel, values: Vec<Value>) -> Result<HKey, InternalError> {
        self.validate_row(table, &values)?;

        let pk = table.pk_values(&values);
        let pk_key = encode_values(&pk);
        if self.store.get(TreeId::PrimaryKey(table.id), &pk_key)?.is_some() {
            return Err(InternalError::write_conflict(format!(
                "duplicate primary key {pk:?} in {}",
                table.name
            )));
        }

        let hkey = self.derive_hkey(table, &values, pk)?;
        let table_indexes = self.table_indexes(table);
        for index in &table_indexes {
            self.check_unique(index, &values)?;
        }

        self.put_row(table, &pk_key, &hkey, values.clone())?;
        for index in &table_indexes {
            self.put_index_entry(index, &values, &hkey)?;
        }
        self.adopt_orphans(table, &hkey)?;

        Ok(hkey)
    }

    /// Stored hkey of the row with primary key `pk`, if any.
    pub fn stored_hkey(&self, table: TableId, pk: &[Value]) -> Result<Option<HKey>, InternalError> {
        self.store
            .get(TreeId::PrimaryKey(table), &encode_values(pk))?
            .map(|bytes| decode_hkey(&bytes))
            .transpose()
    }

    fn table(&self, id: TableId) -> Result<&Arc<TableModel>, InternalError> {
        self.schema
            .table(id)
            .ok_or_else(|| InternalError::write_invalid(format!("unknown table {id}")))
    }

    fn validate_row(&self, table: &TableModel, values: &[Value]) -> Result<(), InternalError> {
        if values.len() != table.columns.len() {
            return Err(InternalError::write_invalid(format!(
                "{} row has {} values, expected {}",
                table.name,
                values.len(),
                table.columns.len()
            )));
        }
        if table.depth() > self.config.max_hkey_depth {
            return Err(InternalError::write_invalid(format!(
                "{} is {} levels deep, configured maximum is {}",
                table.name,
                table.depth(),
                self.config.max_hkey_depth
            )));
        }
        if table
            .primary_key
            .iter()
            .any(|&column| values[column].is_null())
        {
            return Err(InternalError::write_invalid(format!(
                "{} primary key contains NULL",
                table.name
            )));
        }

        Ok(())
    }

    // Parent hkey plus own segment; orphans get the foreign key as their
    // parent segment and NULL-keyed segments above it.
    fn derive_hkey(
        &self,
        table: &TableModel,
        values: &[Value],
        pk: Vec<Value>,
    ) -> Result<HKey, InternalError> {
        let Some(parent_id) = table.parent else {
            return Ok(HKey::new().with_segment(table.ordinal, pk)?);
        };
        let parent = self.table(parent_id)?;
        let parent_key = table.parent_key_values(values);

        let mut hkey = match self.stored_hkey(parent_id, &parent_key)? {
            Some(parent_hkey) => parent_hkey,
            None => {
                let mut hkey = null_path(&parent.path[..parent.depth() - 1])?;
                hkey.push_segment(parent.ordinal, parent_key)?;
                hkey
            }
        };
        hkey.push_segment(table.ordinal, pk)?;

        Ok(hkey)
    }

    fn table_indexes(&self, table: &TableModel) -> Vec<Arc<IndexModel>> {
        self.schema
            .indexes_in_group(table.group)
            .filter(|index| {
                !index.is_group_index() && index.leaf().is_some_and(|leaf| leaf.table == table.id)
            })
            .cloned()
            .collect()
    }

    // A unique entry conflicts with any entry sharing its declared values,
    // unless one of them is NULL.
    fn check_unique(&self, index: &IndexModel, values: &[Value]) -> Result<(), InternalError> {
        if !index.unique {
            return Ok(());
        }
        let declared = declared_values(index, values);
        if declared.iter().any(Value::is_null) {
            return Ok(());
        }

        let (lower, upper) = prefix_envelope(&encode_values(&declared));
        let existing = self.store.seek(
            TreeId::Index(index.id),
            owned_bound_ref(&lower),
            owned_bound_ref(&upper),
            Direction::Asc,
        )?;
        if existing.is_some() {
            return Err(InternalError::write_conflict(format!(
                "duplicate key {declared:?} in unique index {}",
                index.name
            )));
        }

        Ok(())
    }

    fn put_row(
        &self,
        table: &TableModel,
        pk_key: &[u8],
        hkey: &HKey,
        values: Vec<Value>,
    ) -> Result<(), InternalError> {
        let stored = StoredRow {
            hkey: Some(hkey.clone()),
            values,
        };
        self.store
            .put(TreeId::Group(table.group), hkey.to_bytes(), stored.encode()?)?;
        self.store
            .put(TreeId::PrimaryKey(table.id), pk_key.to_vec(), serialize(hkey)?)?;

        Ok(())
    }

    fn put_index_entry(
        &self,
        index: &IndexModel,
        values: &[Value],
        hkey: &HKey,
    ) -> Result<(), InternalError> {
        let (key, entry) = table_index_entry(index, values, hkey);
        self.store.put(TreeId::Index(index.id), key, entry.encode()?)?;

        Ok(())
    }

    fn remove_index_entry(
        &self,
        index: &IndexModel,
        values: &[Value],
        hkey: &HKey,
    ) -> Result<(), InternalError> {
        let (key, _) = table_index_entry(index, values, hkey);
        self.store.remove(TreeId::Index(index.id), &key)?;

        Ok(())
    }

    // Re-key every row stored under the orphan form of `hkey`.
    fn adopt_orphans(&self, table: &TableModel, hkey: &HKey) -> Result<(), InternalError> {
        let mut orphan_prefix = null_path(&table.path[..table.depth() - 1])?;
        let own = hkey.segment(table.depth() - 1).map(|segment| segment.values.to_vec());
        orphan_prefix.push_segment(table.ordinal, own.unwrap_or_default())?;
        if orphan_prefix == *hkey {
            return Ok(());
        }

        let tree = TreeId::Group(table.group);
        let orphans = self.scan_prefix(tree, &orphan_prefix.to_bytes())?;
        for (old_key, bytes) in orphans {
            let stored = StoredRow::decode(&bytes)?;
            let Some(old_hkey) = stored.hkey else {
                return Err(InternalError::store_invariant(format!(
                    "{tree} row stored without hkey"
                )));
            };
            let mut new_hkey = hkey.clone();
            for segment in old_hkey.segments().skip(table.depth()) {
                new_hkey.push_segment(segment.ordinal, segment.values.iter().cloned())?;
            }

            let row_table = old_hkey
                .last_ordinal()
                .and_then(|ordinal| self.schema.group(table.group)?.table_type_by_ordinal(ordinal))
                .and_then(RowType::table_model)
                .ok_or_else(|| {
                    InternalError::store_invariant(format!(
                        "{tree} row hkey {old_hkey} names no table"
                    ))
                })?;

            self.store.remove(tree, &old_key)?;
            let pk_key = encode_values(&row_table.pk_values(&stored.values));
            self.put_row(row_table, &pk_key, &new_hkey, stored.values.clone())?;
            for index in self.table_indexes(row_table) {
                self.remove_index_entry(&index, &stored.values, &old_hkey)?;
                self.put_index_entry(&index, &stored.values, &new_hkey)?;
            }
        }

        Ok(())
    }

    fn scan_prefix(&self, tree: TreeId, prefix: &[u8]) -> Result<Vec<StoreEntry>, InternalError> {
        let (mut lower, upper) = prefix_envelope(prefix);
        let mut entries = Vec::new();

        while let Some((key, value)) = self.store.seek(
            tree,
            owned_bound_ref(&lower),
            owned_bound_ref(&upper),
            Direction::Asc,
        )? {
            lower = Bound::Excluded(key.clone());
            entries.push((key, value));
        }

        Ok(entries)
    }
}

// NULL-keyed hkey over the given path entries.
fn null_path(entries: &[TablePathEntry]) -> Result<HKey, InternalError> {
    let mut hkey = HKey::new();
    for entry in entries {
        hkey.push_segment(entry.ordinal, iter::repeat_n(Value::Null, entry.pk_arity))?;
    }

    Ok(hkey)
}

fn declared_values(index: &IndexModel, values: &[Value]) -> Vec<Value> {
    index
        .columns
        .iter()
        .map(|column| values.get(column.column).cloned().unwrap_or(Value::Null))
        .collect()
}

fn table_index_entry(index: &IndexModel, values: &[Value], hkey: &HKey) -> (Vec<u8>, StoredIndexEntry) {
    let mut row = declared_values(index, values);
    row.extend(index.completion_values(hkey));

    (
        encode_values(&row),
        StoredIndexEntry {
            values: row,
            owner_depth: hkey.depth(),
            first_present: 0,
        },
    )
}

fn decode_hkey(bytes: &[u8]) -> Result<HKey, InternalError> {
    deserialize(bytes)
        .map_err(|err| InternalError::store_corruption(format!("undecodable stored hkey: {err}")))
}
