use crate::{
    db::{
        codec::encode_values,
        data::{StoredIndexEntry, StoredRow},
        direction::Direction,
        hkey::HKey,
        store::{KeyValueStore, TreeId, owned_bound_ref},
    },
    error::InternalError,
    model::{GroupId, IndexJoinType, IndexKind, IndexModel, Schema},
    value::Value,
};
use std::{collections::BTreeMap, ops::Bound};

/// One stored row: its hkey and column values.
type GroupRow = (HKey, Vec<Value>);

/// Stored rows of one group keyed by hkey bytes.
type GroupRows = BTreeMap<Vec<u8>, GroupRow>;

/// Clear and repopulate every group index of `group`.
pub(super) fn rebuild(
    schema: &Schema,
    store: &dyn KeyValueStore,
    group: GroupId,
) -> Result<(), InternalError> {
    let indexes: Vec<_> = schema
        .indexes_in_group(group)
        .filter(|index| index.is_group_index())
        .collect();
    if indexes.is_empty() {
        return Ok(());
    }

    let rows = load_group(store, group)?;
    for index in indexes {
        let IndexKind::Group { join, branch_start } = index.kind else {
            continue;
        };
        let entries = match join {
            IndexJoinType::Left => left_entries(index, branch_start, &rows),
            IndexJoinType::Right => right_entries(index, branch_start, &rows),
        };

        let tree = TreeId::Index(index.id);
        store.clear_tree(tree)?;
        for entry in entries {
            store.put(tree, encode_values(&entry.values), entry.encode()?)?;
        }
    }

    Ok(())
}

fn load_group(store: &dyn KeyValueStore, group: GroupId) -> Result<GroupRows, InternalError> {
    let tree = TreeId::Group(group);
    let mut rows = GroupRows::new();
    let mut lower: Bound<Vec<u8>> = Bound::Unbounded;

    while let Some((key, bytes)) =
        store.seek(tree, owned_bound_ref(&lower), Bound::Unbounded, Direction::Asc)?
    {
        let stored = StoredRow::decode(&bytes)?;
        let hkey = stored.hkey.ok_or_else(|| {
            InternalError::store_invariant(format!("{tree} row stored without hkey"))
        })?;
        rows.insert(key.clone(), (hkey, stored.values));
        lower = Bound::Excluded(key);
    }

    Ok(rows)
}

// Row of the path table at `position` stored exactly at `hkey`'s prefix.
fn path_row<'a>(
    index: &IndexModel,
    rows: &'a GroupRows,
    hkey: &HKey,
    position: usize,
) -> Option<&'a GroupRow> {
    let prefix = hkey.prefix(position + 1).ok()?;
    let row = rows.get(&prefix.to_bytes())?;
    (row.0.last_ordinal() == Some(index.path[position].ordinal)).then_some(row)
}

// Rows of the path table at `position` that are children of `parent`.
fn children<'a>(
    index: &IndexModel,
    rows: &'a GroupRows,
    parent: &'a HKey,
    position: usize,
) -> impl Iterator<Item = &'a GroupRow> {
    let ordinal = index.path[position].ordinal;
    rows.range(parent.to_bytes()..)
        .map(|(_, row)| row)
        .take_while(move |(hkey, _)| parent.is_prefix_of(hkey))
        .filter(move |(hkey, _)| hkey.depth() == position + 1 && hkey.last_ordinal() == Some(ordinal))
}

// One entry per maximal parent-to-child chain starting at the branch root.
fn left_entries(
    index: &IndexModel,
    branch_start: usize,
    rows: &GroupRows,
) -> Vec<StoredIndexEntry> {
    let root_ordinal = index.path[branch_start].ordinal;
    let mut entries = Vec::new();
    let mut stack: Vec<Vec<&GroupRow>> = rows
        .values()
        .filter(|(hkey, _)| hkey.depth() == branch_start + 1 && hkey.last_ordinal() == Some(root_ordinal))
        .map(|row| vec![row])
        .rev()
        .collect();

    while let Some(chain) = stack.pop() {
        let position = branch_start + chain.len() - 1;
        let Some(&deepest) = chain.last() else {
            continue;
        };

        let mut extended: Vec<_> = if position + 1 < index.path.len() {
            children(index, rows, &deepest.0, position + 1)
                .map(|child| {
                    let mut next = chain.clone();
                    next.push(child);
                    next
                })
                .collect()
        } else {
            Vec::new()
        };

        if extended.is_empty() {
            entries.push(group_entry(index, branch_start, &chain, deepest));
        } else {
            extended.reverse();
            stack.extend(extended);
        }
    }

    entries
}

// One entry per leaf row, with ancestors present up to the first gap.
fn right_entries(
    index: &IndexModel,
    branch_start: usize,
    rows: &GroupRows,
) -> Vec<StoredIndexEntry> {
    let leaf_position = index.path.len() - 1;
    let leaf_ordinal = index.path[leaf_position].ordinal;

    rows.values()
        .filter(|(hkey, _)| hkey.depth() == leaf_position + 1 && hkey.last_ordinal() == Some(leaf_ordinal))
        .map(|leaf| {
            let mut chain = vec![leaf];
            for position in (branch_start..leaf_position).rev() {
                match path_row(index, rows, &leaf.0, position) {
                    Some(row) => chain.push(row),
                    None => break,
                }
            }
            chain.reverse();
            let first_present = leaf_position + 1 - chain.len();

            group_entry(index, first_present, &chain, leaf)
        })
        .collect()
}

// Index entry for a contiguous chain of path rows starting at `first_present`
// and ending at `owner`.
fn group_entry(
    index: &IndexModel,
    first_present: usize,
    chain: &[&GroupRow],
    owner: &GroupRow,
) -> StoredIndexEntry {
    let mut values: Vec<Value> = index
        .columns
        .iter()
        .map(|column| {
            column
                .path_position
                .checked_sub(first_present)
                .and_then(|offset| chain.get(offset))
                .and_then(|(_, row)| row.get(column.column).cloned())
                .unwrap_or(Value::Null)
        })
        .collect();
    values.extend(index.completion_values(&owner.0));

    StoredIndexEntry {
        values,
        owner_depth: owner.0.depth(),
        first_present,
    }
}
