use crate::{
    error::InternalError,
    model::{GroupId, IndexModel, TableModel},
};
use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering as AtomicOrdering},
    },
};

///
/// RowTypeId
///
/// Per-schema identity of one row type.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RowTypeId(u32);

impl RowTypeId {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

///
/// TypeRegistry
///
/// Per-schema id allocator and flattened-type intern table. Holds ids only,
/// so row types referencing the registry never form an ownership cycle.
///

#[derive(Debug, Default)]
pub(crate) struct TypeRegistry {
    next_id: AtomicU32,
    flattened: Mutex<HashMap<(RowTypeId, RowTypeId), RowTypeId>>,
}

impl TypeRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn allocate(&self) -> RowTypeId {
        RowTypeId(self.next_id.fetch_add(1, AtomicOrdering::Relaxed))
    }

    fn flattened_id(&self, parent: RowTypeId, child: RowTypeId) -> Result<RowTypeId, InternalError> {
        let mut interned = self
            .flattened
            .lock()
            .map_err(|_| InternalError::planner_invalid("row type registry lock poisoned"))?;

        Ok(*interned
            .entry((parent, child))
            .or_insert_with(|| self.allocate()))
    }
}

///
/// RowTypeKind
///

#[derive(Clone)]
pub enum RowTypeKind {
    Table(Arc<TableModel>),
    Index(Arc<IndexModel>),
    Flattened { parent: RowType, child: RowType },
}

///
/// RowType
///
/// Immutable schema descriptor for rows. Cheap to clone; equality is
/// interned identity within one schema.
///

#[derive(Clone)]
pub struct RowType(Arc<RowTypeInner>);

struct RowTypeInner {
    id: RowTypeId,
    name: String,
    columns: Vec<String>,
    kind: RowTypeKind,
    registry: Arc<TypeRegistry>,
}

impl RowType {
    pub(crate) fn for_table(registry: &Arc<TypeRegistry>, table: Arc<TableModel>) -> Self {
        Self(Arc::new(RowTypeInner {
            id: registry.allocate(),
            name: table.name.clone(),
            columns: table.columns.clone(),
            kind: RowTypeKind::Table(table),
            registry: Arc::clone(registry),
        }))
    }

    pub(crate) fn for_index(registry: &Arc<TypeRegistry>, index: Arc<IndexModel>) -> Self {
        Self(Arc::new(RowTypeInner {
            id: registry.allocate(),
            name: index.name.clone(),
            columns: index.row_column_names(),
            kind: RowTypeKind::Index(index),
            registry: Arc::clone(registry),
        }))
    }

    /// Interned flattened type of `(self, child)`.
    ///
    /// The same pair always yields an identical (equal) row type.
    pub fn flattened_with(&self, child: &Self) -> Result<Self, InternalError> {
        if !self.same_schema(child) {
            return Err(InternalError::planner_invalid(format!(
                "cannot flatten row types from different schemas: {} and {}",
                self.name(),
                child.name()
            )));
        }
        let id = self.0.registry.flattened_id(self.id(), child.id())?;
        let mut columns = self.0.columns.clone();
        columns.extend(child.0.columns.iter().cloned());

        Ok(Self(Arc::new(RowTypeInner {
            id,
            name: format!("flatten({}, {})", self.name(), child.name()),
            columns,
            kind: RowTypeKind::Flattened {
                parent: self.clone(),
                child: child.clone(),
            },
            registry: Arc::clone(&self.0.registry),
        })))
    }

    #[must_use]
    pub fn id(&self) -> RowTypeId {
        self.0.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.0.columns
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.0.columns.len()
    }

    #[must_use]
    pub fn kind(&self) -> &RowTypeKind {
        &self.0.kind
    }

    #[must_use]
    pub fn table_model(&self) -> Option<&Arc<TableModel>> {
        match self.kind() {
            RowTypeKind::Table(table) => Some(table),
            _ => None,
        }
    }

    #[must_use]
    pub fn index_model(&self) -> Option<&Arc<IndexModel>> {
        match self.kind() {
            RowTypeKind::Index(index) => Some(index),
            _ => None,
        }
    }

    /// Table whose hkey rows of this type carry.
    ///
    /// A flattened row carries its child's hkey. Index rows have none.
    #[must_use]
    pub fn hkey_table(&self) -> Option<&Arc<TableModel>> {
        match self.kind() {
            RowTypeKind::Table(table) => Some(table),
            RowTypeKind::Index(_) => None,
            RowTypeKind::Flattened { child, .. } => child.hkey_table(),
        }
    }

    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        match self.kind() {
            RowTypeKind::Table(table) => Some(table.group),
            RowTypeKind::Index(index) => Some(index.group),
            RowTypeKind::Flattened { child, .. } => child.group(),
        }
    }

    pub(crate) fn same_schema(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0.registry, &other.0.registry)
    }
}

impl PartialEq for RowType {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id() && self.same_schema(other)
    }
}

impl Eq for RowType {}

impl Hash for RowType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowType({}#{})", self.name(), self.id().get())
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
