pub(crate) mod codec;
pub mod cursor;
pub(crate) mod data;
pub mod direction;
pub(crate) mod executor;
pub mod hkey;
pub mod plan;
pub mod row;
pub mod store;
pub mod write;

use crate::{
    config::ExecConfig,
    db::{
        cursor::{ExecContext, drain},
        plan::Operator,
        row::Row,
        store::KeyValueStore,
        write::Writer,
    },
    error::InternalError,
    model::Schema,
};
use std::sync::Arc;

///
/// Database
///
/// A handle binding one schema to one store.
///
/// The `Database` is the entry point for writing rows and for running
/// operator plans against the same storage.
///

#[derive(Clone)]
pub struct Database {
    schema: Arc<Schema>,
    store: Arc<dyn KeyValueStore>,
    config: Arc<ExecConfig>,
}

impl Database {
    #[must_use]
    pub fn new(schema: Arc<Schema>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(schema, store, ExecConfig::default())
    }

    #[must_use]
    pub fn with_config(
        schema: Arc<Schema>,
        store: Arc<dyn KeyValueStore>,
        config: ExecConfig,
    ) -> Self {
        Self {
            schema,
            store,
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &Arc<ExecConfig> {
        &self.config
    }

    #[must_use]
    pub fn writer(&self) -> Writer {
        Writer::new(
            Arc::clone(&self.schema),
            Arc::clone(&self.store),
            Arc::clone(&self.config),
        )
    }

    #[must_use]
    pub fn context(&self) -> ExecContext {
        ExecContext::new(Arc::clone(&self.store), Arc::clone(&self.config))
    }

    /// Run `plan` to completion and collect its rows.
    pub fn execute(&self, plan: &Operator) -> Result<Vec<Row>, InternalError> {
        let mut cursor = plan.cursor(&self.context());

        drain(cursor.as_mut())
    }
}
