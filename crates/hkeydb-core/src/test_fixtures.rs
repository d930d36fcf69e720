//! Shared unit-test fixtures: the customer/order/item/address group and a
//! cursor over a fixed row list.

use crate::{
    db::{
        Database,
        cursor::{ColumnSelector, Cursor, CursorState},
        row::{Row, RowType},
        store::MemoryStore,
    },
    error::InternalError,
    model::{GroupModel, IndexId, IndexJoinType, ParentSpec, SchemaBuilder, TableId},
    value::Value,
};
use std::sync::Arc;

///
/// CoiFixture
///
/// customer(cid, name) → order(oid, cid, salesman) → item(iid, oid), plus
/// address(aid, cid, address) under customer. Customer 3 is missing, so
/// order 31 and its items are orphans.
///

pub(crate) struct CoiFixture {
    pub(crate) db: Database,
    pub(crate) customer: TableId,
    pub(crate) order: TableId,
    pub(crate) item: TableId,
    pub(crate) address: TableId,
    pub(crate) name_oid_left: IndexId,
    pub(crate) order_salesman: IndexId,
}

impl CoiFixture {
    pub(crate) fn new() -> Self {
        let mut builder = SchemaBuilder::new();
        let group = builder.group("coi").expect("group should register");
        let customer = builder
            .table(group, "customer", &["cid", "name"], &["cid"], None)
            .expect("customer should register");
        let order = builder
            .table(
                group,
                "order",
                &["oid", "cid", "salesman"],
                &["oid"],
                Some(ParentSpec {
                    table: customer,
                    join_columns: &["cid"],
                }),
            )
            .expect("order should register");
        let item = builder
            .table(
                group,
                "item",
                &["iid", "oid"],
                &["iid"],
                Some(ParentSpec {
                    table: order,
                    join_columns: &["oid"],
                }),
            )
            .expect("item should register");
        let address = builder
            .table(
                group,
                "address",
                &["aid", "cid", "address"],
                &["aid"],
                Some(ParentSpec {
                    table: customer,
                    join_columns: &["cid"],
                }),
            )
            .expect("address should register");
        let name_oid_left = builder
            .group_index(
                "name_oid_left",
                &[(customer, "name"), (item, "oid")],
                IndexJoinType::Left,
            )
            .expect("group index should register");
        let order_salesman = builder
            .index("order_salesman", order, &["salesman"], false)
            .expect("table index should register");
        let schema = builder.build().expect("schema should build");

        let fixture = Self {
            db: Database::new(schema, Arc::new(MemoryStore::new())),
            customer,
            order,
            item,
            address,
            name_oid_left,
            order_salesman,
        };
        fixture.load();

        fixture
    }

    fn load(&self) {
        let writer = self.db.writer();
        let customers = [
            (1, "northbridge"),
            (2, "foundation"),
            (4, "highland"),
            (5, "matrix"),
            (6, "nea"),
        ];
        let orders = [
            (11, 1, "ori"),
            (12, 1, "david"),
            (21, 2, "tom"),
            (22, 2, "jack"),
            (31, 3, "peter"),
            (51, 5, "yuval"),
            (61, 6, "mike"),
            (62, 6, "padraig"),
        ];
        let items = [
            (111, 11),
            (112, 11),
            (121, 12),
            (122, 12),
            (211, 21),
            (212, 21),
            (221, 22),
            (222, 22),
            (311, 31),
            (312, 31),
            (621, 62),
        ];

        for (cid, name) in customers {
            writer
                .insert(self.customer, vec![Value::Int(cid), name.into()])
                .expect("customer insert should succeed");
        }
        for (oid, cid, salesman) in orders {
            writer
                .insert(
                    self.order,
                    vec![Value::Int(oid), Value::Int(cid), salesman.into()],
                )
                .expect("order insert should succeed");
        }
        for (iid, oid) in items {
            writer
                .insert(self.item, vec![Value::Int(iid), Value::Int(oid)])
                .expect("item insert should succeed");
        }
        writer
            .insert(
                self.address,
                vec![Value::Int(41), Value::Int(4), "560 Harrison".into()],
            )
            .expect("address insert should succeed");
    }

    pub(crate) fn group(&self) -> Arc<GroupModel> {
        let customer = self.db.schema().table(self.customer).expect("customer table");
        Arc::clone(self.db.schema().group(customer.group).expect("group"))
    }

    pub(crate) fn table_type(&self, table: TableId) -> RowType {
        self.db
            .schema()
            .table_type(table)
            .expect("table type")
            .clone()
    }

    pub(crate) fn index_type(&self, index: IndexId) -> RowType {
        self.db
            .schema()
            .index_type(index)
            .expect("index type")
            .clone()
    }
}

/// Render rows with their type name, e.g. `customer(1, "northbridge")`.
pub(crate) fn render(rows: &[Row]) -> Vec<String> {
    rows.iter().map(ToString::to_string).collect()
}

///
/// RowsCursor
///
/// Cursor over a fixed row list; rejects `jump`.
///

pub(crate) struct RowsCursor {
    rows: Vec<Row>,
    position: usize,
    state: CursorState,
}

impl RowsCursor {
    pub(crate) const fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            position: 0,
            state: CursorState::Closed,
        }
    }
}

impl Cursor for RowsCursor {
    fn open(&mut self) -> Result<(), InternalError> {
        if self.state.is_open() {
            return Err(InternalError::executor_invariant("rows cursor already open"));
        }
        self.position = 0;
        self.state = CursorState::Idle;

        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>, InternalError> {
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
            self.state = CursorState::Active;
        } else {
            self.state = CursorState::Idle;
        }

        Ok(row)
    }

    fn jump(&mut self, _target: &Row, _selector: ColumnSelector) -> Result<(), InternalError> {
        Err(InternalError::executor_unsupported("rows cursor does not jump"))
    }

    fn close(&mut self) -> Result<(), InternalError> {
        self.state = CursorState::Closed;

        Ok(())
    }

    fn state(&self) -> CursorState {
        self.state
    }
}
