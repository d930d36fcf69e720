use crate::{
    db::{
        Database,
        cursor::{ColumnSelector, Cursor},
        direction::Direction,
        plan::{IndexBound, IndexKeyRange, IndexOrdering, IndexScanSelector, Operator},
        row::{Row, RowType},
        store::MemoryStore,
    },
    model::SchemaBuilder,
    obs::{OperatorKind, metrics_report, metrics_reset_all},
    value::Value,
};
use std::sync::Arc;

///
/// Pairs
///
/// t(id, a, b) for ids 1..=12 with a = id % 2 and b = id % 3, indexed on
/// (a, b). Index rows read (a, b, id); each scan fixes a.
///

struct Pairs {
    db: Database,
    index_type: RowType,
}

impl Pairs {
    fn new() -> Self {
        let mut builder = SchemaBuilder::new();
        let group = builder.group("t").expect("group");
        let t = builder
            .table(group, "t", &["id", "a", "b"], &["id"], None)
            .expect("table");
        let idx_ab = builder.index("idx_ab", t, &["a", "b"], false).expect("idx_ab");
        let schema = builder.build().expect("schema");
        let index_type = schema.index_type(idx_ab).expect("idx_ab type").clone();

        let db = Database::new(schema, Arc::new(MemoryStore::new()));
        db.writer()
            .insert_all(
                t,
                (1..=12).map(|id| vec![Value::Int(id), Value::Int(id % 2), Value::Int(id % 3)]),
            )
            .expect("insert");

        Self { db, index_type }
    }

    fn scan(&self, a: i64, b: Direction, id: Direction) -> Operator {
        let point = IndexBound::prefix(vec![Value::Int(a)]);

        Operator::index_scan(
            &self.index_type,
            IndexKeyRange::bounded(point.clone(), true, point, true),
            IndexOrdering::new(vec![Direction::Asc, b, id]),
            IndexScanSelector::All,
        )
        .expect("index scan should build")
    }

    fn union(&self, sides: (i64, i64), directions: &[Direction], output_equal: bool) -> Operator {
        let b = directions.first().copied().unwrap_or_default();
        let id = directions.get(1).copied().unwrap_or(b);

        Operator::union_ordered(
            self.scan(sides.0, b, id),
            self.scan(sides.1, b, id),
            &self.index_type,
            &self.index_type,
            2,
            2,
            directions,
            output_equal,
        )
        .expect("union should build")
    }

    fn ids(&self, plan: &Operator) -> Vec<i64> {
        ids(&self.db.execute(plan).expect("union should execute"))
    }
}

fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .map(|row| row.value(2).and_then(Value::as_int).expect("id column"))
        .collect()
}

#[test]
fn union_merges_disjoint_inputs_in_stream_order() {
    let pairs = Pairs::new();
    let asc = Direction::Asc;
    let desc = Direction::Desc;

    assert_eq!(
        pairs.ids(&pairs.union((0, 1), &[asc, asc], false)),
        [3, 6, 9, 12, 1, 4, 7, 10, 2, 5, 8, 11]
    );
    assert_eq!(
        pairs.ids(&pairs.union((0, 1), &[desc, desc], false)),
        [11, 8, 5, 2, 10, 7, 4, 1, 12, 9, 6, 3]
    );
    assert_eq!(
        pairs.ids(&pairs.union((0, 1), &[asc, desc], false)),
        [12, 9, 6, 3, 10, 7, 4, 1, 11, 8, 5, 2]
    );
}

#[test]
fn union_emits_equal_rows_once_unless_asked_for_both() {
    let pairs = Pairs::new();
    let both = [Direction::Asc, Direction::Asc];

    assert_eq!(
        pairs.ids(&pairs.union((0, 0), &both, false)),
        [6, 12, 4, 10, 2, 8]
    );
    assert_eq!(
        pairs.ids(&pairs.union((0, 0), &both, true)),
        [6, 6, 12, 12, 4, 4, 10, 10, 2, 2, 8, 8]
    );
}

#[test]
fn union_compares_only_the_leading_fields() {
    let pairs = Pairs::new();

    // on b alone, each left row absorbs the right row it ties with
    assert_eq!(
        pairs.ids(&pairs.union((0, 1), &[Direction::Asc], false)),
        [6, 12, 4, 10, 2, 8]
    );
    // ties go to the left side first
    assert_eq!(
        pairs.ids(&pairs.union((0, 1), &[Direction::Asc], true)),
        [6, 12, 3, 9, 4, 10, 1, 7, 2, 8, 5, 11]
    );
}

#[test]
fn union_jump_repositions_both_inputs() {
    let pairs = Pairs::new();
    let plan = pairs.union((0, 0), &[Direction::Asc, Direction::Asc], false);
    let mut cursor = plan.cursor(&pairs.db.context());
    cursor.open().expect("open");

    let first = cursor.next().expect("next").expect("first row");
    assert_eq!(ids(&[first]), [6]);

    let target = Row::new(
        pairs.index_type.clone(),
        vec![Value::Int(0), Value::Int(1), Value::Null],
        None,
    );
    cursor.jump(&target, ColumnSelector::Prefix(2)).expect("jump");

    let mut rest = Vec::new();
    while let Some(row) = cursor.next().expect("next") {
        rest.push(row);
    }
    assert_eq!(ids(&rest), [4, 10, 2, 8]);

    cursor.close().expect("close");
}

#[test]
fn union_close_reaches_both_inputs() {
    let pairs = Pairs::new();
    let plan = pairs.union((0, 1), &[Direction::Asc, Direction::Asc], false);

    metrics_reset_all();
    let mut cursor = plan.cursor(&pairs.db.context());
    cursor.open().expect("open");
    cursor.next().expect("next").expect("first row");
    cursor.close().expect("close");

    let report = metrics_report();
    let closed = |kind: OperatorKind| {
        report
            .operators
            .get(kind.label())
            .map_or(0, |operator| operator.closed)
    };
    assert_eq!(closed(OperatorKind::UnionOrdered), 1);
    assert_eq!(closed(OperatorKind::IndexScan), 2);
}
