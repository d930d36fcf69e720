mod union;

use crate::{
    db::{
        cursor::{ColumnSelector, Cursor, ExecContext, drain},
        direction::Direction,
        executor::{IntersectCursor, SortInsertionLimitedCursor},
        hkey::HKey,
        plan::{
            DuplicatePolicy, FlattenOption, IndexBound, IndexKeyRange, IndexOrdering,
            IndexScanSelector, IntersectOption, JoinType, Operator, SortOrdering,
        },
        row::{Row, RowType},
    },
    error::ErrorClass,
    model::TableId,
    test_fixtures::{CoiFixture, RowsCursor, render},
    value::Value,
};

fn scan(fx: &CoiFixture, tables: &[TableId]) -> Operator {
    let keep: Vec<RowType> = tables.iter().map(|table| fx.table_type(*table)).collect();
    let group_scan = Operator::group_scan(&fx.group()).expect("group scan should build");

    Operator::filter(group_scan, &keep).expect("filter should build")
}

fn run(fx: &CoiFixture, plan: &Operator) -> Vec<String> {
    render(&fx.db.execute(plan).expect("plan should execute"))
}

fn flatten_co(fx: &CoiFixture, join: JoinType, options: &[FlattenOption]) -> Operator {
    Operator::flatten(
        scan(fx, &[fx.customer, fx.order, fx.item]),
        &fx.table_type(fx.customer),
        &fx.table_type(fx.order),
        join,
        options,
    )
    .expect("flatten should build")
}

fn strings(rows: &[&str]) -> Vec<String> {
    rows.iter().map(ToString::to_string).collect()
}

//
// GroupScan / Filter
//

#[test]
fn group_scan_emits_rows_in_hkey_order_with_adopted_orphans() {
    let fx = CoiFixture::new();
    let plan = Operator::group_scan(&fx.group()).expect("group scan should build");
    let rows = fx.db.execute(&plan).expect("group scan should execute");

    assert_eq!(rows.len(), 5 + 8 + 11 + 1);
    let hkeys: Vec<&HKey> = rows.iter().map(|row| row.hkey().expect("hkey")).collect();
    assert!(hkeys.windows(2).all(|pair| pair[0] < pair[1]));

    let orphan_item = rows
        .iter()
        .find(|row| row.values().first() == Some(&Value::Int(311)))
        .expect("item 311 should be stored");
    let expected = HKey::new()
        .with_segment(1, [Value::Int(3)])
        .and_then(|hkey| hkey.with_segment(2, [Value::Int(31)]))
        .and_then(|hkey| hkey.with_segment(3, [Value::Int(311)]))
        .expect("hkey should build");
    assert_eq!(orphan_item.hkey(), Some(&expected));
}

#[test]
fn filter_keeps_only_listed_types() {
    let fx = CoiFixture::new();
    let rows = run(&fx, &scan(&fx, &[fx.address]));

    assert_eq!(rows, strings(&[r#"address(41, 4, "560 Harrison")"#]));
}

fn item_111(fx: &CoiFixture) -> Row {
    let hkey = HKey::new()
        .with_segment(1, [Value::Int(1)])
        .and_then(|hkey| hkey.with_segment(2, [Value::Int(11)]))
        .and_then(|hkey| hkey.with_segment(3, [Value::Int(111)]))
        .expect("hkey should build");

    Row::new(
        fx.table_type(fx.item),
        vec![Value::Int(111), Value::Int(11)],
        Some(hkey),
    )
}

fn next_rendered(cursor: &mut dyn Cursor) -> Option<String> {
    cursor
        .next()
        .expect("next should succeed")
        .as_ref()
        .map(ToString::to_string)
}

#[test]
fn group_scan_jump_resumes_at_selected_ancestor() {
    let fx = CoiFixture::new();
    let plan = Operator::group_scan(&fx.group()).expect("group scan should build");
    let mut cursor = plan.cursor(&fx.db.context());
    cursor.open().expect("open should succeed");
    let target = item_111(&fx);

    for (selector, expected) in [
        (ColumnSelector::All, "item(111, 11)"),
        (ColumnSelector::Prefix(3), "item(111, 11)"),
        (ColumnSelector::Prefix(2), r#"order(11, 1, "ori")"#),
        (ColumnSelector::Prefix(1), r#"customer(1, "northbridge")"#),
        (ColumnSelector::Prefix(0), r#"customer(1, "northbridge")"#),
    ] {
        cursor.jump(&target, selector).expect("jump should succeed");
        assert_eq!(
            next_rendered(cursor.as_mut()).as_deref(),
            Some(expected),
            "{selector:?}"
        );
    }

    while cursor.next().expect("next should succeed").is_some() {}
    cursor
        .jump(&target, ColumnSelector::Prefix(2))
        .expect("jump should reactivate an exhausted scan");
    assert_eq!(
        next_rendered(cursor.as_mut()).as_deref(),
        Some(r#"order(11, 1, "ori")"#)
    );

    cursor.close().expect("close should succeed");
}

#[test]
fn filter_forwards_jump_to_its_input() {
    let fx = CoiFixture::new();
    let mut cursor = scan(&fx, &[fx.order]).cursor(&fx.db.context());
    cursor.open().expect("open should succeed");
    let target = item_111(&fx);

    cursor
        .jump(&target, ColumnSelector::All)
        .expect("jump should succeed");
    assert_eq!(
        next_rendered(cursor.as_mut()).as_deref(),
        Some(r#"order(12, 1, "david")"#)
    );

    cursor
        .jump(&target, ColumnSelector::Prefix(1))
        .expect("jump should succeed");
    assert_eq!(
        next_rendered(cursor.as_mut()).as_deref(),
        Some(r#"order(11, 1, "ori")"#)
    );

    cursor.close().expect("close should succeed");
}

//
// Flatten
//

#[test]
fn flatten_inner_drops_childless_parents_and_orphans() {
    let fx = CoiFixture::new();
    let rows = run(&fx, &flatten_co(&fx, JoinType::Inner, &[]));

    assert_eq!(
        rows,
        strings(&[
            r#"flatten(customer, order)(1, "northbridge", 11, 1, "ori")"#,
            "item(111, 11)",
            "item(112, 11)",
            r#"flatten(customer, order)(1, "northbridge", 12, 1, "david")"#,
            "item(121, 12)",
            "item(122, 12)",
            r#"flatten(customer, order)(2, "foundation", 21, 2, "tom")"#,
            "item(211, 21)",
            "item(212, 21)",
            r#"flatten(customer, order)(2, "foundation", 22, 2, "jack")"#,
            "item(221, 22)",
            "item(222, 22)",
            "item(311, 31)",
            "item(312, 31)",
            r#"flatten(customer, order)(5, "matrix", 51, 5, "yuval")"#,
            r#"flatten(customer, order)(6, "nea", 61, 6, "mike")"#,
            r#"flatten(customer, order)(6, "nea", 62, 6, "padraig")"#,
            "item(621, 62)",
        ])
    );
}

#[test]
fn flatten_left_emits_childless_parent_before_next_parent() {
    let fx = CoiFixture::new();
    let rows = fx
        .db
        .execute(&flatten_co(&fx, JoinType::Left, &[]))
        .expect("flatten should execute");
    let rendered = render(&rows);

    let left_row = r#"flatten(customer, order)(4, "highland", NULL, NULL, NULL)"#;
    let position = rendered
        .iter()
        .position(|row| row == left_row)
        .expect("customer 4 should produce a left-join row");
    assert_eq!(rendered[position - 1], "item(312, 31)");
    assert_eq!(
        rendered[position + 1],
        r#"flatten(customer, order)(5, "matrix", 51, 5, "yuval")"#
    );
    assert!(!rendered.iter().any(|row| row.contains("peter")));

    let expected_hkey = HKey::new()
        .with_segment(1, [Value::Int(4)])
        .and_then(|hkey| hkey.with_segment(2, [Value::Null]))
        .expect("hkey should build");
    assert_eq!(rows[position].hkey(), Some(&expected_hkey));
}

#[test]
fn flatten_right_emits_orphans_with_null_parent() {
    let fx = CoiFixture::new();
    let rows = run(&fx, &flatten_co(&fx, JoinType::Right, &[]));

    let orphan = r#"flatten(customer, order)(NULL, NULL, 31, 3, "peter")"#;
    let position = rows
        .iter()
        .position(|row| row == orphan)
        .expect("order 31 should produce a right-join row");
    assert_eq!(rows[position + 1], "item(311, 31)");
    assert_eq!(rows[position + 2], "item(312, 31)");
    assert!(!rows.iter().any(|row| row.contains("highland")));
}

#[test]
fn flatten_full_keeping_both_sides_orders_inputs_before_joined_rows() {
    let fx = CoiFixture::new();
    let rows = run(
        &fx,
        &flatten_co(
            &fx,
            JoinType::Full,
            &[FlattenOption::KeepParent, FlattenOption::KeepChild],
        ),
    );

    assert_eq!(
        rows,
        strings(&[
            r#"customer(1, "northbridge")"#,
            r#"order(11, 1, "ori")"#,
            r#"flatten(customer, order)(1, "northbridge", 11, 1, "ori")"#,
            "item(111, 11)",
            "item(112, 11)",
            r#"order(12, 1, "david")"#,
            r#"flatten(customer, order)(1, "northbridge", 12, 1, "david")"#,
            "item(121, 12)",
            "item(122, 12)",
            r#"customer(2, "foundation")"#,
            r#"order(21, 2, "tom")"#,
            r#"flatten(customer, order)(2, "foundation", 21, 2, "tom")"#,
            "item(211, 21)",
            "item(212, 21)",
            r#"order(22, 2, "jack")"#,
            r#"flatten(customer, order)(2, "foundation", 22, 2, "jack")"#,
            "item(221, 22)",
            "item(222, 22)",
            r#"order(31, 3, "peter")"#,
            r#"flatten(customer, order)(NULL, NULL, 31, 3, "peter")"#,
            "item(311, 31)",
            "item(312, 31)",
            r#"customer(4, "highland")"#,
            r#"flatten(customer, order)(4, "highland", NULL, NULL, NULL)"#,
            r#"customer(5, "matrix")"#,
            r#"order(51, 5, "yuval")"#,
            r#"flatten(customer, order)(5, "matrix", 51, 5, "yuval")"#,
            r#"customer(6, "nea")"#,
            r#"order(61, 6, "mike")"#,
            r#"flatten(customer, order)(6, "nea", 61, 6, "mike")"#,
            r#"order(62, 6, "padraig")"#,
            r#"flatten(customer, order)(6, "nea", 62, 6, "padraig")"#,
            "item(621, 62)",
        ])
    );
}

#[test]
fn left_join_row_precedes_address_of_same_customer() {
    let fx = CoiFixture::new();
    let customer = fx.table_type(fx.customer);
    let address = fx.table_type(fx.address);
    let order = fx.table_type(fx.order);

    let ca = Operator::flatten(
        scan(&fx, &[fx.customer, fx.order, fx.address]),
        &customer,
        &address,
        JoinType::Inner,
        &[FlattenOption::KeepParent],
    )
    .expect("customer/address flatten should build");
    let plan = Operator::flatten(ca, &customer, &order, JoinType::Left, &[])
        .expect("customer/order flatten should build");

    assert_eq!(
        run(&fx, &plan),
        strings(&[
            r#"flatten(customer, order)(1, "northbridge", 11, 1, "ori")"#,
            r#"flatten(customer, order)(1, "northbridge", 12, 1, "david")"#,
            r#"flatten(customer, order)(2, "foundation", 21, 2, "tom")"#,
            r#"flatten(customer, order)(2, "foundation", 22, 2, "jack")"#,
            r#"flatten(customer, order)(4, "highland", NULL, NULL, NULL)"#,
            r#"flatten(customer, address)(4, "highland", 41, 4, "560 Harrison")"#,
            r#"flatten(customer, order)(5, "matrix", 51, 5, "yuval")"#,
            r#"flatten(customer, order)(6, "nea", 61, 6, "mike")"#,
            r#"flatten(customer, order)(6, "nea", 62, 6, "padraig")"#,
        ])
    );
}

#[test]
fn shortened_hkey_without_option_is_incompatible_row() {
    let fx = CoiFixture::new();
    let co = flatten_co(&fx, JoinType::Left, &[FlattenOption::LeftJoinShortensHKey]);
    let co_type = co.row_type().expect("flatten output type").clone();
    let plan = Operator::flatten(co, &co_type, &fx.table_type(fx.item), JoinType::Left, &[])
        .expect("second flatten should build");

    let err = fx
        .db
        .execute(&plan)
        .expect_err("shortened parent hkey should be rejected");

    assert_eq!(err.class, ErrorClass::IncompatibleRow);
    assert!(err.message.contains("LEFT_JOIN_SHORTENS_HKEY"));
}

#[test]
fn shortened_hkey_with_option_keeps_parent_hkey() {
    let fx = CoiFixture::new();
    let co = flatten_co(&fx, JoinType::Left, &[FlattenOption::LeftJoinShortensHKey]);
    let co_type = co.row_type().expect("flatten output type").clone();
    let plan = Operator::flatten(
        co,
        &co_type,
        &fx.table_type(fx.item),
        JoinType::Left,
        &[FlattenOption::LeftJoinShortensHKey],
    )
    .expect("second flatten should build");

    let rows = fx.db.execute(&plan).expect("consistent flattens should execute");
    let childless = rows
        .iter()
        .find(|row| row.values().first() == Some(&Value::Int(4)))
        .expect("customer 4 should survive both left joins");
    let customer_hkey = HKey::new()
        .with_segment(1, [Value::Int(4)])
        .expect("hkey should build");

    assert_eq!(childless.values().len(), 7);
    assert!(childless.values()[2..].iter().all(Value::is_null));
    assert_eq!(childless.hkey(), Some(&customer_hkey));
}

// INNER and RIGHT stages cannot be configured to shorten, so they take the
// shortened childless parent as an unmatched parent and drop it.
#[test]
fn inner_and_right_stages_drop_shortened_parents() {
    let fx = CoiFixture::new();
    let matched = [
        (Value::Int(1), 111),
        (Value::Int(1), 112),
        (Value::Int(1), 121),
        (Value::Int(1), 122),
        (Value::Int(2), 211),
        (Value::Int(2), 212),
        (Value::Int(2), 221),
        (Value::Int(2), 222),
    ];
    let orphans = [(Value::Null, 311), (Value::Null, 312)];
    let last = (Value::Int(6), 621);

    for (join, expected) in [
        (
            JoinType::Inner,
            matched.iter().chain([&last]).cloned().collect::<Vec<_>>(),
        ),
        (
            JoinType::Right,
            matched
                .iter()
                .chain(&orphans)
                .chain([&last])
                .cloned()
                .collect(),
        ),
    ] {
        let co = flatten_co(&fx, JoinType::Left, &[FlattenOption::LeftJoinShortensHKey]);
        let co_type = co.row_type().expect("flatten output type").clone();
        let plan = Operator::flatten(co, &co_type, &fx.table_type(fx.item), join, &[])
            .expect("second flatten should build");

        let rows = fx
            .db
            .execute(&plan)
            .expect("shortened parents are dropped, not rejected");
        let pairs: Vec<(Value, i64)> = rows
            .iter()
            .map(|row| {
                (
                    row.values()[0].clone(),
                    row.values()[5].as_int().expect("item id"),
                )
            })
            .collect();

        assert_eq!(pairs, expected, "{join:?}");
        assert!(rows.iter().all(|row| row.values()[0] != Value::Int(4)));
    }
}

#[test]
fn flatten_rejects_jump() {
    let fx = CoiFixture::new();
    let mut cursor = flatten_co(&fx, JoinType::Inner, &[]).cursor(&fx.db.context());
    cursor.open().expect("open should succeed");
    let target = cursor.next().expect("next").expect("first row");

    let err = cursor
        .jump(&target, Default::default())
        .expect_err("flatten is not jump-addressable");
    assert_eq!(err.class, ErrorClass::Unsupported);
    cursor.close().expect("close should succeed");
}

//
// AncestorLookup
//

#[test]
fn ancestor_lookup_skips_missing_ancestors() {
    let fx = CoiFixture::new();
    let item = fx.table_type(fx.item);
    let plan = Operator::ancestor_lookup(
        scan(&fx, &[fx.item]),
        &fx.group(),
        &item,
        &[fx.table_type(fx.order), fx.table_type(fx.customer)],
        true,
    )
    .expect("ancestor lookup should build");
    let rows = run(&fx, &plan);

    assert_eq!(
        rows[..3],
        strings(&[
            r#"customer(1, "northbridge")"#,
            r#"order(11, 1, "ori")"#,
            "item(111, 11)",
        ])
    );
    let orphan = rows
        .iter()
        .position(|row| row == "item(311, 31)")
        .expect("item 311 should be emitted");
    assert_eq!(rows[orphan - 1], r#"order(31, 3, "peter")"#);
    assert_eq!(rows[orphan - 2], "item(222, 22)");
}

//
// BranchLookup
//

#[test]
fn branch_lookup_streams_child_branches_after_their_parent() {
    let fx = CoiFixture::new();
    let plan = Operator::branch_lookup(
        scan(&fx, &[fx.customer, fx.address]),
        &fx.group(),
        &fx.table_type(fx.customer),
        &fx.table_type(fx.order),
        true,
    )
    .expect("branch lookup should build");

    assert_eq!(
        run(&fx, &plan),
        strings(&[
            r#"customer(1, "northbridge")"#,
            r#"order(11, 1, "ori")"#,
            "item(111, 11)",
            "item(112, 11)",
            r#"order(12, 1, "david")"#,
            "item(121, 12)",
            "item(122, 12)",
            r#"customer(2, "foundation")"#,
            r#"order(21, 2, "tom")"#,
            "item(211, 21)",
            "item(212, 21)",
            r#"order(22, 2, "jack")"#,
            "item(221, 22)",
            "item(222, 22)",
            r#"customer(4, "highland")"#,
            r#"address(41, 4, "560 Harrison")"#,
            r#"customer(5, "matrix")"#,
            r#"order(51, 5, "yuval")"#,
            r#"customer(6, "nea")"#,
            r#"order(61, 6, "mike")"#,
            r#"order(62, 6, "padraig")"#,
            "item(621, 62)",
        ])
    );
}

#[test]
fn branch_lookup_reads_orphan_branches_without_their_root() {
    let fx = CoiFixture::new();
    let salesman = fx.index_type(fx.order_salesman);
    let peter = IndexBound::prefix(vec!["peter".into()]);
    let index_scan = Operator::index_scan(
        &salesman,
        IndexKeyRange::bounded(peter.clone(), true, peter, true),
        IndexOrdering::ascending(1),
        IndexScanSelector::All,
    )
    .expect("index scan should build");
    let lookup = |output: TableId| {
        let plan = Operator::branch_lookup(
            index_scan.clone(),
            &fx.group(),
            &salesman,
            &fx.table_type(output),
            false,
        )
        .expect("branch lookup should build");
        run(&fx, &plan)
    };

    // customer 3 was never stored; its orphaned order still forms its branch
    assert_eq!(
        lookup(fx.customer),
        strings(&[r#"order(31, 3, "peter")"#, "item(311, 31)", "item(312, 31)"])
    );
    assert_eq!(
        lookup(fx.item),
        strings(&["item(311, 31)", "item(312, 31)"])
    );
}

#[test]
fn branch_lookup_places_kept_input_after_an_ancestor_branch() {
    let fx = CoiFixture::new();
    let plan = Operator::branch_lookup(
        scan(&fx, &[fx.order]),
        &fx.group(),
        &fx.table_type(fx.order),
        &fx.table_type(fx.customer),
        true,
    )
    .expect("branch lookup should build");
    let rows = run(&fx, &plan);

    // order 51 has no items: customer 5's branch, then the order itself
    let position = rows
        .iter()
        .position(|row| row == r#"customer(5, "matrix")"#)
        .expect("customer 5 should be emitted");
    assert_eq!(
        rows[position..position + 3],
        strings(&[
            r#"customer(5, "matrix")"#,
            r#"order(51, 5, "yuval")"#,
            r#"order(51, 5, "yuval")"#,
        ])
    );
    assert!(!rows.iter().any(|row| row.starts_with("address")));
    assert_eq!(rows.first().map(String::as_str), Some(r#"customer(1, "northbridge")"#));
}

#[test]
fn branch_lookup_rejects_jump() {
    let fx = CoiFixture::new();
    let plan = Operator::branch_lookup(
        scan(&fx, &[fx.customer]),
        &fx.group(),
        &fx.table_type(fx.customer),
        &fx.table_type(fx.order),
        false,
    )
    .expect("branch lookup should build");
    let mut cursor = plan.cursor(&fx.db.context());
    cursor.open().expect("open");

    let target = cursor.next().expect("next").expect("first row");
    let err = cursor
        .jump(&target, ColumnSelector::All)
        .expect_err("branch lookup is not jump-addressable");
    assert_eq!(err.class, ErrorClass::Unsupported);
    cursor.close().expect("close should succeed");
}

//
// Sort
//

#[test]
fn sort_tree_restarts_identically_and_releases_scratch() {
    let fx = CoiFixture::new();
    let order = fx.table_type(fx.order);
    let plan = Operator::sort_tree(
        scan(&fx, &[fx.order]),
        &order,
        SortOrdering::asc(2),
        DuplicatePolicy::Preserve,
    )
    .expect("sort should build");

    let mut cursor = plan.cursor(&fx.db.context());
    let first = drain(cursor.as_mut()).expect("first drain");
    for _ in 0..10 {
        let again = drain(cursor.as_mut()).expect("repeat drain");
        assert_eq!(again, first);
    }

    let salesmen: Vec<&str> = first
        .iter()
        .filter_map(|row| row.value(2).and_then(Value::as_text))
        .collect();
    assert_eq!(
        salesmen,
        ["david", "jack", "mike", "ori", "padraig", "peter", "tom", "yuval"]
    );
    assert_eq!(
        fx.db.store().scratch_tree_count().expect("scratch count"),
        0
    );
}

#[test]
fn sort_tree_duplicate_policies() {
    let fx = CoiFixture::new();
    let order = fx.table_type(fx.order);
    let oids = |policy, ordering| {
        let plan = Operator::sort_tree(scan(&fx, &[fx.order]), &order, ordering, policy)
            .expect("sort should build");
        fx.db
            .execute(&plan)
            .expect("sort should execute")
            .iter()
            .filter_map(|row| row.value(0).and_then(Value::as_int))
            .collect::<Vec<_>>()
    };

    assert_eq!(
        oids(DuplicatePolicy::Suppress, SortOrdering::asc(1)),
        [11, 21, 31, 51, 61]
    );
    assert_eq!(
        oids(DuplicatePolicy::Preserve, SortOrdering::desc(1)),
        [61, 62, 51, 31, 21, 22, 11, 12]
    );
}

#[test]
fn sort_close_mid_stream_releases_scratch() {
    let fx = CoiFixture::new();
    let order = fx.table_type(fx.order);
    let plan = Operator::sort_tree(
        scan(&fx, &[fx.order]),
        &order,
        SortOrdering::asc(0),
        DuplicatePolicy::Preserve,
    )
    .expect("sort should build");

    let mut cursor = plan.cursor(&fx.db.context());
    cursor.open().expect("open should succeed");
    assert_eq!(fx.db.store().scratch_tree_count().expect("count"), 1);
    cursor.next().expect("next should succeed");
    cursor.close().expect("close should succeed");
    cursor.close().expect("second close is a no-op");

    assert_eq!(fx.db.store().scratch_tree_count().expect("count"), 0);
}

fn insertion_limited(
    fx: &CoiFixture,
    rows: Vec<Row>,
    ordering: SortOrdering,
    policy: DuplicatePolicy,
    limit: usize,
) -> Vec<Row> {
    let order = fx.table_type(fx.order);
    let plan = Operator::sort_insertion_limited(
        scan(fx, &[fx.order]),
        &order,
        ordering,
        policy,
        limit,
        fx.db.config(),
    )
    .expect("sort should build");
    let Operator::SortInsertionLimited(plan) = plan else {
        panic!("expected insertion-limited sort plan");
    };

    let mut cursor = SortInsertionLimitedCursor::new(&plan, Box::new(RowsCursor::new(rows)));
    drain(&mut cursor).expect("sort should execute")
}

fn order_row(fx: &CoiFixture, oid: i64, cid: i64, salesman: &str) -> Row {
    Row::new(
        fx.table_type(fx.order),
        vec![Value::Int(oid), Value::Int(cid), salesman.into()],
        None,
    )
}

#[test]
fn insertion_limited_keeps_smallest_rows_with_stable_ties() {
    let fx = CoiFixture::new();
    let rows = vec![
        order_row(&fx, 1, 3, "a"),
        order_row(&fx, 2, 1, "b"),
        order_row(&fx, 3, 2, "c"),
        order_row(&fx, 4, 1, "d"),
        order_row(&fx, 5, 0, "e"),
    ];

    let preserved = insertion_limited(
        &fx,
        rows.clone(),
        SortOrdering::asc(1),
        DuplicatePolicy::Preserve,
        3,
    );
    let suppressed = insertion_limited(
        &fx,
        rows.clone(),
        SortOrdering::asc(1),
        DuplicatePolicy::Suppress,
        3,
    );
    let empty = insertion_limited(&fx, rows, SortOrdering::asc(1), DuplicatePolicy::Preserve, 0);

    let oids = |rows: &[Row]| {
        rows.iter()
            .filter_map(|row| row.value(0).and_then(Value::as_int))
            .collect::<Vec<_>>()
    };
    assert_eq!(oids(&preserved), [5, 2, 4]);
    assert_eq!(oids(&suppressed), [5, 2, 3]);
    assert!(empty.is_empty());
}

#[test]
fn sort_rejects_rows_of_another_type() {
    let fx = CoiFixture::new();
    let stray = Row::new(
        fx.table_type(fx.item),
        vec![Value::Int(1), Value::Int(2)],
        None,
    );

    let order = fx.table_type(fx.order);
    let plan = Operator::sort_insertion_limited(
        scan(&fx, &[fx.order]),
        &order,
        SortOrdering::asc(0),
        DuplicatePolicy::Preserve,
        5,
        fx.db.config(),
    )
    .expect("sort should build");
    let Operator::SortInsertionLimited(plan) = plan else {
        panic!("expected insertion-limited sort plan");
    };
    let mut cursor = SortInsertionLimitedCursor::new(&plan, Box::new(RowsCursor::new(vec![stray])));

    let err = drain(&mut cursor).expect_err("foreign row type should be rejected");
    assert!(err.is_incompatible_row());
}

//
// Intersect
//

#[test]
fn intersect_detects_out_of_order_input() {
    let fx = CoiFixture::new();
    let index_type = fx.index_type(fx.name_oid_left);
    let index_scan = || {
        Operator::index_scan(
            &index_type,
            IndexKeyRange::unbounded(),
            IndexOrdering::ascending(1),
            IndexScanSelector::All,
        )
        .expect("index scan should build")
    };
    let plan = Operator::intersect_ordered(
        index_scan(),
        index_scan(),
        &index_type,
        &index_type,
        3,
        3,
        &[Direction::Asc],
        1,
        JoinType::Inner,
        &[IntersectOption::OutputLeft, IntersectOption::SequentialScan],
    )
    .expect("intersect should build");
    let Operator::IntersectOrdered(plan) = plan else {
        panic!("expected intersect plan");
    };

    let entry = |cid: i64| {
        Row::new(
            index_type.clone(),
            vec![
                Value::Null,
                Value::Null,
                Value::Int(cid),
                Value::Null,
                Value::Null,
            ],
            None,
        )
    };
    let left = RowsCursor::new(vec![entry(2), entry(1)]);
    let right = RowsCursor::new(vec![entry(1), entry(2), entry(3)]);
    let ctx: ExecContext = fx.db.context();
    let mut cursor = IntersectCursor::new(&plan, Box::new(left), Box::new(right), &ctx);

    let err = drain(&mut cursor).expect_err("left input goes backwards");
    assert!(err.is_incompatible_row());
}
