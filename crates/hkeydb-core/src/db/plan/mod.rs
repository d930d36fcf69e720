//! Module: db::plan
//! Responsibility: the closed operator algebra and its construction-time validation.
//! Does not own: execution (see `executor`) or storage access.
//! Boundary: every `Operator` value is valid; cursors never re-check plan shape.

mod error;
mod options;
mod ordering;
mod range;


use crate::{
    config::ExecConfig,
    db::{
        cursor::{Cursor, ExecContext},
        direction::Direction,
        executor::{
            AncestorLookupCursor, BranchLookupCursor, FilterCursor, FlattenCursor,
            GroupScanCursor, IndexScanCursor, IntersectCursor, SortInsertionLimitedCursor,
            SortTreeCursor, UnionCursor,
        },
        row::{RowType, RowTypeKind},
    },
    model::{GroupModel, IndexModel, TableModel},
};
use std::sync::Arc;

// re-exports
pub use error::PlanError;
pub use options::{DuplicatePolicy, FlattenOption, IndexScanSelector, IntersectOption, JoinType};
pub use ordering::{IndexOrdering, SortOrdering};
pub(crate) use ordering::compare_directed;
pub use range::{IndexBound, IndexKeyRange};

///
/// Operator
///
/// Validated physical plan node. Inputs are owned, so a plan is a tree.
///

#[derive(Clone, Debug)]
pub enum Operator {
    GroupScan(GroupScanPlan),
    IndexScan(IndexScanPlan),
    Filter(FilterPlan),
    Flatten(FlattenPlan),
    IntersectOrdered(IntersectPlan),
    UnionOrdered(UnionPlan),
    AncestorLookup(AncestorLookupPlan),
    BranchLookup(BranchLookupPlan),
    SortTree(SortPlan),
    SortInsertionLimited(SortPlan),
}

///
/// GroupScanPlan
///

#[derive(Clone, Debug)]
pub struct GroupScanPlan {
    pub(crate) group: Arc<GroupModel>,
}

///
/// IndexScanPlan
///

#[derive(Clone, Debug)]
pub struct IndexScanPlan {
    pub(crate) index_type: RowType,
    pub(crate) index: Arc<IndexModel>,
    pub(crate) range: IndexKeyRange,
    pub(crate) ordering: IndexOrdering,
    /// Path position a selected table must be present at.
    pub(crate) selected_position: Option<usize>,
}

///
/// FilterPlan
///

#[derive(Clone, Debug)]
pub struct FilterPlan {
    pub(crate) input: Box<Operator>,
    pub(crate) keep_types: Vec<RowType>,
}

///
/// FlattenPlan
///

#[derive(Clone, Debug)]
pub struct FlattenPlan {
    pub(crate) input: Box<Operator>,
    pub(crate) parent_type: RowType,
    pub(crate) child_type: RowType,
    pub(crate) output_type: RowType,
    pub(crate) join_type: JoinType,
    pub(crate) keep_parent: bool,
    pub(crate) keep_child: bool,
    pub(crate) shortens_hkey: bool,
}

///
/// IntersectSide
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntersectSide {
    Left,
    Right,
}

impl IntersectSide {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

///
/// IntersectPlan
///

#[derive(Clone, Debug)]
pub struct IntersectPlan {
    pub(crate) left: Box<Operator>,
    pub(crate) right: Box<Operator>,
    pub(crate) left_type: RowType,
    pub(crate) right_type: RowType,
    pub(crate) left_ordering_columns: usize,
    pub(crate) right_ordering_columns: usize,
    pub(crate) directions: Vec<Direction>,
    pub(crate) comparison_fields: usize,
    pub(crate) join_type: JoinType,
    pub(crate) output: IntersectSide,
    pub(crate) skip_scan: bool,
}

///
/// UnionPlan
///

#[derive(Clone, Debug)]
pub struct UnionPlan {
    pub(crate) left: Box<Operator>,
    pub(crate) right: Box<Operator>,
    pub(crate) row_type: RowType,
    pub(crate) ordering_columns: usize,
    /// One direction per compared field.
    pub(crate) directions: Vec<Direction>,
    pub(crate) output_equal: bool,
}

///
/// AncestorLookupPlan
///

#[derive(Clone, Debug)]
pub struct AncestorLookupPlan {
    pub(crate) input: Box<Operator>,
    pub(crate) group: Arc<GroupModel>,
    pub(crate) input_type: RowType,
    /// Ancestor types, shallowest first.
    pub(crate) ancestor_types: Vec<RowType>,
    pub(crate) keep_input: bool,
}

///
/// BranchLookupPlan
///
/// The branch root is the output table. `common_depth` is the depth of the
/// deepest table shared by the input's and the output's paths; the root is
/// either that table or one of its children (`branch_ordinal`).
///

#[derive(Clone, Debug)]
pub struct BranchLookupPlan {
    pub(crate) input: Box<Operator>,
    pub(crate) group: Arc<GroupModel>,
    pub(crate) input_type: RowType,
    pub(crate) common_depth: usize,
    pub(crate) branch_ordinal: Option<u32>,
    pub(crate) keep_input: bool,
    pub(crate) input_precedes_branch: bool,
}

///
/// SortPlan
///

#[derive(Clone, Debug)]
pub struct SortPlan {
    pub(crate) input: Box<Operator>,
    pub(crate) row_type: RowType,
    pub(crate) ordering: SortOrdering,
    pub(crate) policy: DuplicatePolicy,
    /// Only used by the insertion-limited sort.
    pub(crate) limit: usize,
}

impl Operator {
    pub fn group_scan(group: &Arc<GroupModel>) -> Result<Self, PlanError> {
        if group.root.is_none() {
            return Err(PlanError::EmptyGroup {
                group: group.name.clone(),
            });
        }

        Ok(Self::GroupScan(GroupScanPlan {
            group: Arc::clone(group),
        }))
    }

    pub fn index_scan(
        index_type: &RowType,
        range: IndexKeyRange,
        ordering: IndexOrdering,
        selector: IndexScanSelector,
    ) -> Result<Self, PlanError> {
        let index = index_model(index_type).ok_or_else(|| PlanError::NotIndexType {
            row_type: index_type.name().to_string(),
        })?;
        let width = index.row_width();

        if range.max_width() > width {
            return Err(PlanError::BoundTooWide {
                width: range.max_width(),
                max: width,
            });
        }
        if ordering.is_empty() || ordering.len() > width {
            return Err(PlanError::OrderingWidth {
                len: ordering.len(),
                max: width,
            });
        }

        let selected_position = match selector {
            IndexScanSelector::All => None,
            IndexScanSelector::Table(table) => {
                if !index.is_group_index() {
                    return Err(PlanError::SelectorRequiresGroupIndex {
                        index: index.name.clone(),
                    });
                }
                let position =
                    index
                        .path_position(table)
                        .ok_or_else(|| PlanError::SelectorTableNotOnPath {
                            table: table.to_string(),
                            index: index.name.clone(),
                        })?;
                Some(position)
            }
        };

        Ok(Self::IndexScan(IndexScanPlan {
            index_type: index_type.clone(),
            index,
            range,
            ordering,
            selected_position,
        }))
    }

    pub fn filter(input: Self, keep_types: &[RowType]) -> Result<Self, PlanError> {
        if keep_types.is_empty() {
            return Err(PlanError::EmptyKeepTypes);
        }

        Ok(Self::Filter(FilterPlan {
            input: Box::new(input),
            keep_types: keep_types.to_vec(),
        }))
    }

    pub fn flatten(
        input: Self,
        parent_type: &RowType,
        child_type: &RowType,
        join_type: JoinType,
        options: &[FlattenOption],
    ) -> Result<Self, PlanError> {
        let parent_table = flatten_side_table(parent_type, "parent")?;
        let child_table = flatten_side_table(child_type, "child")?;

        if parent_table.group != child_table.group {
            return Err(PlanError::FlattenGroupMismatch {
                parent: parent_type.name().to_string(),
                child: child_type.name().to_string(),
            });
        }
        if !parent_table.is_ancestor_of(child_table) {
            return Err(PlanError::FlattenNotAncestor {
                parent: parent_type.name().to_string(),
                child: child_type.name().to_string(),
            });
        }

        let shortens_hkey = options.contains(&FlattenOption::LeftJoinShortensHKey);
        if shortens_hkey && !join_type.keeps_left() {
            return Err(PlanError::ShortensHKeyRequiresLeftJoin { join: join_type });
        }

        let output_type =
            parent_type
                .flattened_with(child_type)
                .map_err(|_| PlanError::ForeignRowType {
                    left: parent_type.name().to_string(),
                    right: child_type.name().to_string(),
                })?;

        Ok(Self::Flatten(FlattenPlan {
            input: Box::new(input),
            parent_type: parent_type.clone(),
            child_type: child_type.clone(),
            output_type,
            join_type,
            keep_parent: options.contains(&FlattenOption::KeepParent),
            keep_child: options.contains(&FlattenOption::KeepChild),
            shortens_hkey,
        }))
    }

    #[expect(clippy::too_many_arguments)]
    pub fn intersect_ordered(
        left: Self,
        right: Self,
        left_type: &RowType,
        right_type: &RowType,
        left_ordering_columns: usize,
        right_ordering_columns: usize,
        directions: &[Direction],
        comparison_fields: usize,
        join_type: JoinType,
        options: &[IntersectOption],
    ) -> Result<Self, PlanError> {
        let left_index = intersect_input_index(left_type, "left")?;
        let right_index = intersect_input_index(right_type, "right")?;

        if left_index.group != right_index.group {
            return Err(PlanError::IntersectGroupMismatch {
                left: left_type.name().to_string(),
                right: right_type.name().to_string(),
            });
        }
        if !left_type.same_schema(right_type) {
            return Err(PlanError::ForeignRowType {
                left: left_type.name().to_string(),
                right: right_type.name().to_string(),
            });
        }
        for (side, columns, width) in [
            ("left", left_ordering_columns, left_type.width()),
            ("right", right_ordering_columns, right_type.width()),
        ] {
            if columns > width {
                return Err(PlanError::OrderingColumnsExceedWidth {
                    side,
                    columns,
                    width,
                });
            }
        }
        let max_fields = left_ordering_columns.min(right_ordering_columns);
        if comparison_fields > max_fields {
            return Err(PlanError::ComparisonFieldsExceedOrdering {
                fields: comparison_fields,
                max: max_fields,
            });
        }
        if directions.len() != comparison_fields {
            return Err(PlanError::DirectionCountMismatch {
                directions: directions.len(),
                fields: comparison_fields,
            });
        }
        if join_type == JoinType::Full {
            return Err(PlanError::IntersectFullJoin);
        }

        let output = match (
            options.contains(&IntersectOption::OutputLeft),
            options.contains(&IntersectOption::OutputRight),
        ) {
            (true, false) => IntersectSide::Left,
            (false, true) => IntersectSide::Right,
            _ => return Err(PlanError::IntersectOutputSide),
        };
        let join_matches_output = match join_type {
            JoinType::Left => output == IntersectSide::Left,
            JoinType::Right => output == IntersectSide::Right,
            JoinType::Inner | JoinType::Full => true,
        };
        if !join_matches_output {
            return Err(PlanError::IntersectJoinOutputMismatch { join: join_type });
        }

        let skip_scan = match (
            options.contains(&IntersectOption::SequentialScan),
            options.contains(&IntersectOption::SkipScan),
        ) {
            (true, false) => false,
            (false, true) => true,
            _ => return Err(PlanError::IntersectScanMode),
        };

        Ok(Self::IntersectOrdered(IntersectPlan {
            left: Box::new(left),
            right: Box::new(right),
            left_type: left_type.clone(),
            right_type: right_type.clone(),
            left_ordering_columns,
            right_ordering_columns,
            directions: directions.to_vec(),
            comparison_fields,
            join_type,
            output,
            skip_scan,
        }))
    }

    pub fn ancestor_lookup(
        input: Self,
        group: &Arc<GroupModel>,
        input_type: &RowType,
        ancestor_types: &[RowType],
        keep_input: bool,
    ) -> Result<Self, PlanError> {
        if ancestor_types.is_empty() {
            return Err(PlanError::EmptyAncestorTypes);
        }

        // Index inputs may look up their own table; table inputs only
        // proper ancestors.
        let (input_table, allow_self) = match input_type.kind() {
            RowTypeKind::Index(index) => {
                let leaf = index
                    .leaf()
                    .and_then(|entry| group.table_type(entry.table))
                    .and_then(RowType::table_model);
                (leaf.cloned(), true)
            }
            _ => (input_type.hkey_table().cloned(), false),
        };
        let input_table = input_table.ok_or_else(|| PlanError::NotAncestor {
            ancestor: ancestor_types[0].name().to_string(),
            input: input_type.name().to_string(),
        })?;

        let mut sorted = Vec::with_capacity(ancestor_types.len());
        for ancestor_type in ancestor_types {
            let ancestor = ancestor_type
                .table_model()
                .filter(|table| table.group == group.id)
                .ok_or_else(|| PlanError::AncestorNotInGroup {
                    row_type: ancestor_type.name().to_string(),
                    group: group.name.clone(),
                })?;
            let is_self = ancestor.id == input_table.id;
            if !(ancestor.is_ancestor_of(&input_table) || (allow_self && is_self)) {
                return Err(PlanError::NotAncestor {
                    ancestor: ancestor_type.name().to_string(),
                    input: input_type.name().to_string(),
                });
            }
            if is_self && keep_input {
                return Err(PlanError::AncestorSelfWithKeepInput {
                    ancestor: ancestor_type.name().to_string(),
                });
            }
            sorted.push((ancestor.depth(), ancestor_type.clone()));
        }
        sorted.sort_by_key(|(depth, _)| *depth);

        Ok(Self::AncestorLookup(AncestorLookupPlan {
            input: Box::new(input),
            group: Arc::clone(group),
            input_type: input_type.clone(),
            ancestor_types: sorted.into_iter().map(|(_, row_type)| row_type).collect(),
            keep_input,
        }))
    }

    /// Merge two streams of one index row type, both ordered on their last
    /// `ordering_columns` columns. The first `directions.len()` of those
    /// columns are compared; equal rows are emitted once unless
    /// `output_equal` asks for both.
    #[expect(clippy::too_many_arguments)]
    pub fn union_ordered(
        left: Self,
        right: Self,
        left_type: &RowType,
        right_type: &RowType,
        left_ordering_columns: usize,
        right_ordering_columns: usize,
        directions: &[Direction],
        output_equal: bool,
    ) -> Result<Self, PlanError> {
        for (side, row_type) in [("left", left_type), ("right", right_type)] {
            if index_model(row_type).is_none() {
                return Err(PlanError::UnionInputNotIndex {
                    side,
                    row_type: row_type.name().to_string(),
                });
            }
        }
        if left_type != right_type {
            return Err(PlanError::UnionTypeMismatch {
                left: left_type.name().to_string(),
                right: right_type.name().to_string(),
            });
        }
        if left_ordering_columns != right_ordering_columns {
            return Err(PlanError::UnionOrderingMismatch {
                left: left_ordering_columns,
                right: right_ordering_columns,
            });
        }
        let width = left_type.width();
        if left_ordering_columns > width {
            return Err(PlanError::OrderingColumnsExceedWidth {
                side: "left",
                columns: left_ordering_columns,
                width,
            });
        }
        if directions.len() > left_ordering_columns {
            return Err(PlanError::ComparisonFieldsExceedOrdering {
                fields: directions.len(),
                max: left_ordering_columns,
            });
        }

        Ok(Self::UnionOrdered(UnionPlan {
            left: Box::new(left),
            right: Box::new(right),
            row_type: left_type.clone(),
            ordering_columns: left_ordering_columns,
            directions: directions.to_vec(),
            output_equal,
        }))
    }

    /// Retrieve, for each input row of `input_type`, the branch rooted at
    /// the related `output_type` row. The output table must be an ancestor
    /// of the input's table or a child of one of its ancestors.
    pub fn branch_lookup(
        input: Self,
        group: &Arc<GroupModel>,
        input_type: &RowType,
        output_type: &RowType,
        keep_input: bool,
    ) -> Result<Self, PlanError> {
        if input_type == output_type {
            return Err(PlanError::BranchLookupSelf {
                row_type: output_type.name().to_string(),
            });
        }
        let output_table = output_type
            .table_model()
            .filter(|table| table.group == group.id)
            .ok_or_else(|| PlanError::BranchNotInGroup {
                side: "output",
                row_type: output_type.name().to_string(),
                group: group.name.clone(),
            })?;

        let input_table = match input_type.kind() {
            RowTypeKind::Index(index) => {
                if keep_input {
                    return Err(PlanError::BranchKeepIndexInput {
                        row_type: input_type.name().to_string(),
                    });
                }
                index
                    .leaf()
                    .and_then(|entry| group.table_type(entry.table))
                    .and_then(RowType::table_model)
            }
            _ => input_type.hkey_table(),
        };
        let input_table = input_table
            .filter(|table| table.group == group.id)
            .ok_or_else(|| PlanError::BranchNotInGroup {
                side: "input",
                row_type: input_type.name().to_string(),
                group: group.name.clone(),
            })?;

        let common_depth = input_table
            .path
            .iter()
            .zip(&output_table.path)
            .take_while(|(from_input, from_output)| from_input.table == from_output.table)
            .count();
        let branch_ordinal = match output_table.depth() - common_depth {
            0 => None,
            1 => Some(output_table.ordinal),
            _ => {
                return Err(PlanError::BranchNotReachable {
                    output: output_type.name().to_string(),
                    input: input_type.name().to_string(),
                });
            }
        };
        // A kept input row precedes the branch when its own line of descent
        // from the shared ancestor sorts before the branch root.
        let input_precedes_branch = branch_ordinal.is_some_and(|ordinal| {
            input_table
                .path
                .get(common_depth)
                .is_none_or(|entry| entry.ordinal < ordinal)
        });

        Ok(Self::BranchLookup(BranchLookupPlan {
            input: Box::new(input),
            group: Arc::clone(group),
            input_type: input_type.clone(),
            common_depth,
            branch_ordinal,
            keep_input,
            input_precedes_branch,
        }))
    }

    pub fn sort_tree(
        input: Self,
        row_type: &RowType,
        ordering: SortOrdering,
        policy: DuplicatePolicy,
    ) -> Result<Self, PlanError> {
        validate_sort_ordering(row_type, &ordering)?;

        Ok(Self::SortTree(SortPlan {
            input: Box::new(input),
            row_type: row_type.clone(),
            ordering,
            policy,
            limit: usize::MAX,
        }))
    }

    pub fn sort_insertion_limited(
        input: Self,
        row_type: &RowType,
        ordering: SortOrdering,
        policy: DuplicatePolicy,
        limit: usize,
        config: &ExecConfig,
    ) -> Result<Self, PlanError> {
        validate_sort_ordering(row_type, &ordering)?;
        if limit > config.sort.max_insertion_limit {
            return Err(PlanError::InsertionLimitTooLarge {
                limit,
                max: config.sort.max_insertion_limit,
            });
        }

        Ok(Self::SortInsertionLimited(SortPlan {
            input: Box::new(input),
            row_type: row_type.clone(),
            ordering,
            policy,
            limit,
        }))
    }

    /// Output row type, when this operator emits rows of exactly one type.
    #[must_use]
    pub fn row_type(&self) -> Option<&RowType> {
        match self {
            Self::GroupScan(_) => None,
            Self::IndexScan(plan) => Some(&plan.index_type),
            Self::Filter(plan) => match plan.keep_types.as_slice() {
                [only] => Some(only),
                _ => None,
            },
            Self::Flatten(plan) => Some(&plan.output_type),
            Self::IntersectOrdered(plan) => Some(match plan.output {
                IntersectSide::Left => &plan.left_type,
                IntersectSide::Right => &plan.right_type,
            }),
            Self::UnionOrdered(plan) => Some(&plan.row_type),
            Self::AncestorLookup(plan) => match plan.ancestor_types.as_slice() {
                [only] if !plan.keep_input => Some(only),
                _ => None,
            },
            Self::BranchLookup(_) => None,
            Self::SortTree(plan) | Self::SortInsertionLimited(plan) => Some(&plan.row_type),
        }
    }

    /// Instantiate the cursor tree for this plan.
    #[must_use]
    pub fn cursor(&self, ctx: &ExecContext) -> Box<dyn Cursor> {
        match self {
            Self::GroupScan(plan) => Box::new(GroupScanCursor::new(plan, ctx)),
            Self::IndexScan(plan) => Box::new(IndexScanCursor::new(plan, ctx)),
            Self::Filter(plan) => Box::new(FilterCursor::new(plan, plan.input.cursor(ctx))),
            Self::Flatten(plan) => Box::new(FlattenCursor::new(plan, plan.input.cursor(ctx), ctx)),
            Self::IntersectOrdered(plan) => Box::new(IntersectCursor::new(
                plan,
                plan.left.cursor(ctx),
                plan.right.cursor(ctx),
                ctx,
            )),
            Self::UnionOrdered(plan) => Box::new(UnionCursor::new(
                plan,
                plan.left.cursor(ctx),
                plan.right.cursor(ctx),
                ctx,
            )),
            Self::AncestorLookup(plan) => Box::new(AncestorLookupCursor::new(
                plan,
                plan.input.cursor(ctx),
                ctx,
            )),
            Self::BranchLookup(plan) => Box::new(BranchLookupCursor::new(
                plan,
                plan.input.cursor(ctx),
                ctx,
            )),
            Self::SortTree(plan) => Box::new(SortTreeCursor::new(plan, plan.input.cursor(ctx), ctx)),
            Self::SortInsertionLimited(plan) => Box::new(SortInsertionLimitedCursor::new(
                plan,
                plan.input.cursor(ctx),
            )),
        }
    }
}

fn index_model(row_type: &RowType) -> Option<Arc<IndexModel>> {
    row_type.index_model().cloned()
}

fn flatten_side_table<'a>(
    row_type: &'a RowType,
    side: &'static str,
) -> Result<&'a TableModel, PlanError> {
    let table = match row_type.kind() {
        RowTypeKind::Table(_) | RowTypeKind::Flattened { .. } => row_type.hkey_table(),
        RowTypeKind::Index(_) => None,
    };

    table
        .map(AsRef::as_ref)
        .ok_or_else(|| PlanError::FlattenInvalidType {
            side,
            row_type: row_type.name().to_string(),
        })
}

fn intersect_input_index(
    row_type: &RowType,
    side: &'static str,
) -> Result<Arc<IndexModel>, PlanError> {
    index_model(row_type).ok_or_else(|| PlanError::IntersectInputNotIndex {
        side,
        row_type: row_type.name().to_string(),
    })
}

fn validate_sort_ordering(row_type: &RowType, ordering: &SortOrdering) -> Result<(), PlanError> {
    if ordering.is_empty() {
        return Err(PlanError::EmptySortOrdering);
    }
    if let Some(&(column, _)) = ordering
        .iter()
        .find(|(column, _)| *column >= row_type.width())
    {
        return Err(PlanError::SortColumnOutOfRange {
            column,
            row_type: row_type.name().to_string(),
        });
    }

    Ok(())
}
