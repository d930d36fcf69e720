use crate::{db::plan::JoinType, error::InternalError};
use thiserror::Error as ThisError;

///
/// PlanError
///
/// Construction-time validation failure. Never touches storage.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum PlanError {
    #[error("group '{group}' has no tables")]
    EmptyGroup { group: String },

    #[error("row type '{row_type}' is not an index row type")]
    NotIndexType { row_type: String },

    #[error("index bound of {width} columns exceeds index row width {max}")]
    BoundTooWide { width: usize, max: usize },

    #[error("ordering of {len} columns must cover 1..={max} columns")]
    OrderingWidth { len: usize, max: usize },

    #[error("index scan selector requires a group index, '{index}' is a table index")]
    SelectorRequiresGroupIndex { index: String },

    #[error("selector table '{table}' is not on the path of index '{index}'")]
    SelectorTableNotOnPath { table: String, index: String },

    #[error("filter must keep at least one row type")]
    EmptyKeepTypes,

    #[error("flatten {side} type '{row_type}' must be a table or flattened row type")]
    FlattenInvalidType {
        side: &'static str,
        row_type: String,
    },

    #[error("flatten types '{parent}' and '{child}' belong to different groups")]
    FlattenGroupMismatch { parent: String, child: String },

    #[error("flatten parent '{parent}' is not an ancestor of child '{child}'")]
    FlattenNotAncestor { parent: String, child: String },

    #[error("LEFT_JOIN_SHORTENS_HKEY requires a LEFT or FULL join, got {join:?}")]
    ShortensHKeyRequiresLeftJoin { join: JoinType },

    #[error("row types '{left}' and '{right}' come from different schemas")]
    ForeignRowType { left: String, right: String },

    #[error("intersect {side} input type '{row_type}' must be an index row type")]
    IntersectInputNotIndex {
        side: &'static str,
        row_type: String,
    },

    #[error("intersect inputs '{left}' and '{right}' belong to different groups")]
    IntersectGroupMismatch { left: String, right: String },

    #[error("{side} ordering columns ({columns}) exceed row width {width}")]
    OrderingColumnsExceedWidth {
        side: &'static str,
        columns: usize,
        width: usize,
    },

    #[error("comparison fields ({fields}) exceed ordering columns ({max})")]
    ComparisonFieldsExceedOrdering { fields: usize, max: usize },

    #[error("{directions} directions given for {fields} comparison fields")]
    DirectionCountMismatch { directions: usize, fields: usize },

    #[error("intersect does not support FULL join")]
    IntersectFullJoin,

    #[error("intersect requires exactly one of OUTPUT_LEFT and OUTPUT_RIGHT")]
    IntersectOutputSide,

    #[error("intersect {join:?} join must output its preserved side")]
    IntersectJoinOutputMismatch { join: JoinType },

    #[error("intersect requires exactly one of SEQUENTIAL_SCAN and SKIP_SCAN")]
    IntersectScanMode,

    #[error("union {side} input type '{row_type}' must be an index row type")]
    UnionInputNotIndex {
        side: &'static str,
        row_type: String,
    },

    #[error("union inputs '{left}' and '{right}' must share one index row type")]
    UnionTypeMismatch { left: String, right: String },

    #[error("union ordering columns differ: left {left}, right {right}")]
    UnionOrderingMismatch { left: usize, right: usize },

    #[error("ancestor lookup requires at least one ancestor type")]
    EmptyAncestorTypes,

    #[error("ancestor type '{row_type}' is not a table type of group '{group}'")]
    AncestorNotInGroup { row_type: String, group: String },

    #[error("'{ancestor}' is not an ancestor of input type '{input}'")]
    NotAncestor { ancestor: String, input: String },

    #[error("ancestor type '{ancestor}' is the indexed table, so input rows cannot be kept")]
    AncestorSelfWithKeepInput { ancestor: String },

    #[error("branch lookup output type '{row_type}' is also the input type")]
    BranchLookupSelf { row_type: String },

    #[error("branch lookup {side} type '{row_type}' has no table in group '{group}'")]
    BranchNotInGroup {
        side: &'static str,
        row_type: String,
        group: String,
    },

    #[error("branch lookup cannot keep index input rows of '{row_type}'")]
    BranchKeepIndexInput { row_type: String },

    #[error("'{output}' is neither an ancestor of '{input}' nor a child of one")]
    BranchNotReachable { output: String, input: String },

    #[error("sort ordering must name at least one column")]
    EmptySortOrdering,

    #[error("sort column {column} is out of range for row type '{row_type}'")]
    SortColumnOutOfRange { column: usize, row_type: String },

    #[error("insertion limit {limit} exceeds configured maximum {max}")]
    InsertionLimitTooLarge { limit: usize, max: usize },
}

impl From<PlanError> for InternalError {
    fn from(err: PlanError) -> Self {
        Self::planner_invalid(err.to_string())
    }
}
