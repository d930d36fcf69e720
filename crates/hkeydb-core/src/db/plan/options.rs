use crate::model::TableId;

///
/// JoinType
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    /// Unmatched left-side (parent) rows survive.
    #[must_use]
    pub const fn keeps_left(self) -> bool {
        matches!(self, Self::Left | Self::Full)
    }

    /// Unmatched right-side (child) rows survive.
    #[must_use]
    pub const fn keeps_right(self) -> bool {
        matches!(self, Self::Right | Self::Full)
    }
}

///
/// FlattenOption
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FlattenOption {
    KeepParent,
    KeepChild,
    LeftJoinShortensHKey,
}

///
/// IntersectOption
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IntersectOption {
    OutputLeft,
    OutputRight,
    SequentialScan,
    SkipScan,
}

///
/// DuplicatePolicy
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DuplicatePolicy {
    #[default]
    Preserve,
    Suppress,
}

///
/// IndexScanSelector
///
/// Restricts a group index scan to entries in which one table is present.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum IndexScanSelector {
    #[default]
    All,
    Table(TableId),
}
