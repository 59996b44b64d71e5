use super::Expr;

use oql_core::schema::db::TableId;

#[derive(Debug, Clone, PartialEq)]
pub struct TableWithJoins {
    pub relation: TableRef,
    pub joins: Vec<Join>,
}

/// A table in a FROM clause, aliased `tbl_{alias}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub table: TableId,
    pub alias: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableRef,
    pub kind: JoinKind,
    pub on: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}
