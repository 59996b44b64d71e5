use super::{Expr, TableWithJoins};

/// A `SELECT` statement, at the top level or as a subquery.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub distinct: bool,

    /// One expression per returned column
    pub projection: Vec<Expr>,

    /// Comma separated FROM items, each with its joins
    pub from: Vec<TableWithJoins>,

    pub filter: Option<Expr>,

    pub group_by: Vec<Expr>,

    pub having: Option<Expr>,

    pub order_by: Vec<OrderByExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}
