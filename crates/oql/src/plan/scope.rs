use super::{Expr, SourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub usize);

/// One query level: the top level query or a subquery.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub id: ScopeId,

    /// Enclosing scope, `None` at the top level
    pub parent: Option<ScopeId>,

    /// Nesting depth, `0` at the top level
    pub depth: usize,

    pub distinct: bool,

    pub select: Vec<SelectItem>,

    /// FROM roots in declaration order. Joins hang off each root.
    pub roots: Vec<SourceId>,

    pub filter: Option<Expr>,

    /// Predicates tying correlated FROM roots to their outer source
    pub correlated_filter: Vec<Expr>,

    /// Explicit GROUP BY expressions
    pub group_by: Vec<Expr>,

    pub having: Option<Expr>,

    pub order_by: Vec<OrderBy>,

    /// Outer sources referenced from this scope, in order of first reference
    pub correlations: Vec<Correlation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub desc: bool,
}

/// An outer source referenced by a subquery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correlation {
    pub source: SourceId,

    /// How many scopes outward the source is declared
    pub depth: usize,
}

impl Scope {
    pub(crate) fn new(id: ScopeId, parent: Option<ScopeId>, depth: usize) -> Scope {
        Scope {
            id,
            parent,
            depth,
            distinct: false,
            select: vec![],
            roots: vec![],
            filter: None,
            correlated_filter: vec![],
            group_by: vec![],
            having: None,
            order_by: vec![],
            correlations: vec![],
        }
    }

    pub fn is_correlated(&self) -> bool {
        !self.correlations.is_empty()
    }

    /// Returns `true` if any select item is an aggregate, ignoring aggregates
    /// computed inside subqueries.
    pub fn has_aggregate(&self) -> bool {
        self.select.iter().any(|item| item.expr.contains_aggregate())
    }
}
