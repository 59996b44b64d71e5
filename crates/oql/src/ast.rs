//! Syntax tree produced by the parser.
//!
//! Every node that can be the subject of a resolution error carries the byte
//! offset at which it starts in the query text.

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// `None` when the query starts with `FROM`, selecting the first root.
    pub select: Option<Select>,
    pub from: Vec<FromRoot>,
    pub joins: Vec<Join>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderBy>,

    /// Offset of the first token of the query
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<Ident>,
}

/// `FROM Person p` or, inside a subquery, `FROM c.Localized e`.
#[derive(Debug, Clone, PartialEq)]
pub struct FromRoot {
    pub path: Path,
    pub alias: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub path: Path,
    pub alias: Option<Ident>,

    /// Extra condition given with `WITH`
    pub with: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub desc: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub offset: usize,
}

/// A dotted identifier, `d.Contacts.Name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),

    /// `:name`
    Param(Ident),

    Path(Path),

    Aggregate(Aggregate),

    /// `KEY(alias)`, `VALUE(alias)` or `INDEX(alias)`
    MapFn(MapFn, Ident),

    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },

    And(Vec<Expr>),

    Or(Vec<Expr>),

    Not(Box<Expr>),

    Neg(Box<Expr>),

    IsNull {
        expr: Box<Expr>,
        negate: bool,
    },

    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negate: bool,
    },

    InSubquery {
        expr: Box<Expr>,
        query: Box<Query>,
        negate: bool,
    },

    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negate: bool,
    },

    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negate: bool,
    },

    Exists(Box<Query>),

    /// Parenthesized query used as a value
    Subquery(Box<Query>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Decimal(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub func: AggregateFunc,

    /// `None` for `COUNT(*)`
    pub arg: Option<Box<Expr>>,
    pub distinct: bool,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFn {
    Key,
    Value,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Path {
    pub fn offset(&self) -> usize {
        self.segments[0].offset
    }

    pub fn first(&self) -> &Ident {
        &self.segments[0]
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.name)?;
        }
        Ok(())
    }
}

impl AggregateFunc {
    pub(crate) fn from_name(name: &str) -> Option<AggregateFunc> {
        Some(match name.to_ascii_lowercase().as_str() {
            "count" => AggregateFunc::Count,
            "sum" => AggregateFunc::Sum,
            "min" => AggregateFunc::Min,
            "max" => AggregateFunc::Max,
            "avg" => AggregateFunc::Avg,
            _ => return None,
        })
    }
}

impl AggregateFunc {
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Avg => "AVG",
        }
    }
}

impl MapFn {
    pub(crate) fn from_name(name: &str) -> Option<MapFn> {
        Some(match name.to_ascii_lowercase().as_str() {
            "key" => MapFn::Key,
            "value" => MapFn::Value,
            "index" => MapFn::Index,
            _ => return None,
        })
    }
}
