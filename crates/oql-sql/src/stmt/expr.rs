use super::{Select, Type, Value};

use oql_core::schema::db::ColumnId;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column of an aliased table
    Column(ExprColumn),

    /// Bound as a parameter, except `NULL` which is inlined
    Value(Value),

    /// Named parameter, bound at execution time
    Arg(String),

    Aggregate(ExprAggregate),

    BinaryOp {
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
        query: Box<Select>,
        negate: bool,
    },

    Exists {
        query: Box<Select>,
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

    Cast {
        expr: Box<Expr>,
        ty: Type,
    },

    /// Parenthesized scalar subquery
    Stmt(Box<Select>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprColumn {
    /// Alias of the table the column is read from
    pub alias: usize,
    pub column: ColumnId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprAggregate {
    pub func: AggregateFunc,

    /// `None` is `*`, only valid for `COUNT`
    pub arg: Option<Box<Expr>>,

    pub distinct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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

impl Expr {
    pub fn column(alias: usize, column: ColumnId) -> Expr {
        Expr::Column(ExprColumn { alias, column })
    }

    pub fn binary_op(lhs: impl Into<Expr>, op: BinaryOp, rhs: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs.into()),
            op,
            rhs: Box::new(rhs.into()),
        }
    }

    pub fn eq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
        Expr::binary_op(lhs, BinaryOp::Eq, rhs)
    }

    /// Combines the operands with AND, flattening nested conjunctions.
    pub fn and_from_vec(operands: Vec<Expr>) -> Expr {
        let mut flattened = vec![];
        for operand in operands {
            match operand {
                Expr::And(inner) => flattened.extend(inner),
                operand => flattened.push(operand),
            }
        }

        if flattened.len() == 1 {
            flattened.remove(0)
        } else {
            Expr::And(flattened)
        }
    }

    pub fn aggregate(func: AggregateFunc, arg: Option<Expr>, distinct: bool) -> Expr {
        Expr::Aggregate(ExprAggregate {
            func,
            arg: arg.map(Box::new),
            distinct,
        })
    }

    pub fn count_star() -> Expr {
        Expr::aggregate(AggregateFunc::Count, None, false)
    }

    pub fn is_value_null(&self) -> bool {
        matches!(self, Expr::Value(Value::Null))
    }
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }
}

impl From<ExprColumn> for Expr {
    fn from(value: ExprColumn) -> Self {
        Expr::Column(value)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl From<Select> for Expr {
    fn from(value: Select) -> Self {
        Expr::Stmt(Box::new(value))
    }
}
