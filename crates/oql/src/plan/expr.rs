use super::{ScopeId, SourceId};

pub use crate::ast::{AggregateFunc, BinaryOp};

use oql_core::{
    schema::db::ColumnId,
    stmt::{Type, Value},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ExprColumn),

    /// An entity-valued reference. Selected, it expands to the entity's
    /// columns; anywhere else it stands for the identifier column.
    Entity {
        source: SourceId,
        id: ColumnId,
        columns: Vec<ColumnId>,
        ty: Type,
    },

    Value(Value),

    /// Named parameter, bound at execution time
    Param(String),

    Aggregate(ExprAggregate),

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
        scope: ScopeId,
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

    Exists(ScopeId),

    /// Scalar subquery
    Subquery { scope: ScopeId, ty: Type },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprColumn {
    pub source: SourceId,
    pub column: ColumnId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprAggregate {
    pub func: AggregateFunc,

    /// `None` for `COUNT(*)`
    pub arg: Option<Box<Expr>>,
    pub distinct: bool,
    pub ty: Type,
}

impl Expr {
    /// The semantic type of the expression. `ty_of_column` supplies the
    /// mapped type of a column.
    pub fn ty(&self, ty_of_column: &impl Fn(ColumnId) -> Type) -> Type {
        match self {
            Expr::Column(expr) => ty_of_column(expr.column),
            Expr::Entity { ty, .. } => ty.clone(),
            Expr::Value(value) => value.infer_ty(),
            Expr::Param(_) => Type::Unknown,
            Expr::Aggregate(expr) => expr.ty.clone(),
            Expr::Binary { lhs, op, rhs } if op.is_arithmetic() => {
                arithmetic_ty(lhs.ty(ty_of_column), rhs.ty(ty_of_column))
            }
            Expr::Neg(expr) => expr.ty(ty_of_column),
            Expr::Subquery { ty, .. } => ty.clone(),
            Expr::Binary { .. }
            | Expr::And(_)
            | Expr::Or(_)
            | Expr::Not(_)
            | Expr::IsNull { .. }
            | Expr::InList { .. }
            | Expr::InSubquery { .. }
            | Expr::Between { .. }
            | Expr::Like { .. }
            | Expr::Exists(_) => Type::Bool,
        }
    }

    /// Returns `true` if the expression computes an aggregate of the scope
    /// it appears in. Aggregates inside subqueries belong to the subquery.
    pub fn contains_aggregate(&self) -> bool {
        let mut found = false;
        self.visit(&mut |expr| found |= matches!(expr, Expr::Aggregate(_)));
        found
    }

    /// Returns `true` if the expression reads any column.
    pub fn references_columns(&self) -> bool {
        let mut found = false;
        self.visit(&mut |expr| {
            found |= matches!(
                expr,
                Expr::Column(_)
                    | Expr::Entity { .. }
                    | Expr::Subquery { .. }
                    | Expr::Exists(_)
                    | Expr::InSubquery { .. }
            )
        });
        found
    }

    /// Calls `f` on this expression and every nested expression, pre-order.
    /// Does not descend into subquery scopes.
    pub fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);

        match self {
            Expr::Column(_)
            | Expr::Entity { .. }
            | Expr::Value(_)
            | Expr::Param(_)
            | Expr::Exists(_)
            | Expr::Subquery { .. } => {}
            Expr::Aggregate(expr) => {
                if let Some(arg) = &expr.arg {
                    arg.visit(f);
                }
            }
            Expr::Binary { lhs, rhs, .. } => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Expr::And(operands) | Expr::Or(operands) => {
                for operand in operands {
                    operand.visit(f);
                }
            }
            Expr::Not(expr) | Expr::Neg(expr) | Expr::IsNull { expr, .. } => expr.visit(f),
            Expr::InList { expr, list, .. } => {
                expr.visit(f);
                for item in list {
                    item.visit(f);
                }
            }
            Expr::InSubquery { expr, .. } => expr.visit(f),
            Expr::Between { expr, low, high, .. } => {
                expr.visit(f);
                low.visit(f);
                high.visit(f);
            }
            Expr::Like { expr, pattern, .. } => {
                expr.visit(f);
                pattern.visit(f);
            }
        }
    }

    /// Subquery scopes nested directly in this expression.
    pub fn subqueries(&self) -> Vec<ScopeId> {
        let mut scopes = vec![];
        self.visit(&mut |expr| match expr {
            Expr::Exists(scope)
            | Expr::InSubquery { scope, .. }
            | Expr::Subquery { scope, .. } => scopes.push(*scope),
            _ => {}
        });
        scopes
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

/// Result type of an arithmetic operation: the wider of the operand types.
fn arithmetic_ty(lhs: Type, rhs: Type) -> Type {
    match (lhs, rhs) {
        (Type::F64, _) | (_, Type::F64) => Type::F64,
        (Type::I64, _) | (_, Type::I64) => Type::I64,
        (Type::I32, Type::I32) => Type::I32,
        (Type::Null | Type::Unknown, ty) | (ty, Type::Null | Type::Unknown) => ty,
        (lhs, _) => lhs,
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
