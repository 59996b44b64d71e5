use super::{Comma, Delimited, Param, Params, ToSql};

use crate::stmt::{self, Value};

/// Wraps an operand in parentheses when it binds looser than a comparison.
struct Operand<'a>(&'a stmt::Expr);

/// Operand of `AND` / `OR`
struct Conjunct<'a>(&'a stmt::Expr);

impl ToSql for &stmt::Expr {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        use stmt::Expr::*;

        match self {
            Aggregate(expr) => {
                let distinct = if expr.distinct { "DISTINCT " } else { "" };

                match &expr.arg {
                    Some(arg) => {
                        let arg: &stmt::Expr = arg;
                        fmt!(f, expr.func "(" distinct arg ")");
                    }
                    None => fmt!(f, expr.func "(*)"),
                }
            }
            And(operands) => {
                fmt!(f, Delimited(operands.iter().map(Conjunct), " AND "));
            }
            Arg(name) => {
                let placeholder = f.params.push(Param::Named(name.clone()));
                fmt!(f, placeholder);
            }
            Between {
                expr,
                low,
                high,
                negate,
            } => {
                let not = if *negate { " NOT" } else { "" };
                fmt!(f, Operand(expr) not " BETWEEN " Operand(low) " AND " Operand(high));
            }
            BinaryOp { lhs, op, rhs } => {
                assert!(!lhs.is_value_null());
                assert!(!rhs.is_value_null());

                let op = *op;

                if op.is_arithmetic() {
                    let lhs: &stmt::Expr = lhs;
                    let rhs: &stmt::Expr = rhs;
                    fmt!(f, "(" lhs " " op " " rhs ")");
                } else {
                    fmt!(f, Operand(lhs) " " op " " Operand(rhs));
                }
            }
            Cast { expr, ty } => {
                let expr: &stmt::Expr = expr;
                fmt!(f, "CAST(" expr " AS " ty ")");
            }
            Column(expr_column) => {
                let column_name = f.serializer.column_name(expr_column.column);
                fmt!(f, "tbl_" expr_column.alias "." column_name);
            }
            Exists { query, negate } => {
                let not = if *negate { "NOT " } else { "" };
                let query: &stmt::Select = query;
                fmt!(f, not "EXISTS (" query ")");
            }
            InList { expr, list, negate } => {
                let not = if *negate { " NOT" } else { "" };
                fmt!(f, Operand(expr) not " IN (" Comma(list) ")");
            }
            InSubquery {
                expr,
                query,
                negate,
            } => {
                let not = if *negate { " NOT" } else { "" };
                let query: &stmt::Select = query;
                fmt!(f, Operand(expr) not " IN (" query ")");
            }
            IsNull { expr, negate } => {
                let not = if *negate { " NOT" } else { "" };
                fmt!(f, Operand(expr) " IS" not " NULL");
            }
            Like {
                expr,
                pattern,
                negate,
            } => {
                let not = if *negate { " NOT" } else { "" };
                fmt!(f, Operand(expr) not " LIKE " Operand(pattern));
            }
            Neg(expr) => {
                fmt!(f, "-" Operand(expr));
            }
            Not(expr) => {
                let expr: &stmt::Expr = expr;
                fmt!(f, "NOT (" expr ")");
            }
            Or(operands) => {
                fmt!(f, Delimited(operands.iter().map(Conjunct), " OR "));
            }
            Stmt(query) => {
                let query: &stmt::Select = query;
                fmt!(f, "(" query ")");
            }
            stmt::Expr::Value(value) => value.to_sql(f),
        }
    }
}

impl ToSql for Operand<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        use stmt::Expr::*;

        match self.0 {
            And(_) | Or(_) | Between { .. } | Like { .. } | IsNull { .. } | InList { .. }
            | InSubquery { .. } => fmt!(f, "(" self.0 ")"),
            BinaryOp { op, .. } if !op.is_arithmetic() => fmt!(f, "(" self.0 ")"),
            expr => expr.to_sql(f),
        }
    }
}

impl ToSql for Conjunct<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self.0 {
            stmt::Expr::And(_) | stmt::Expr::Or(_) => fmt!(f, "(" self.0 ")"),
            expr => expr.to_sql(f),
        }
    }
}

impl ToSql for &Value {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            Value::Null => fmt!(f, "NULL"),
            Value::Record(record) => fmt!(f, "(" Comma(record.iter()) ")"),
            value => {
                let placeholder = f.params.push(Param::Value(value.clone()));
                fmt!(f, placeholder);
            }
        }
    }
}

impl ToSql for stmt::AggregateFunc {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(
            f,
            match self {
                stmt::AggregateFunc::Count => "COUNT",
                stmt::AggregateFunc::Sum => "SUM",
                stmt::AggregateFunc::Min => "MIN",
                stmt::AggregateFunc::Max => "MAX",
                stmt::AggregateFunc::Avg => "AVG",
            }
        );
    }
}

impl ToSql for stmt::BinaryOp {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(
            f,
            match self {
                stmt::BinaryOp::Eq => "=",
                stmt::BinaryOp::Ne => "<>",
                stmt::BinaryOp::Lt => "<",
                stmt::BinaryOp::Le => "<=",
                stmt::BinaryOp::Gt => ">",
                stmt::BinaryOp::Ge => ">=",
                stmt::BinaryOp::Add => "+",
                stmt::BinaryOp::Sub => "-",
                stmt::BinaryOp::Mul => "*",
                stmt::BinaryOp::Div => "/",
                stmt::BinaryOp::Mod => "%",
            }
        );
    }
}
