use crate::plan::{self, AggregateFunc, BinaryOp, Expr, Scope, ScopeId, Source, Statement};

use oql_core::{driver::Capability, stmt::Type, Error, Result, Schema};
use oql_sql::stmt as sql;

/// Lowers a correlated plan into a SQL statement tree. Every source is
/// aliased by its handle, so references stay unambiguous across scopes.
pub(super) struct Lower<'a> {
    pub(super) schema: &'a Schema,
    pub(super) plan: &'a Statement,
    pub(super) capability: &'static Capability,
}

impl Lower<'_> {
    pub(super) fn lower(&self) -> Result<sql::Select> {
        self.lower_scope(Statement::ROOT)
    }

    fn lower_scope(&self, id: ScopeId) -> Result<sql::Select> {
        let scope = self.plan.scope(id);

        let mut projection = vec![];
        for item in &scope.select {
            self.lower_select_item(&item.expr, &mut projection)?;
        }

        let order_by = scope
            .order_by
            .iter()
            .map(|item| {
                Ok(sql::OrderByExpr {
                    expr: self.lower_expr(&item.expr)?,
                    direction: if item.desc {
                        sql::Direction::Desc
                    } else {
                        sql::Direction::Asc
                    },
                })
            })
            .collect::<Result<_>>()?;

        Ok(sql::Select {
            distinct: scope.distinct,
            projection,
            from: self.lower_from(scope)?,
            filter: self.lower_filter(scope)?,
            group_by: self.lower_group_by(scope)?,
            having: scope
                .having
                .as_ref()
                .map(|having| self.lower_expr(having))
                .transpose()?,
            order_by,
        })
    }

    /// Entity items expand to one column per mapped column.
    pub(super) fn lower_select_item(&self, expr: &Expr, out: &mut Vec<sql::Expr>) -> Result<()> {
        match expr {
            Expr::Entity {
                source, columns, ..
            } => {
                out.extend(
                    columns
                        .iter()
                        .map(|column| sql::Expr::column(source.0, *column)),
                );
            }
            expr => out.push(self.lower_expr(expr)?),
        }
        Ok(())
    }

    /// Each root followed by the joins introduced from it, in order.
    pub(super) fn lower_from(&self, scope: &Scope) -> Result<Vec<sql::TableWithJoins>> {
        let mut from = vec![];

        for root in &scope.roots {
            let root = self.plan.source(*root);

            let mut joins = vec![];
            for source in root.joins.iter().map(|id| self.plan.source(*id)) {
                let Some(join) = &source.join else {
                    continue;
                };

                let on = join
                    .on
                    .iter()
                    .map(|expr| self.lower_expr(expr))
                    .collect::<Result<Vec<_>>>()?;

                joins.push(sql::Join {
                    table: table_ref(source),
                    kind: match join.kind {
                        plan::JoinKind::Inner => sql::JoinKind::Inner,
                        plan::JoinKind::Left => sql::JoinKind::Left,
                    },
                    on: sql::Expr::and_from_vec(on),
                });
            }

            from.push(sql::TableWithJoins {
                relation: table_ref(root),
                joins,
            });
        }

        Ok(from)
    }

    pub(super) fn lower_filter(&self, scope: &Scope) -> Result<Option<sql::Expr>> {
        let mut operands = vec![];

        if let Some(filter) = &scope.filter {
            operands.push(self.lower_expr(filter)?);
        }

        for predicate in &scope.correlated_filter {
            operands.push(self.lower_expr(predicate)?);
        }

        Ok(match operands.len() {
            0 => None,
            _ => Some(sql::Expr::and_from_vec(operands)),
        })
    }

    /// Non-aggregated select items in select order, then explicit GROUP BY
    /// expressions not already listed.
    fn lower_group_by(&self, scope: &Scope) -> Result<Vec<sql::Expr>> {
        if scope.group_by.is_empty() && !scope.has_aggregate() {
            return Ok(vec![]);
        }

        let mut group_by = vec![];
        for item in &scope.select {
            if item.expr.contains_aggregate() || !item.expr.references_columns() {
                continue;
            }
            self.lower_select_item(&item.expr, &mut group_by)?;
        }

        for expr in &scope.group_by {
            group_by.push(self.lower_expr(expr)?);
        }

        let mut deduped: Vec<sql::Expr> = vec![];
        for expr in group_by {
            if !deduped.contains(&expr) {
                deduped.push(expr);
            }
        }
        Ok(deduped)
    }

    pub(super) fn lower_expr(&self, expr: &Expr) -> Result<sql::Expr> {
        Ok(match expr {
            Expr::Column(column) => sql::Expr::column(column.source.0, column.column),
            Expr::Entity { source, id, .. } => sql::Expr::column(source.0, *id),
            Expr::Value(value) => sql::Expr::Value(value.clone()),
            Expr::Param(name) => sql::Expr::Arg(name.clone()),
            Expr::Aggregate(aggregate) => self.lower_aggregate(aggregate)?,
            Expr::Binary { lhs, op, rhs } => {
                sql::Expr::binary_op(self.lower_expr(lhs)?, binary_op(*op), self.lower_expr(rhs)?)
            }
            Expr::And(operands) => sql::Expr::And(self.lower_all(operands)?),
            Expr::Or(operands) => sql::Expr::Or(self.lower_all(operands)?),
            Expr::Not(expr) => sql::Expr::Not(Box::new(self.lower_expr(expr)?)),
            Expr::Neg(expr) => sql::Expr::Neg(Box::new(self.lower_expr(expr)?)),
            Expr::IsNull { expr, negate } => sql::Expr::IsNull {
                expr: Box::new(self.lower_expr(expr)?),
                negate: *negate,
            },
            Expr::InList { expr, list, negate } => sql::Expr::InList {
                expr: Box::new(self.lower_expr(expr)?),
                list: self.lower_all(list)?,
                negate: *negate,
            },
            Expr::InSubquery {
                expr,
                scope,
                negate,
            } => sql::Expr::InSubquery {
                expr: Box::new(self.lower_expr(expr)?),
                query: Box::new(self.lower_scope(*scope)?),
                negate: *negate,
            },
            Expr::Between {
                expr,
                low,
                high,
                negate,
            } => sql::Expr::Between {
                expr: Box::new(self.lower_expr(expr)?),
                low: Box::new(self.lower_expr(low)?),
                high: Box::new(self.lower_expr(high)?),
                negate: *negate,
            },
            Expr::Like {
                expr,
                pattern,
                negate,
            } => sql::Expr::Like {
                expr: Box::new(self.lower_expr(expr)?),
                pattern: Box::new(self.lower_expr(pattern)?),
                negate: *negate,
            },
            Expr::Exists(scope) => sql::Expr::Exists {
                query: Box::new(self.lower_scope(*scope)?),
                negate: false,
            },
            Expr::Subquery { scope, .. } => sql::Expr::Stmt(Box::new(self.lower_scope(*scope)?)),
        })
    }

    fn lower_all(&self, exprs: &[Expr]) -> Result<Vec<sql::Expr>> {
        exprs.iter().map(|expr| self.lower_expr(expr)).collect()
    }

    fn lower_aggregate(&self, aggregate: &plan::ExprAggregate) -> Result<sql::Expr> {
        if let Some(arg) = &aggregate.arg {
            if !self.capability.aggregate_in_sub_select && self.over_correlated_subquery(arg) {
                return Err(Error::unsupported_feature(format!(
                    "`{}` over a correlated subquery; the backend cannot evaluate \
                     an aggregate whose argument is a correlated subquery",
                    aggregate.func.name()
                )));
            }
        }

        let mut arg = aggregate
            .arg
            .as_ref()
            .map(|arg| self.lower_expr(arg))
            .transpose()?;

        let is_double = aggregate
            .arg
            .as_ref()
            .is_some_and(|arg| self.ty_of(arg) == Type::F64);

        if aggregate.func == AggregateFunc::Avg && self.capability.avg_cast && !is_double {
            arg = arg.map(|arg| sql::Expr::Cast {
                expr: Box::new(arg),
                ty: Type::F64,
            });
        }

        Ok(sql::Expr::aggregate(
            aggregate_func(aggregate.func),
            arg,
            aggregate.distinct,
        ))
    }

    /// Returns `true` if the expression contains a correlated subquery.
    pub(super) fn over_correlated_subquery(&self, expr: &Expr) -> bool {
        expr.subqueries()
            .into_iter()
            .any(|scope| self.plan.scope(scope).is_correlated())
    }

    /// Returns `true` if the expression aggregates a correlated subquery
    /// anywhere outside nested scopes.
    pub(super) fn aggregates_correlated_subquery(&self, expr: &Expr) -> bool {
        let mut found = false;
        expr.visit(&mut |expr| {
            if let Expr::Aggregate(aggregate) = expr {
                found |= aggregate
                    .arg
                    .as_ref()
                    .is_some_and(|arg| self.over_correlated_subquery(arg));
            }
        });
        found
    }

    pub(super) fn ty_of(&self, expr: &Expr) -> Type {
        let db = &self.schema.db;
        expr.ty(&|column| db.column(column).ty.clone())
    }

    /// Semantic type of each top level select item.
    pub(super) fn shape(&self) -> Vec<Type> {
        self.plan
            .root()
            .select
            .iter()
            .map(|item| self.ty_of(&item.expr))
            .collect()
    }
}

/// The column types of the rows a statement with the given shape returns.
pub(super) fn flatten(shape: &[Type]) -> Vec<Type> {
    let mut columns = vec![];
    for ty in shape {
        match ty {
            Type::Record(fields) => columns.extend(flatten(fields)),
            ty => columns.push(ty.clone()),
        }
    }
    columns
}

fn table_ref(source: &Source) -> sql::TableRef {
    sql::TableRef {
        table: source.table,
        alias: source.id.0,
    }
}

fn binary_op(op: BinaryOp) -> sql::BinaryOp {
    match op {
        BinaryOp::Eq => sql::BinaryOp::Eq,
        BinaryOp::Ne => sql::BinaryOp::Ne,
        BinaryOp::Lt => sql::BinaryOp::Lt,
        BinaryOp::Le => sql::BinaryOp::Le,
        BinaryOp::Gt => sql::BinaryOp::Gt,
        BinaryOp::Ge => sql::BinaryOp::Ge,
        BinaryOp::Add => sql::BinaryOp::Add,
        BinaryOp::Sub => sql::BinaryOp::Sub,
        BinaryOp::Mul => sql::BinaryOp::Mul,
        BinaryOp::Div => sql::BinaryOp::Div,
        BinaryOp::Mod => sql::BinaryOp::Mod,
    }
}

fn aggregate_func(func: AggregateFunc) -> sql::AggregateFunc {
    match func {
        AggregateFunc::Count => sql::AggregateFunc::Count,
        AggregateFunc::Sum => sql::AggregateFunc::Sum,
        AggregateFunc::Min => sql::AggregateFunc::Min,
        AggregateFunc::Max => sql::AggregateFunc::Max,
        AggregateFunc::Avg => sql::AggregateFunc::Avg,
    }
}
