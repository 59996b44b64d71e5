mod column_def;
pub use column_def::ColumnDef;

mod create_table;
pub use create_table::CreateTable;

mod expr;
pub use expr::{AggregateFunc, BinaryOp, Expr, ExprAggregate, ExprColumn};

mod select;
pub use select::{Direction, OrderByExpr, Select};

mod table_with_joins;
pub use table_with_joins::{Join, JoinKind, TableRef, TableWithJoins};

pub use oql_core::stmt::{Type, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    Query(Select),
}

impl From<Select> for Statement {
    fn from(value: Select) -> Self {
        Self::Query(value)
    }
}
