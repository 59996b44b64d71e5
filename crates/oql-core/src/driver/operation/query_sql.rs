use super::Operation;

use crate::stmt;

#[derive(Debug, Clone)]
pub struct QuerySql {
    /// The SQL text, in the driver's dialect
    pub sql: String,

    /// Bind parameters, in placeholder order
    pub params: Vec<stmt::Value>,

    /// The type of each returned column. `None` when the statement returns
    /// a row count instead of rows.
    pub ret: Option<Vec<stmt::Type>>,
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}
