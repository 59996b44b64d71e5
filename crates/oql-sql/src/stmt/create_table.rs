use super::{ColumnDef, Statement};

use oql_core::schema::db::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    /// Name of the table
    pub name: String,

    /// Column definitions
    pub columns: Vec<ColumnDef>,

    /// Names of the primary key columns
    pub primary_key: Vec<String>,
}

impl Statement {
    pub fn create_table(table: &Table) -> Self {
        CreateTable {
            name: table.name.clone(),
            columns: table.columns.iter().map(ColumnDef::from_schema).collect(),
            primary_key: table
                .primary_key_columns()
                .map(|column| column.name.clone())
                .collect(),
        }
        .into()
    }
}

impl From<CreateTable> for Statement {
    fn from(value: CreateTable) -> Self {
        Self::CreateTable(value)
    }
}
