use oql_core::schema::db::{self, Column};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Name of the column
    pub name: String,

    /// Storage type
    pub ty: db::Type,

    pub nullable: bool,

    pub auto_increment: bool,
}

impl ColumnDef {
    pub(crate) fn from_schema(column: &Column) -> ColumnDef {
        ColumnDef {
            name: column.name.clone(),
            ty: column.storage_ty,
            nullable: column.nullable,
            auto_increment: column.auto_increment,
        }
    }
}
