use super::{Field, FieldId, FieldTy};
use crate::{
    schema::db::{ColumnId, TableId},
    stmt,
};
use std::fmt;

/// A mapped entity type.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Uniquely identifies the entity within the schema
    pub id: EntityId,

    /// Name used to refer to the entity in queries
    pub name: String,

    /// Table storing the entity's rows
    pub table: TableId,

    /// Every entity has exactly one identifier
    pub identifier: Identifier,

    /// Properties, in declaration order. The identifier is the first field.
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct Identifier {
    /// The identifier property. Always a scalar field.
    pub field: FieldId,

    pub generator: Generator,
}

/// How identifier values are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// The database assigns the value (auto increment)
    Native,

    /// The application assigns the value
    Assigned,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

impl Entity {
    pub fn field(&self, id: impl Into<FieldId>) -> &Field {
        let field_id = id.into();
        assert_eq!(self.id, field_id.entity);
        &self.fields[field_id.index]
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn identifier_field(&self) -> &Field {
        self.field(self.identifier.field)
    }

    /// Column storing the identifier
    pub fn identifier_column(&self) -> ColumnId {
        self.identifier_field().expect_scalar().column
    }

    /// Type of the identifier value
    pub fn identifier_ty(&self) -> &stmt::Type {
        &self.identifier_field().expect_scalar().ty
    }

    /// Fields stored in the entity's own table, identifier first.
    pub fn columns(&self) -> impl Iterator<Item = &Field> + '_ {
        self.fields
            .iter()
            .filter(|field| matches!(field.ty, FieldTy::Scalar(_) | FieldTy::ManyToOne(_)))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "EntityId({})", self.0)
    }
}

impl From<&Entity> for EntityId {
    fn from(value: &Entity) -> Self {
        value.id
    }
}
