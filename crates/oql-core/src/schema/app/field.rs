use super::{Collection, EntityId};
use crate::{schema::db::ColumnId, stmt};
use std::fmt;

#[derive(Debug, Clone)]
pub struct Field {
    /// Uniquely identifies the field within the schema
    pub id: FieldId,

    /// Property name, as used in query paths
    pub name: String,

    pub ty: FieldTy,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    pub entity: EntityId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub enum FieldTy {
    Scalar(Scalar),
    ManyToOne(ManyToOne),
    Collection(Collection),
}

/// A property stored in a column of the entity's table.
#[derive(Debug, Clone)]
pub struct Scalar {
    pub column: ColumnId,
    pub ty: stmt::Type,
    pub nullable: bool,
}

/// A reference to another entity, stored as a foreign key column holding the
/// target's identifier.
#[derive(Debug, Clone)]
pub struct ManyToOne {
    pub target: EntityId,
    pub column: ColumnId,
}

impl Field {
    pub fn is_scalar(&self) -> bool {
        matches!(self.ty, FieldTy::Scalar(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.ty, FieldTy::Collection(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.ty {
            FieldTy::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_scalar(&self) -> &Scalar {
        match &self.ty {
            FieldTy::Scalar(scalar) => scalar,
            _ => panic!("expected scalar field; actual={self:#?}"),
        }
    }

    /// Column in the entity's own table, for scalar and many-to-one fields.
    pub fn column(&self) -> Option<ColumnId> {
        match &self.ty {
            FieldTy::Scalar(scalar) => Some(scalar.column),
            FieldTy::ManyToOne(many_to_one) => Some(many_to_one.column),
            FieldTy::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match &self.ty {
            FieldTy::Collection(collection) => Some(collection),
            _ => None,
        }
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "FieldId({}/{})", self.entity.0, self.index)
    }
}

impl From<&Field> for FieldId {
    fn from(value: &Field) -> Self {
        value.id
    }
}
