use super::EntityId;
use crate::{
    schema::db::{ColumnId, TableId},
    stmt,
};

/// A collection-valued property.
///
/// Rows of the collection live in `table` and reference their owner through
/// the `key` column. For one-to-many collections `table` is the target
/// entity's own table.
#[derive(Debug, Clone)]
pub struct Collection {
    /// `Owner.Property`, used in messages
    pub role: String,

    pub owner: EntityId,

    pub kind: CollectionKind,

    pub table: TableId,

    /// Foreign key column holding the owner's identifier
    pub key: ColumnId,

    pub element: Element,

    pub cascade: Cascade,
}

#[derive(Debug, Clone)]
pub enum CollectionKind {
    /// Keyed by an explicit index column
    Map { index: ColumnId, index_ty: stmt::Type },

    /// Ordered by an integer position column
    List { index: ColumnId },

    Set,

    Bag,
}

#[derive(Debug, Clone)]
pub enum Element {
    /// Scalar elements stored in the collection table
    Value { column: ColumnId, ty: stmt::Type },

    /// Entity elements; the collection table is the target's table
    OneToMany { target: EntityId },

    /// Entity elements referenced from a link table
    ManyToMany { target: EntityId, column: ColumnId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cascade {
    #[default]
    None,
    SaveUpdate,
    Delete,
    All,
}

impl Collection {
    /// The index column of a map or list.
    pub fn index(&self) -> Option<ColumnId> {
        match self.kind {
            CollectionKind::Map { index, .. } | CollectionKind::List { index } => Some(index),
            CollectionKind::Set | CollectionKind::Bag => None,
        }
    }

    pub fn index_ty(&self) -> Option<stmt::Type> {
        match &self.kind {
            CollectionKind::Map { index_ty, .. } => Some(index_ty.clone()),
            CollectionKind::List { .. } => Some(stmt::Type::I32),
            CollectionKind::Set | CollectionKind::Bag => None,
        }
    }

    /// The entity elements are instances of, if any.
    pub fn target(&self) -> Option<EntityId> {
        match self.element {
            Element::Value { .. } => None,
            Element::OneToMany { target } | Element::ManyToMany { target, .. } => Some(target),
        }
    }

    pub fn is_one_to_many(&self) -> bool {
        matches!(self.element, Element::OneToMany { .. })
    }
}
