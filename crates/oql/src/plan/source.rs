use super::{Expr, ScopeId};

use oql_core::schema::{
    app::{EntityId, FieldId},
    db::TableId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub usize);

/// A table occurrence in a FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: SourceId,

    /// Scope whose FROM clause the source belongs to
    pub scope: ScopeId,

    /// User alias, if any. Implicit joins have none.
    pub alias: Option<String>,

    pub table: TableId,

    /// Entity the rows represent, `None` for rows of a value collection or a
    /// many-to-many link table.
    pub entity: Option<EntityId>,

    /// Collection the source was reached through
    pub collection: Option<CollectionRef>,

    /// How the source is joined to its parent; `None` for FROM roots.
    pub join: Option<Join>,

    /// For FROM roots, the sources joined under it in introduction order.
    pub joins: Vec<SourceId>,

    /// True when reached through a LEFT join. Joins introduced from an
    /// optional source are LEFT as well.
    pub optional: bool,
}

/// Collection a source was reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionRef {
    pub field: FieldId,

    /// Source holding the key and index columns: the collection table, or the
    /// link table of a many-to-many collection.
    pub link: SourceId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub parent: SourceId,
    pub kind: JoinKind,

    /// Conjunction of join conditions
    pub on: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl Source {
    pub fn is_root(&self) -> bool {
        self.join.is_none()
    }
}
