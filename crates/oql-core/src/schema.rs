pub mod app;

mod builder;
pub use builder::{Builder, CollectionBuilder, EntityBuilder};

pub mod db;

mod verify;

use app::{Entity, EntityId, Field, FieldId};
use db::{Table, TableId};
use std::sync::Arc;

/// The compiled mapping model.
///
/// Built once through [`Schema::builder`] and shared read-only (usually
/// behind an `Arc`) by every query compilation.
#[derive(Debug)]
pub struct Schema {
    /// Entity-level schema
    pub app: app::Schema,

    /// Database-level schema
    pub db: Arc<db::Schema>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn entity(&self, id: impl Into<EntityId>) -> &Entity {
        self.app.entity(id)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.app.entity_by_name(name)
    }

    pub fn field(&self, id: FieldId) -> &Field {
        self.app.field(id)
    }

    pub fn table_for(&self, id: impl Into<EntityId>) -> &Table {
        self.db.table(self.table_id_for(id))
    }

    pub fn table_id_for(&self, id: impl Into<EntityId>) -> TableId {
        self.app.entity(id).table
    }
}
