use super::{Entity, EntityId, Field, FieldId};

#[derive(Debug, Default)]
pub struct Schema {
    pub entities: Vec<Entity>,
}

impl Schema {
    pub fn entity(&self, id: impl Into<EntityId>) -> &Entity {
        &self.entities[id.into().0]
    }

    /// Entity names are matched case-sensitively, as declared.
    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    pub fn field(&self, id: FieldId) -> &Field {
        self.entity(id.entity).field(id)
    }
}
