mod collection;
pub use collection::{Cascade, Collection, CollectionKind, Element};

mod entity;
pub use entity::{Entity, EntityId, Generator, Identifier};

mod field;
pub use field::{Field, FieldId, FieldTy, ManyToOne, Scalar};

mod schema;
pub use schema::Schema;
