use super::{
    app::{self, Cascade, CollectionKind, Element, EntityId, FieldId, FieldTy, Generator},
    db::{self, Column, ColumnId, Table, TableId},
    Schema,
};
use crate::{stmt, Error, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Declares the mapping model.
///
/// Entities, properties and collections are declared by name; targets are
/// resolved and tables/columns generated when [`Builder::build`] is called.
///
/// ```
/// use oql_core::{schema::app::{Cascade, Generator}, stmt::Type, Schema};
///
/// let schema = Schema::builder()
///     .entity("Person", |e| {
///         e.id("Id", Type::I32, Generator::Native)
///             .property("Name", Type::String)
///             .map("Localized", |m| {
///                 m.index(Type::I32).element(Type::String).cascade(Cascade::All);
///             });
///     })
///     .build()
///     .unwrap();
///
/// assert!(schema.entity_by_name("Person").is_some());
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    /// If set, prefix all table names with this string
    table_name_prefix: Option<String>,

    entities: Vec<EntityBuilder>,
}

#[derive(Debug)]
pub struct EntityBuilder {
    name: String,
    table: Option<String>,
    id: Vec<IdDef>,
    properties: Vec<PropertyDef>,
}

#[derive(Debug)]
struct IdDef {
    name: String,
    ty: stmt::Type,
    generator: Generator,
}

#[derive(Debug)]
struct PropertyDef {
    name: String,
    column: Option<String>,
    kind: PropertyKind,
}

#[derive(Debug)]
enum PropertyKind {
    Id,
    Scalar { ty: stmt::Type, nullable: bool },
    ManyToOne { target: String },
    Collection(CollectionBuilder),
}

#[derive(Debug)]
pub struct CollectionBuilder {
    kind: CollectionKindDef,
    table: Option<String>,
    key_column: Option<String>,
    index_ty: stmt::Type,
    index_column: Option<String>,
    element: ElementDef,
    element_column: Option<String>,
    cascade: Cascade,
}

#[derive(Debug, Clone, Copy)]
enum CollectionKindDef {
    Map,
    List,
    Set,
    Bag,
}

#[derive(Debug)]
enum ElementDef {
    Value(stmt::Type),
    OneToMany(String),
    ManyToMany(String),
}

/// Used to track state during the build process
struct BuildSchema<'a> {
    /// Build options
    builder: &'a Builder,

    /// Maps entity names to identifiers, reserved before the entities exist.
    entity_lookup: IndexMap<&'a str, EntityId>,

    /// Tables as they are built
    tables: Vec<Table>,

    /// Fields of each entity, in declaration order
    fields: Vec<Vec<app::Field>>,
}

impl Builder {
    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn entity(&mut self, name: &str, f: impl FnOnce(&mut EntityBuilder)) -> &mut Self {
        let mut entity = EntityBuilder {
            name: name.to_string(),
            table: None,
            id: vec![],
            properties: vec![],
        };
        f(&mut entity);
        self.entities.push(entity);
        self
    }

    pub fn build(&self) -> Result<Schema> {
        let mut entity_lookup = IndexMap::new();

        for (index, entity) in self.entities.iter().enumerate() {
            if entity_lookup
                .insert(entity.name.as_str(), EntityId(index))
                .is_some()
            {
                return Err(Error::invalid_schema(format!(
                    "entity `{}` is mapped more than once",
                    entity.name
                )));
            }
        }

        let mut build = BuildSchema {
            builder: self,
            entity_lookup,
            tables: vec![],
            fields: vec![vec![]; self.entities.len()],
        };

        // Entity tables first so that collection tables and one-to-many key
        // columns can reference them.
        for entity in &self.entities {
            build.build_entity_table(entity)?;
        }

        for (index, entity) in self.entities.iter().enumerate() {
            build.build_entity_fields(EntityId(index), entity)?;
        }

        let entities = self
            .entities
            .iter()
            .zip(build.fields)
            .enumerate()
            .map(|(index, (def, fields))| {
                let id = EntityId(index);
                let IdDef { generator, .. } = &def.id[0];
                app::Entity {
                    id,
                    name: def.name.clone(),
                    table: TableId(index),
                    identifier: app::Identifier {
                        field: FieldId {
                            entity: id,
                            index: 0,
                        },
                        generator: *generator,
                    },
                    fields,
                }
            })
            .collect();

        let schema = Schema {
            app: app::Schema { entities },
            db: Arc::new(db::Schema {
                tables: build.tables,
            }),
        };

        schema.verify()?;

        Ok(schema)
    }
}

impl EntityBuilder {
    /// Overrides the table name. Defaults to the entity name.
    pub fn table(&mut self, name: &str) -> &mut Self {
        self.table = Some(name.to_string());
        self
    }

    /// Declares the identifier property. It must be declared exactly once.
    pub fn id(&mut self, name: &str, ty: stmt::Type, generator: Generator) -> &mut Self {
        self.id.push(IdDef {
            name: name.to_string(),
            ty,
            generator,
        });
        self.properties.push(PropertyDef {
            name: name.to_string(),
            column: None,
            kind: PropertyKind::Id,
        });
        self
    }

    pub fn property(&mut self, name: &str, ty: stmt::Type) -> &mut Self {
        self.push(name, PropertyKind::Scalar { ty, nullable: false })
    }

    pub fn nullable_property(&mut self, name: &str, ty: stmt::Type) -> &mut Self {
        self.push(name, PropertyKind::Scalar { ty, nullable: true })
    }

    pub fn many_to_one(&mut self, name: &str, target: &str) -> &mut Self {
        self.push(
            name,
            PropertyKind::ManyToOne {
                target: target.to_string(),
            },
        )
    }

    pub fn map(&mut self, name: &str, f: impl FnOnce(&mut CollectionBuilder)) -> &mut Self {
        self.collection(name, CollectionKindDef::Map, f)
    }

    pub fn list(&mut self, name: &str, f: impl FnOnce(&mut CollectionBuilder)) -> &mut Self {
        self.collection(name, CollectionKindDef::List, f)
    }

    pub fn set(&mut self, name: &str, f: impl FnOnce(&mut CollectionBuilder)) -> &mut Self {
        self.collection(name, CollectionKindDef::Set, f)
    }

    pub fn bag(&mut self, name: &str, f: impl FnOnce(&mut CollectionBuilder)) -> &mut Self {
        self.collection(name, CollectionKindDef::Bag, f)
    }

    /// Overrides the column of a previously declared identifier, scalar or
    /// many-to-one property.
    pub fn column(&mut self, property: &str, column: &str) -> &mut Self {
        if let Some(def) = self.properties.iter_mut().rev().find(|p| p.name == property) {
            def.column = Some(column.to_string());
        }
        self
    }

    fn collection(
        &mut self,
        name: &str,
        kind: CollectionKindDef,
        f: impl FnOnce(&mut CollectionBuilder),
    ) -> &mut Self {
        let mut collection = CollectionBuilder {
            kind,
            table: None,
            key_column: None,
            index_ty: stmt::Type::I32,
            index_column: None,
            element: ElementDef::Value(stmt::Type::String),
            element_column: None,
            cascade: Cascade::None,
        };
        f(&mut collection);
        self.push(name, PropertyKind::Collection(collection))
    }

    fn push(&mut self, name: &str, kind: PropertyKind) -> &mut Self {
        self.properties.push(PropertyDef {
            name: name.to_string(),
            column: None,
            kind,
        });
        self
    }
}

impl CollectionBuilder {
    /// Overrides the collection table. Ignored for one-to-many collections,
    /// which live in the target's table.
    pub fn table(&mut self, name: &str) -> &mut Self {
        self.table = Some(name.to_string());
        self
    }

    /// Overrides the foreign key column referencing the owner.
    pub fn key_column(&mut self, name: &str) -> &mut Self {
        self.key_column = Some(name.to_string());
        self
    }

    /// Type of a map's keys. Defaults to `I32`.
    pub fn index(&mut self, ty: stmt::Type) -> &mut Self {
        self.index_ty = ty;
        self
    }

    pub fn index_column(&mut self, name: &str) -> &mut Self {
        self.index_column = Some(name.to_string());
        self
    }

    /// Scalar elements of the given type. This is the default, with `String`.
    pub fn element(&mut self, ty: stmt::Type) -> &mut Self {
        self.element = ElementDef::Value(ty);
        self
    }

    pub fn element_column(&mut self, name: &str) -> &mut Self {
        self.element_column = Some(name.to_string());
        self
    }

    pub fn one_to_many(&mut self, target: &str) -> &mut Self {
        self.element = ElementDef::OneToMany(target.to_string());
        self
    }

    pub fn many_to_many(&mut self, target: &str) -> &mut Self {
        self.element = ElementDef::ManyToMany(target.to_string());
        self
    }

    pub fn cascade(&mut self, cascade: Cascade) -> &mut Self {
        self.cascade = cascade;
        self
    }
}

impl BuildSchema<'_> {
    fn table_name(&self, name: &str) -> String {
        match &self.builder.table_name_prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_string(),
        }
    }

    fn lookup(&self, owner: &str, name: &str) -> Result<EntityId> {
        self.entity_lookup.get(name).copied().ok_or_else(|| {
            Error::invalid_schema(format!(
                "entity `{owner}` references unmapped entity `{name}`"
            ))
        })
    }

    fn entity_def(&self, id: EntityId) -> &EntityBuilder {
        &self.builder.entities[id.0]
    }

    fn identifier_ty(&self, id: EntityId) -> Result<stmt::Type> {
        let def = self.entity_def(id);
        match &def.id[..] {
            [id] => Ok(id.ty.clone()),
            [] => Err(Error::invalid_schema(format!(
                "entity `{}` has no identifier",
                def.name
            ))),
            _ => Err(Error::invalid_schema(format!(
                "entity `{}` declares more than one identifier",
                def.name
            ))),
        }
    }

    fn push_table(&mut self, name: String) -> TableId {
        let id = TableId(self.tables.len());
        self.tables.push(Table::new(id, name));
        id
    }

    fn push_column(
        &mut self,
        table: TableId,
        name: String,
        ty: stmt::Type,
        nullable: bool,
        primary_key: bool,
        auto_increment: bool,
    ) -> Result<ColumnId> {
        let storage_ty = db::Type::from_app(&ty)?;
        let table = &mut self.tables[table.0];
        let id = ColumnId {
            table: table.id,
            index: table.columns.len(),
        };
        table.columns.push(Column {
            id,
            name,
            ty,
            storage_ty,
            nullable,
            primary_key,
            auto_increment,
        });
        if primary_key {
            table.primary_key.push(id);
        }
        Ok(id)
    }

    /// Creates the entity's table with its identifier column. Property
    /// columns are added by `build_entity_fields`.
    fn build_entity_table(&mut self, def: &EntityBuilder) -> Result<()> {
        let entity = self.entity_lookup[def.name.as_str()];
        let id_ty = self.identifier_ty(entity)?;
        let IdDef {
            name, generator, ..
        } = &def.id[0];

        if !matches!(def.properties.first(), Some(PropertyDef { kind: PropertyKind::Id, .. })) {
            return Err(Error::invalid_schema(format!(
                "entity `{}` must declare its identifier first",
                def.name
            )));
        }

        let table = self.push_table(self.table_name(def.table.as_deref().unwrap_or(&def.name)));
        debug_assert_eq!(table.0, entity.0);

        let column = def.properties[0].column.clone().unwrap_or_else(|| name.clone());
        self.push_column(
            table,
            column,
            id_ty,
            false,
            true,
            *generator == Generator::Native,
        )?;
        Ok(())
    }

    fn build_entity_fields(&mut self, entity: EntityId, def: &EntityBuilder) -> Result<()> {
        let table = TableId(entity.0);
        let mut fields = vec![];

        for (index, property) in def.properties.iter().enumerate() {
            let id = FieldId { entity, index };
            let column_name = property.column.clone().unwrap_or_else(|| property.name.clone());

            let ty = match &property.kind {
                PropertyKind::Id => FieldTy::Scalar(app::Scalar {
                    column: ColumnId { table, index: 0 },
                    ty: self.identifier_ty(entity)?,
                    nullable: false,
                }),
                PropertyKind::Scalar { ty, nullable } => {
                    let column =
                        self.push_column(table, column_name, ty.clone(), *nullable, false, false)?;
                    FieldTy::Scalar(app::Scalar {
                        column,
                        ty: ty.clone(),
                        nullable: *nullable,
                    })
                }
                PropertyKind::ManyToOne { target } => {
                    let target = self.lookup(&def.name, target)?;
                    let ty = self.identifier_ty(target)?;
                    let column = self.push_column(table, column_name, ty, true, false, false)?;
                    FieldTy::ManyToOne(app::ManyToOne { target, column })
                }
                PropertyKind::Collection(collection) => FieldTy::Collection(
                    self.build_collection(entity, def, &property.name, collection)?,
                ),
            };

            fields.push(app::Field {
                id,
                name: property.name.clone(),
                ty,
            });
        }

        self.fields[entity.0] = fields;
        Ok(())
    }

    fn build_collection(
        &mut self,
        owner: EntityId,
        def: &EntityBuilder,
        name: &str,
        collection: &CollectionBuilder,
    ) -> Result<app::Collection> {
        let owner_id_ty = self.identifier_ty(owner)?;
        let key_name = collection
            .key_column
            .clone()
            .unwrap_or_else(|| format!("{}_key", def.name.to_lowercase()));

        if matches!(collection.kind, CollectionKindDef::List) && !collection.index_ty.is_integer() {
            return Err(Error::invalid_schema(format!(
                "list `{}.{name}` must have an integer index",
                def.name
            )));
        }

        let one_to_many = match &collection.element {
            ElementDef::OneToMany(target) => Some(self.lookup(&def.name, target)?),
            _ => None,
        };

        let (table, default_index) = match one_to_many {
            // Key and index columns live in the target's table
            Some(target) => (TableId(target.0), format!("{}_idx", name.to_lowercase())),
            None => {
                let table_name = collection
                    .table
                    .clone()
                    .unwrap_or_else(|| format!("{}_{}", def.name, name));
                (self.push_table(self.table_name(&table_name)), "idx".to_string())
            }
        };

        // Collection tables own their key; one-to-many keys are nullable
        // because target rows may exist outside the collection.
        let owned = one_to_many.is_none();
        let key_pk = owned && !matches!(collection.kind, CollectionKindDef::Bag);
        let key = self.push_column(table, key_name, owner_id_ty, !owned, key_pk, false)?;

        let index_name = collection.index_column.clone().unwrap_or(default_index);
        let kind = match collection.kind {
            CollectionKindDef::Map => CollectionKind::Map {
                index: self.push_column(
                    table,
                    index_name,
                    collection.index_ty.clone(),
                    !owned,
                    owned,
                    false,
                )?,
                index_ty: collection.index_ty.clone(),
            },
            CollectionKindDef::List => CollectionKind::List {
                index: self.push_column(
                    table,
                    index_name,
                    collection.index_ty.clone(),
                    !owned,
                    owned,
                    false,
                )?,
            },
            CollectionKindDef::Set => CollectionKind::Set,
            CollectionKindDef::Bag => CollectionKind::Bag,
        };

        // Sets are keyed by (owner, element)
        let element_pk = owned && matches!(collection.kind, CollectionKindDef::Set);
        let element_name = collection.element_column.clone().unwrap_or_else(|| "elt".to_string());
        let element = match &collection.element {
            ElementDef::Value(ty) => Element::Value {
                column: self.push_column(table, element_name, ty.clone(), false, element_pk, false)?,
                ty: ty.clone(),
            },
            ElementDef::OneToMany(target) => Element::OneToMany {
                target: self.lookup(&def.name, target)?,
            },
            ElementDef::ManyToMany(target) => {
                let target = self.lookup(&def.name, target)?;
                let ty = self.identifier_ty(target)?;
                Element::ManyToMany {
                    target,
                    column: self.push_column(table, element_name, ty, false, element_pk, false)?,
                }
            }
        };

        Ok(app::Collection {
            role: format!("{}.{name}", def.name),
            owner,
            kind,
            table,
            key,
            element,
            cascade: collection.cascade,
        })
    }
}
