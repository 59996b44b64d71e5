use oql_core::{
    schema::app::{Cascade, CollectionKind, Element, FieldTy, Generator},
    stmt::Type,
    Schema,
};
use pretty_assertions::assert_eq;
use std_util::prelude::*;

fn person_document() -> Schema {
    Schema::builder()
        .entity("Person", |e| {
            e.id("Id", Type::I32, Generator::Native)
                .property("Name", Type::String)
                .map("Localized", |m| {
                    m.element(Type::String).cascade(Cascade::All);
                });
        })
        .entity("Document", |e| {
            e.id("Id", Type::I32, Generator::Native)
                .property("Name", Type::String)
                .map("Contacts", |m| {
                    m.key_column("position").one_to_many("Person");
                });
        })
        .build()
        .unwrap()
}

#[test]
fn entity_tables_come_first() {
    let schema = person_document();

    let names: Vec<_> = schema.db.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Person", "Document", "Person_Localized"]);

    let person = schema.entity_by_name("Person").unwrap();
    assert_eq!(schema.table_for(person).name, "Person");
    assert_eq!(person.identifier.generator, Generator::Native);
    assert_eq!(person.identifier_ty(), &Type::I32);
}

#[test]
fn value_map_gets_its_own_table() {
    let schema = person_document();
    let person = schema.entity_by_name("Person").unwrap();
    let localized = person.field_by_name("Localized").unwrap();
    let collection = localized.as_collection().unwrap();

    assert_eq!(collection.role, "Person.Localized");
    assert_eq!(collection.cascade, Cascade::All);

    let table = schema.db.table(collection.table);
    let columns: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, ["person_key", "idx", "elt"]);

    let pk: Vec<_> = table.primary_key_columns().map(|c| c.name.as_str()).collect();
    assert_eq!(pk, ["person_key", "idx"]);

    assert!(matches!(
        collection.kind,
        CollectionKind::Map {
            index_ty: Type::I32,
            ..
        }
    ));
    assert!(matches!(
        collection.element,
        Element::Value {
            ty: Type::String,
            ..
        }
    ));
}

#[test]
fn one_to_many_map_lives_in_target_table() {
    let schema = person_document();
    let document = schema.entity_by_name("Document").unwrap();
    let contacts = document
        .field_by_name("Contacts")
        .unwrap()
        .as_collection()
        .unwrap();
    let person = schema.entity_by_name("Person").unwrap();

    assert_eq!(contacts.table, person.table);
    assert_eq!(contacts.target(), Some(person.id));
    assert!(contacts.is_one_to_many());

    let key = schema.db.column(contacts.key);
    assert_eq!(key.name, "position");
    assert!(key.nullable);
    assert!(!key.primary_key);

    let index = schema.db.column(contacts.index().unwrap());
    assert_eq!(index.name, "contacts_idx");
}

#[test]
fn many_to_one_column_takes_target_identifier_type() {
    let schema = Schema::builder()
        .entity("Folder", |e| {
            e.id("Id", Type::I64, Generator::Assigned)
                .many_to_one("Parent", "Folder");
        })
        .build()
        .unwrap();

    let folder = schema.entity_by_name("Folder").unwrap();
    let FieldTy::ManyToOne(parent) = &folder.field_by_name("Parent").unwrap().ty else {
        panic!("expected many-to-one");
    };
    assert_eq!(parent.target, folder.id);

    let column = schema.db.column(parent.column);
    assert_eq!(column.name, "Parent");
    assert_eq!(column.ty, Type::I64);
    assert!(column.nullable);
}

#[test]
fn table_name_prefix_and_overrides() {
    let schema = Schema::builder()
        .table_name_prefix("app_")
        .entity("Tag", |e| {
            e.id("Id", Type::I32, Generator::Native)
                .table("tags")
                .property("Label", Type::String)
                .column("Label", "label_text")
                .set("Aliases", |s| {
                    s.table("tag_aliases").element_column("alias");
                });
        })
        .build()
        .unwrap();

    let names: Vec<_> = schema.db.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["app_tags", "app_tag_aliases"]);

    let tags = &schema.db.tables[0];
    assert!(tags.column_by_name("label_text").is_some());

    let aliases = &schema.db.tables[1];
    let pk: Vec<_> = aliases.primary_key_columns().map(|c| c.name.as_str()).collect();
    assert_eq!(pk, ["tag_key", "alias"]);
}

#[test]
fn bag_table_has_no_primary_key() {
    let schema = Schema::builder()
        .entity("Post", |e| {
            e.id("Id", Type::I32, Generator::Native).bag("Words", |b| {
                b.element(Type::String);
            });
        })
        .build()
        .unwrap();

    assert!(schema.db.tables[1].primary_key.is_empty());
}

#[test]
fn duplicate_entity_is_invalid() {
    let err = assert_err!(Schema::builder()
        .entity("A", |e| {
            e.id("Id", Type::I32, Generator::Native);
        })
        .entity("A", |e| {
            e.id("Id", Type::I32, Generator::Native);
        })
        .build());
    assert!(err.is_invalid_schema());
}

#[test]
fn missing_identifier_is_invalid() {
    let err = assert_err!(Schema::builder()
        .entity("A", |e| {
            e.property("Name", Type::String);
        })
        .build());
    assert!(err.is_invalid_schema());
    assert_eq!(err.to_string(), "invalid schema: entity `A` has no identifier");
}

#[test]
fn unknown_target_is_invalid() {
    let err = assert_err!(Schema::builder()
        .entity("A", |e| {
            e.id("Id", Type::I32, Generator::Native)
                .map("Items", |m| {
                    m.one_to_many("Missing");
                });
        })
        .build());
    assert!(err.is_invalid_schema());
}

#[test]
fn duplicate_column_is_invalid() {
    let err = assert_err!(Schema::builder()
        .entity("A", |e| {
            e.id("Id", Type::I32, Generator::Native)
                .property("Name", Type::String)
                .property("Title", Type::String)
                .column("Title", "name");
        })
        .build());
    assert!(err.is_invalid_schema());
}

#[test]
fn list_index_must_be_integer() {
    let err = assert_err!(Schema::builder()
        .entity("A", |e| {
            e.id("Id", Type::I32, Generator::Native).list("Lines", |l| {
                l.index(Type::String);
            });
        })
        .build());
    assert!(err.is_invalid_schema());
}
