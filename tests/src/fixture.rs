//! The schema and rows most end-to-end tests run against.
//!
//! Document 1 lists two contacts, each with two localized names. Document 2
//! has no contacts. One person has no employer.

use oql::{
    driver::{Capability, Dialect},
    schema::app::Generator,
    stmt::{Type, Value},
    Db, Result, Schema,
};

/// SQLite, reported as unable to aggregate over a correlated subquery.
pub static NO_AGGREGATE_IN_SUB_SELECT: Capability = Capability {
    dialect: Dialect::Sqlite,
    aggregate_in_sub_select: false,
    avg_cast: false,
};

/// Sums the per-contact count of localized names for each document.
pub const CONTACT_NAME_COUNT: &str = "select d.Id, sum((select count(e) from Person c \
     left join c.Localized e where c.Id = link.Id)) \
     from Document d left join d.Contacts link group by d.Id";

pub fn schema() -> Schema {
    Schema::builder()
        .entity("Person", |e| {
            e.id("Id", Type::I32, Generator::Native)
                .property("Name", Type::String)
                .nullable_property("Age", Type::I32)
                .many_to_one("Employer", "Company")
                .map("Localized", |m| {
                    m.element(Type::String);
                });
        })
        .entity("Company", |e| {
            e.id("Id", Type::I32, Generator::Native)
                .property("Name", Type::String);
        })
        .entity("Document", |e| {
            e.id("Id", Type::I32, Generator::Native)
                .property("Name", Type::String)
                .map("Contacts", |m| {
                    m.key_column("position").one_to_many("Person");
                })
                .set("Readers", |m| {
                    m.many_to_many("Person");
                });
        })
        .build()
        .unwrap()
}

pub fn builder() -> oql::Builder {
    let mut builder = Db::builder();
    builder.schema(schema());
    builder
}

pub async fn seed(db: &mut Db) -> Result<()> {
    db.begin().await?;

    insert(db, "INSERT INTO \"Company\" (\"Id\", \"Name\") VALUES (?1, ?2)", vec![1.into(), "acme".into()]).await?;

    for (id, name) in [(1, "draft"), (2, "memo")] {
        insert(
            db,
            "INSERT INTO \"Document\" (\"Id\", \"Name\") VALUES (?1, ?2)",
            vec![id.into(), name.into()],
        )
        .await?;
    }

    let people: [(i32, &str, Value, Value, Value, Value); 3] = [
        (1, "ann", 30.into(), 1.into(), 1.into(), 0.into()),
        (2, "bob", Value::Null, 1.into(), 1.into(), 1.into()),
        (3, "cid", 40.into(), Value::Null, Value::Null, Value::Null),
    ];

    for (id, name, age, employer, position, idx) in people {
        insert(
            db,
            "INSERT INTO \"Person\" (\"Id\", \"Name\", \"Age\", \"Employer\", \"position\", \"contacts_idx\") \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            vec![id.into(), name.into(), age, employer, position, idx],
        )
        .await?;
    }

    for (person, idx, name) in [(1, 0, "en"), (1, 1, "fr"), (2, 0, "en"), (2, 1, "de")] {
        insert(
            db,
            "INSERT INTO \"Person_Localized\" (\"person_key\", \"idx\", \"elt\") VALUES (?1, ?2, ?3)",
            vec![person.into(), idx.into(), name.into()],
        )
        .await?;
    }

    for (document, reader) in [(1, 3), (2, 1)] {
        insert(
            db,
            "INSERT INTO \"Document_Readers\" (\"document_key\", \"elt\") VALUES (?1, ?2)",
            vec![document.into(), reader.into()],
        )
        .await?;
    }

    db.commit().await
}

async fn insert(db: &mut Db, sql: &str, params: Vec<Value>) -> Result<()> {
    let count = db.execute(sql, params).await?;
    assert_eq!(count, 1, "{sql}");
    Ok(())
}
