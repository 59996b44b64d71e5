use oql_core::{
    driver::{
        operation::{QuerySql, Transaction},
        Connection as _, Driver, Operation,
    },
    schema::app::Generator,
    stmt::{Type, Value},
    Schema,
};
use oql_driver_sqlite::Sqlite;
use pretty_assertions::assert_eq;
use std_util::prelude::*;

fn schema() -> Schema {
    Schema::builder()
        .entity("Person", |e| {
            e.id("Id", Type::I32, Generator::Native)
                .property("Name", Type::String)
                .nullable_property("Score", Type::F64)
                .map("Localized", |m| {
                    m.element(Type::String);
                });
        })
        .build()
        .unwrap()
}

fn query(sql: &str, params: Vec<Value>, ret: Vec<Type>) -> Operation {
    QuerySql {
        sql: sql.to_string(),
        params,
        ret: Some(ret),
    }
    .into()
}

fn statement(sql: &str, params: Vec<Value>) -> Operation {
    QuerySql {
        sql: sql.to_string(),
        params,
        ret: None,
    }
    .into()
}

// ---------------------------------------------------------------------------
// Connection URLs
// ---------------------------------------------------------------------------

#[test]
fn memory_url() {
    assert!(matches!(
        assert_ok!(Sqlite::new("sqlite::memory:")),
        Sqlite::InMemory
    ));
}

#[test]
fn file_url() {
    let Sqlite::File(path) = assert_ok!(Sqlite::new("sqlite:/tmp/oql.db")) else {
        panic!("expected a file database");
    };
    assert_eq!(path.to_str(), Some("/tmp/oql.db"));
}

#[test]
fn wrong_scheme() {
    let err = assert_err!(Sqlite::new("postgresql://localhost/db"));
    assert!(err.is_invalid_connection_url());
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn push_schema_then_query() {
    let schema = schema();
    let mut connection = assert_ok!(Sqlite::in_memory().connect().await);
    assert_ok!(connection.push_schema(&schema.db).await);

    let inserted = assert_ok!(
        connection
            .exec(statement(
                "INSERT INTO \"Person\" (\"Name\", \"Score\") VALUES (?1, ?2), (?3, NULL)",
                vec![Value::from("ann"), Value::F64(1.5), Value::from("bob")],
            ))
            .await
    );
    assert_eq!(assert_ok!(inserted.rows.into_count()), 2);

    let response = assert_ok!(
        connection
            .exec(query(
                "SELECT \"Id\", \"Name\", \"Score\" FROM \"Person\" ORDER BY \"Id\"",
                vec![],
                vec![Type::I32, Type::String, Type::F64],
            ))
            .await
    );
    let rows = assert_ok!(response.rows.into_values());

    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].clone().into_vec(),
        [Value::I32(1), Value::from("ann"), Value::F64(1.5)]
    );
    assert_eq!(
        rows[1].clone().into_vec(),
        [Value::I32(2), Value::from("bob"), Value::Null]
    );
}

#[tokio::test]
async fn aggregate_over_correlated_subquery() {
    let schema = schema();
    let mut connection = assert_ok!(Sqlite::in_memory().connect().await);
    assert_ok!(connection.push_schema(&schema.db).await);

    assert_ok!(
        connection
            .exec(statement(
                "INSERT INTO \"Person\" (\"Id\", \"Name\") VALUES (1, 'ann'), (2, 'bob')",
                vec![],
            ))
            .await
    );
    assert_ok!(
        connection
            .exec(statement(
                "INSERT INTO \"Person_Localized\" (\"person_key\", \"idx\", \"elt\") \
                 VALUES (1, 0, 'a'), (1, 1, 'b'), (2, 0, 'c'), (2, 1, 'd')",
                vec![],
            ))
            .await
    );

    let response = assert_ok!(
        connection
            .exec(query(
                "SELECT SUM((SELECT COUNT(l.\"elt\") FROM \"Person_Localized\" l \
                 WHERE l.\"person_key\" = p.\"Id\")), \
                 AVG((SELECT COUNT(l.\"elt\") FROM \"Person_Localized\" l \
                 WHERE l.\"person_key\" = p.\"Id\")) FROM \"Person\" p",
                vec![],
                vec![Type::I64, Type::F64],
            ))
            .await
    );
    let rows = assert_ok!(response.rows.into_values());
    assert_eq!(rows[0].clone().into_vec(), [Value::I64(4), Value::F64(2.0)]);
}

#[tokio::test]
async fn rollback_discards_changes() {
    let schema = schema();
    let mut connection = assert_ok!(Sqlite::in_memory().connect().await);
    assert_ok!(connection.push_schema(&schema.db).await);

    assert_ok!(connection.exec(Transaction::Start.into()).await);
    assert_ok!(
        connection
            .exec(statement(
                "INSERT INTO \"Person\" (\"Name\") VALUES ('ann')",
                vec![],
            ))
            .await
    );
    assert_ok!(connection.exec(Transaction::Rollback.into()).await);

    let response = assert_ok!(
        connection
            .exec(query(
                "SELECT COUNT(*) FROM \"Person\"",
                vec![],
                vec![Type::I64],
            ))
            .await
    );
    let rows = assert_ok!(response.rows.into_values());
    assert_eq!(rows[0].clone().into_vec(), [Value::I64(0)]);
}

#[tokio::test]
async fn invalid_sql_is_a_driver_error() {
    let mut connection = assert_ok!(Sqlite::in_memory().connect().await);

    let err = assert_err!(
        connection
            .exec(query("SELECT * FROM \"Missing\"", vec![], vec![]))
            .await
    );
    assert!(err.is_driver_operation_failed());
}
