use oql::stmt::Value;
use pretty_assertions::assert_eq;
use tests::{tests, DbTest};

async fn implicit_join_skips_missing_targets(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let tuples = db
        .query("select p.Name, p.Employer.Name from Person p order by p.Name")
        .list()
        .await
        .unwrap();

    let names: Vec<_> = tuples.iter().map(|tuple| tuple.values().to_vec()).collect();
    assert_eq!(
        names,
        [
            vec![Value::from("ann"), Value::from("acme")],
            vec![Value::from("bob"), Value::from("acme")],
        ]
    );
}

async fn left_join_keeps_missing_targets(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let tuples = db
        .query("select p.Name, c.Name from Person p left join p.Employer c order by p.Name")
        .list()
        .await
        .unwrap();

    assert_eq!(tuples.len(), 3);
    assert_eq!(tuples[2].values(), [Value::from("cid"), Value::Null]);
}

async fn foreign_key_comparison(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let tuples = db
        .query("select count(*) from Person p where p.Employer.Id = 1")
        .list()
        .await
        .unwrap();
    assert_eq!(tuples[0][0], Value::I64(2));

    // Compared on the foreign key column, without a join
    let sql = test.log().sql();
    assert!(!sql[0].contains("JOIN"), "{}", sql[0]);
}

async fn entity_select_with_parameter(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let bob = db
        .query("from Person p where p.Name = :name")
        .bind("name", "bob")
        .unique()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        bob[0],
        Value::record_from_vec(vec![
            Value::I32(2),
            Value::from("bob"),
            Value::Null,
            Value::I32(1),
        ])
    );

    assert_eq!(bob[0].as_record().map(|record| record.fields.len()), Some(4));

    let nobody = db
        .query("from Person p where p.Name = :name")
        .bind("name", "zed")
        .unique()
        .await
        .unwrap();
    assert!(nobody.is_none());
}

async fn filter_on_aggregate_with_having(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let tuples = db
        .query(
            "select c.Name, count(p) from Person p join p.Employer c \
             group by c.Name having count(p) > 1",
        )
        .list()
        .await
        .unwrap();

    assert_eq!(tuples.len(), 1);
    assert_eq!(tuples[0].values(), [Value::from("acme"), Value::I64(2)]);
}

async fn explicit_inner_join_below_left_join(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let count = |inner: &str| {
        format!(
            "select d.Id, count(e) from Document d left join d.Contacts link \
             {inner} join link.Localized e group by d.Id order by d.Id"
        )
    };

    // The memo has no contacts, so the inner join drops it
    let inner = db.query(count("inner")).list().await.unwrap();
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].values(), [Value::I32(1), Value::I64(4)]);

    let left = db.query(count("left")).list().await.unwrap();
    assert_eq!(left.len(), 2);
    assert_eq!(left[1].values(), [Value::I32(2), Value::I64(0)]);
}

tests!(
    explicit_inner_join_below_left_join,
    implicit_join_skips_missing_targets,
    left_join_keeps_missing_targets,
    foreign_key_comparison,
    entity_select_with_parameter,
    filter_on_aggregate_with_having,
);
