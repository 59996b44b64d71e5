use oql::stmt::Value;
use pretty_assertions::assert_eq;
use tests::{tests, DbTest};

async fn map_entries_ordered_by_key(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let tuples = db
        .query(
            "select key(e), value(e) from Person p join p.Localized e \
             where p.Id = 1 order by key(e) desc",
        )
        .list()
        .await
        .unwrap();

    let entries: Vec<_> = tuples.iter().map(|tuple| tuple.values().to_vec()).collect();
    assert_eq!(
        entries,
        [
            vec![Value::I32(1), Value::from("fr")],
            vec![Value::I32(0), Value::from("en")],
        ]
    );
}

async fn one_to_many_contacts(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let tuples = db
        .query("select c.Name from Document d join d.Contacts c where d.Name = 'draft' order by index(c)")
        .list()
        .await
        .unwrap();

    let names: Vec<_> = tuples.iter().map(|tuple| tuple[0].clone()).collect();
    assert_eq!(names, [Value::from("ann"), Value::from("bob")]);
}

async fn many_to_many_readers(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let tuples = db
        .query("select d.Name, r.Name from Document d join d.Readers r order by d.Id")
        .list()
        .await
        .unwrap();

    let pairs: Vec<_> = tuples.iter().map(|tuple| tuple.values().to_vec()).collect();
    assert_eq!(
        pairs,
        [
            vec![Value::from("draft"), Value::from("cid")],
            vec![Value::from("memo"), Value::from("ann")],
        ]
    );
}

async fn exists_over_correlated_collection(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let tuples = db
        .query(
            "select d.Name from Document d \
             where not exists (select c.Id from d.Contacts c)",
        )
        .list()
        .await
        .unwrap();

    assert_eq!(tuples.len(), 1);
    assert_eq!(tuples[0][0], Value::from("memo"));
}

tests!(
    map_entries_ordered_by_key,
    one_to_many_contacts,
    many_to_many_readers,
    exists_over_correlated_collection,
);
