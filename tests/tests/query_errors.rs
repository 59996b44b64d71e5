use tests::{tests, DbTest};

async fn syntax_error_never_reaches_the_backend(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let err = db
        .query("select d.Id, sum((select count(e) from Person c) from Document d")
        .list()
        .await
        .unwrap_err();

    assert!(err.is_syntax());
    assert!(err.syntax_offset().is_some());
    assert!(test.log().is_empty());
}

async fn unresolved_path(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let err = db.query("select p.Nmae from Person p").list().await.unwrap_err();
    assert!(err.is_unresolved_path());
    assert!(err.to_string().contains("Nmae"));

    let err = db.query("from Persn").list().await.unwrap_err();
    assert!(err.is_unresolved_path());

    assert!(test.log().is_empty());
}

async fn ambiguous_alias(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let err = db
        .query("select p.Name from Person p, Company p")
        .list()
        .await
        .unwrap_err();
    assert!(err.is_ambiguous_alias());
    assert!(test.log().is_empty());
}

async fn correlation_to_undeclared_alias(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let err = db
        .query("select d.Id, (select count(*) from Person c where c.Id = link.Id) from Document d")
        .list()
        .await
        .unwrap_err();
    assert!(err.is_correlation());
    assert!(test.log().is_empty());
}

async fn failed_statement_is_a_driver_error(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let err = db.execute("INSERT INTO \"Nowhere\" VALUES (1)", vec![]).await.unwrap_err();
    assert!(err.is_driver_operation_failed());
    assert!(err
        .to_string()
        .starts_with("failed to execute `INSERT INTO \"Nowhere\" VALUES (1)`: "));
}

tests!(
    syntax_error_never_reaches_the_backend,
    unresolved_path,
    ambiguous_alias,
    correlation_to_undeclared_alias,
    failed_statement_is_a_driver_error,
);
