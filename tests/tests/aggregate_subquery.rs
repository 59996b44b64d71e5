use oql::{stmt::Value, AggregateFallback, Tuple};
use pretty_assertions::assert_eq;
use tests::{fixture, tests, DbTest};

fn values(tuples: &[Tuple]) -> Vec<Vec<Value>> {
    tuples.iter().map(|tuple| tuple.values().to_vec()).collect()
}

fn sorted(mut tuples: Vec<Tuple>) -> Vec<Vec<Value>> {
    tuples.sort_by_key(|tuple| tuple[0].as_i64());
    values(&tuples)
}

async fn sum_over_correlated_subquery(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let tuples = db.query(fixture::CONTACT_NAME_COUNT).list().await.unwrap();
    assert_eq!(
        sorted(tuples),
        [
            vec![Value::I32(1), Value::I64(4)],
            vec![Value::I32(2), Value::I64(0)],
        ]
    );

    // The whole query runs as a single statement
    assert_eq!(test.log().len(), 1);
}

async fn min_max_avg_over_correlated_subquery(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let query = |func: &str| fixture::CONTACT_NAME_COUNT.replace("sum(", &format!("{func}("));

    let min = db.query(query("min")).list().await.unwrap();
    assert_eq!(sorted(min)[0], [Value::I32(1), Value::I64(2)]);

    let max = db.query(query("max")).list().await.unwrap();
    assert_eq!(sorted(max)[0], [Value::I32(1), Value::I64(2)]);

    let avg = sorted(db.query(query("avg")).list().await.unwrap());
    assert_eq!(avg[0], [Value::I32(1), Value::F64(2.0)]);
    assert_eq!(avg[1], [Value::I32(2), Value::F64(0.0)]);
}

async fn two_phase_matches_direct_evaluation(test: &mut DbTest) {
    let mut direct = test.setup_db().await;

    let mut builder = fixture::builder();
    builder.aggregate_fallback(AggregateFallback::TwoPhase);
    let mut two_phase = test
        .setup_db_with(&mut builder, Some(&fixture::NO_AGGREGATE_IN_SUB_SELECT))
        .await;

    for func in ["sum", "min", "max", "avg"] {
        let query = fixture::CONTACT_NAME_COUNT.replace("sum(", &format!("{func}("));

        let expect = direct.query(&query).list().await.unwrap();
        let actual = two_phase.query(&query).list().await.unwrap();
        assert_eq!(sorted(actual), sorted(expect), "{func}");
    }

    // No statement sent to the backend aggregates the subquery
    for sql in test.log().sql() {
        assert!(!sql.contains("GROUP BY"), "{sql}");
    }
}

async fn rejected_without_capability(test: &mut DbTest) {
    let mut db = test
        .setup_db_with(&mut fixture::builder(), Some(&fixture::NO_AGGREGATE_IN_SUB_SELECT))
        .await;

    let err = db.query(fixture::CONTACT_NAME_COUNT).list().await.unwrap_err();
    assert!(err.is_unsupported_feature());
    assert!(test.log().is_empty());
}

async fn correlated_from_path_equals_explicit_join(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let subquery = db
        .query("select d.Id, (select count(*) from d.Contacts c) from Document d order by d.Id")
        .list()
        .await
        .unwrap();

    let joined = db
        .query("select d.Id, count(c) from Document d left join d.Contacts c group by d.Id order by d.Id")
        .list()
        .await
        .unwrap();

    assert_eq!(values(&subquery), values(&joined));
    assert_eq!(
        values(&subquery),
        [
            vec![Value::I32(1), Value::I64(2)],
            vec![Value::I32(2), Value::I64(0)],
        ]
    );
}

tests!(
    sum_over_correlated_subquery,
    min_max_avg_over_correlated_subquery,
    two_phase_matches_direct_evaluation,
    rejected_without_capability,
    correlated_from_path_equals_explicit_join,
);
