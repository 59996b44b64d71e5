use oql::{
    plan::{Correlation, Expr, JoinKind, ScopeId, SourceId, Statement},
    schema::app::Generator,
    stmt::Type,
    Engine, Schema,
};
use oql_core::driver::Capability;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std_util::prelude::*;

fn engine() -> Engine {
    let schema = Schema::builder()
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
        .unwrap();

    Engine::new(Arc::new(schema), &Capability::SQLITE)
}

fn correlation(source: usize, depth: usize) -> Correlation {
    Correlation {
        source: SourceId(source),
        depth,
    }
}

// ---------------------------------------------------------------------------
// Correlation tables
// ---------------------------------------------------------------------------

#[test]
fn seed_subquery_is_correlated_with_the_join_alias() {
    let plan = assert_ok!(engine().plan(
        "select d.Id, sum((select count(e) from Person c left join c.Localized e \
         where c.Id = link.Id)) \
         from Document d left join d.Contacts link group by d.Id"
    ));

    assert_eq!(plan.scopes.len(), 2);
    assert_empty!(plan.root().correlations);
    assert_eq!(plan.scope(ScopeId(1)).correlations, [correlation(1, 1)]);
    assert!(plan.scope(ScopeId(1)).is_correlated());
}

#[test]
fn uncorrelated_subquery() {
    let plan = assert_ok!(engine().plan(
        "select (select count(*) from Company c) from Person p"
    ));
    assert!(!plan.scope(ScopeId(1)).is_correlated());
}

#[test]
fn correlation_depth_propagates_outward() {
    let plan = assert_ok!(engine().plan(
        "select d.Id from Document d where exists \
         (select c.Id from Person c where c.Age in \
         (select x.Age from Person x where x.Id = d.Id))"
    ));

    assert_eq!(plan.scopes.len(), 3);
    assert_eq!(plan.scope(ScopeId(2)).correlations, [correlation(0, 2)]);

    // The middle query reads nothing from outside, but must still be
    // evaluated per outer row
    assert_eq!(plan.scope(ScopeId(1)).correlations, [correlation(0, 1)]);
    assert_empty!(plan.root().correlations);
}

#[test]
fn correlations_are_listed_in_order_of_first_reference() {
    let plan = assert_ok!(engine().plan(
        "select (select count(*) from Person x where x.Id = c.Id or x.Name = d.Name or x.Id = c.Age) \
         from Document d join d.Contacts c"
    ));
    assert_eq!(
        plan.scope(ScopeId(1)).correlations,
        [correlation(1, 1), correlation(0, 1)]
    );
}

#[test]
fn property_of_unaliased_outer_root() {
    let engine = engine();
    let plan = assert_ok!(engine.plan(
        "select (select count(*) from Person x where x.Name = Name) from Document"
    ));

    assert_eq!(plan.scope(ScopeId(1)).correlations, [correlation(0, 1)]);
}

#[test]
fn outer_many_to_one_navigation_joins_in_outer_query() {
    let plan = assert_ok!(engine().plan(
        "select (select count(*) from Company x where x.Name = p.Employer.Name) from Person p"
    ));

    // p=0, x=1, then the implicit join for `p.Employer`
    let employer = plan.source(SourceId(2));
    assert_eq!(employer.scope, Statement::ROOT);
    assert_eq!(employer.join.as_ref().unwrap().kind, JoinKind::Left);
    assert_eq!(plan.source(SourceId(0)).joins, [SourceId(2)]);
    assert_eq!(plan.scope(ScopeId(1)).correlations, [correlation(2, 1)]);
}

// ---------------------------------------------------------------------------
// Correlated FROM paths
// ---------------------------------------------------------------------------

#[test]
fn collection_root_is_tied_to_outer_alias() {
    let plan = assert_ok!(engine().plan(
        "select d.Id, (select count(*) from d.Contacts c) from Document d"
    ));

    let subquery = plan.scope(ScopeId(1));
    assert_eq!(subquery.roots, [SourceId(1)]);
    assert_eq!(subquery.correlated_filter.len(), 1);
    assert_eq!(subquery.correlations, [correlation(0, 1)]);

    let root = plan.source(SourceId(1));
    assert!(root.is_root());
    assert_eq!(root.alias.as_deref(), Some("c"));
    assert!(root.collection.is_some());
}

#[test]
fn many_to_many_root_joins_target() {
    let plan = assert_ok!(engine().plan(
        "select (select count(r) from d.Readers r) from Document d"
    ));

    let subquery = plan.scope(ScopeId(1));
    assert_eq!(subquery.roots, [SourceId(1)]);

    let link = plan.source(SourceId(1));
    assert!(link.alias.is_none());
    assert_eq!(link.joins, [SourceId(2)]);

    let target = plan.source(SourceId(2));
    assert_eq!(target.alias.as_deref(), Some("r"));
    assert_eq!(target.join.as_ref().unwrap().kind, JoinKind::Inner);

    let Expr::Aggregate(count) = &subquery.select[0].expr else {
        panic!("expected an aggregate");
    };
    assert!(matches!(
        count.arg.as_deref(),
        Some(Expr::Column(c)) if c.source == SourceId(2)
    ));
}

#[test]
fn many_to_one_root() {
    let plan = assert_ok!(engine().plan(
        "select (select e.Name from p.Employer e) from Person p"
    ));

    let subquery = plan.scope(ScopeId(1));
    assert_eq!(subquery.roots, [SourceId(1)]);
    assert!(plan.source(SourceId(1)).collection.is_none());
    assert_eq!(subquery.correlations, [correlation(0, 1)]);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn undeclared_identifier_in_subquery() {
    let err = assert_err!(engine().plan(
        "select (select count(*) from Person x where x.Id = y.Id) from Person p"
    ));
    assert!(err.is_correlation());
    assert!(err.to_string().contains("`y`"));
}

#[test]
fn sibling_subquery_alias_is_not_visible() {
    let err = assert_err!(engine().plan(
        "select (select count(*) from Person a), \
         (select count(*) from Person b where b.Id = a.Id) from Person p"
    ));
    assert!(err.is_correlation());
}

#[test]
fn correlated_path_crossing_a_collection() {
    let err = assert_err!(engine().plan(
        "select (select count(*) from Person x where x.Name = d.Contacts.Name) from Document d"
    ));
    assert!(err.is_correlation());
}

#[test]
fn join_path_from_outer_alias() {
    let err = assert_err!(engine().plan(
        "select (select count(*) from Person x join d.Contacts c) from Document d"
    ));
    assert!(err.is_correlation());
}

#[test]
fn correlated_root_from_undeclared_alias() {
    let err = assert_err!(engine().plan(
        "select (select count(*) from q.Contacts c) from Document d"
    ));
    assert!(err.is_correlation());
}
