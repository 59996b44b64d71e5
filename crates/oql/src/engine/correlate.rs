//! Binding of identifiers that are not declared in the scope using them.
//!
//! During resolution, identifiers a subquery does not declare are bound to
//! a source of an enclosing scope. Once the whole statement is resolved,
//! [`analyze`] records for every scope which outer sources it reads and
//! rejects references that escape the scope that declares them.

use super::resolve::{column, eq, Position, Resolver};
use crate::{
    ast,
    plan::{CollectionRef, Correlation, Expr, JoinKind, ScopeId, SourceId, Statement},
};

use oql_core::{
    schema::app::{Element, FieldTy},
    Error, Result,
};

/// Finds a source aliased `name` in a scope enclosing `scope`.
pub(super) fn lookup_outer(plan: &Statement, scope: ScopeId, name: &str) -> Option<SourceId> {
    plan.ancestors(scope).skip(1).find_map(|outer| {
        plan.sources
            .iter()
            .find(|source| source.scope == outer.id && source.alias.as_deref() == Some(name))
            .map(|source| source.id)
    })
}

/// Binds a path whose first segment the current scope does not declare.
pub(super) fn bind_free(
    resolver: &mut Resolver<'_>,
    scope: ScopeId,
    path: &ast::Path,
    position: Position,
) -> Result<Expr> {
    let first = &path.first().name;

    if resolver.plan.scope(scope).parent.is_none() {
        return Err(Error::unresolved_path(
            path.to_string(),
            format!("`{first}` is not an alias or a property of an unaliased root"),
        ));
    }

    let ancestors: Vec<ScopeId> = resolver
        .plan
        .ancestors(scope)
        .skip(1)
        .map(|outer| outer.id)
        .collect();

    for outer in ancestors {
        if let Some(source) = resolver.lookup_local(outer, first) {
            return navigate(resolver, source, &path.segments[1..], path, position);
        }

        if let Some(source) = resolver.unaliased_root_with(outer, first) {
            return navigate(resolver, source, &path.segments, path, position);
        }
    }

    Err(Error::correlation(format!(
        "`{first}` is not declared in this query or any enclosing query"
    )))
}

/// Walks a path starting at an outer source. Joins needed along the way
/// belong to the scope declaring that source.
fn navigate(
    resolver: &mut Resolver<'_>,
    outer: SourceId,
    segments: &[ast::Ident],
    path: &ast::Path,
    position: Position,
) -> Result<Expr> {
    let mut current = outer;

    for (i, segment) in segments.iter().enumerate() {
        let field = resolver.field_of(current, segment, path)?;

        match &field.ty {
            FieldTy::Scalar(scalar) => {
                if i + 1 != segments.len() {
                    return Err(Error::unresolved_path(
                        path.to_string(),
                        format!("`{}` is not an association", segment.name),
                    ));
                }
                return Ok(column(current, scalar.column));
            }
            FieldTy::ManyToOne(many_to_one) => {
                let rest = &segments[i + 1..];
                if let Some(fk) = resolver.foreign_key_shortcut(many_to_one, rest, position) {
                    return Ok(column(current, fk));
                }

                // LEFT keeps the outer row count unchanged
                current = resolver.implicit_join(current, field, JoinKind::Left, path)?;
            }
            FieldTy::Collection(_) => return Err(crosses_collection(path, &field.name)),
        }
    }

    resolver.source_ref(current, position)
}

/// Rewrites `FROM c.Localized e` in a subquery, where `c` is an outer
/// alias, into a root over the collection table tied to `c` by a predicate.
pub(super) fn correlated_root(
    resolver: &mut Resolver<'_>,
    scope: ScopeId,
    root: &ast::FromRoot,
) -> Result<()> {
    let path = &root.path;
    let first = path.first();

    let Some(outer) = lookup_outer(&resolver.plan, scope, &first.name) else {
        return Err(Error::correlation(format!(
            "`{}` is not declared in this query or any enclosing query",
            first.name
        )));
    };

    let Some((last, intermediate)) = path.segments[1..].split_last() else {
        return Err(Error::unresolved_path(
            path.to_string(),
            "a FROM path must name an association",
        ));
    };

    let mut current = outer;
    for segment in intermediate {
        let field = resolver.field_of(current, segment, path)?;
        match &field.ty {
            FieldTy::ManyToOne(_) => {
                current = resolver.implicit_join(current, field, JoinKind::Left, path)?;
            }
            FieldTy::Collection(_) => return Err(crosses_collection(path, &field.name)),
            FieldTy::Scalar(_) => {
                return Err(Error::unresolved_path(
                    path.to_string(),
                    format!("`{}` is not an association", field.name),
                ));
            }
        }
    }

    let field = resolver.field_of(current, last, path)?;
    let alias = resolver.declare_alias(scope, root.alias.as_ref())?;
    let schema = resolver.schema;

    let (source, predicate) = match &field.ty {
        FieldTy::ManyToOne(many_to_one) => {
            let target = schema.entity(many_to_one.target);
            let source = resolver.push_source(scope, target.table, Some(target.id), alias, None, None);
            let predicate = eq(
                column(source, target.identifier_column()),
                column(current, many_to_one.column),
            );
            (source, predicate)
        }
        FieldTy::Collection(collection) => {
            let owner_id = schema.entity(collection.owner).identifier_column();
            let link = resolver.next_source_id();
            let collection_ref = CollectionRef {
                field: field.id,
                link,
            };

            match &collection.element {
                Element::Value { .. } => {
                    resolver.push_source(scope, collection.table, None, alias, None, Some(collection_ref));
                }
                Element::OneToMany { target } => {
                    resolver.push_source(
                        scope,
                        collection.table,
                        Some(*target),
                        alias,
                        None,
                        Some(collection_ref),
                    );
                }
                Element::ManyToMany { target, column: fk } => {
                    resolver.push_source(scope, collection.table, None, None, None, Some(collection_ref));
                    resolver.join_link_target(
                        scope,
                        link,
                        *target,
                        *fk,
                        JoinKind::Inner,
                        alias,
                        collection_ref,
                    );
                }
            }

            let predicate = eq(column(link, collection.key), column(current, owner_id));
            (link, predicate)
        }
        FieldTy::Scalar(_) => {
            return Err(Error::unresolved_path(
                path.to_string(),
                format!("`{}` is not an association", field.name),
            ));
        }
    };

    let scope = resolver.plan.scope_mut(scope);
    scope.roots.push(source);
    scope.correlated_filter.push(predicate);
    Ok(())
}

fn crosses_collection(path: &ast::Path, collection: &str) -> Error {
    Error::correlation(format!(
        "correlated path `{path}` crosses collection `{collection}`; \
         join the collection in the subquery's FROM clause"
    ))
}

/// Fills in the correlation table of every scope.
pub(super) fn analyze(plan: &mut Statement) -> Result<()> {
    for index in 0..plan.scopes.len() {
        let scope = ScopeId(index);
        let depth = plan.scope(scope).depth;

        let mut correlations: Vec<Correlation> = vec![];
        for source_id in references(plan, scope) {
            let source = plan.source(source_id);
            if source.scope == scope {
                continue;
            }

            if !plan.encloses(source.scope, scope) {
                let name = match &source.alias {
                    Some(alias) => format!("`{alias}`"),
                    None => format!("implicit join tbl_{}", source_id.0),
                };
                return Err(Error::correlation(format!(
                    "{name} is referenced outside the query that declares it"
                )));
            }

            if !correlations.iter().any(|c| c.source == source_id) {
                correlations.push(Correlation {
                    source: source_id,
                    depth: depth - plan.scope(source.scope).depth,
                });
            }
        }

        plan.scope_mut(scope).correlations = correlations;
    }

    // A subquery reaching past its parent makes the parent correlated too.
    // Children always come after their parent, so walking backwards carries
    // correlations all the way up.
    for index in (1..plan.scopes.len()).rev() {
        let scope = plan.scope(ScopeId(index));
        let Some(parent) = scope.parent else {
            continue;
        };

        let inherited: Vec<Correlation> = scope
            .correlations
            .iter()
            .filter(|c| c.depth > 1)
            .map(|c| Correlation {
                source: c.source,
                depth: c.depth - 1,
            })
            .collect();

        let parent = plan.scope_mut(parent);
        for correlation in inherited {
            if !parent.correlations.iter().any(|c| c.source == correlation.source) {
                parent.correlations.push(correlation);
            }
        }
    }

    Ok(())
}

/// Sources read by the expressions of `scope`, in order of first reference.
fn references(plan: &Statement, scope: ScopeId) -> Vec<SourceId> {
    let s = plan.scope(scope);

    let mut exprs: Vec<&Expr> = s.select.iter().map(|item| &item.expr).collect();
    exprs.extend(&s.filter);
    exprs.extend(&s.correlated_filter);
    exprs.extend(&s.group_by);
    exprs.extend(&s.having);
    exprs.extend(s.order_by.iter().map(|item| &item.expr));

    for source in plan.sources.iter().filter(|source| source.scope == scope) {
        if let Some(join) = &source.join {
            exprs.extend(&join.on);
        }
    }

    let mut sources = vec![];
    for expr in exprs {
        expr.visit(&mut |expr| match expr {
            Expr::Column(column) => sources.push(column.source),
            Expr::Entity { source, .. } => sources.push(*source),
            _ => {}
        });
    }
    sources
}
