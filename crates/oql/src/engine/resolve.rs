use super::correlate;
use crate::{
    ast,
    plan::{
        CollectionRef, Expr, ExprAggregate, ExprColumn, Join, JoinKind, OrderBy, Scope, ScopeId,
        SelectItem, Source, SourceId, Statement,
    },
};

use oql_core::{
    schema::{
        app::{Element, Entity, EntityId, Field, FieldId, FieldTy, ManyToOne},
        db::{ColumnId, TableId},
    },
    stmt::{Type, Value},
    Error, Result, Schema,
};
use std::collections::HashMap;

/// Where an expression appears. Entity references only expand to their
/// columns when they are a top level select item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Position {
    Select,
    Value,
}

pub(super) struct Resolver<'a> {
    pub(super) schema: &'a Schema,
    pub(super) plan: Statement,

    /// Implicit joins already introduced, keyed by parent source and property
    implicit: HashMap<(SourceId, FieldId), SourceId>,
}

/// Binds the syntax tree against the mapping, producing an uncorrelated plan.
pub(super) fn resolve(schema: &Schema, query: &ast::Query) -> Result<Statement> {
    let mut resolver = Resolver {
        schema,
        plan: Statement::default(),
        implicit: HashMap::new(),
    };
    resolver.resolve_query(query, None)?;
    Ok(resolver.plan)
}

impl<'a> Resolver<'a> {
    fn resolve_query(&mut self, query: &ast::Query, parent: Option<ScopeId>) -> Result<ScopeId> {
        let id = ScopeId(self.plan.scopes.len());
        let depth = match parent {
            Some(parent) => self.plan.scope(parent).depth + 1,
            None => 0,
        };
        self.plan.scopes.push(Scope::new(id, parent, depth));

        for root in &query.from {
            self.resolve_root(id, root)?;
        }

        for join in &query.joins {
            self.resolve_join(id, join)?;
        }

        // Subqueries produce values; only top level items materialize entities
        let position = match parent {
            Some(_) => Position::Value,
            None => Position::Select,
        };

        let (distinct, select) = match &query.select {
            Some(select) => {
                let mut items = vec![];
                for item in &select.items {
                    items.push(SelectItem {
                        expr: self.resolve_expr(id, &item.expr, position)?,
                        alias: item.alias.as_ref().map(|alias| alias.name.clone()),
                    });
                }
                (select.distinct, items)
            }
            None => {
                let first = &query.from[0];
                let source = first
                    .alias
                    .as_ref()
                    .and_then(|alias| self.lookup_local(id, &alias.name))
                    .unwrap_or(self.plan.scope(id).roots[0]);
                let expr = self.source_ref(source, position)?;
                (false, vec![SelectItem { expr, alias: None }])
            }
        };

        let filter = match &query.filter {
            Some(filter) => {
                let filter = self.resolve_expr(id, filter, Position::Value)?;
                if filter.contains_aggregate() {
                    return Err(Error::invalid_statement(
                        "aggregate functions are not allowed in WHERE",
                    ));
                }
                Some(filter)
            }
            None => None,
        };

        let mut group_by = vec![];
        for expr in &query.group_by {
            let expr = self.resolve_expr(id, expr, Position::Value)?;
            if expr.contains_aggregate() {
                return Err(Error::invalid_statement(
                    "aggregate functions are not allowed in GROUP BY",
                ));
            }
            group_by.push(expr);
        }

        let having = query
            .having
            .as_ref()
            .map(|having| self.resolve_expr(id, having, Position::Value))
            .transpose()?;

        let mut order_by = vec![];
        for item in &query.order_by {
            order_by.push(OrderBy {
                expr: self.resolve_order_by(id, &item.expr, &select)?,
                desc: item.desc,
            });
        }

        let scope = self.plan.scope_mut(id);
        scope.distinct = distinct;
        scope.select = select;
        scope.filter = filter;
        scope.group_by = group_by;
        scope.having = having;
        scope.order_by = order_by;

        Ok(id)
    }

    fn resolve_root(&mut self, scope: ScopeId, root: &ast::FromRoot) -> Result<()> {
        let path = &root.path;
        let first = path.first();

        if path.segments.len() == 1 {
            if let Some(entity) = self.schema.entity_by_name(&first.name) {
                let alias = self.declare_alias(scope, root.alias.as_ref())?;
                let source = self.push_source(scope, entity.table, Some(entity.id), alias, None, None);
                self.plan.scope_mut(scope).roots.push(source);
                return Ok(());
            }
        }

        // `FROM Person p, p.Localized e` joins the collection to `p`
        if self.lookup_local(scope, &first.name).is_some() {
            self.resolve_join_path(scope, path, root.alias.as_ref(), JoinKind::Inner)?;
            return Ok(());
        }

        if path.segments.len() > 1 && self.plan.scope(scope).parent.is_some() {
            return correlate::correlated_root(self, scope, root);
        }

        let reason = if path.segments.len() == 1 {
            format!("`{}` is not a mapped entity", first.name)
        } else {
            format!("`{}` is not an alias", first.name)
        };
        Err(Error::unresolved_path(path.to_string(), reason))
    }

    fn resolve_join(&mut self, scope: ScopeId, join: &ast::Join) -> Result<()> {
        let kind = match join.kind {
            ast::JoinKind::Inner => JoinKind::Inner,
            ast::JoinKind::Left => JoinKind::Left,
        };
        let path = &join.path;
        let name = &path.first().name;

        let entity = match path.segments.len() {
            1 if self.lookup_local(scope, name).is_none() => self.schema.entity_by_name(name),
            _ => None,
        };

        let source = match entity {
            Some(entity) => {
                if join.with.is_none() {
                    return Err(Error::invalid_statement(format!(
                        "join to entity `{}` requires a `WITH` condition",
                        entity.name
                    )));
                }

                let alias = self.declare_alias(scope, join.alias.as_ref())?;
                let Some(&parent) = self.plan.scope(scope).roots.last() else {
                    return Err(Error::invalid_statement("join without a FROM root"));
                };
                self.push_source(
                    scope,
                    entity.table,
                    Some(entity.id),
                    alias,
                    Some(Join {
                        parent,
                        kind,
                        on: vec![],
                    }),
                    None,
                )
            }
            None => self.resolve_join_path(scope, path, join.alias.as_ref(), kind)?,
        };

        // An explicit INNER join stays INNER even below an outer join
        if kind == JoinKind::Inner {
            let parent = self.plan.source(source).join.as_ref().map(|join| join.parent);
            if parent.is_some_and(|parent| self.plan.source(parent).optional) {
                log::debug!(
                    "inner join below an outer join drops rows the outer join kept; path={path}"
                );
            }
        }

        if let Some(with) = &join.with {
            let condition = self.resolve_expr(scope, with, Position::Value)?;
            if condition.contains_aggregate() {
                return Err(Error::invalid_statement(
                    "aggregate functions are not allowed in a join condition",
                ));
            }

            if let Some(join) = &mut self.plan.source_mut(source).join {
                join.on.push(condition);
            }
        }

        Ok(())
    }

    /// Resolves `alias.property[.property]*` in a FROM or JOIN clause.
    fn resolve_join_path(
        &mut self,
        scope: ScopeId,
        path: &ast::Path,
        alias: Option<&ast::Ident>,
        kind: JoinKind,
    ) -> Result<SourceId> {
        let first = path.first();
        let Some(mut current) = self.lookup_local(scope, &first.name) else {
            if correlate::lookup_outer(&self.plan, scope, &first.name).is_some() {
                return Err(Error::correlation(format!(
                    "join path `{path}` must start at an alias of its own query"
                )));
            }
            return Err(Error::unresolved_path(
                path.to_string(),
                format!("`{}` is not an alias", first.name),
            ));
        };

        let Some((last, intermediate)) = path.segments[1..].split_last() else {
            return Err(Error::unresolved_path(
                path.to_string(),
                "a join path must name an association",
            ));
        };

        for segment in intermediate {
            let field = self.field_of(current, segment, path)?;
            match &field.ty {
                FieldTy::ManyToOne(_) => {
                    current = self.implicit_join(current, field, JoinKind::Inner, path)?;
                }
                FieldTy::Collection(_) => {
                    return Err(Error::unresolved_path(
                        path.to_string(),
                        format!("`{}` is a collection; join it with an alias first", field.name),
                    ));
                }
                FieldTy::Scalar(_) => {
                    return Err(Error::unresolved_path(
                        path.to_string(),
                        format!("`{}` is not an association", field.name),
                    ));
                }
            }
        }

        let field = self.field_of(current, last, path)?;
        let alias = self.declare_alias(scope, alias)?;
        self.join_association(current, field, kind, alias, path)
    }

    /// Joins the rows an association of `parent` points at. For a
    /// many-to-many collection this adds the link table and the target; the
    /// target is returned.
    pub(super) fn join_association(
        &mut self,
        parent: SourceId,
        field: &'a Field,
        kind: JoinKind,
        alias: Option<String>,
        path: &ast::Path,
    ) -> Result<SourceId> {
        let scope = self.plan.source(parent).scope;

        match &field.ty {
            FieldTy::ManyToOne(many_to_one) => {
                let target = self.schema.entity(many_to_one.target);
                let id = self.next_source_id();
                let on = vec![eq(
                    column(id, target.identifier_column()),
                    column(parent, many_to_one.column),
                )];
                Ok(self.push_source(
                    scope,
                    target.table,
                    Some(target.id),
                    alias,
                    Some(Join { parent, kind, on }),
                    None,
                ))
            }
            FieldTy::Collection(collection) => {
                let owner_id = self.schema.entity(collection.owner).identifier_column();
                let id = self.next_source_id();
                let on = vec![eq(column(id, collection.key), column(parent, owner_id))];
                let collection_ref = CollectionRef {
                    field: field.id,
                    link: id,
                };

                match &collection.element {
                    Element::Value { .. } => Ok(self.push_source(
                        scope,
                        collection.table,
                        None,
                        alias,
                        Some(Join { parent, kind, on }),
                        Some(collection_ref),
                    )),
                    Element::OneToMany { target } => Ok(self.push_source(
                        scope,
                        collection.table,
                        Some(*target),
                        alias,
                        Some(Join { parent, kind, on }),
                        Some(collection_ref),
                    )),
                    Element::ManyToMany { target, column: fk } => {
                        let link = self.push_source(
                            scope,
                            collection.table,
                            None,
                            None,
                            Some(Join { parent, kind, on }),
                            Some(collection_ref),
                        );
                        Ok(self.join_link_target(scope, link, *target, *fk, kind, alias, collection_ref))
                    }
                }
            }
            FieldTy::Scalar(_) => Err(Error::unresolved_path(
                path.to_string(),
                format!("`{}` is not an association", field.name),
            )),
        }
    }

    /// Joins the target entity of a many-to-many link table.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn join_link_target(
        &mut self,
        scope: ScopeId,
        link: SourceId,
        target: EntityId,
        fk: ColumnId,
        kind: JoinKind,
        alias: Option<String>,
        collection_ref: CollectionRef,
    ) -> SourceId {
        let target = self.schema.entity(target);
        let id = self.next_source_id();
        let on = vec![eq(column(id, target.identifier_column()), column(link, fk))];
        self.push_source(
            scope,
            target.table,
            Some(target.id),
            alias,
            Some(Join {
                parent: link,
                kind,
                on,
            }),
            Some(collection_ref),
        )
    }

    /// Joins an association reached by navigating a path, reusing an
    /// earlier join of the same property from the same source.
    pub(super) fn implicit_join(
        &mut self,
        parent: SourceId,
        field: &'a Field,
        kind: JoinKind,
        path: &ast::Path,
    ) -> Result<SourceId> {
        if let Some(&source) = self.implicit.get(&(parent, field.id)) {
            return Ok(source);
        }

        let kind = if self.plan.source(parent).optional {
            JoinKind::Left
        } else {
            kind
        };

        let source = self.join_association(parent, field, kind, None, path)?;
        self.implicit.insert((parent, field.id), source);
        Ok(source)
    }

    pub(super) fn next_source_id(&self) -> SourceId {
        SourceId(self.plan.sources.len())
    }

    /// Adds a source to `scope`. Joined sources are registered under the
    /// root they hang off.
    pub(super) fn push_source(
        &mut self,
        scope: ScopeId,
        table: TableId,
        entity: Option<EntityId>,
        alias: Option<String>,
        join: Option<Join>,
        collection: Option<CollectionRef>,
    ) -> SourceId {
        let id = self.next_source_id();

        let optional = match &join {
            Some(join) => join.kind == JoinKind::Left || self.plan.source(join.parent).optional,
            None => false,
        };

        if let Some(join) = &join {
            let root = self.root_of(join.parent);
            self.plan.source_mut(root).joins.push(id);
        }

        self.plan.sources.push(Source {
            id,
            scope,
            alias,
            table,
            entity,
            collection,
            join,
            joins: vec![],
            optional,
        });

        id
    }

    fn root_of(&self, mut source: SourceId) -> SourceId {
        while let Some(join) = &self.plan.source(source).join {
            source = join.parent;
        }
        source
    }

    /// Checks that `alias` is not declared anywhere it could be confused
    /// with: in `scope`, in an enclosing scope or in a nested one.
    pub(super) fn declare_alias(
        &self,
        scope: ScopeId,
        alias: Option<&ast::Ident>,
    ) -> Result<Option<String>> {
        let Some(alias) = alias else {
            return Ok(None);
        };

        let taken = self.plan.sources.iter().any(|source| {
            source.alias.as_deref() == Some(alias.name.as_str())
                && (self.plan.encloses(source.scope, scope)
                    || self.plan.encloses(scope, source.scope))
        });

        if taken {
            return Err(Error::ambiguous_alias(&alias.name));
        }

        Ok(Some(alias.name.clone()))
    }

    pub(super) fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SourceId> {
        self.plan
            .sources
            .iter()
            .find(|source| source.scope == scope && source.alias.as_deref() == Some(name))
            .map(|source| source.id)
    }

    /// An unaliased entity root of `scope` with a property called `name`.
    pub(super) fn unaliased_root_with(&self, scope: ScopeId, name: &str) -> Option<SourceId> {
        self.plan.scope(scope).roots.iter().copied().find(|root| {
            let source = self.plan.source(*root);
            source.alias.is_none()
                && source
                    .entity
                    .is_some_and(|entity| self.schema.entity(entity).field_by_name(name).is_some())
        })
    }

    pub(super) fn entity_of(&self, source: SourceId) -> Option<&'a Entity> {
        let schema = self.schema;
        self.plan
            .source(source)
            .entity
            .map(|entity| schema.entity(entity))
    }

    pub(super) fn field_of(
        &self,
        source: SourceId,
        segment: &ast::Ident,
        path: &ast::Path,
    ) -> Result<&'a Field> {
        let Some(entity) = self.entity_of(source) else {
            return Err(Error::unresolved_path(
                path.to_string(),
                format!(
                    "collection elements have no property `{}`",
                    segment.name
                ),
            ));
        };

        entity.field_by_name(&segment.name).ok_or_else(|| {
            Error::unresolved_path(
                path.to_string(),
                format!("{} has no property `{}`", entity.name, segment.name),
            )
        })
    }

    /// `x.Parent` used as a value, or `x.Parent.Id`, reads the foreign key
    /// instead of joining the target.
    pub(super) fn foreign_key_shortcut(
        &self,
        many_to_one: &ManyToOne,
        rest: &[ast::Ident],
        position: Position,
    ) -> Option<ColumnId> {
        match rest {
            [] if position == Position::Value => Some(many_to_one.column),
            [id] => {
                let target = self.schema.entity(many_to_one.target);
                (target.identifier_field().name == id.name).then_some(many_to_one.column)
            }
            _ => None,
        }
    }

    /// The expression standing for a whole source: an entity, or the
    /// element of a value collection.
    pub(super) fn source_ref(&self, source: SourceId, position: Position) -> Result<Expr> {
        let src = self.plan.source(source);

        if let Some(entity) = self.entity_of(source) {
            return Ok(match position {
                Position::Value => column(source, entity.identifier_column()),
                Position::Select => {
                    let columns: Vec<ColumnId> =
                        entity.columns().filter_map(Field::column).collect();
                    let ty = Type::Record(
                        columns
                            .iter()
                            .map(|column| self.schema.db.column(*column).ty.clone())
                            .collect(),
                    );
                    Expr::Entity {
                        source,
                        id: entity.identifier_column(),
                        columns,
                        ty,
                    }
                }
            });
        }

        let Some(collection_ref) = src.collection else {
            return Err(oql_core::err!("source {} has neither entity nor collection", source.0));
        };

        match self.collection(collection_ref.field)?.element {
            Element::Value { column: element, .. } | Element::ManyToMany { column: element, .. } => {
                Ok(column(source, element))
            }
            Element::OneToMany { target } => Ok(column(
                source,
                self.schema.entity(target).identifier_column(),
            )),
        }
    }

    fn collection(&self, field: FieldId) -> Result<&'a oql_core::schema::app::Collection> {
        self.schema
            .field(field)
            .as_collection()
            .ok_or_else(|| oql_core::err!("`{}` is not a collection", self.schema.field(field).name))
    }

    pub(super) fn ty_of(&self, expr: &Expr) -> Type {
        let db = &self.schema.db;
        expr.ty(&|column| db.column(column).ty.clone())
    }

    fn resolve_expr(&mut self, scope: ScopeId, expr: &ast::Expr, position: Position) -> Result<Expr> {
        use Position::Value as V;

        Ok(match expr {
            ast::Expr::Literal(literal) => Expr::Value(literal_value(literal)),
            ast::Expr::Param(ident) => Expr::Param(ident.name.clone()),
            ast::Expr::Path(path) => self.resolve_path(scope, path, position)?,
            ast::Expr::Aggregate(aggregate) => self.resolve_aggregate(scope, aggregate)?,
            ast::Expr::MapFn(func, alias) => self.resolve_map_fn(scope, *func, alias)?,
            ast::Expr::Binary { lhs, op, rhs } => {
                let lhs = self.resolve_expr(scope, lhs, V)?;
                let rhs = self.resolve_expr(scope, rhs, V)?;
                binary(lhs, *op, rhs)?
            }
            ast::Expr::And(operands) => Expr::And(self.resolve_all(scope, operands)?),
            ast::Expr::Or(operands) => Expr::Or(self.resolve_all(scope, operands)?),
            ast::Expr::Not(expr) => Expr::Not(Box::new(self.resolve_expr(scope, expr, V)?)),
            ast::Expr::Neg(expr) => Expr::Neg(Box::new(self.resolve_expr(scope, expr, V)?)),
            ast::Expr::IsNull { expr, negate } => Expr::IsNull {
                expr: Box::new(self.resolve_expr(scope, expr, V)?),
                negate: *negate,
            },
            ast::Expr::InList { expr, list, negate } => Expr::InList {
                expr: Box::new(self.resolve_expr(scope, expr, V)?),
                list: self.resolve_all(scope, list)?,
                negate: *negate,
            },
            ast::Expr::InSubquery {
                expr,
                query,
                negate,
            } => {
                let expr = self.resolve_expr(scope, expr, V)?;
                let (query, _) = self.resolve_subquery(scope, query, true)?;
                Expr::InSubquery {
                    expr: Box::new(expr),
                    scope: query,
                    negate: *negate,
                }
            }
            ast::Expr::Between {
                expr,
                low,
                high,
                negate,
            } => Expr::Between {
                expr: Box::new(self.resolve_expr(scope, expr, V)?),
                low: Box::new(self.resolve_expr(scope, low, V)?),
                high: Box::new(self.resolve_expr(scope, high, V)?),
                negate: *negate,
            },
            ast::Expr::Like {
                expr,
                pattern,
                negate,
            } => Expr::Like {
                expr: Box::new(self.resolve_expr(scope, expr, V)?),
                pattern: Box::new(self.resolve_expr(scope, pattern, V)?),
                negate: *negate,
            },
            ast::Expr::Exists(query) => Expr::Exists(self.resolve_subquery(scope, query, false)?.0),
            ast::Expr::Subquery(query) => {
                let (query, ty) = self.resolve_subquery(scope, query, true)?;
                Expr::Subquery { scope: query, ty }
            }
        })
    }

    fn resolve_all(&mut self, scope: ScopeId, exprs: &[ast::Expr]) -> Result<Vec<Expr>> {
        exprs
            .iter()
            .map(|expr| self.resolve_expr(scope, expr, Position::Value))
            .collect()
    }

    fn resolve_subquery(
        &mut self,
        scope: ScopeId,
        query: &ast::Query,
        single: bool,
    ) -> Result<(ScopeId, Type)> {
        let id = self.resolve_query(query, Some(scope))?;
        let select = &self.plan.scope(id).select;

        if single && select.len() != 1 {
            return Err(Error::invalid_statement(format!(
                "a subquery used as a value must select exactly one item, found {}",
                select.len()
            )));
        }

        let ty = match select.first() {
            Some(item) => self.ty_of(&item.expr),
            None => Type::Unknown,
        };
        Ok((id, ty))
    }

    fn resolve_aggregate(&mut self, scope: ScopeId, aggregate: &ast::Aggregate) -> Result<Expr> {
        let func = aggregate.func;
        let arg = aggregate
            .arg
            .as_ref()
            .map(|arg| self.resolve_expr(scope, arg, Position::Value))
            .transpose()?;

        if arg.as_ref().is_some_and(Expr::contains_aggregate) {
            return Err(Error::invalid_statement("aggregate functions cannot be nested"));
        }

        let arg_ty = arg.as_ref().map(|arg| self.ty_of(arg));

        if matches!(func, ast::AggregateFunc::Sum | ast::AggregateFunc::Avg) {
            if let Some(ty) = &arg_ty {
                if !ty.is_numeric() && !matches!(ty, Type::Null | Type::Unknown) {
                    return Err(Error::invalid_statement(format!(
                        "`{}` requires a numeric argument, got {ty:?}",
                        func.name()
                    )));
                }
            }
        }

        let ty = match func {
            ast::AggregateFunc::Count => Type::I64,
            ast::AggregateFunc::Avg => Type::F64,
            ast::AggregateFunc::Sum | ast::AggregateFunc::Min | ast::AggregateFunc::Max => {
                arg_ty.unwrap_or(Type::Unknown)
            }
        };

        Ok(Expr::Aggregate(ExprAggregate {
            func,
            arg: arg.map(Box::new),
            distinct: aggregate.distinct,
            ty,
        }))
    }

    fn resolve_map_fn(&mut self, scope: ScopeId, func: ast::MapFn, alias: &ast::Ident) -> Result<Expr> {
        let source = match self.lookup_local(scope, &alias.name) {
            Some(source) => source,
            None => match correlate::lookup_outer(&self.plan, scope, &alias.name) {
                Some(source) => source,
                None if self.plan.scope(scope).parent.is_some() => {
                    return Err(Error::correlation(format!(
                        "`{}` is not declared in this query or any enclosing query",
                        alias.name
                    )));
                }
                None => {
                    return Err(Error::unresolved_path(
                        alias.name.clone(),
                        format!("`{}` is not an alias", alias.name),
                    ));
                }
            },
        };

        let Some(collection_ref) = self.plan.source(source).collection else {
            return Err(Error::invalid_statement(format!(
                "`{}` does not alias a collection",
                alias.name
            )));
        };

        match func {
            ast::MapFn::Value => self.source_ref(source, Position::Value),
            ast::MapFn::Key | ast::MapFn::Index => {
                let collection = self.collection(collection_ref.field)?;
                match collection.index() {
                    Some(index) => Ok(column(collection_ref.link, index)),
                    None => Err(Error::invalid_statement(format!(
                        "`{}` is not an indexed collection",
                        collection.role
                    ))),
                }
            }
        }
    }

    fn resolve_path(&mut self, scope: ScopeId, path: &ast::Path, position: Position) -> Result<Expr> {
        let first = &path.first().name;

        if let Some(source) = self.lookup_local(scope, first) {
            return self.navigate(source, &path.segments[1..], path, position);
        }

        if let Some(source) = self.unaliased_root_with(scope, first) {
            return self.navigate(source, &path.segments, path, position);
        }

        correlate::bind_free(self, scope, path, position)
    }

    /// Walks property segments from a source of the current scope, joining
    /// associations as they are crossed.
    fn navigate(
        &mut self,
        source: SourceId,
        segments: &[ast::Ident],
        path: &ast::Path,
        position: Position,
    ) -> Result<Expr> {
        let mut current = source;

        for (i, segment) in segments.iter().enumerate() {
            let field = self.field_of(current, segment, path)?;

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
                    if let Some(fk) = self.foreign_key_shortcut(many_to_one, rest, position) {
                        return Ok(column(current, fk));
                    }
                    current = self.implicit_join(current, field, JoinKind::Inner, path)?;
                }
                FieldTy::Collection(_) => {
                    current = self.implicit_join(current, field, JoinKind::Left, path)?;
                }
            }
        }

        self.source_ref(current, position)
    }

    /// ORDER BY may name a select item by its alias.
    fn resolve_order_by(
        &mut self,
        scope: ScopeId,
        expr: &ast::Expr,
        select: &[SelectItem],
    ) -> Result<Expr> {
        if let ast::Expr::Path(path) = expr {
            let name = &path.first().name;
            if path.segments.len() == 1 && self.lookup_local(scope, name).is_none() {
                let item = select
                    .iter()
                    .find(|item| item.alias.as_deref() == Some(name.as_str()));
                if let Some(item) = item {
                    return Ok(item.expr.clone());
                }
            }
        }

        self.resolve_expr(scope, expr, Position::Value)
    }
}

pub(super) fn column(source: SourceId, column: ColumnId) -> Expr {
    Expr::Column(ExprColumn { source, column })
}

pub(super) fn eq(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        lhs: Box::new(lhs),
        op: ast::BinaryOp::Eq,
        rhs: Box::new(rhs),
    }
}

/// Comparisons against a `NULL` literal become null tests.
fn binary(lhs: Expr, op: ast::BinaryOp, rhs: Expr) -> Result<Expr> {
    let is_null = |expr: &Expr| matches!(expr, Expr::Value(Value::Null));

    if !is_null(&lhs) && !is_null(&rhs) {
        return Ok(Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        });
    }

    let negate = match op {
        ast::BinaryOp::Eq => false,
        ast::BinaryOp::Ne => true,
        _ => {
            return Err(Error::invalid_statement(
                "`NULL` can only be compared with `=`, `<>` or `IS`",
            ))
        }
    };

    let operand = if is_null(&lhs) { rhs } else { lhs };
    Ok(Expr::IsNull {
        expr: Box::new(operand),
        negate,
    })
}

fn literal_value(literal: &ast::Literal) -> Value {
    match literal {
        ast::Literal::Integer(value) => match i32::try_from(*value) {
            Ok(value) => Value::I32(value),
            Err(_) => Value::I64(*value),
        },
        ast::Literal::Decimal(value) => Value::F64(*value),
        ast::Literal::String(value) => Value::String(value.clone()),
        ast::Literal::Bool(value) => Value::Bool(*value),
        ast::Literal::Null => Value::Null,
    }
}
