//! The logical plan: the query after name resolution and correlation.
//!
//! Scopes and sources live in arenas owned by [`Statement`] and refer to each
//! other through [`ScopeId`] and [`SourceId`] handles. Scope `0` is the top
//! level query. Sources are numbered across the whole statement, so a source
//! handle identifies a table occurrence unambiguously at every nesting depth.

mod expr;
pub use expr::{AggregateFunc, BinaryOp, Expr, ExprAggregate, ExprColumn};

mod scope;
pub use scope::{Correlation, OrderBy, Scope, ScopeId, SelectItem};

mod source;
pub use source::{CollectionRef, Join, JoinKind, Source, SourceId};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub scopes: Vec<Scope>,
    pub sources: Vec<Source>,
}

impl Statement {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    pub fn source(&self, id: SourceId) -> &Source {
        &self.sources[id.0]
    }

    pub(crate) fn source_mut(&mut self, id: SourceId) -> &mut Source {
        &mut self.sources[id.0]
    }

    /// The top level query
    pub fn root(&self) -> &Scope {
        self.scope(Self::ROOT)
    }

    /// Iterates `scope` and its enclosing scopes, innermost first.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = &Scope> + '_ {
        let mut next = Some(scope);
        std::iter::from_fn(move || {
            let scope = self.scope(next?);
            next = scope.parent;
            Some(scope)
        })
    }

    /// Returns `true` if `ancestor` is `scope` or encloses it.
    pub fn encloses(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        self.ancestors(scope).any(|s| s.id == ancestor)
    }
}
