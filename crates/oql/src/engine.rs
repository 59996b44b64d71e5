mod correlate;

mod lower;
use lower::Lower;

mod materialize;

mod resolve;

mod two_phase;
use two_phase::TwoPhase;

use crate::{parser, plan, Tuple};

use oql_core::{
    driver::{operation::QuerySql, Capability, Connection, Operation},
    err,
    stmt::{Type, Value},
    Error, Result, Schema,
};
use oql_sql::{Param, Serializer, Statement};
use std::sync::Arc;

/// How to evaluate an aggregate over a correlated subquery when the backend
/// cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateFallback {
    /// Fail compilation with an unsupported feature error
    #[default]
    Reject,

    /// Fetch the ungrouped rows and aggregate them in memory
    TwoPhase,
}

/// Compiles query text into SQL for one backend.
///
/// The engine holds no per-query state: the same engine can compile any
/// number of queries, concurrently, against its shared schema.
#[derive(Debug, Clone)]
pub struct Engine {
    schema: Arc<Schema>,
    capability: &'static Capability,
    fallback: AggregateFallback,
}

/// A compiled query, ready to execute.
#[derive(Debug, Clone)]
pub struct Compiled {
    sql: String,
    params: Vec<Param>,

    /// Type of each column the statement returns
    ret: Vec<Type>,

    /// Type of each select item
    shape: Vec<Type>,

    strategy: Strategy,
}

#[derive(Debug, Clone)]
enum Strategy {
    /// The backend computes the final rows
    Direct,

    /// The backend returns ungrouped rows; aggregation happens in memory
    TwoPhase(TwoPhase),
}

impl Engine {
    pub fn new(schema: Arc<Schema>, capability: &'static Capability) -> Engine {
        Engine {
            schema,
            capability,
            fallback: AggregateFallback::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: AggregateFallback) -> Engine {
        self.fallback = fallback;
        self
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn capability(&self) -> &'static Capability {
        self.capability
    }

    /// Parses, resolves and correlates a query.
    pub fn plan(&self, text: &str) -> Result<plan::Statement> {
        let query = parser::parse(text)?;
        let mut plan = resolve::resolve(&self.schema, &query)?;
        correlate::analyze(&mut plan)?;
        log::trace!("planned query; text={text:?}; plan={plan:#?}");
        Ok(plan)
    }

    pub fn compile(&self, text: &str) -> Result<Compiled> {
        let plan = self.plan(text)?;
        let lower = Lower {
            schema: &self.schema,
            plan: &plan,
            capability: self.capability,
        };

        let shape = lower.shape();

        let (select, ret, strategy) = if self.needs_two_phase(&lower) {
            let (select, ret, two_phase) = two_phase::plan(&lower)?;
            (select, ret, Strategy::TwoPhase(two_phase))
        } else {
            (lower.lower()?, lower::flatten(&shape), Strategy::Direct)
        };

        let mut params = vec![];
        let serializer = Serializer::for_dialect(&self.schema.db, self.capability.dialect);
        let sql = serializer.serialize(&Statement::from(select), &mut params);

        log::debug!(
            "compiled query; strategy={}; sql={sql}",
            match strategy {
                Strategy::Direct => "direct",
                Strategy::TwoPhase(_) => "two-phase",
            }
        );

        Ok(Compiled {
            sql,
            params,
            ret,
            shape,
            strategy,
        })
    }

    fn needs_two_phase(&self, lower: &Lower<'_>) -> bool {
        self.fallback == AggregateFallback::TwoPhase
            && !self.capability.aggregate_in_sub_select
            && lower
                .plan
                .root()
                .select
                .iter()
                .any(|item| lower.aggregates_correlated_subquery(&item.expr))
    }

    /// Executes a compiled query on `connection`.
    pub(crate) async fn exec(
        &self,
        connection: &mut dyn Connection,
        compiled: &Compiled,
        args: &[(String, Value)],
    ) -> Result<Vec<Tuple>> {
        let params = compiled.bind(args)?;

        let response = connection
            .exec(Operation::QuerySql(QuerySql {
                sql: compiled.sql.clone(),
                params,
                ret: Some(compiled.ret.clone()),
            }))
            .await
            .map_err(|err| err.context(err!("failed to execute `{}`", compiled.sql)))?;

        let rows = response.rows.into_values()?;
        let rows = match &compiled.strategy {
            Strategy::Direct => rows,
            Strategy::TwoPhase(two_phase) => two_phase.aggregate(rows)?,
        };

        materialize::materialize(&compiled.shape, rows)
    }
}

impl Compiled {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Statement parameters, in placeholder order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Type of each select item.
    pub fn shape(&self) -> &[Type] {
        &self.shape
    }

    pub fn is_two_phase(&self) -> bool {
        matches!(self.strategy, Strategy::TwoPhase(_))
    }

    /// Resolves named parameters against the bound arguments.
    fn bind(&self, args: &[(String, Value)]) -> Result<Vec<Value>> {
        self.params
            .iter()
            .map(|param| match param {
                Param::Value(value) => Ok(value.clone()),
                Param::Named(name) => args
                    .iter()
                    .find(|(arg, _)| arg == name)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| {
                        Error::invalid_statement(format!("parameter `:{name}` is not bound"))
                    }),
            })
            .collect()
    }
}
