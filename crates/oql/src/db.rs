mod builder;
pub use builder::Builder;

mod query;
pub use query::Query;

use crate::{engine::Engine, Compiled};

use oql_core::{
    driver::{
        operation::{QuerySql, Transaction},
        Capability, Connection, Operation,
    },
    err,
    stmt::Value,
    Result, Schema,
};
use std::sync::Arc;

/// A database handle: a query engine and the connection it runs on.
pub struct Db {
    engine: Engine,
    connection: Box<dyn Connection>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.engine.schema()
    }

    pub fn capability(&self) -> &'static Capability {
        self.engine.capability()
    }

    /// Compiles a query without running it.
    pub fn compile(&self, text: &str) -> Result<Compiled> {
        self.engine.compile(text)
    }

    /// Starts building a query. Nothing is compiled until it is run.
    pub fn query(&mut self, text: impl Into<String>) -> Query<'_> {
        Query::new(self, text.into())
    }

    /// Runs a raw SQL statement, returning the number of rows it changed.
    pub async fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<u64> {
        let response = self
            .connection
            .exec(Operation::QuerySql(QuerySql {
                sql: sql.to_string(),
                params,
                ret: None,
            }))
            .await
            .map_err(|err| err.context(err!("failed to execute `{sql}`")))?;

        response.rows.into_count()
    }

    /// Creates the tables of the schema.
    pub async fn push_schema(&mut self) -> Result<()> {
        let schema = self.engine.schema().clone();
        self.connection.push_schema(&schema.db).await
    }

    pub async fn begin(&mut self) -> Result<()> {
        self.transaction(Transaction::Start).await
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.transaction(Transaction::Commit).await
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.transaction(Transaction::Rollback).await
    }

    async fn transaction(&mut self, op: Transaction) -> Result<()> {
        self.connection.exec(op.into()).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("engine", &self.engine)
            .field("connection", &self.connection)
            .finish()
    }
}
