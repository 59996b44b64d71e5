use super::Db;
use crate::{engine::Engine, AggregateFallback};

use oql_core::{driver::Driver, Error, Result, Schema};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Builder {
    schema: Option<Arc<Schema>>,
    fallback: AggregateFallback,
}

impl Builder {
    pub fn schema(&mut self, schema: impl Into<Arc<Schema>>) -> &mut Self {
        self.schema = Some(schema.into());
        self
    }

    /// What to do with aggregates over correlated subqueries when the
    /// backend cannot evaluate them. Defaults to rejecting the query.
    pub fn aggregate_fallback(&mut self, fallback: AggregateFallback) -> &mut Self {
        self.fallback = fallback;
        self
    }

    pub async fn build(&mut self, driver: impl Driver) -> Result<Db> {
        let Some(schema) = self.schema.clone() else {
            return Err(Error::invalid_schema("no schema given to the database builder"));
        };

        let connection = driver.connect().await?;
        let engine = Engine::new(schema, driver.capability()).with_fallback(self.fallback);

        log::debug!("connected; driver={driver:?}; fallback={:?}", self.fallback);

        Ok(Db { engine, connection })
    }
}
