use super::Db;
use crate::Tuple;

use oql_core::{stmt::Value, Error, Result};

/// A query with its parameter bindings, run with [`Query::list`] or
/// [`Query::unique`].
#[derive(Debug)]
pub struct Query<'a> {
    db: &'a mut Db,
    text: String,
    args: Vec<(String, Value)>,
}

impl<'a> Query<'a> {
    pub(super) fn new(db: &'a mut Db, text: String) -> Query<'a> {
        Query {
            db,
            text,
            args: vec![],
        }
    }

    /// Binds `:name`. Binding the same name twice keeps the last value.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();

        match self.args.iter_mut().find(|(arg, _)| *arg == name) {
            Some((_, existing)) => *existing = value,
            None => self.args.push((name, value)),
        }
        self
    }

    pub async fn list(self) -> Result<Vec<Tuple>> {
        let db = self.db;
        let compiled = db.engine.compile(&self.text)?;
        db.engine
            .exec(&mut *db.connection, &compiled, &self.args)
            .await
    }

    /// Runs the query, expecting at most one row.
    pub async fn unique(self) -> Result<Option<Tuple>> {
        let mut tuples = self.list().await?;
        match tuples.len() {
            0 | 1 => Ok(tuples.pop()),
            len => Err(Error::invalid_statement(format!(
                "query returned {len} rows where at most one was expected"
            ))),
        }
    }
}
