//! An object query language compiled to SQL.
//!
//! Queries name entities and navigate their properties; the engine resolves
//! them against a mapping [`Schema`], binds subquery correlations, and
//! lowers the result to one SQL statement for the connected backend.

pub mod ast;

mod db;
pub use db::{Builder, Db, Query};

mod engine;
pub use engine::{AggregateFallback, Compiled, Engine};

pub mod parser;
pub use parser::parse;

pub mod plan;

mod tuple;
pub use tuple::Tuple;

pub use oql_core::{driver, schema, stmt, Error, Result, Schema};
pub use oql_sql::Param;
