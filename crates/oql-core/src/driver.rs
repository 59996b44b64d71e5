mod capability;
pub use capability::{Capability, Dialect};

mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::{async_trait, schema::db::Schema};

use std::fmt::Debug;

#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Describes the driver's capability, which informs the query compiler.
    fn capability(&self) -> &'static Capability;

    /// Opens a new connection to the database.
    async fn connect(&self) -> crate::Result<Box<dyn Connection>>;
}

/// An open execution context.
///
/// Compiled statements are handed to the connection as SQL text plus bind
/// parameters. Failures are reported as driver operation failures and are
/// never retried.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    fn capability(&self) -> &'static Capability;

    /// Execute a database operation
    async fn exec(&mut self, op: Operation) -> crate::Result<Response>;

    /// Create the tables of the given schema.
    async fn push_schema(&mut self, schema: &Schema) -> crate::Result<()>;
}
