use oql_core::{
    async_trait,
    driver::{Capability, Connection, Driver, Operation, Response},
    schema::db::Schema,
    Result,
};
use std::sync::{Arc, Mutex};

/// Wraps a driver, logging every operation its connections execute.
#[derive(Debug)]
pub struct LoggingDriver {
    inner: Box<dyn Driver>,

    /// Reported instead of the inner driver's capability, if set
    capability: Option<&'static Capability>,

    /// Shared with every connection and with the test
    ops_log: Arc<Mutex<Vec<DriverOp>>>,
}

impl LoggingDriver {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self {
            inner: driver,
            capability: None,
            ops_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reports `capability` to the query engine, so tests can exercise
    /// compilation paths the wrapped backend does not need.
    pub fn with_capability(mut self, capability: &'static Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Get a handle to access the operations log
    pub fn ops_log_handle(&self) -> Arc<Mutex<Vec<DriverOp>>> {
        self.ops_log.clone()
    }
}

#[async_trait]
impl Driver for LoggingDriver {
    fn capability(&self) -> &'static Capability {
        self.capability.unwrap_or_else(|| self.inner.capability())
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(LoggingConnection {
            inner: self.inner.connect().await?,
            capability: self.capability(),
            ops_log: self.ops_log_handle(),
        }))
    }
}

#[derive(Debug)]
pub struct DriverOp {
    pub operation: Operation,
    pub response: Response,
}

#[derive(Debug)]
struct LoggingConnection {
    inner: Box<dyn Connection>,
    capability: &'static Capability,
    ops_log: Arc<Mutex<Vec<DriverOp>>>,
}

#[async_trait]
impl Connection for LoggingConnection {
    fn capability(&self) -> &'static Capability {
        self.capability
    }

    async fn exec(&mut self, operation: Operation) -> Result<Response> {
        let logged = operation.clone();
        let response = self.inner.exec(operation).await?;

        log::trace!("driver op; op={logged:?}");

        self.ops_log
            .lock()
            .expect("Failed to acquire ops log lock")
            .push(DriverOp {
                operation: logged,
                response: Response {
                    rows: response.rows.try_clone(),
                },
            });

        Ok(response)
    }

    async fn push_schema(&mut self, schema: &Schema) -> Result<()> {
        self.inner.push_schema(schema).await
    }
}
