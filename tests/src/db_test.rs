use crate::{
    exec_log::ExecLog,
    fixture,
    logging_driver::{DriverOp, LoggingDriver},
};
use oql::{driver::Capability, Db};
use oql_driver_sqlite::Sqlite;
use std::sync::{Arc, Mutex};

/// Per-test state: the driver operations log of the database under test.
pub struct DbTest {
    ops_log: Arc<Mutex<Vec<DriverOp>>>,
}

impl DbTest {
    /// Runs one test on a current-thread runtime.
    pub fn run<F, Fut>(test_fn: F)
    where
        F: FnOnce(DbTest) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let _ = env_logger::builder().is_test(true).try_init();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create Tokio runtime");

        runtime.block_on(test_fn(DbTest {
            ops_log: Arc::new(Mutex::new(Vec::new())),
        }));
    }

    /// Try to set up a database, creating the schema's tables.
    pub async fn try_setup_db(
        &mut self,
        builder: &mut oql::Builder,
        capability: Option<&'static Capability>,
    ) -> oql::Result<Db> {
        let mut driver = LoggingDriver::new(Box::new(Sqlite::in_memory()));
        if let Some(capability) = capability {
            driver = driver.with_capability(capability);
        }
        self.ops_log = driver.ops_log_handle();

        let mut db = builder.build(driver).await?;
        db.push_schema().await?;
        Ok(db)
    }

    /// Set up a database with the fixture schema and data.
    pub async fn setup_db(&mut self) -> Db {
        self.setup_db_with(&mut fixture::builder(), None).await
    }

    /// Set up a database with the fixture data, reporting `capability`
    /// instead of SQLite's.
    pub async fn setup_db_with(
        &mut self,
        builder: &mut oql::Builder,
        capability: Option<&'static Capability>,
    ) -> Db {
        let mut db = self.try_setup_db(builder, capability).await.unwrap();
        fixture::seed(&mut db).await.unwrap();
        self.log().clear();
        db
    }

    /// Get the operations log for assertions
    pub fn log(&self) -> ExecLog {
        ExecLog::new(self.ops_log.clone())
    }
}
