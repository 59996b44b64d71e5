mod value;
pub(crate) use value::Value;

use oql_core::{
    async_trait,
    driver::{
        operation::{Operation, QuerySql, Transaction},
        Capability, Driver, Response,
    },
    schema::db::{Schema, Table},
    stmt, Error, Result,
};
use oql_sql::{self as sql, Serializer};
use rusqlite::Connection as RusqliteConnection;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver from a connection URL, `sqlite::memory:`
    /// or `sqlite:/path/to/file`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(Error::driver_operation_failed)?;

        if url.scheme() != "sqlite" {
            return Err(Error::invalid_connection_url(format!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn oql_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection =
            RusqliteConnection::open_in_memory().map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl oql_core::driver::Connection for Connection {
    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn exec(&mut self, op: Operation) -> Result<Response> {
        match op {
            Operation::QuerySql(op) => self.query_sql(op),
            Operation::Transaction(op) => {
                let sql = match op {
                    Transaction::Start => "BEGIN",
                    Transaction::Commit => "COMMIT",
                    Transaction::Rollback => "ROLLBACK",
                };

                log::debug!("sqlite transaction; sql={sql}");
                self.connection
                    .execute(sql, [])
                    .map_err(Error::driver_operation_failed)?;
                Ok(Response::count(0))
            }
        }
    }

    async fn push_schema(&mut self, schema: &Schema) -> Result<()> {
        for table in &schema.tables {
            self.create_table(schema, table)?;
        }

        Ok(())
    }
}

impl Connection {
    fn query_sql(&mut self, op: QuerySql) -> Result<Response> {
        log::debug!("sqlite exec; sql={}; params={:?}", op.sql, op.params);

        let mut stmt = self
            .connection
            .prepare_cached(&op.sql)
            .map_err(Error::driver_operation_failed)?;

        let params = op.params.into_iter().map(Value::from).collect::<Vec<_>>();

        let Some(ret_tys) = op.ret else {
            let count = stmt
                .execute(rusqlite::params_from_iter(params.iter()))
                .map_err(Error::driver_operation_failed)?;

            return Ok(Response::count(count as _));
        };

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver_operation_failed)?;

        let mut ret = vec![];

        while let Some(row) = rows.next().map_err(Error::driver_operation_failed)? {
            let mut items = Vec::with_capacity(ret_tys.len());

            for (index, ty) in ret_tys.iter().enumerate() {
                items.push(Value::from_sql(row, index, ty)?.into_inner());
            }

            ret.push(stmt::ValueRecord::from_vec(items));
        }

        log::trace!("sqlite rows; count={}", ret.len());
        Ok(Response::values(ret))
    }

    fn create_table(&mut self, schema: &Schema, table: &Table) -> Result<()> {
        let mut params: Vec<sql::Param> = vec![];
        let stmt = Serializer::sqlite(schema).serialize(&sql::Statement::create_table(table), &mut params);

        if !params.is_empty() {
            oql_core::bail!("DDL for table `{}` has bind parameters", table.name);
        }

        log::debug!("sqlite create table; sql={stmt}");
        self.connection
            .execute(&stmt, [])
            .map_err(Error::driver_operation_failed)?;
        Ok(())
    }
}
