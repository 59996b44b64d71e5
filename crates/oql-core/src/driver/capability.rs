/// SQL dialect spoken by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgresql,
    Mysql,
}

#[derive(Debug)]
pub struct Capability {
    /// Which SQL dialect to generate.
    pub dialect: Dialect,

    /// SQL: the backend can evaluate an aggregate function whose argument is
    /// a correlated scalar subquery, e.g. `SUM((SELECT COUNT(*) ...))`.
    pub aggregate_in_sub_select: bool,

    /// SQL: AVG over integers truncates or yields an exact decimal, so its
    /// argument must be cast to a double-precision type.
    pub avg_cast: bool,
}

impl Capability {
    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        dialect: Dialect::Sqlite,
        aggregate_in_sub_select: true,

        // SQLite's AVG always returns a REAL
        avg_cast: false,
    };

    /// PostgreSQL capabilities
    pub const POSTGRESQL: Self = Self {
        dialect: Dialect::Postgresql,

        // AVG(integer) returns NUMERIC
        avg_cast: true,
        ..Self::SQLITE
    };

    /// MySQL capabilities
    pub const MYSQL: Self = Self {
        dialect: Dialect::Mysql,

        // MySQL returns DECIMAL, which the materializer widens to F64
        avg_cast: false,
        ..Self::SQLITE
    };
}
