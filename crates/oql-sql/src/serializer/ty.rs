use super::{Flavor, Formatter, Params, ToSql};

use crate::stmt;
use oql_core::schema::db;

/// Column storage type, as written in DDL
pub(super) struct StorageTy {
    pub(super) ty: db::Type,
    pub(super) auto_increment: bool,
}

impl ToSql for StorageTy {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let flavor = f.serializer.flavor;
        let sql = match (self.ty, flavor) {
            (db::Type::Boolean, _) => "BOOLEAN",
            // SQLite only auto increments `INTEGER PRIMARY KEY` columns
            (db::Type::Integer(_), Flavor::Sqlite) => "INTEGER",
            (db::Type::Integer(8), Flavor::Postgresql) if self.auto_increment => "BIGSERIAL",
            (db::Type::Integer(_), Flavor::Postgresql) if self.auto_increment => "SERIAL",
            (db::Type::Integer(8), _) => "BIGINT",
            (db::Type::Integer(2), _) => "SMALLINT",
            (db::Type::Integer(_), Flavor::Mysql) => "INT",
            (db::Type::Integer(_), Flavor::Postgresql) => "INTEGER",
            (db::Type::Double, Flavor::Sqlite) => "REAL",
            (db::Type::Double, Flavor::Postgresql) => "DOUBLE PRECISION",
            (db::Type::Double, Flavor::Mysql) => "DOUBLE",
            (db::Type::Text, Flavor::Mysql) => "VARCHAR(255)",
            (db::Type::Text, _) => "TEXT",
        };

        fmt!(f, sql);
    }
}

/// Target of a `CAST` expression
impl ToSql for &stmt::Type {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let flavor = f.serializer.flavor;
        let sql = match (self, flavor) {
            (stmt::Type::Bool, Flavor::Mysql) => "UNSIGNED",
            (stmt::Type::Bool, _) => "BOOLEAN",
            (stmt::Type::I32 | stmt::Type::I64, Flavor::Mysql) => "SIGNED",
            (stmt::Type::I32, _) => "INTEGER",
            (stmt::Type::I64, _) => "BIGINT",
            (stmt::Type::F64, Flavor::Sqlite) => "REAL",
            (stmt::Type::F64, Flavor::Postgresql) => "DOUBLE PRECISION",
            (stmt::Type::F64, Flavor::Mysql) => "DOUBLE",
            (stmt::Type::String, Flavor::Mysql) => "CHAR",
            (stmt::Type::String, _) => "TEXT",
            (ty, _) => panic!("cannot cast to {ty:?}"),
        };

        fmt!(f, sql);
    }
}
