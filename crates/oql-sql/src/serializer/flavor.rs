use super::Serializer;

use oql_core::{driver::Dialect, schema::db};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flavor {
    Postgresql,
    Sqlite,
    Mysql,
}

impl<'a> Serializer<'a> {
    pub fn sqlite(schema: &'a db::Schema) -> Serializer<'a> {
        Serializer {
            schema,
            flavor: Flavor::Sqlite,
        }
    }

    pub fn postgresql(schema: &'a db::Schema) -> Serializer<'a> {
        Serializer {
            schema,
            flavor: Flavor::Postgresql,
        }
    }

    pub fn mysql(schema: &'a db::Schema) -> Serializer<'a> {
        Serializer {
            schema,
            flavor: Flavor::Mysql,
        }
    }

    /// Picks the serializer for the dialect a driver reports.
    pub fn for_dialect(schema: &'a db::Schema, dialect: Dialect) -> Serializer<'a> {
        match dialect {
            Dialect::Sqlite => Serializer::sqlite(schema),
            Dialect::Postgresql => Serializer::postgresql(schema),
            Dialect::Mysql => Serializer::mysql(schema),
        }
    }

    pub(super) fn is_sqlite(&self) -> bool {
        self.flavor == Flavor::Sqlite
    }
}
