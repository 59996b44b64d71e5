use super::{Flavor, Formatter, ToSql};

use oql_core::stmt;

/// A statement parameter, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// A literal lifted out of the query text
    Value(stmt::Value),

    /// A named parameter, resolved when the query is executed
    Named(String),
}

pub trait Params {
    fn push(&mut self, param: Param) -> Placeholder;
}

pub struct Placeholder(pub usize);

impl Params for Vec<Param> {
    fn push(&mut self, param: Param) -> Placeholder {
        Vec::push(self, param);
        Placeholder(self.len())
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        use std::fmt::Write;

        match f.serializer.flavor {
            Flavor::Mysql => write!(&mut f.dst, "?").unwrap(),
            Flavor::Postgresql => write!(&mut f.dst, "${}", self.0).unwrap(),
            Flavor::Sqlite => write!(&mut f.dst, "?{}", self.0).unwrap(),
        }
    }
}
