use super::{column_def::ColumnDefSql, Comma, Delimited, Ident, Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::Statement {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            stmt::Statement::CreateTable(stmt) => stmt.to_sql(f),
            stmt::Statement::Query(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &stmt::CreateTable {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        // SQLite only auto increments a column declared `INTEGER PRIMARY KEY`
        // inline, which requires it to be the sole primary key column.
        let inline_pk = if f.serializer.is_sqlite() && self.primary_key.len() == 1 {
            self.columns
                .iter()
                .position(|column| column.auto_increment && column.name == self.primary_key[0])
        } else {
            None
        };

        fmt!(f, "CREATE TABLE IF NOT EXISTS " Ident(&self.name) " (");

        for (index, column) in self.columns.iter().enumerate() {
            let def = ColumnDefSql {
                def: column,
                inline_pk: inline_pk == Some(index),
            };
            fmt!(f, "\n    " def);
            if index < self.columns.len() - 1 {
                fmt!(f, ",");
            }
        }

        if inline_pk.is_none() && !self.primary_key.is_empty() {
            let pk = Comma(self.primary_key.iter().map(Ident));
            fmt!(f, ",\n    PRIMARY KEY (" pk ")");
        }

        fmt!(f, "\n)");
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let distinct = if self.distinct { "DISTINCT " } else { "" };

        fmt!(f, "SELECT " distinct Comma(&self.projection));

        if !self.from.is_empty() {
            fmt!(f, " FROM " Comma(&self.from));
        }

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }

        if !self.group_by.is_empty() {
            fmt!(f, " GROUP BY " Comma(&self.group_by));
        }

        if let Some(having) = &self.having {
            fmt!(f, " HAVING " having);
        }

        if !self.order_by.is_empty() {
            fmt!(f, " ORDER BY " Comma(&self.order_by));
        }
    }
}

impl ToSql for &stmt::TableWithJoins {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, self.relation);

        if !self.joins.is_empty() {
            fmt!(f, " " Delimited(&self.joins, " "));
        }
    }
}

impl ToSql for stmt::TableRef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let table_name = f.serializer.table_name(self.table);
        fmt!(f, table_name " tbl_" self.alias);
    }
}

impl ToSql for &stmt::TableRef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        (*self).to_sql(f);
    }
}

impl ToSql for &stmt::Join {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let kind = match self.kind {
            stmt::JoinKind::Inner => "INNER JOIN ",
            stmt::JoinKind::Left => "LEFT JOIN ",
        };

        let on = &self.on;
        fmt!(f, kind self.table " ON " on);
    }
}

impl ToSql for &stmt::OrderByExpr {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let direction = match self.direction {
            stmt::Direction::Asc => " ASC",
            stmt::Direction::Desc => " DESC",
        };

        fmt!(f, &self.expr direction);
    }
}
