use super::{ty::StorageTy, Flavor, Ident, Params, ToSql};

use crate::stmt;

/// A column definition. `inline_pk` renders the primary key constraint on
/// the column itself.
pub(super) struct ColumnDefSql<'a> {
    pub(super) def: &'a stmt::ColumnDef,
    pub(super) inline_pk: bool,
}

impl ToSql for ColumnDefSql<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let name = Ident(&self.def.name);
        let ty = StorageTy {
            ty: self.def.ty,
            auto_increment: self.def.auto_increment,
        };

        fmt!(f, name " " ty);

        if self.inline_pk {
            fmt!(f, " PRIMARY KEY");

            if self.def.auto_increment {
                fmt!(f, " AUTOINCREMENT");
            }
        } else {
            if !self.def.nullable {
                fmt!(f, " NOT NULL");
            }

            if self.def.auto_increment && f.serializer.flavor == Flavor::Mysql {
                fmt!(f, " AUTO_INCREMENT");
            }
        }
    }
}
