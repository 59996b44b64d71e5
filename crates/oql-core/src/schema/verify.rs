use super::{
    app::{CollectionKind, Element, FieldTy},
    Schema,
};
use crate::{Error, Result};

use std::collections::HashSet;

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        self.verify_identifiers()?;
        self.verify_property_names_are_unique()?;
        self.verify_column_names_are_unique()?;
        self.verify_collection_columns()?;
        Ok(())
    }

    fn verify_identifiers(&self) -> Result<()> {
        for entity in &self.schema.app.entities {
            let field = entity.identifier_field();
            let Some(scalar) = field.as_scalar() else {
                return Err(Error::invalid_schema(format!(
                    "identifier of `{}` must be a scalar property",
                    entity.name
                )));
            };

            let column = self.schema.db.column(scalar.column);
            if !column.primary_key || column.nullable {
                return Err(Error::invalid_schema(format!(
                    "identifier column `{}` of `{}` must be a non-null primary key",
                    column.name, entity.name
                )));
            }

            if column.auto_increment && !scalar.ty.is_integer() {
                return Err(Error::invalid_schema(format!(
                    "native identifier of `{}` must be an integer",
                    entity.name
                )));
            }
        }
        Ok(())
    }

    fn verify_property_names_are_unique(&self) -> Result<()> {
        for entity in &self.schema.app.entities {
            let mut names = HashSet::new();
            for field in &entity.fields {
                if !names.insert(field.name.as_str()) {
                    return Err(Error::invalid_schema(format!(
                        "property `{}.{}` is declared more than once",
                        entity.name, field.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn verify_column_names_are_unique(&self) -> Result<()> {
        for table in &self.schema.db.tables {
            let mut names = HashSet::new();
            for column in &table.columns {
                // Column names are case-insensitive in SQL
                if !names.insert(column.name.to_lowercase()) {
                    return Err(Error::invalid_schema(format!(
                        "table `{}` has more than one column named `{}`",
                        table.name, column.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn verify_collection_columns(&self) -> Result<()> {
        for entity in &self.schema.app.entities {
            for field in &entity.fields {
                let FieldTy::Collection(collection) = &field.ty else {
                    continue;
                };

                let mut columns = vec![collection.key];
                columns.extend(collection.index());
                match &collection.element {
                    Element::Value { column, .. } | Element::ManyToMany { column, .. } => {
                        columns.push(*column)
                    }
                    Element::OneToMany { target } => {
                        assert_eq!(self.schema.table_id_for(*target), collection.table);
                    }
                }

                for column in columns {
                    assert_eq!(column.table, collection.table);
                }

                if let CollectionKind::List { index } = collection.kind {
                    if !self.schema.db.column(index).ty.is_integer() {
                        return Err(Error::invalid_schema(format!(
                            "list `{}` must have an integer index",
                            collection.role
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
