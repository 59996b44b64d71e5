use crate::{stmt, Error, Result};

/// Database storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Boolean,

    /// A signed integer of `n` bytes
    Integer(u8),

    /// Double-precision floating point
    Double,

    Text,
}

impl Type {
    /// Picks the storage type for a mapped property type.
    pub fn from_app(ty: &stmt::Type) -> Result<Type> {
        Ok(match ty {
            stmt::Type::Bool => Type::Boolean,
            stmt::Type::I32 => Type::Integer(4),
            stmt::Type::I64 => Type::Integer(8),
            stmt::Type::F64 => Type::Double,
            stmt::Type::String => Type::Text,
            _ => {
                return Err(Error::invalid_schema(format!(
                    "type {ty:?} cannot be stored in a column"
                )))
            }
        })
    }
}
