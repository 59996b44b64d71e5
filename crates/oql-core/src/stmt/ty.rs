use super::Value;
use crate::{Error, Result};

/// The semantic type of a query expression or a mapped column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// Double-precision floating point
    F64,

    /// String type
    String,

    /// A fixed-length tuple where each item can have a different type.
    Record(Vec<Type>),

    /// The type of the `NULL` literal. It can be cast to any type.
    Null,

    /// A type that could not be inferred (e.g. an unbound parameter)
    Unknown,
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::I32 | Self::I64)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Number of result columns a value of this type occupies.
    pub fn width(&self) -> usize {
        match self {
            Self::Record(fields) => fields.iter().map(Type::width).sum(),
            _ => 1,
        }
    }

    /// Coerces a backend value to this type.
    ///
    /// Integers widen freely and narrow only when the value fits. Floating
    /// point values convert to integers only when they have no fractional
    /// part. Numeric text (as some backends return decimals) is parsed.
    pub fn cast(&self, value: Value) -> Result<Value> {
        // Null values are passed through
        if value.is_null() {
            return Ok(value);
        }

        Ok(match (value, self) {
            (value, Self::Unknown | Self::Null) => value,
            (value @ Value::Bool(_), Self::Bool) => value,
            (Value::I32(v), Self::Bool) => Value::Bool(v != 0),
            (Value::I64(v), Self::Bool) => Value::Bool(v != 0),
            (value @ Value::I32(_), Self::I32) => value,
            (Value::I64(v), Self::I32) => match i32::try_from(v) {
                Ok(v) => Value::I32(v),
                Err(_) => return Err(Error::type_conversion(Value::I64(v), "I32")),
            },
            (Value::I32(v), Self::I64) => Value::I64(v.into()),
            (value @ Value::I64(_), Self::I64) => value,
            (Value::I32(v), Self::F64) => Value::F64(v.into()),
            (Value::I64(v), Self::F64) => Value::F64(v as f64),
            (value @ Value::F64(_), Self::F64) => value,
            (Value::F64(v), Self::I32 | Self::I64) => {
                if v.fract() != 0.0 {
                    return Err(Error::type_conversion(Value::F64(v), self.name()));
                }
                self.cast(Value::I64(v as i64))?
            }
            (Value::String(v), Self::I32 | Self::I64) => {
                let parsed: i64 = v.trim().parse()?;
                self.cast(Value::I64(parsed))?
            }
            (Value::String(v), Self::F64) => Value::F64(v.trim().parse()?),
            (value @ Value::String(_), Self::String) => value,
            (Value::Record(record), Self::Record(tys)) if record.len() == tys.len() => {
                let fields = record
                    .fields
                    .into_iter()
                    .zip(tys)
                    .map(|(value, ty)| ty.cast(value))
                    .collect::<Result<Vec<_>>>()?;
                Value::record_from_vec(fields)
            }
            (value, _) => return Err(Error::type_conversion(value, self.name())),
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::F64 => "F64",
            Self::String => "String",
            Self::Record(_) => "Record",
            Self::Null => "Null",
            Self::Unknown => "Unknown",
        }
    }
}
