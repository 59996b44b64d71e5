use crate::Tuple;

use oql_core::{
    stmt::{Type, Value, ValueRecord},
    Result,
};

/// Turns backend rows into one tuple per row, each value coerced to the
/// type of its select item.
pub(super) fn materialize(shape: &[Type], rows: Vec<ValueRecord>) -> Result<Vec<Tuple>> {
    let width: usize = shape.iter().map(Type::width).sum();
    rows.into_iter().map(|row| tuple(shape, width, row)).collect()
}

fn tuple(shape: &[Type], width: usize, row: ValueRecord) -> Result<Tuple> {
    if row.len() != width {
        oql_core::bail!(
            "backend returned {} columns, expected {width}",
            row.len()
        );
    }

    let mut columns = row.into_iter();
    let mut values = Vec::with_capacity(shape.len());

    for ty in shape {
        let value = match ty {
            Type::Record(fields) => {
                let record: Vec<Value> = columns.by_ref().take(fields.len()).collect();

                // An entity reached through an outer join with no match
                if matches!(record.first(), None | Some(Value::Null)) {
                    Value::Null
                } else {
                    ty.cast(Value::record_from_vec(record))?
                }
            }
            ty => {
                let Some(value) = columns.next() else {
                    oql_core::bail!("backend row ended early");
                };
                ty.cast(value)?
            }
        };
        values.push(value);
    }

    Ok(Tuple::from_vec(values))
}
