//! In-memory aggregation, for backends that cannot aggregate a correlated
//! subquery.
//!
//! The statement sent to the backend drops the outer aggregation: it returns
//! one row per joined row holding the grouping key columns followed by the
//! argument of every aggregate. Rows are then grouped here, in the order
//! their group is first seen.

use super::lower::Lower;
use crate::plan::{AggregateFunc, Expr};

use indexmap::IndexMap;
use oql_core::{
    stmt::{Type, Value, ValueRecord},
    Error, Result,
};
use oql_sql::stmt as sql;
use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

#[derive(Debug, Clone)]
pub(crate) struct TwoPhase {
    /// Number of leading columns forming the group key
    key_len: usize,

    /// One entry per select item
    items: Vec<Item>,
}

#[derive(Debug, Clone)]
enum Item {
    /// Copied from the group key
    Key { start: usize, width: usize },

    Aggregate {
        func: AggregateFunc,
        distinct: bool,

        /// Position of the argument after the key columns, `None` for
        /// `COUNT(*)`
        arg: Option<usize>,
    },
}

/// Builds the first phase statement. Returns it with the types of the
/// columns it returns.
pub(super) fn plan(lower: &Lower<'_>) -> Result<(sql::Select, Vec<Type>, TwoPhase)> {
    let scope = lower.plan.root();

    if scope.having.is_some() {
        return Err(unsupported("HAVING"));
    }

    if !scope.order_by.is_empty() {
        return Err(unsupported("ORDER BY"));
    }

    if scope.distinct {
        return Err(unsupported("SELECT DISTINCT"));
    }

    let mut keys = vec![];
    let mut key_tys = vec![];
    let mut key_items = vec![];

    for item in &scope.select {
        match &item.expr {
            Expr::Aggregate(_) => key_items.push(None),
            expr if expr.contains_aggregate() => {
                return Err(unsupported("an aggregate nested in another expression"));
            }
            expr => {
                let start = keys.len();
                lower.lower_select_item(expr, &mut keys)?;
                key_tys.extend(super::lower::flatten(&[lower.ty_of(expr)]));
                key_items.push(Some((start, keys.len() - start)));
            }
        }
    }

    for expr in &scope.group_by {
        let key = lower.lower_expr(expr)?;
        if !keys.contains(&key) {
            keys.push(key);
            key_tys.push(lower.ty_of(expr));
        }
    }

    let key_len = keys.len();
    let mut projection = keys;
    let mut ret = key_tys;
    let mut items = vec![];

    for (item, key) in scope.select.iter().zip(key_items) {
        if let Some((start, width)) = key {
            items.push(Item::Key { start, width });
            continue;
        }

        let Expr::Aggregate(aggregate) = &item.expr else {
            continue;
        };

        let arg = match &aggregate.arg {
            Some(arg) => {
                projection.push(lower.lower_expr(arg)?);
                ret.push(lower.ty_of(arg));
                Some(projection.len() - 1 - key_len)
            }
            None => None,
        };

        items.push(Item::Aggregate {
            func: aggregate.func,
            distinct: aggregate.distinct,
            arg,
        });
    }

    let select = sql::Select {
        projection,
        from: lower.lower_from(scope)?,
        filter: lower.lower_filter(scope)?,
        ..sql::Select::default()
    };

    Ok((select, ret, TwoPhase { key_len, items }))
}

fn unsupported(what: &str) -> Error {
    Error::unsupported_feature(format!(
        "{what} cannot be combined with an aggregate over a correlated subquery \
         when aggregating in memory"
    ))
}

impl TwoPhase {
    /// Groups the first phase rows, producing one row per group laid out
    /// like the rows of the direct statement.
    pub(crate) fn aggregate(&self, rows: Vec<ValueRecord>) -> Result<Vec<ValueRecord>> {
        let mut groups: IndexMap<GroupKey, Vec<Accumulator>> = IndexMap::new();

        // Without grouping keys there is exactly one group, even with no rows
        if self.key_len == 0 {
            groups.insert(GroupKey(vec![]), self.accumulators());
        }

        for row in rows {
            let mut key = row.into_vec();
            let args = key.split_off(self.key_len.min(key.len()));

            let accumulators = groups
                .entry(GroupKey(key))
                .or_insert_with(|| self.accumulators());

            for accumulator in accumulators {
                let value = accumulator.arg.and_then(|arg| args.get(arg)).cloned();
                accumulator.push(value);
            }
        }

        let mut out = vec![];
        for (key, accumulators) in groups {
            let mut accumulators = accumulators.into_iter();
            let mut fields = vec![];

            for item in &self.items {
                match item {
                    Item::Key { start, width } => {
                        fields.extend_from_slice(&key.0[*start..*start + *width]);
                    }
                    Item::Aggregate { .. } => {
                        let Some(accumulator) = accumulators.next() else {
                            oql_core::bail!("missing accumulator");
                        };
                        fields.push(accumulator.finish()?);
                    }
                }
            }

            out.push(ValueRecord::from_vec(fields));
        }

        log::trace!("aggregated in memory; groups={}", out.len());
        Ok(out)
    }

    fn accumulators(&self) -> Vec<Accumulator> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Aggregate {
                    func,
                    distinct,
                    arg,
                } => Some(Accumulator {
                    func: *func,
                    distinct: *distinct,
                    arg: *arg,
                    rows: 0,
                    values: vec![],
                }),
                Item::Key { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug)]
struct Accumulator {
    func: AggregateFunc,
    distinct: bool,
    arg: Option<usize>,

    /// Rows seen, for `COUNT(*)`
    rows: i64,

    /// Non-null argument values
    values: Vec<Value>,
}

impl Accumulator {
    fn push(&mut self, value: Option<Value>) {
        self.rows += 1;

        let Some(value) = value else {
            return;
        };

        if value.is_null() || (self.distinct && self.values.iter().any(|v| same_value(v, &value))) {
            return;
        }

        self.values.push(value);
    }

    fn finish(self) -> Result<Value> {
        match self.func {
            AggregateFunc::Count => Ok(Value::I64(match self.arg {
                Some(_) => self.values.len() as i64,
                None => self.rows,
            })),
            AggregateFunc::Sum => sum(self.values),
            AggregateFunc::Min => extreme(self.values, Ordering::Less),
            AggregateFunc::Max => extreme(self.values, Ordering::Greater),
            AggregateFunc::Avg => {
                if self.values.is_empty() {
                    return Ok(Value::Null);
                }

                let len = self.values.len() as f64;
                let mut total = 0.0;
                for value in self.values {
                    total += value.to_f64()?;
                }
                Ok(Value::F64(total / len))
            }
        }
    }
}

/// SQL semantics: `NULL` over no values, integer sums stay integers.
fn sum(values: Vec<Value>) -> Result<Value> {
    if values.is_empty() {
        return Ok(Value::Null);
    }

    if values.iter().all(|value| value.as_i64().is_some()) {
        let mut total: i64 = 0;
        for value in values {
            let value = value.to_i64()?;
            total = total
                .checked_add(value)
                .ok_or_else(|| oql_core::err!("integer overflow in SUM"))?;
        }
        return Ok(Value::I64(total));
    }

    let mut total = 0.0;
    for value in values {
        total += value.to_f64()?;
    }
    Ok(Value::F64(total))
}

fn extreme(values: Vec<Value>, wanted: Ordering) -> Result<Value> {
    let mut best: Option<Value> = None;

    for value in values {
        best = Some(match best {
            Some(current) if compare(&value, &current)? != wanted => current,
            _ => value,
        });
    }

    Ok(best.unwrap_or(Value::Null))
}

fn compare(lhs: &Value, rhs: &Value) -> Result<Ordering> {
    Ok(match (lhs, rhs) {
        (Value::String(lhs), Value::String(rhs)) => lhs.cmp(rhs),
        (Value::Bool(lhs), Value::Bool(rhs)) => lhs.cmp(rhs),
        (lhs, rhs) => match (lhs.as_i64(), rhs.as_i64()) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
            _ => match (lhs.as_f64(), rhs.as_f64()) {
                (Some(lhs), Some(rhs)) => lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
                _ => return Err(Error::type_conversion(rhs.clone(), "a comparable value")),
            },
        },
    })
}

/// Group key compared with SQL grouping semantics: `NULL`s group together
/// and floats compare by bit pattern.
#[derive(Debug)]
struct GroupKey(Vec<Value>);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(lhs, rhs)| same_value(lhs, rhs))
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            hash_value(value, state);
        }
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);

    match value {
        Value::Bool(value) => value.hash(state),
        Value::I32(value) => value.hash(state),
        Value::I64(value) => value.hash(state),
        Value::F64(value) => value.to_bits().hash(state),
        Value::String(value) => value.hash(state),
        Value::Record(record) => {
            for field in record {
                hash_value(field, state);
            }
        }
        Value::Null => {}
    }
}

fn same_value(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::F64(lhs), Value::F64(rhs)) => lhs.to_bits() == rhs.to_bits(),
        (Value::Record(lhs), Value::Record(rhs)) => {
            lhs.len() == rhs.len() && lhs.iter().zip(rhs.iter()).all(|(l, r)| same_value(l, r))
        }
        (lhs, rhs) => lhs == rhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: Vec<Value>) -> ValueRecord {
        ValueRecord::from_vec(values)
    }

    fn two_phase(items: Vec<Item>, key_len: usize) -> TwoPhase {
        TwoPhase { key_len, items }
    }

    fn aggregate(func: AggregateFunc, arg: Option<usize>) -> Item {
        Item::Aggregate {
            func,
            distinct: false,
            arg,
        }
    }

    #[test]
    fn groups_in_first_seen_order() {
        let plan = two_phase(
            vec![
                Item::Key { start: 0, width: 1 },
                aggregate(AggregateFunc::Sum, Some(0)),
            ],
            1,
        );

        let rows = plan
            .aggregate(vec![
                row(vec![Value::I32(2), Value::I64(5)]),
                row(vec![Value::I32(1), Value::I64(2)]),
                row(vec![Value::I32(2), Value::I64(1)]),
            ])
            .unwrap();

        assert_eq!(
            rows,
            vec![
                row(vec![Value::I32(2), Value::I64(6)]),
                row(vec![Value::I32(1), Value::I64(2)]),
            ]
        );
    }

    #[test]
    fn seed_aggregates() {
        let plan = two_phase(
            vec![
                Item::Key { start: 0, width: 1 },
                aggregate(AggregateFunc::Sum, Some(0)),
                aggregate(AggregateFunc::Min, Some(0)),
                aggregate(AggregateFunc::Max, Some(0)),
                aggregate(AggregateFunc::Avg, Some(0)),
            ],
            1,
        );

        let rows = plan
            .aggregate(vec![
                row(vec![Value::I32(1), Value::I64(2)]),
                row(vec![Value::I32(1), Value::I64(2)]),
            ])
            .unwrap();

        assert_eq!(
            rows,
            vec![row(vec![
                Value::I32(1),
                Value::I64(4),
                Value::I64(2),
                Value::I64(2),
                Value::F64(2.0),
            ])]
        );
    }

    #[test]
    fn no_keys_and_no_rows_is_one_group() {
        let plan = two_phase(
            vec![
                aggregate(AggregateFunc::Count, None),
                aggregate(AggregateFunc::Sum, Some(0)),
            ],
            0,
        );

        let rows = plan.aggregate(vec![]).unwrap();
        assert_eq!(rows, vec![row(vec![Value::I64(0), Value::Null])]);
    }

    #[test]
    fn nulls_are_skipped_and_grouped_together() {
        let plan = two_phase(
            vec![
                Item::Key { start: 0, width: 1 },
                aggregate(AggregateFunc::Count, Some(0)),
                aggregate(AggregateFunc::Count, None),
            ],
            1,
        );

        let rows = plan
            .aggregate(vec![
                row(vec![Value::Null, Value::I64(1)]),
                row(vec![Value::Null, Value::Null]),
            ])
            .unwrap();

        assert_eq!(rows, vec![row(vec![Value::Null, Value::I64(1), Value::I64(2)])]);
    }

    #[test]
    fn distinct_counts_each_value_once() {
        let plan = two_phase(
            vec![Item::Aggregate {
                func: AggregateFunc::Count,
                distinct: true,
                arg: Some(0),
            }],
            0,
        );

        let rows = plan
            .aggregate(vec![
                row(vec![Value::from("a")]),
                row(vec![Value::from("b")]),
                row(vec![Value::from("a")]),
            ])
            .unwrap();

        assert_eq!(rows, vec![row(vec![Value::I64(2)])]);
    }

    #[test]
    fn sum_of_doubles() {
        assert_eq!(
            sum(vec![Value::F64(1.5), Value::I32(2)]).unwrap(),
            Value::F64(3.5)
        );
    }

    #[test]
    fn sum_overflow_is_an_error() {
        assert!(sum(vec![Value::I64(i64::MAX), Value::I64(1)]).is_err());
    }
}
