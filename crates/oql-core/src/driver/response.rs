use crate::stmt::ValueRecord;

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Operation result, one record per row in backend order
    Values(Vec<ValueRecord>),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn values(rows: Vec<ValueRecord>) -> Self {
        Self {
            rows: Rows::Values(rows),
        }
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Self::Values(_))
    }

    pub fn try_clone(&self) -> Self {
        match self {
            Rows::Count(count) => Rows::Count(*count),
            Rows::Values(values) => Rows::Values(values.clone()),
        }
    }

    pub fn into_count(self) -> crate::Result<u64> {
        match self {
            Rows::Count(count) => Ok(count),
            Rows::Values(_) => Err(crate::err!("expected a row count, got a row set")),
        }
    }

    pub fn into_values(self) -> crate::Result<Vec<ValueRecord>> {
        match self {
            Self::Values(values) => Ok(values),
            Self::Count(_) => Err(crate::err!("expected a row set, got a row count")),
        }
    }
}
