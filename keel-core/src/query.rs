use crate::{Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// A parameterized statement: SQL text with positional `$n` placeholders and their values.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter and return its 1-based placeholder index.
    pub fn push_param(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Query {
            sql: value.into(),
            params: Vec::new(),
        }
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Query {
            sql: value,
            params: Vec::new(),
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    pub rows_affected: u64,
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
        }
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    pub labels: RowNames,
    pub values: Row,
}

impl RowLabeled {
    pub fn new(names: RowNames, values: Row) -> Self {
        Self {
            labels: names,
            values,
        }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values()[i])
    }
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        value.values
    }
}

/// One page of a `find` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<E> {
    /// Type tag of the entities.
    pub kind: &'static str,
    pub entities: Vec<E>,
    /// Token of the next page, present only when this page was full.
    pub next_page: Option<String>,
}

impl<E> ListResult<E> {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
