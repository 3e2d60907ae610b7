use crate::{AsValue, Error, Result, Value};
use std::borrow::Cow;

pub const DEFAULT_LIMIT: u64 = 100;
/// Largest limit or offset, stores take them as signed 64 bit integers.
pub const MAX_ROWS: u64 = i64::MAX as u64;

/// Equality predicate on a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = $n`
    Equal(Value),
    /// `column IN ($n, $n+1, ..)`, an empty list is treated as undefined.
    In(Vec<Value>),
}

/// Column to predicate map consumed by `find`, kept in insertion order.
///
/// An entry without a predicate is undefined and does not restrict the query:
/// ```rust
/// use keel_core::Filters;
/// let status: Option<&str> = None;
/// let filters = Filters::new().eq("company_id", "abc").optional("status", status);
/// assert_eq!(filters.defined().count(), 1);
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Filters(pub Vec<(Cow<'static, str>, Option<Filter>)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<Cow<'static, str>>, value: impl AsValue) -> Self {
        self.0
            .push((column.into(), Some(Filter::Equal(value.as_value()))));
        self
    }

    pub fn is_in<V: AsValue>(
        mut self,
        column: impl Into<Cow<'static, str>>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.0.push((
            column.into(),
            Some(Filter::In(values.into_iter().map(AsValue::as_value).collect())),
        ));
        self
    }

    /// Equality filter that is skipped when `value` is `None`.
    pub fn optional<V: AsValue>(
        mut self,
        column: impl Into<Cow<'static, str>>,
        value: Option<V>,
    ) -> Self {
        self.0
            .push((column.into(), value.map(|v| Filter::Equal(v.as_value()))));
        self
    }

    /// Entries carrying a predicate, empty `IN` lists excluded.
    pub fn defined(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.0.iter().filter_map(|(column, filter)| match filter {
            Some(Filter::In(values)) if values.is_empty() => None,
            Some(filter) => Some((column.as_ref(), filter)),
            None => None,
        })
    }
}

impl<K: Into<Cow<'static, str>>, V: AsValue> FromIterator<(K, V)> for Filters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Filters(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(Filter::Equal(v.as_value()))))
                .collect(),
        )
    }
}

/// Paging request, both fields are decimal text as received from callers.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub limit_str: Option<String>,
    /// Row offset returned as `next_page` by a previous `find`.
    pub page_token: Option<String>,
}

impl Pagination {
    pub fn new(limit: u64) -> Self {
        Self {
            limit_str: Some(limit.to_string()),
            page_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    /// Resolved row window, blank fields fall back to the defaults.
    pub fn window(&self) -> Result<Window> {
        let limit = match self.limit_str.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_LIMIT,
            Some(v) => match v.parse::<u64>() {
                Ok(0) | Err(..) => {
                    return Err(Error::msg(format!(
                        "Invalid pagination limit `{v}`, expected a positive integer"
                    )));
                }
                Ok(v) if v > MAX_ROWS => {
                    return Err(Error::msg(format!(
                        "Invalid pagination limit `{v}`, the maximum is {MAX_ROWS}"
                    )));
                }
                Ok(v) => v,
            },
        };
        let offset = match self.page_token.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(v) => v.parse::<u64>().map_err(|_| {
                Error::msg(format!(
                    "Invalid page token `{v}`, expected a decimal row offset"
                ))
            })?,
        };
        if offset > MAX_ROWS {
            return Err(Error::msg(format!(
                "Invalid page token `{offset}`, the maximum offset is {MAX_ROWS}"
            )));
        }
        Ok(Window { limit, offset })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u64,
    pub offset: u64,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Window {
    /// Token of the following window, only when `rows` filled this one.
    pub fn next_page(&self, rows: usize) -> Option<String> {
        if rows as u64 != self.limit {
            return None;
        }
        self.offset
            .checked_add(self.limit)
            .filter(|v| *v <= MAX_ROWS)
            .map(|v| v.to_string())
    }
}

/// Extra predicates and paging of a `find` call.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct FindOptions {
    pub lt: Vec<(Cow<'static, str>, Value)>,
    pub lte: Vec<(Cow<'static, str>, Value)>,
    pub gt: Vec<(Cow<'static, str>, Value)>,
    pub gte: Vec<(Cow<'static, str>, Value)>,
    /// Values are bound as they are, without column encoding.
    pub r#in: Vec<(Cow<'static, str>, Vec<Value>)>,
    /// Substring match, wrapped in `%` when bound.
    pub like: Vec<(Cow<'static, str>, String)>,
    pub pagination: Option<Pagination>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn lt(mut self, column: impl Into<Cow<'static, str>>, value: impl AsValue) -> Self {
        self.lt.push((column.into(), value.as_value()));
        self
    }
    pub fn lte(mut self, column: impl Into<Cow<'static, str>>, value: impl AsValue) -> Self {
        self.lte.push((column.into(), value.as_value()));
        self
    }
    pub fn gt(mut self, column: impl Into<Cow<'static, str>>, value: impl AsValue) -> Self {
        self.gt.push((column.into(), value.as_value()));
        self
    }
    pub fn gte(mut self, column: impl Into<Cow<'static, str>>, value: impl AsValue) -> Self {
        self.gte.push((column.into(), value.as_value()));
        self
    }
    pub fn is_in<V: AsValue>(
        mut self,
        column: impl Into<Cow<'static, str>>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.r#in.push((
            column.into(),
            values.into_iter().map(AsValue::as_value).collect(),
        ));
        self
    }
    pub fn like(mut self, column: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        self.like.push((column.into(), value.into()));
        self
    }
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn window(&self) -> Result<Window> {
        self.pagination
            .as_ref()
            .map(Pagination::window)
            .unwrap_or_else(|| Ok(Window::default()))
    }
}
