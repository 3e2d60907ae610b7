use keel::{
    Connection, Driver, Error, Executor, GenericSqlWriter, Query, Result, RowLabeled,
    RowNames, RowsAffected, Value,
    stream::{self, Stream},
};
use std::{
    collections::VecDeque,
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Scripted outcome of the next statement sent to a [`MockConnection`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    Rows(Vec<RowLabeled>),
    Affected(u64),
    Error(String),
}

#[derive(Default, Debug, Clone, Copy)]
pub struct MockDriver {}

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = GenericSqlWriter;

    const NAME: &'static str = "mock";

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }
}

/// In memory connection recording every statement it receives.
///
/// Statements consume the scripted responses in order. Once the script is
/// exhausted a fetch returns no rows (one row for the healthcheck) and an
/// execute reports one affected row.
#[derive(Default, Debug)]
pub struct MockConnection {
    queries: Mutex<Vec<Query>>,
    responses: Mutex<VecDeque<MockResponse>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A result row from column labels and values.
pub fn mock_row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
    let labels: RowNames = labels.iter().map(|v| v.to_string()).collect();
    RowLabeled::new(labels, values.into())
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a response to the script.
    pub fn respond(self, response: MockResponse) -> Self {
        self.push_response(response);
        self
    }

    pub fn push_response(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Every statement received so far.
    pub fn queries(&self) -> Vec<Query> {
        lock(&self.queries).clone()
    }

    /// SQL text of every statement received so far.
    pub fn statements(&self) -> Vec<String> {
        lock(&self.queries).iter().map(|v| v.sql.clone()).collect()
    }

    pub fn clear(&self) {
        lock(&self.queries).clear();
    }

    fn next(&self, query: Query) -> Option<MockResponse> {
        log::trace!("Mock received:\n{}", query);
        lock(&self.queries).push(query);
        lock(&self.responses).pop_front()
    }
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    fn driver(&self) -> &Self::Driver {
        &MockDriver {}
    }

    fn fetch(&self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send {
        let healthcheck = query.sql.contains("NOW()");
        let result: Vec<Result<RowLabeled>> = match self.next(query) {
            Some(MockResponse::Rows(rows)) => rows.into_iter().map(Ok).collect(),
            Some(MockResponse::Affected(..)) => Vec::new(),
            Some(MockResponse::Error(e)) => vec![Err(Error::msg(e))],
            None if healthcheck => vec![Ok(mock_row(&["now"], vec![Value::Int64(0)]))],
            None => Vec::new(),
        };
        stream::iter(result)
    }

    fn execute(&self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        let result = match self.next(query) {
            Some(MockResponse::Rows(rows)) => Ok(rows.len() as u64),
            Some(MockResponse::Affected(v)) => Ok(v),
            Some(MockResponse::Error(e)) => Err(Error::msg(e)),
            None => Ok(1),
        };
        async move {
            result.map(|rows_affected| RowsAffected { rows_affected })
        }
    }
}

impl Connection for MockConnection {
    async fn connect(url: &str) -> Result<MockConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!("Mock connection url must start with `{}`", prefix));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(MockConnection::new())
    }
}
