use crate::{
    Driver, Query, Result, RowLabeled, RowsAffected,
    stream::{Stream, TryStreamExt},
};
use std::future::Future;

/// Runs statements against a store.
///
/// Every method borrows the executor immutably so independent statements can
/// be in flight at the same time (the connector fans out batch writes).
pub trait Executor: Send + Sync + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Execute the query and return the rows.
    fn fetch(&self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send;

    /// Execute the query and return the total number of rows affected.
    fn execute(&self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send;

    /// Execute the query and collect every row.
    fn fetch_all(&self, query: Query) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        self.fetch(query).try_collect()
    }
}
