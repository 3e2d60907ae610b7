use crate::{Executor, Result};
use std::future::Future;

pub trait Connection: Executor {
    /// Establish a connection to the given URL.
    fn connect(url: &str) -> impl Future<Output = Result<Self>>;

    /// Close the connection, pending statements are abandoned.
    fn disconnect(self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
