mod as_value;
mod column;
mod config;
mod connection;
mod connector;
mod crypto;
mod driver;
mod entity;
mod executor;
mod filter;
mod manager;
mod query;
mod table;
mod transform;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context;
pub use ::serde_json;
pub use as_value::*;
pub use column::*;
pub use config::*;
pub use connection::*;
pub use connector::*;
pub use crypto::*;
pub use driver::*;
pub use entity::*;
pub use executor::*;
pub use filter::*;
pub use manager::*;
pub use query::*;
pub use table::*;
pub use transform::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
