mod crud;
mod entities;
mod mock;
mod schema;
mod unit_of_work;

pub use entities::*;
pub use mock::*;

use crate::{crud::crud, schema::schema, unit_of_work::unit_of_work};
use keel::{Connection, Connector};
use log::LevelFilter;
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run every scenario against a live store, the tables of the current schema are dropped first.
pub async fn execute_tests<C: Connection>(mut connector: Connector<C>) {
    connector
        .connect()
        .await
        .expect("Could not connect to the store");
    connector.drop().await.expect("Could not clean the schema");
    schema(&connector).await;
    crud(&connector).await;
    unit_of_work(&connector).await;
    connector.drop().await.expect("Could not clean the schema");
    connector
        .disconnect()
        .await
        .expect("Could not disconnect");
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        let result = { $($code)+ };
        log::set_max_level(level);
        result
    }};
}
