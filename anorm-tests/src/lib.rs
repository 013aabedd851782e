mod joins;
mod nullability;
mod pagination;
mod simple;
mod transaction;

use anorm::{Config, Connection, DataSourcePool, Registry};
use joins::joins;
use log::LevelFilter;
use nullability::nullability;
use pagination::pagination;
use simple::simple;
use std::{env, sync::Arc};
use transaction::transaction;

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

/// Registry migrating every entity into `connection`.
pub(crate) fn registry(connection: Arc<dyn Connection>) -> Registry {
    let pool = Arc::new(DataSourcePool::new());
    pool.push(connection);
    Registry::new(
        Config {
            migrate: true,
            ..Default::default()
        },
        pool,
    )
}

pub async fn execute_tests(connection: Arc<dyn Connection>) {
    simple(connection.clone()).await;
    nullability(connection.clone()).await;
    joins(connection.clone()).await;
    pagination(connection.clone()).await;
    transaction(connection).await;
}
