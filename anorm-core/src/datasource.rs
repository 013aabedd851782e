use crate::{Connection, OrmError, Result};
use parking_lot::RwLock;
use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};
use tokio::task::JoinHandle;

/// Name under which [`DataSourcePool::push`] stores the primary connection.
pub const DEFAULT_DATA_SOURCE: &str = "_";
/// Alias of [`DEFAULT_DATA_SOURCE`], also written by [`DataSourcePool::push`].
pub const MASTER_DATA_SOURCE: &str = "master";

/// Named connections shared by the registry and every handle.
#[derive(Default)]
pub struct DataSourcePool {
    connections: RwLock<BTreeMap<String, Arc<dyn Connection>>>,
}

impl DataSourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the primary connection under both `_` and `master`.
    pub fn push(&self, connection: Arc<dyn Connection>) {
        let mut connections = self.connections.write();
        connections.insert(DEFAULT_DATA_SOURCE.into(), connection.clone());
        connections.insert(MASTER_DATA_SOURCE.into(), connection);
    }

    /// Store (or replace) a named connection.
    pub fn push_named(&self, name: impl Into<String>, connection: Arc<dyn Connection>) {
        self.connections.write().insert(name.into(), connection);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Connection>> {
        self.connections.read().get(name).cloned()
    }

    /// The named connection, or [`OrmError::RequiredDataSource`].
    pub fn required(&self, name: &str) -> Result<Arc<dyn Connection>> {
        self.get(name).ok_or_else(|| {
            OrmError::RequiredDataSource {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// `master`, falling back to `_`.
    pub fn master(&self) -> Result<Arc<dyn Connection>> {
        self.get(MASTER_DATA_SOURCE)
            .or_else(|| self.get(DEFAULT_DATA_SOURCE))
            .ok_or_else(|| OrmError::NoMasterDataSource.into())
    }

    pub fn names(&self) -> Vec<String> {
        self.connections.read().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Ping every connection each `period` and log the outcome, until the
    /// returned task is aborted.
    pub fn spawn_liveness_probe(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let pool = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let Some(pool) = pool.upgrade() else {
                    break;
                };
                let snapshot = pool
                    .connections
                    .read()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<Vec<_>>();
                drop(pool);
                for (name, connection) in snapshot {
                    match connection.ping().await {
                        Ok(()) => log::debug!("Data source `{}` ping succeeded", name),
                        Err(e) => log::error!("Data source `{}` ping failed: {:#}", name, e),
                    }
                }
            }
        })
    }
}

impl fmt::Debug for DataSourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourcePool")
            .field("names", &self.names())
            .finish()
    }
}
