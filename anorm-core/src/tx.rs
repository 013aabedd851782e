use crate::{Result, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Groups transactions, possibly on different data sources, and finishes them together.
///
/// Members are committed or rolled back in join order. The first failure stops
/// the walk and is returned, members already finished stay finished: this is
/// not a two phase commit.
#[derive(Default)]
pub struct TxManager {
    transactions: Mutex<Vec<Arc<dyn Transaction>>>,
}

impl TxManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, transaction: Arc<dyn Transaction>) {
        self.transactions.lock().await.push(transaction);
    }

    pub async fn commit(&self) -> Result<()> {
        let transactions = self.transactions.lock().await;
        for (i, tx) in transactions.iter().enumerate() {
            if let Err(e) = tx.commit().await {
                log::error!("Commit of transaction {} failed: {:#}", i, e);
                return Err(e);
            }
        }
        Ok(())
    }

    pub async fn rollback(&self) -> Result<()> {
        let transactions = self.transactions.lock().await;
        for (i, tx) in transactions.iter().enumerate() {
            if let Err(e) = tx.rollback().await {
                log::error!("Rollback of transaction {} failed: {:#}", i, e);
                return Err(e);
            }
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.transactions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.transactions.lock().await.is_empty()
    }
}
