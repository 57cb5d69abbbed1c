use crate::{db::PoolConnection, Result, Store};

use std::{ops::Deref, sync::Arc};
use strata_core::{
    driver::operation::{IsolationLevel, Transaction as TransactionOp},
    Error,
};
use tokio::sync::Mutex;

/// The connection a transaction is pinned to. Emptied when the transaction
/// commits or rolls back, after which stores bound to it fail with
/// `InvalidTxCallback`.
#[derive(Debug)]
pub(crate) struct TxConnection {
    pub(crate) conn: Mutex<Option<PoolConnection>>,
}

/// An open database transaction.
///
/// Dereferences to a [`Store`] whose operations run inside the transaction.
/// Beginning a transaction from a store that is already inside one yields a
/// nested handle whose commit and rollback are left to the outer
/// transaction.
///
/// If dropped without calling [`commit`](Self::commit) or
/// [`rollback`](Self::rollback), the transaction is rolled back.
#[derive(Debug)]
pub struct Transaction {
    store: Store,
    nested: bool,
    finished: bool,
}

impl Transaction {
    pub(crate) async fn begin(
        store: &Store,
        isolation: Option<IsolationLevel>,
        read_only: bool,
    ) -> Result<Transaction> {
        if store.in_transaction() {
            return Ok(Transaction {
                store: store.clone(),
                nested: true,
                finished: false,
            });
        }

        let mut conn = store.shared().pool.get().await?;
        conn.exec(
            TransactionOp::Start {
                isolation,
                read_only,
            }
            .into(),
        )
        .await?;

        tracing::info!(?isolation, read_only, "transaction started");

        let tx = Arc::new(TxConnection {
            conn: Mutex::new(Some(conn)),
        });

        Ok(Transaction {
            store: store.bind(tx),
            nested: false,
            finished: false,
        })
    }

    /// The store bound to this transaction.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }

    pub async fn commit(mut self) -> Result<()> {
        self.end(TransactionOp::Commit).await?;
        tracing::info!("transaction committed");
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<()> {
        self.end(TransactionOp::Rollback).await?;
        tracing::info!("transaction rolled back");
        Ok(())
    }

    /// Commits when `res` is `Ok`, otherwise rolls back and returns the
    /// original error.
    pub(crate) async fn finish<T>(self, res: Result<T>) -> Result<T> {
        match res {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(error = %err, "rolling back transaction");
                if let Err(rollback) = self.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn end(&mut self, op: TransactionOp) -> Result<()> {
        self.finished = true;

        if self.nested {
            return Ok(());
        }

        let Some(tx) = self.store.tx() else {
            return Ok(());
        };

        // Taking the connection returns it to the pool once the statement
        // completes.
        let Some(mut conn) = tx.conn.lock().await.take() else {
            return Err(Error::invalid_tx_callback());
        };
        conn.exec(op.into()).await?;
        Ok(())
    }
}

impl Deref for Transaction {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.finished || self.nested {
            return;
        }

        let Some(tx) = self.store.tx().cloned() else {
            return;
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Some(mut conn) = tx.conn.lock().await.take() {
                    let _ = conn.exec(TransactionOp::Rollback.into()).await;
                    tracing::info!("dropped transaction rolled back");
                }
            });
        }
    }
}
