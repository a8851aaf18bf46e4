//! Client-side transaction coordination
//!
//! A transaction is BEGIN, the caller's statements, and COMMIT sequenced
//! through one session lineage; atomicity is enforced by the database via
//! ROLLBACK, not by the client. The coordinator runs on a dedicated
//! connection so the caller's own connection keeps its session untouched.

use futures::future::BoxFuture;

use crate::connection::{Connection, ExecuteOptions};
use crate::error::DriverResult;
use crate::sanitize::Params;
use crate::types::ExecutedQuery;

/// Handle passed to the unit of work. Exposes only statement execution,
/// scoped to the transaction's connection.
pub struct Transaction {
    conn: Connection,
}

impl Transaction {
    pub async fn execute(
        &mut self,
        query: &str,
        params: impl Into<Params>,
    ) -> DriverResult<ExecutedQuery> {
        self.conn.execute(query, params).await
    }

    pub async fn execute_with(
        &mut self,
        query: &str,
        params: impl Into<Params>,
        options: ExecuteOptions,
    ) -> DriverResult<ExecutedQuery> {
        self.conn.execute_with(query, params, options).await
    }
}

impl Connection {
    /// Runs `work` inside a transaction on a dedicated connection.
    ///
    /// Executes `BEGIN`, the work's statements, then `COMMIT`, all through
    /// one fresh session lineage. If any of the three fails, `ROLLBACK` is
    /// issued on the same connection and the original error is returned; a
    /// rollback failure is logged but never displaces the triggering
    /// error. No nested transactions, no savepoints.
    ///
    /// ```no_run
    /// # use sqlgate::{Connection, DriverResult};
    /// # async fn demo(conn: &Connection) -> DriverResult<()> {
    /// conn.transaction(|tx| {
    ///     Box::pin(async move {
    ///         tx.execute("INSERT INTO audits (actor) VALUES (?)", ["admin"]).await?;
    ///         tx.execute("UPDATE counters SET n = n + 1 WHERE id = :id", std::collections::HashMap::from([("id", 1)])).await
    ///     })
    /// })
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn transaction<T, F>(&self, work: F) -> DriverResult<T>
    where
        F: for<'t> FnOnce(&'t mut Transaction) -> BoxFuture<'t, DriverResult<T>>,
    {
        let mut tx = Transaction { conn: self.sibling() };

        let outcome = {
            let tx = &mut tx;
            async move {
                tx.conn.execute("BEGIN", ()).await?;
                let value = work(tx).await?;
                tx.conn.execute("COMMIT", ()).await?;
                Ok(value)
            }
            .await
        };

        match outcome {
            Ok(value) => Ok(value),
            Err(error) => {
                if let Err(rollback_error) = tx.conn.execute("ROLLBACK", ()).await {
                    tracing::warn!(
                        error = %rollback_error,
                        "rollback failed after transaction error"
                    );
                }
                Err(error)
            }
        }
    }
}
