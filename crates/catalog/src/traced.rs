//! Traced database connection wrapper.
//!
//! Wraps a tokio-postgres client and logs all queries via tracing.

use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Error, Row};
use tracing::Instrument;

/// A wrapper around a client that logs every statement via tracing.
///
/// This is a thin wrapper that delegates to the underlying client but adds
/// `tracing::debug_span!` around each call.
///
/// # Example
///
/// ```ignore
/// use catalog::TracedConn;
///
/// let traced = TracedConn::new(&client);
/// traced.batch_execute("CREATE TABLE ...").await?;
/// let rows = traced.query("SELECT * FROM products WHERE \"Code\" = $1", &[&code]).await?;
/// ```
pub struct TracedConn<'a> {
    client: &'a Client,
}

impl<'a> TracedConn<'a> {
    /// Create a new traced wrapper.
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Execute a query, returning all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Error> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            params = params.len(),
            rows = tracing::field::Empty,
        );
        let rows = self
            .client
            .query(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", rows.len());
        Ok(rows)
    }

    /// Run one or more statements with the simple query protocol.
    pub async fn batch_execute(&self, sql: &str) -> Result<(), Error> {
        let span = tracing::debug_span!("db.execute", sql = %sql, batch = true);
        self.client.batch_execute(sql).instrument(span).await
    }
}
