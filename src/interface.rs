use crate::connection::{PreparedStatement, Statement};
use crate::core::{ConsistencyLevel, Result};
use crate::result::ResultSet;
use async_trait::async_trait;

/// A single-attempt channel to the cluster.
///
/// Implementations perform exactly one round-trip per call and report
/// coordinator failures (`ReadTimeout`, `WriteTimeout`, `Unavailable`) and
/// connectivity failures (`NoHostAvailable`) as errors. Retrying, deadlines
/// and consistency defaults belong to [`crate::Session`], which wraps a transport.
///
/// [`crate::StubCluster`] is the in-memory implementation; a driver for a real
/// cluster plugs in here as well.
#[async_trait]
pub trait ClusterTransport: Send + Sync {
    /// Open a connection and select `keyspace`.
    async fn connect(&self, keyspace: &str) -> Result<()>;

    /// Prepare a statement on the cluster.
    async fn prepare(&self, cql: &str) -> Result<PreparedStatement>;

    /// Execute one attempt of `statement` at `consistency`.
    async fn execute(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
    ) -> Result<ResultSet>;

    /// Release the connection.
    async fn close(&self) -> Result<()>;
}
