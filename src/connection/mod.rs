pub mod config;
pub mod statement;
pub mod stub;

use crate::core::{ClusterError, ConsistencyLevel, Result};
use crate::interface::ClusterTransport;
use crate::result::ResultSet;
use crate::retry::{
    DefaultRetryPolicy, ReadTimeoutContext, RetryDecision, RetryPolicy, UnavailableContext,
    WriteTimeoutContext,
};
use config::ClusterConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Instrument, Level, event, info_span};

pub use statement::{PreparedStatement, Statement, StatementKind};

/// Client handle to the cluster
///
/// Owns the transport for its whole lifetime. Every statement goes through
/// [`Session::execute`], which bounds each attempt by the configured read
/// timeout and asks the retry policy what to do when the coordinator reports
/// a timeout or missing replicas.
pub struct Session {
    transport: Arc<dyn ClusterTransport>,
    config: ClusterConfig,
    retry_policy: Arc<dyn RetryPolicy>,
    closed: AtomicBool,
}

impl Session {
    /// Opens a session using the cluster's default retry policy.
    pub async fn connect(
        config: ClusterConfig,
        transport: Arc<dyn ClusterTransport>,
    ) -> Result<Self> {
        Self::connect_with_policy(config, transport, Arc::new(DefaultRetryPolicy)).await
    }

    /// Opens a session and selects the configured keyspace.
    ///
    /// `retry_policy` applies to every statement that does not carry its own.
    pub async fn connect_with_policy(
        config: ClusterConfig,
        transport: Arc<dyn ClusterTransport>,
        retry_policy: Arc<dyn RetryPolicy>,
    ) -> Result<Self> {
        config.validate()?;

        let deadline = config.read_timeout;
        tokio::time::timeout(deadline, transport.connect(&config.keyspace))
            .await
            .map_err(|_| {
                ClusterError::NoHostAvailable(format!(
                    "no contact point in [{}] answered within {:?}",
                    config.contact_points.join(", "),
                    deadline
                ))
            })??;

        event!(
            Level::INFO,
            keyspace = %config.keyspace,
            url = %config.to_url(),
            "cluster session opened"
        );

        Ok(Self {
            transport,
            config,
            retry_policy,
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &Arc<dyn RetryPolicy> {
        &self.retry_policy
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Prepare a statement on the cluster
    pub async fn prepare(&self, cql: &str) -> Result<PreparedStatement> {
        self.ensure_open()?;
        let deadline = self.config.read_timeout;
        tokio::time::timeout(deadline, self.transport.prepare(cql))
            .await
            .map_err(|_| ClusterError::OperationTimedOut(deadline))?
    }

    /// Execute a statement, retrying as the retry policy decides.
    ///
    /// The first attempt uses the statement's consistency, or the session
    /// default. Attempts are strictly sequential.
    pub async fn execute(&self, statement: &Statement) -> Result<ResultSet> {
        self.ensure_open()?;

        let consistency = statement
            .consistency()
            .unwrap_or(self.config.default_consistency);
        let span = info_span!(
            "session.execute",
            cql = %statement.cql(),
            consistency = %consistency,
            prepared = statement.is_prepared()
        );

        self.execute_with_retries(statement, consistency)
            .instrument(span)
            .await
    }

    async fn execute_with_retries(
        &self,
        statement: &Statement,
        initial: ConsistencyLevel,
    ) -> Result<ResultSet> {
        let policy = statement.retry_policy().unwrap_or(&self.retry_policy);
        let mut consistency = initial;
        let mut attempt: u32 = 0;

        loop {
            let err = match self.attempt(statement, consistency).await {
                Ok(result) => {
                    event!(Level::DEBUG, attempt, rows = result.row_count(), "statement succeeded");
                    return Ok(result);
                }
                Err(err) => err,
            };

            let decision = match decide(&**policy, statement, &err, attempt) {
                Some(decision) => decision,
                None => {
                    event!(Level::DEBUG, attempt, error = %err, "statement failed");
                    return Err(err);
                }
            };

            match decision {
                RetryDecision::Retry(next) => {
                    event!(
                        Level::DEBUG,
                        attempt,
                        error = %err,
                        next_consistency = %next,
                        "retrying statement"
                    );
                    attempt += 1;
                    consistency = next;
                }
                RetryDecision::Rethrow => {
                    event!(Level::DEBUG, attempt, error = %err, "retry policy rethrew");
                    return Err(err);
                }
                RetryDecision::Ignore => {
                    event!(Level::DEBUG, attempt, error = %err, "retry policy ignored failure");
                    return Ok(ResultSet::empty());
                }
            }
        }
    }

    async fn attempt(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
    ) -> Result<ResultSet> {
        let deadline = self.config.read_timeout;
        tokio::time::timeout(deadline, self.transport.execute(statement, consistency))
            .await
            .map_err(|_| ClusterError::OperationTimedOut(deadline))?
    }

    /// Close the session
    ///
    /// Closing twice is a no-op.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        event!(Level::INFO, keyspace = %self.config.keyspace, "cluster session closed");
        self.transport.close().await
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ClusterError::SessionClosed);
        }
        Ok(())
    }
}

/// Maps a coordinator failure onto the matching policy callback.
///
/// Returns `None` for failures no policy is consulted about.
fn decide(
    policy: &dyn RetryPolicy,
    statement: &Statement,
    err: &ClusterError,
    attempt: u32,
) -> Option<RetryDecision> {
    let decision = match *err {
        ClusterError::ReadTimeout {
            consistency,
            required_responses,
            received_responses,
            data_retrieved,
        } => policy.on_read_timeout(&ReadTimeoutContext {
            statement,
            consistency,
            required_responses,
            received_responses,
            data_retrieved,
            attempt,
        }),
        ClusterError::WriteTimeout {
            consistency,
            write_type,
            required_acks,
            received_acks,
        } => policy.on_write_timeout(&WriteTimeoutContext {
            statement,
            consistency,
            write_type,
            required_acks,
            received_acks,
            attempt,
        }),
        ClusterError::Unavailable {
            consistency,
            required_replicas,
            alive_replicas,
        } => policy.on_unavailable(&UnavailableContext {
            statement,
            consistency,
            required_replicas,
            alive_replicas,
            attempt,
        }),
        _ => return None,
    };
    Some(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Value, WriteType};
    use crate::retry::{ConsistencyAwareRetryPolicy, FallthroughRetryPolicy};
    use super::stub::{PrimeResult, PrimingRequest, StubCluster};
    use std::time::Duration;

    async fn open(stub: &StubCluster, policy: Arc<dyn RetryPolicy>) -> Session {
        let config = ClusterConfig::default().read_timeout(Duration::from_millis(100));
        Session::connect_with_policy(config, Arc::new(stub.clone()), policy)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_connect_selects_keyspace() {
        let stub = StubCluster::new();
        let _session = Session::connect(ClusterConfig::default(), Arc::new(stub.clone()))
            .await
            .unwrap();

        assert_eq!(stub.recorded_connections().await, 1);
        let queries = stub.recorded_queries().await;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].query, "USE people");
        assert_eq!(queries[0].consistency, ConsistencyLevel::One);
    }

    #[tokio::test]
    async fn test_connect_uses_default_policy() {
        let stub = StubCluster::new();
        let session = Session::connect(ClusterConfig::default(), Arc::new(stub))
            .await
            .unwrap();
        assert_eq!(
            format!("{:?}", session.retry_policy()),
            format!("{:?}", DefaultRetryPolicy)
        );
    }

    #[tokio::test]
    async fn test_connect_fails_when_cluster_down() {
        let stub = StubCluster::new();
        stub.set_available(false);
        let result = Session::connect(ClusterConfig::default(), Arc::new(stub.clone())).await;
        assert!(matches!(result, Err(ClusterError::NoHostAvailable(_))));
    }

    #[tokio::test]
    async fn test_read_timeout_downgrades_then_rethrows() {
        let stub = StubCluster::new();
        let session = open(&stub, Arc::new(ConsistencyAwareRetryPolicy::new(2))).await;
        stub.clear_recorded_activity().await;
        stub.prime(
            PrimingRequest::query("select * from person")
                .with_result(PrimeResult::ReadTimeout),
        )
        .await
        .unwrap();

        let statement = Statement::simple("select * from person")
            .with_consistency(ConsistencyLevel::Quorum);
        let err = session.execute(&statement).await.unwrap_err();
        assert!(matches!(err, ClusterError::ReadTimeout { .. }));

        let levels: Vec<ConsistencyLevel> = stub
            .recorded_queries()
            .await
            .into_iter()
            .map(|q| q.consistency)
            .collect();
        assert_eq!(
            levels,
            vec![
                ConsistencyLevel::Quorum,
                ConsistencyLevel::One,
                ConsistencyLevel::One
            ]
        );
    }

    #[tokio::test]
    async fn test_statement_policy_overrides_session_policy() {
        let stub = StubCluster::new();
        let session = open(&stub, Arc::new(ConsistencyAwareRetryPolicy::new(3))).await;
        stub.clear_recorded_activity().await;
        stub.prime(
            PrimingRequest::query("select * from person")
                .with_result(PrimeResult::ReadTimeout),
        )
        .await
        .unwrap();

        let statement = Statement::simple("select * from person")
            .with_retry_policy(Arc::new(FallthroughRetryPolicy));
        assert!(session.execute(&statement).await.is_err());
        assert_eq!(stub.recorded_queries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_write_timeout_uses_default_escalation() {
        let stub = StubCluster::new();
        let session = open(&stub, Arc::new(ConsistencyAwareRetryPolicy::new(3))).await;
        stub.clear_recorded_activity().await;
        stub.prime(
            PrimingRequest::query("insert into person(name) values ('x')")
                .with_result(PrimeResult::WriteTimeout(WriteType::BatchLog)),
        )
        .await
        .unwrap();

        let statement = Statement::simple("insert into person(name) values ('x')");
        let err = session.execute(&statement).await.unwrap_err();
        assert!(matches!(err, ClusterError::WriteTimeout { .. }));
        // batch log writes are retried once at the same level
        assert_eq!(stub.recorded_queries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_slow_attempt_hits_client_deadline() {
        let stub = StubCluster::new();
        let session = open(&stub, Arc::new(ConsistencyAwareRetryPolicy::new(1))).await;
        stub.prime(
            PrimingRequest::query("select * from person")
                .with_fixed_delay(Duration::from_millis(500)),
        )
        .await
        .unwrap();

        let err = session
            .execute(&Statement::simple("select * from person"))
            .await
            .unwrap_err();
        assert_eq!(err, ClusterError::OperationTimedOut(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_execute_after_close_fails() {
        let stub = StubCluster::new();
        let session = open(&stub, Arc::new(DefaultRetryPolicy)).await;
        session.close().await.unwrap();
        session.close().await.unwrap();

        assert!(session.is_closed());
        let err = session
            .execute(&Statement::simple("select * from person"))
            .await
            .unwrap_err();
        assert_eq!(err, ClusterError::SessionClosed);
        assert!(session.prepare("select * from person").await.is_err());
    }

    #[tokio::test]
    async fn test_prepared_round_trip() {
        let stub = StubCluster::new();
        let session = open(&stub, Arc::new(DefaultRetryPolicy)).await;
        let prepared = session
            .prepare("select * from person where name = ?")
            .await
            .unwrap();
        let statement = prepared.bind(vec![Value::from("Chris")]).unwrap();

        let result = session.execute(&statement).await.unwrap();
        assert!(result.is_empty());

        let executions = stub.recorded_prepared_executions().await;
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].variables, vec![Value::from("Chris")]);
    }
}
