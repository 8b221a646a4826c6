/// Session API tests
///
/// Exercise `Session` against a hand-written transport to check how
/// coordinator failures are routed through retry policies.
/// Run with: cargo test --test session_api_tests
use async_trait::async_trait;
use peoplestore::{
    ClusterConfig, ClusterError, ClusterTransport, ConsistencyAwareRetryPolicy, ConsistencyLevel,
    PreparedStatement, ReadTimeoutContext, Result, ResultSet, RetryDecision, RetryPolicy, Session,
    Statement, Value,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Fails the first `failures` attempts with `error`, then answers one row.
struct FlakyTransport {
    error: ClusterError,
    failures: usize,
    attempts: Mutex<Vec<ConsistencyLevel>>,
}

impl FlakyTransport {
    fn new(error: ClusterError, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            error,
            failures,
            attempts: Mutex::new(Vec::new()),
        })
    }

    async fn attempts(&self) -> Vec<ConsistencyLevel> {
        self.attempts.lock().await.clone()
    }
}

#[async_trait]
impl ClusterTransport for FlakyTransport {
    async fn connect(&self, _keyspace: &str) -> Result<()> {
        Ok(())
    }

    async fn prepare(&self, cql: &str) -> Result<PreparedStatement> {
        Ok(PreparedStatement::new(cql))
    }

    async fn execute(
        &self,
        _statement: &Statement,
        consistency: ConsistencyLevel,
    ) -> Result<ResultSet> {
        let mut attempts = self.attempts.lock().await;
        attempts.push(consistency);
        if attempts.len() <= self.failures {
            return Err(self.error.clone());
        }
        Ok(ResultSet::new(
            vec!["name".to_string()],
            vec![vec![Value::from("Chris")]],
        ))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn read_timeout() -> ClusterError {
    ClusterError::ReadTimeout {
        consistency: ConsistencyLevel::Quorum,
        required_responses: 2,
        received_responses: 1,
        data_retrieved: false,
    }
}

#[derive(Debug)]
struct IgnoreReads;

impl RetryPolicy for IgnoreReads {
    fn on_read_timeout(&self, _ctx: &ReadTimeoutContext<'_>) -> RetryDecision {
        RetryDecision::Ignore
    }
}

#[tokio::test]
async fn test_downgraded_retry_recovers() {
    let transport = FlakyTransport::new(read_timeout(), 1);
    let session = Session::connect_with_policy(
        ClusterConfig::default(),
        transport.clone(),
        Arc::new(ConsistencyAwareRetryPolicy::new(3)),
    )
    .await
    .unwrap();

    let statement =
        Statement::simple("select * from person").with_consistency(ConsistencyLevel::Quorum);
    let result = session.execute(&statement).await.unwrap();

    assert_eq!(result.row_count(), 1);
    assert_eq!(
        transport.attempts().await,
        vec![ConsistencyLevel::Quorum, ConsistencyLevel::One]
    );
}

#[tokio::test]
async fn test_default_policy_retries_read_once_when_enough_replicas_answered() {
    let transport = FlakyTransport::new(
        ClusterError::ReadTimeout {
            consistency: ConsistencyLevel::Quorum,
            required_responses: 2,
            received_responses: 2,
            data_retrieved: false,
        },
        5,
    );
    let session = Session::connect(ClusterConfig::default(), transport.clone())
        .await
        .unwrap();

    let statement =
        Statement::simple("select * from person").with_consistency(ConsistencyLevel::Quorum);
    assert!(matches!(
        session.execute(&statement).await,
        Err(ClusterError::ReadTimeout { .. })
    ));
    assert_eq!(
        transport.attempts().await,
        vec![ConsistencyLevel::Quorum, ConsistencyLevel::Quorum]
    );
}

#[tokio::test]
async fn test_unavailable_is_rethrown_by_consistency_aware_policy() {
    let transport = FlakyTransport::new(
        ClusterError::Unavailable {
            consistency: ConsistencyLevel::Quorum,
            required_replicas: 2,
            alive_replicas: 1,
        },
        1,
    );
    let session = Session::connect_with_policy(
        ClusterConfig::default(),
        transport.clone(),
        Arc::new(ConsistencyAwareRetryPolicy::new(3)),
    )
    .await
    .unwrap();

    let err = session
        .execute(&Statement::simple("select * from person"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClusterError::Unavailable { .. }));
    assert_eq!(transport.attempts().await.len(), 1);
}

#[tokio::test]
async fn test_ignore_decision_yields_empty_result() {
    let transport = FlakyTransport::new(read_timeout(), 1);
    let session = Session::connect_with_policy(
        ClusterConfig::default(),
        transport.clone(),
        Arc::new(IgnoreReads),
    )
    .await
    .unwrap();

    let result = session
        .execute(&Statement::simple("select * from person"))
        .await
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(transport.attempts().await.len(), 1);
}

#[tokio::test]
async fn test_session_default_consistency_applies() {
    let transport = FlakyTransport::new(read_timeout(), 0);
    let config = ClusterConfig::default().default_consistency(ConsistencyLevel::LocalQuorum);
    let session = Session::connect(config, transport.clone()).await.unwrap();

    session
        .execute(&Statement::simple("select * from person"))
        .await
        .unwrap();
    assert_eq!(transport.attempts().await, vec![ConsistencyLevel::LocalQuorum]);
}

#[tokio::test]
async fn test_closed_session_rejects_statements() {
    let transport = FlakyTransport::new(read_timeout(), 0);
    let session = Session::connect(ClusterConfig::default(), transport.clone())
        .await
        .unwrap();

    session.close().await.unwrap();
    session.close().await.unwrap();
    assert!(session.is_closed());
    assert!(matches!(
        session.prepare("select * from person").await,
        Err(ClusterError::SessionClosed)
    ));
    assert!(transport.attempts().await.is_empty());
}
