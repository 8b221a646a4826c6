//! In-memory stand-in for a cluster.
//!
//! Tests prime the responses they want for given queries, then inspect which
//! queries and prepared statement executions the client actually issued.
//! Unprimed statements succeed with an empty result.

use super::{PreparedStatement, Statement, StatementKind};
use crate::core::{ClusterError, ConsistencyLevel, DataType, Result, Value, WriteType};
use crate::interface::ClusterTransport;
use crate::result::ResultSet;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use regex::Regex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_REPLICATION_FACTOR: u32 = 3;

/// What a primed statement answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimeResult {
    Success,
    ReadTimeout,
    WriteTimeout(WriteType),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrimeKind {
    Query,
    PreparedStatement,
}

#[derive(Debug, Clone)]
enum QueryMatcher {
    Exact(String),
    Pattern(String),
}

/// A canned response for a query or prepared statement.
///
/// ```
/// # use peoplestore::{PrimingRequest, Value};
/// let prime = PrimingRequest::query("select * from person")
///     .with_row([("first_name", Value::from("Chris")), ("age", Value::from(29))]);
/// ```
#[derive(Debug, Clone)]
pub struct PrimingRequest {
    kind: PrimeKind,
    matcher: QueryMatcher,
    rows: Vec<Vec<(String, Value)>>,
    column_types: Vec<(String, DataType)>,
    variable_types: Option<Vec<DataType>>,
    result: PrimeResult,
    fixed_delay: Option<Duration>,
}

impl PrimingRequest {
    fn new(kind: PrimeKind, matcher: QueryMatcher) -> Self {
        Self {
            kind,
            matcher,
            rows: Vec::new(),
            column_types: Vec::new(),
            variable_types: None,
            result: PrimeResult::Success,
            fixed_delay: None,
        }
    }

    /// Primes an unbound query with exactly this text.
    pub fn query(text: impl Into<String>) -> Self {
        Self::new(PrimeKind::Query, QueryMatcher::Exact(text.into()))
    }

    /// Primes unbound queries whose whole text matches `pattern`.
    pub fn query_pattern(pattern: impl Into<String>) -> Self {
        Self::new(PrimeKind::Query, QueryMatcher::Pattern(pattern.into()))
    }

    /// Primes executions of the prepared statement with exactly this text.
    pub fn prepared(text: impl Into<String>) -> Self {
        Self::new(PrimeKind::PreparedStatement, QueryMatcher::Exact(text.into()))
    }

    /// Primes executions of prepared statements whose whole text matches `pattern`.
    pub fn prepared_pattern(pattern: impl Into<String>) -> Self {
        Self::new(
            PrimeKind::PreparedStatement,
            QueryMatcher::Pattern(pattern.into()),
        )
    }

    pub fn with_row<I, K>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.rows
            .push(row.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    /// Declares column types; cells of untyped columns are returned as primed.
    pub fn with_column_types<I, K>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = (K, DataType)>,
        K: Into<String>,
    {
        self.column_types = types.into_iter().map(|(k, t)| (k.into(), t)).collect();
        self
    }

    /// Declares the bind variable types a prepared execution must match.
    pub fn with_variable_types(mut self, types: Vec<DataType>) -> Self {
        self.variable_types = Some(types);
        self
    }

    pub fn with_result(mut self, result: PrimeResult) -> Self {
        self.result = result;
        self
    }

    /// Delays the response by `delay` before answering.
    pub fn with_fixed_delay(mut self, delay: Duration) -> Self {
        self.fixed_delay = Some(delay);
        self
    }

    fn column_type(&self, column: &str) -> Option<&DataType> {
        self.column_types
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, t)| t)
    }

    /// Builds the primed result, coercing every cell to its column type.
    fn result_set(&self) -> Result<ResultSet> {
        let mut columns: Vec<String> = Vec::new();
        for row in &self.rows {
            for (name, _) in row {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = row
                    .iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Null);
                let value = match self.column_type(column) {
                    Some(data_type) => coerce(value, data_type).ok_or_else(|| {
                        ClusterError::InvalidQuery(format!(
                            "Primed value for column '{}' is not a valid {}",
                            column, data_type
                        ))
                    })?,
                    None => value,
                };
                values.push(value);
            }
            rows.push(values);
        }

        Ok(ResultSet::new(columns, rows))
    }
}

/// Converts primed values to the declared type; timestamps may be primed as
/// epoch milliseconds.
fn coerce(value: Value, data_type: &DataType) -> Option<Value> {
    match (data_type, value) {
        (_, Value::Null) => Some(Value::Null),
        (DataType::Timestamp, Value::Integer(millis)) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .map(Value::Timestamp),
        (DataType::List(inner), Value::List(items)) => items
            .into_iter()
            .map(|item| coerce(item, inner))
            .collect::<Option<Vec<_>>>()
            .map(Value::List),
        (data_type, value) if data_type.is_compatible(&value) => Some(value),
        _ => None,
    }
}

#[derive(Debug)]
struct StoredPrime {
    request: PrimingRequest,
    pattern: Option<Regex>,
    result_set: ResultSet,
}

impl StoredPrime {
    fn matches(&self, kind: PrimeKind, text: &str) -> bool {
        if self.request.kind != kind {
            return false;
        }
        match (&self.request.matcher, &self.pattern) {
            (_, Some(regex)) => regex.is_match(text),
            (QueryMatcher::Exact(expected), None) => expected.trim() == text.trim(),
            (QueryMatcher::Pattern(_), None) => false,
        }
    }
}

/// An unbound query received by the stub.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub query: String,
    pub consistency: ConsistencyLevel,
}

/// A prepared statement execution received by the stub.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPreparedExecution {
    pub prepared_statement_text: String,
    pub consistency: ConsistencyLevel,
    pub variables: Vec<Value>,
}

#[derive(Debug, Default)]
struct Activity {
    connections: usize,
    disconnections: usize,
    queries: Vec<RecordedQuery>,
    prepared_executions: Vec<RecordedPreparedExecution>,
}

/// An in-memory implementation of `ClusterTransport` for testing.
///
/// Cloning shares primes and recorded activity, so a test can keep one handle
/// while the session owns another.
#[derive(Clone)]
pub struct StubCluster {
    primes: Arc<Mutex<Vec<StoredPrime>>>,
    activity: Arc<Mutex<Activity>>,
    available: Arc<AtomicBool>,
    replication_factor: u32,
}

impl Default for StubCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl StubCluster {
    pub fn new() -> Self {
        Self::with_replication_factor(DEFAULT_REPLICATION_FACTOR)
    }

    /// Replication factor used to report required responses in timeouts.
    pub fn with_replication_factor(replication_factor: u32) -> Self {
        Self {
            primes: Arc::new(Mutex::new(Vec::new())),
            activity: Arc::new(Mutex::new(Activity::default())),
            available: Arc::new(AtomicBool::new(true)),
            replication_factor: replication_factor.max(1),
        }
    }

    /// Registers a prime; later primes take precedence over earlier ones.
    pub async fn prime(&self, request: PrimingRequest) -> Result<()> {
        let pattern = match &request.matcher {
            QueryMatcher::Pattern(pattern) => {
                let anchored = format!("^(?:{})$", pattern);
                Some(Regex::new(&anchored).map_err(|e| {
                    ClusterError::InvalidQuery(format!(
                        "Invalid prime pattern '{}': {}",
                        pattern, e
                    ))
                })?)
            }
            QueryMatcher::Exact(_) => None,
        };
        let result_set = request.result_set()?;

        let mut primes = self.primes.lock().await;
        primes.push(StoredPrime {
            request,
            pattern,
            result_set,
        });
        Ok(())
    }

    pub async fn clear_primes(&self) {
        self.primes.lock().await.clear();
    }

    /// Makes every node unreachable, or reachable again.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn clear_recorded_activity(&self) {
        let mut activity = self.activity.lock().await;
        *activity = Activity::default();
    }

    pub async fn recorded_connections(&self) -> usize {
        self.activity.lock().await.connections
    }

    pub async fn recorded_disconnections(&self) -> usize {
        self.activity.lock().await.disconnections
    }

    pub async fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.activity.lock().await.queries.clone()
    }

    pub async fn recorded_prepared_executions(&self) -> Vec<RecordedPreparedExecution> {
        self.activity.lock().await.prepared_executions.clone()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClusterError::NoHostAvailable(
                "All host(s) tried for query failed".to_string(),
            ))
        }
    }

    async fn record(&self, statement: &Statement, consistency: ConsistencyLevel) {
        let mut activity = self.activity.lock().await;
        match statement.kind() {
            StatementKind::Simple { cql } => activity.queries.push(RecordedQuery {
                query: cql.clone(),
                consistency,
            }),
            StatementKind::Bound { prepared, values } => {
                activity
                    .prepared_executions
                    .push(RecordedPreparedExecution {
                        prepared_statement_text: prepared.cql().to_string(),
                        consistency,
                        variables: values.clone(),
                    })
            }
        }
    }

    /// Returns the newest matching prime's response parts.
    async fn lookup(
        &self,
        kind: PrimeKind,
        text: &str,
    ) -> Option<(PrimeResult, Option<Duration>, Option<Vec<DataType>>, ResultSet)> {
        let primes = self.primes.lock().await;
        primes
            .iter()
            .rev()
            .find(|prime| prime.matches(kind, text))
            .map(|prime| {
                (
                    prime.request.result.clone(),
                    prime.request.fixed_delay,
                    prime.request.variable_types.clone(),
                    prime.result_set.clone(),
                )
            })
    }

    fn failure(&self, result: &PrimeResult, consistency: ConsistencyLevel) -> Option<ClusterError> {
        let required = consistency.required_responses(self.replication_factor);
        match result {
            PrimeResult::Success => None,
            PrimeResult::ReadTimeout => Some(ClusterError::ReadTimeout {
                consistency,
                required_responses: required,
                received_responses: 0,
                data_retrieved: false,
            }),
            PrimeResult::WriteTimeout(write_type) => Some(ClusterError::WriteTimeout {
                consistency,
                write_type: *write_type,
                required_acks: required,
                received_acks: 0,
            }),
            PrimeResult::Unavailable => Some(ClusterError::Unavailable {
                consistency,
                required_replicas: required,
                alive_replicas: required.saturating_sub(1),
            }),
        }
    }
}

fn check_variables(statement: &Statement, expected: &[DataType]) -> Result<()> {
    let values = statement.values();
    if values.len() != expected.len() {
        return Err(ClusterError::InvalidQuery(format!(
            "Expected {} bind variables for '{}', got {}",
            expected.len(),
            statement.cql(),
            values.len()
        )));
    }
    for (idx, (value, data_type)) in values.iter().zip(expected).enumerate() {
        if !data_type.is_compatible(value) {
            return Err(ClusterError::InvalidQuery(format!(
                "Bind variable {} of '{}' expects {}, got {}",
                idx,
                statement.cql(),
                data_type,
                value.type_name()
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ClusterTransport for StubCluster {
    async fn connect(&self, keyspace: &str) -> Result<()> {
        self.ensure_available()?;
        let mut activity = self.activity.lock().await;
        activity.connections += 1;
        activity.queries.push(RecordedQuery {
            query: format!("USE {}", keyspace),
            consistency: ConsistencyLevel::One,
        });
        Ok(())
    }

    async fn prepare(&self, cql: &str) -> Result<PreparedStatement> {
        self.ensure_available()?;
        Ok(PreparedStatement::new(cql))
    }

    async fn execute(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
    ) -> Result<ResultSet> {
        self.ensure_available()?;
        self.record(statement, consistency).await;

        let kind = if statement.is_prepared() {
            PrimeKind::PreparedStatement
        } else {
            PrimeKind::Query
        };
        let Some((result, delay, variable_types, result_set)) =
            self.lookup(kind, statement.cql()).await
        else {
            return Ok(ResultSet::empty());
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(types) = variable_types.as_deref() {
            check_variables(statement, types)?;
        }
        if let Some(err) = self.failure(&result, consistency) {
            return Err(err);
        }
        Ok(result_set)
    }

    async fn close(&self) -> Result<()> {
        self.activity.lock().await.disconnections += 1;
        Ok(())
    }
}
