use crate::core::{ClusterError, ConsistencyLevel, Result, Value};
use crate::retry::RetryPolicy;
use std::sync::Arc;
use uuid::Uuid;

/// A query prepared once on the cluster and executed with bound variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    id: Uuid,
    cql: String,
    marker_count: usize,
}

impl PreparedStatement {
    pub fn new(cql: impl Into<String>) -> Self {
        let cql = cql.into();
        let marker_count = count_bind_markers(&cql);
        Self {
            id: Uuid::new_v4(),
            cql,
            marker_count,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cql(&self) -> &str {
        &self.cql
    }

    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    /// Binds positional values to the `?` markers.
    ///
    /// The number of values must match the number of markers exactly.
    pub fn bind(&self, values: Vec<Value>) -> Result<Statement> {
        if values.len() != self.marker_count {
            return Err(ClusterError::BindError(format!(
                "Statement '{}' expects {} bound values, got {}",
                self.cql,
                self.marker_count,
                values.len()
            )));
        }

        Ok(Statement::new(StatementKind::Bound {
            prepared: Arc::new(self.clone()),
            values,
        }))
    }
}

/// Counts `?` markers outside of quoted literals.
fn count_bind_markers(cql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for ch in cql.chars() {
        match ch {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Simple {
        cql: String,
    },
    Bound {
        prepared: Arc<PreparedStatement>,
        values: Vec<Value>,
    },
}

/// A statement ready for execution, with optional per-statement settings
/// that override the session defaults.
#[derive(Debug, Clone)]
pub struct Statement {
    kind: StatementKind,
    consistency: Option<ConsistencyLevel>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
}

impl Statement {
    fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            consistency: None,
            retry_policy: None,
        }
    }

    /// Creates an unbound statement from raw CQL text.
    pub fn simple(cql: impl Into<String>) -> Self {
        Self::new(StatementKind::Simple { cql: cql.into() })
    }

    pub fn with_consistency(mut self, consistency: ConsistencyLevel) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Uses `policy` for this statement instead of the session policy.
    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    pub fn cql(&self) -> &str {
        match &self.kind {
            StatementKind::Simple { cql } => cql,
            StatementKind::Bound { prepared, .. } => prepared.cql(),
        }
    }

    pub fn values(&self) -> &[Value] {
        match &self.kind {
            StatementKind::Simple { .. } => &[],
            StatementKind::Bound { values, .. } => values,
        }
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.kind, StatementKind::Bound { .. })
    }

    pub fn prepared_id(&self) -> Option<Uuid> {
        match &self.kind {
            StatementKind::Simple { .. } => None,
            StatementKind::Bound { prepared, .. } => Some(prepared.id()),
        }
    }

    pub fn consistency(&self) -> Option<ConsistencyLevel> {
        self.consistency
    }

    pub fn retry_policy(&self) -> Option<&Arc<dyn RetryPolicy>> {
        self.retry_policy.as_ref()
    }
}
