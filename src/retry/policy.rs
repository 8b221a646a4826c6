use super::DefaultRetryPolicy;
use crate::connection::Statement;
use crate::core::{ConsistencyLevel, WriteType};
use std::fmt;

/// Outcome of consulting a retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Reissue the statement at the given consistency level.
    Retry(ConsistencyLevel),
    /// Give up and surface the failure to the caller.
    Rethrow,
    /// Treat the failed request as successful and return an empty result.
    Ignore,
}

/// A read did not gather enough replica responses before the coordinator's deadline.
#[derive(Debug, Clone, Copy)]
pub struct ReadTimeoutContext<'a> {
    pub statement: &'a Statement,
    pub consistency: ConsistencyLevel,
    pub required_responses: u32,
    pub received_responses: u32,
    pub data_retrieved: bool,
    /// Zero-based number of retries already performed for this operation.
    pub attempt: u32,
}

/// A write did not gather enough acknowledgements before the coordinator's deadline.
#[derive(Debug, Clone, Copy)]
pub struct WriteTimeoutContext<'a> {
    pub statement: &'a Statement,
    pub consistency: ConsistencyLevel,
    pub write_type: WriteType,
    pub required_acks: u32,
    pub received_acks: u32,
    pub attempt: u32,
}

/// The coordinator knew up front that too few replicas were alive.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableContext<'a> {
    pub statement: &'a Statement,
    pub consistency: ConsistencyLevel,
    pub required_replicas: u32,
    pub alive_replicas: u32,
    pub attempt: u32,
}

/// Decides the fate of a failed request.
///
/// Implementations must be pure and return immediately. They are invoked
/// exactly once per failure event, and attempts are never issued in parallel.
/// Only read timeouts require an implementation; write timeouts and
/// unavailability fall through to [`DefaultRetryPolicy`].
pub trait RetryPolicy: fmt::Debug + Send + Sync {
    fn on_read_timeout(&self, ctx: &ReadTimeoutContext<'_>) -> RetryDecision;

    fn on_write_timeout(&self, ctx: &WriteTimeoutContext<'_>) -> RetryDecision {
        DefaultRetryPolicy.on_write_timeout(ctx)
    }

    fn on_unavailable(&self, ctx: &UnavailableContext<'_>) -> RetryDecision {
        DefaultRetryPolicy.on_unavailable(ctx)
    }
}
