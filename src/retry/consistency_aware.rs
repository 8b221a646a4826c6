use super::{ReadTimeoutContext, RetryDecision, RetryPolicy};
use crate::core::ConsistencyLevel;

/// Trades consistency for availability once a read has timed out.
///
/// Every retry is issued at `ONE`, whatever level the caller originally asked
/// for, until `max_retries` retries have been spent. Write timeouts and
/// unavailability use the default escalation unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyAwareRetryPolicy {
    max_retries: u32,
}

impl ConsistencyAwareRetryPolicy {
    /// The consistency every retried read is downgraded to.
    pub const DOWNGRADED_CONSISTENCY: ConsistencyLevel = ConsistencyLevel::One;

    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl RetryPolicy for ConsistencyAwareRetryPolicy {
    fn on_read_timeout(&self, ctx: &ReadTimeoutContext<'_>) -> RetryDecision {
        if ctx.attempt < self.max_retries {
            RetryDecision::Retry(Self::DOWNGRADED_CONSISTENCY)
        } else {
            RetryDecision::Rethrow
        }
    }
}
