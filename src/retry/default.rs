use super::{
    ReadTimeoutContext, RetryDecision, RetryPolicy, UnavailableContext, WriteTimeoutContext,
};
use crate::core::WriteType;

/// The cluster's built-in escalation behaviour.
///
/// Retries at most once, at the same consistency, and only when the retry
/// is likely to succeed without changing the outcome:
/// - a read that heard from enough replicas but none returned data
/// - a write that timed out while writing the batch log
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryPolicy;

impl RetryPolicy for DefaultRetryPolicy {
    fn on_read_timeout(&self, ctx: &ReadTimeoutContext<'_>) -> RetryDecision {
        if ctx.attempt != 0 {
            return RetryDecision::Rethrow;
        }

        if ctx.received_responses >= ctx.required_responses && !ctx.data_retrieved {
            RetryDecision::Retry(ctx.consistency)
        } else {
            RetryDecision::Rethrow
        }
    }

    fn on_write_timeout(&self, ctx: &WriteTimeoutContext<'_>) -> RetryDecision {
        if ctx.attempt != 0 {
            return RetryDecision::Rethrow;
        }

        if ctx.write_type == WriteType::BatchLog {
            RetryDecision::Retry(ctx.consistency)
        } else {
            RetryDecision::Rethrow
        }
    }

    fn on_unavailable(&self, _ctx: &UnavailableContext<'_>) -> RetryDecision {
        RetryDecision::Rethrow
    }
}

/// Never retries; every failure surfaces to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallthroughRetryPolicy;

impl RetryPolicy for FallthroughRetryPolicy {
    fn on_read_timeout(&self, _ctx: &ReadTimeoutContext<'_>) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_write_timeout(&self, _ctx: &WriteTimeoutContext<'_>) -> RetryDecision {
        RetryDecision::Rethrow
    }

    fn on_unavailable(&self, _ctx: &UnavailableContext<'_>) -> RetryDecision {
        RetryDecision::Rethrow
    }
}
