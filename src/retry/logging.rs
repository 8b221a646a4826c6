use super::{
    ReadTimeoutContext, RetryDecision, RetryPolicy, UnavailableContext, WriteTimeoutContext,
};
use crate::core::ConsistencyLevel;
use log::info;

/// Logs every decision of the wrapped policy that does not rethrow.
///
/// Decisions are returned unchanged.
#[derive(Debug, Clone)]
pub struct LoggingRetryPolicy<P> {
    inner: P,
}

impl<P: RetryPolicy> LoggingRetryPolicy<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

fn describe(decision: &RetryDecision, requested: ConsistencyLevel) -> Option<String> {
    match decision {
        RetryDecision::Retry(level) if *level == requested => {
            Some("retrying on the same consistency level".to_string())
        }
        RetryDecision::Retry(level) => Some(format!("retrying on consistency level {}", level)),
        RetryDecision::Ignore => Some("ignoring".to_string()),
        RetryDecision::Rethrow => None,
    }
}

impl<P: RetryPolicy> RetryPolicy for LoggingRetryPolicy<P> {
    fn on_read_timeout(&self, ctx: &ReadTimeoutContext<'_>) -> RetryDecision {
        let decision = self.inner.on_read_timeout(ctx);
        if let Some(action) = describe(&decision, ctx.consistency) {
            info!(
                "Read timeout at consistency {} ({} of {} responses, data: {}, retries: {}); {}",
                ctx.consistency,
                ctx.received_responses,
                ctx.required_responses,
                ctx.data_retrieved,
                ctx.attempt,
                action
            );
        }
        decision
    }

    fn on_write_timeout(&self, ctx: &WriteTimeoutContext<'_>) -> RetryDecision {
        let decision = self.inner.on_write_timeout(ctx);
        if let Some(action) = describe(&decision, ctx.consistency) {
            info!(
                "Write timeout at consistency {} ({} write, {} of {} acks, retries: {}); {}",
                ctx.consistency,
                ctx.write_type,
                ctx.received_acks,
                ctx.required_acks,
                ctx.attempt,
                action
            );
        }
        decision
    }

    fn on_unavailable(&self, ctx: &UnavailableContext<'_>) -> RetryDecision {
        let decision = self.inner.on_unavailable(ctx);
        if let Some(action) = describe(&decision, ctx.consistency) {
            info!(
                "Unavailable at consistency {} ({} replicas required, {} alive, retries: {}); {}",
                ctx.consistency,
                ctx.required_replicas,
                ctx.alive_replicas,
                ctx.attempt,
                action
            );
        }
        decision
    }
}
