//! Retry policies consulted by the session when a request fails on the cluster.
//!
//! A policy only returns decisions. The session owns the attempt counter and
//! reissues the statement at whatever consistency the decision names.

mod consistency_aware;
mod default;
mod logging;
mod policy;

pub use consistency_aware::ConsistencyAwareRetryPolicy;
pub use default::{DefaultRetryPolicy, FallthroughRetryPolicy};
pub use logging::LoggingRetryPolicy;
pub use policy::{
    ReadTimeoutContext, RetryDecision, RetryPolicy, UnavailableContext, WriteTimeoutContext,
};
