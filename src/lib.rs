// ============================================================================
// peoplestore Library
// ============================================================================

//! Person store with a consistency-downgrading read retry policy
//!
//! # Examples
//!
//! ```
//! use peoplestore::{
//!     ClusterConfig, Person, PersonDao, PersonStore, PrimingRequest, StubCluster, Value,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cluster = StubCluster::new();
//! cluster
//!     .prime(PrimingRequest::query("select * from person")
//!         .with_row([("first_name", Value::from("Chris")), ("age", Value::from(29))]))
//!     .await?;
//!
//! let store = PersonStore::connect(ClusterConfig::default(), Arc::new(cluster)).await?;
//! let people = store.retrieve_people().await?;
//! assert_eq!(people, vec![Person::new("Chris", 29, None)]);
//! store.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod core;
pub mod dao;
pub mod interface;
pub mod result;
pub mod retry;

// Re-export main types for convenience
pub use crate::core::{ClusterError, ConsistencyLevel, DataType, Result, Row, Value, WriteType};
pub use crate::interface::ClusterTransport;
pub use result::ResultSet;

// Re-export connection API
pub use connection::{
    PreparedStatement, Session, Statement, StatementKind,
    config::ClusterConfig,
    stub::{PrimeResult, PrimingRequest, RecordedPreparedExecution, RecordedQuery, StubCluster},
};

pub use retry::{
    ConsistencyAwareRetryPolicy, DefaultRetryPolicy, FallthroughRetryPolicy, LoggingRetryPolicy,
    ReadTimeoutContext, RetryDecision, RetryPolicy, UnavailableContext, WriteTimeoutContext,
};

// ============================================================================
// Person data access
// ============================================================================

pub use dao::{DaoError, DaoResult, Person, PersonDao, PersonStore};
