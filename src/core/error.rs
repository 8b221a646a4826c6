use super::{ConsistencyLevel, WriteType};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error(
        "Read timeout at consistency {consistency} ({received_responses} of {required_responses} responses received, data retrieved: {data_retrieved})"
    )]
    ReadTimeout {
        consistency: ConsistencyLevel,
        required_responses: u32,
        received_responses: u32,
        data_retrieved: bool,
    },

    #[error(
        "Write timeout at consistency {consistency} for {write_type} write ({received_acks} of {required_acks} acknowledgements)"
    )]
    WriteTimeout {
        consistency: ConsistencyLevel,
        write_type: WriteType,
        required_acks: u32,
        received_acks: u32,
    },

    #[error(
        "Not enough replicas available for consistency {consistency} ({alive_replicas} alive, {required_replicas} required)"
    )]
    Unavailable {
        consistency: ConsistencyLevel,
        required_replicas: u32,
        alive_replicas: u32,
    },

    #[error("No host available: {0}")]
    NoHostAvailable(String),

    #[error("Operation timed out after {0:?}")]
    OperationTimedOut(Duration),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Column '{0}' not found in result row")]
    ColumnNotFound(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Bind error: {0}")]
    BindError(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClusterError {
    /// Returns true for failures where no coordinator could serve the request
    /// before the client gave up on it.
    pub fn is_connectivity_failure(&self) -> bool {
        matches!(self, Self::NoHostAvailable(_) | Self::OperationTimedOut(_))
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
