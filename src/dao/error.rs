use crate::core::ClusterError;
use thiserror::Error;

/// Errors surfaced to callers of the person store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DaoError {
    /// A read still timed out after the retry budget was spent.
    #[error("Unable to retrieve people: {0}")]
    UnableToRetrievePeople(#[source] ClusterError),

    /// No node could take the write before the client deadline.
    #[error("Unable to save person: {0}")]
    UnableToSavePerson(#[source] ClusterError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

pub type DaoResult<T> = std::result::Result<T, DaoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::time::Duration;

    #[test]
    fn test_domain_errors_keep_cause() {
        let cause = ClusterError::OperationTimedOut(Duration::from_millis(500));
        let err = DaoError::UnableToSavePerson(cause.clone());
        assert!(err.to_string().starts_with("Unable to save person"));
        assert_eq!(err.source().map(|s| s.to_string()), Some(cause.to_string()));
    }

    #[test]
    fn test_cluster_errors_convert_unchanged() {
        let err: DaoError = ClusterError::SessionClosed.into();
        assert_eq!(err, DaoError::Cluster(ClusterError::SessionClosed));
        assert_eq!(err.to_string(), "Session is closed");
    }
}
