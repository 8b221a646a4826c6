use crate::core::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of replica acknowledgements a request waits for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    Any,
    #[default]
    One,
    Two,
    Three,
    LocalOne,
    Quorum,
    LocalQuorum,
    EachQuorum,
    All,
}

impl ConsistencyLevel {
    /// Relative strictness of the level.
    ///
    /// Levels that wait for the same class of acknowledgement share a rank,
    /// so `LOCAL_ONE` is as strict as `ONE` and the quorum family ranks together.
    pub fn strictness(&self) -> u8 {
        match self {
            Self::Any => 0,
            Self::One | Self::LocalOne => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Quorum | Self::LocalQuorum | Self::EachQuorum => 4,
            Self::All => 5,
        }
    }

    pub fn is_weaker_than(&self, other: &ConsistencyLevel) -> bool {
        self.strictness() < other.strictness()
    }

    /// Returns true if a read at this level touches no more replicas than `ONE`.
    pub fn is_at_most_one(&self) -> bool {
        self.strictness() <= Self::One.strictness()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::LocalOne => "LOCAL_ONE",
            Self::Quorum => "QUORUM",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::All => "ALL",
        }
    }

    /// Replica responses required for a read at this level,
    /// given the replication factor of the keyspace.
    pub fn required_responses(&self, replication_factor: u32) -> u32 {
        let rf = replication_factor.max(1);
        match self {
            Self::Any | Self::One | Self::LocalOne => 1,
            Self::Two => 2.min(rf),
            Self::Three => 3.min(rf),
            Self::Quorum | Self::LocalQuorum | Self::EachQuorum => rf / 2 + 1,
            Self::All => rf,
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsistencyLevel {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        let level = match s.trim().to_ascii_uppercase().as_str() {
            "ANY" => Self::Any,
            "ONE" => Self::One,
            "TWO" => Self::Two,
            "THREE" => Self::Three,
            "LOCAL_ONE" => Self::LocalOne,
            "QUORUM" => Self::Quorum,
            "LOCAL_QUORUM" => Self::LocalQuorum,
            "EACH_QUORUM" => Self::EachQuorum,
            "ALL" => Self::All,
            other => {
                return Err(ClusterError::Configuration(format!(
                    "Unknown consistency level '{}'",
                    other
                )));
            }
        };
        Ok(level)
    }
}
