use crate::core::{ClusterError, ConsistencyLevel, Result};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_PORT: u16 = 9042;
const DEFAULT_KEYSPACE: &str = "people";
const DEFAULT_READ_TIMEOUT_MS: u64 = 500;
const DEFAULT_MAX_READ_RETRIES: u32 = 1;

/// Cluster session configuration
///
/// Holds everything needed to open a session: where the cluster lives,
/// which keyspace to use, the per-attempt client deadline and the read
/// retry budget.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    /// Contact points used to reach the cluster
    pub contact_points: Vec<String>,

    /// Native protocol port
    pub port: u16,

    /// Keyspace selected on connect
    pub keyspace: String,

    /// Client-side deadline for a single attempt
    pub read_timeout: Duration,

    /// Retries permitted after a read times out
    pub max_read_retries: u32,

    /// Consistency used when a statement does not set its own
    pub default_consistency: ConsistencyLevel,
}

impl ClusterConfig {
    pub fn new(contact_point: &str) -> Self {
        Self {
            contact_points: vec![contact_point.to_string()],
            port: DEFAULT_PORT,
            keyspace: DEFAULT_KEYSPACE.to_string(),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            max_read_retries: DEFAULT_MAX_READ_RETRIES,
            default_consistency: ConsistencyLevel::One,
        }
    }

    pub fn contact_point(mut self, host: &str) -> Self {
        self.contact_points.push(host.to_string());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn keyspace(mut self, keyspace: &str) -> Self {
        self.keyspace = keyspace.to_string();
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn max_read_retries(mut self, retries: u32) -> Self {
        self.max_read_retries = retries;
        self
    }

    pub fn default_consistency(mut self, consistency: ConsistencyLevel) -> Self {
        self.default_consistency = consistency;
        self
    }

    /// Parse from connection string
    ///
    /// Format: "cql://host1,host2:port/keyspace"
    ///
    /// # Examples
    ///
    /// ```
    /// # use peoplestore::ClusterConfig;
    /// let config = ClusterConfig::from_url("cql://localhost:8042/people").unwrap();
    /// assert_eq!(config.port, 8042);
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("cql://")
            .ok_or_else(|| invalid("URL must start with 'cql://'"))?;

        let (hosts, keyspace) = rest
            .split_once('/')
            .ok_or_else(|| invalid("Invalid host/keyspace format"))?;
        if keyspace.is_empty() {
            return Err(invalid("Keyspace must not be empty"));
        }

        let (hosts, port) = match hosts.rsplit_once(':') {
            Some((hosts, port)) => {
                let port = port.parse().map_err(|_| invalid("Invalid port"))?;
                (hosts, port)
            }
            None => (hosts, DEFAULT_PORT),
        };

        let contact_points: Vec<String> = hosts
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect();
        if contact_points.is_empty() {
            return Err(invalid("At least one contact point is required"));
        }

        let mut config = Self::new(&contact_points[0]).port(port).keyspace(keyspace);
        config.contact_points = contact_points;
        Ok(config)
    }

    /// Convert to connection string
    pub fn to_url(&self) -> String {
        format!(
            "cql://{}:{}/{}",
            self.contact_points.join(","),
            self.port,
            self.keyspace
        )
    }

    /// Load from a JSON document; omitted fields take their defaults.
    ///
    /// ```
    /// # use peoplestore::ClusterConfig;
    /// let config = ClusterConfig::from_json(
    ///     r#"{"contact_points": ["10.0.0.1"], "max_read_retries": 3}"#,
    /// ).unwrap();
    /// assert_eq!(config.max_read_retries, 3);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawClusterConfig = serde_json::from_str(json)
            .map_err(|e| ClusterError::Configuration(e.to_string()))?;
        let config = raw.into_config();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.contact_points.iter().all(|h| h.trim().is_empty()) {
            return Err(invalid("At least one contact point is required"));
        }

        if self.keyspace.trim().is_empty() {
            return Err(invalid("Keyspace cannot be empty"));
        }

        if self.port == 0 {
            return Err(invalid("port must be > 0"));
        }

        if self.read_timeout.is_zero() {
            return Err(invalid("read_timeout must be > 0"));
        }

        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}

fn invalid(message: &str) -> ClusterError {
    ClusterError::Configuration(message.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClusterConfig {
    #[serde(default)]
    contact_points: Option<Vec<String>>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    keyspace: Option<String>,
    #[serde(default)]
    read_timeout_ms: Option<u64>,
    #[serde(default)]
    max_read_retries: Option<u32>,
    #[serde(default)]
    default_consistency: Option<ConsistencyLevel>,
}

impl RawClusterConfig {
    fn into_config(self) -> ClusterConfig {
        let mut config = ClusterConfig::default();
        if let Some(contact_points) = self.contact_points {
            config.contact_points = contact_points;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(keyspace) = self.keyspace {
            config.keyspace = keyspace;
        }
        if let Some(ms) = self.read_timeout_ms {
            config.read_timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = self.max_read_retries {
            config.max_read_retries = retries;
        }
        if let Some(consistency) = self.default_consistency {
            config.default_consistency = consistency;
        }
        config
    }
}
