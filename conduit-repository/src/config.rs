//! Repository configuration
//!
//! Connection settings for the repository store and the bootstrap behaviour.

use std::time::Duration;

/// Repository configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Store location (e.g., "sqlite://conduit.db")
    pub repository_url: String,

    /// Maximum pooled connections
    pub max_connections: u32,

    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,

    /// Whether bootstrap may create the schema of an empty repository
    pub create_schema: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(repository_url: String) -> Self {
        Self {
            repository_url,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            create_schema: true,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - CONDUIT_REPOSITORY_URL (required)
    /// - CONDUIT_MAX_CONNECTIONS (optional, default: 5)
    /// - CONDUIT_ACQUIRE_TIMEOUT (optional, seconds, default: 5)
    /// - CONDUIT_CREATE_SCHEMA (optional, default: true)
    pub fn from_env() -> anyhow::Result<Self> {
        let repository_url = std::env::var("CONDUIT_REPOSITORY_URL")
            .map_err(|_| anyhow::anyhow!("CONDUIT_REPOSITORY_URL environment variable not set"))?;

        let max_connections = std::env::var("CONDUIT_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(5);

        let acquire_timeout = std::env::var("CONDUIT_ACQUIRE_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));

        let create_schema = std::env::var("CONDUIT_CREATE_SCHEMA")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(true);

        Ok(Self {
            repository_url,
            max_connections,
            acquire_timeout,
            create_schema,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.repository_url.is_empty() {
            anyhow::bail!("repository_url cannot be empty");
        }

        if !self.repository_url.starts_with("sqlite:") {
            anyhow::bail!("repository_url must start with sqlite:");
        }

        if self.max_connections == 0 {
            anyhow::bail!("max_connections must be greater than 0");
        }

        if self.acquire_timeout.is_zero() {
            anyhow::bail!("acquire_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("sqlite://conduit.db".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert!(config.create_schema);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.repository_url = String::new();
        assert!(config.validate().is_err());

        config.repository_url = "postgres://localhost/conduit".to_string();
        assert!(config.validate().is_err());

        config.repository_url = "sqlite::memory:".to_string();
        assert!(config.validate().is_ok());

        config.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
