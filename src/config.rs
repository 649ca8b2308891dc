//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::publish::{TopicAddress, DEFAULT_BATCH_SIZE, DEFAULT_QUEUE_CAPACITY, MAX_BATCH_ENTRIES};

/// Where account balances live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

/// How withdrawal batches leave the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// POST batches to `TOPIC_ENDPOINT`
    Http,
    /// Keep batches in memory
    Fake,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    pub store_backend: StoreBackend,

    /// Database connection URL (postgres backend only)
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    pub transport: TransportKind,

    /// Publish endpoint (http transport only)
    pub topic_endpoint: Option<String>,

    /// Destination topic for withdrawal events
    pub topic: TopicAddress,

    /// Entries per publish call
    pub batch_size: usize,

    /// Maximum queued events before new ones are dropped
    pub queue_capacity: usize,

    /// Timeout of one publish call
    pub publish_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var_or("HOST", "127.0.0.1");

        let port = var_or("PORT", "3000")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = var_or("ENVIRONMENT", "development");

        let store_backend = match var_or("STORE_BACKEND", "memory").to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "postgres" => StoreBackend::Postgres,
            _ => return Err(ConfigError::InvalidValue("STORE_BACKEND")),
        };

        let database_url = lookup("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        let database_max_connections = var_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let transport = match var_or("TOPIC_TRANSPORT", "fake").to_lowercase().as_str() {
            "http" => TransportKind::Http,
            "fake" => TransportKind::Fake,
            _ => return Err(ConfigError::InvalidValue("TOPIC_TRANSPORT")),
        };

        let topic_endpoint = lookup("TOPIC_ENDPOINT");
        if transport == TransportKind::Http && topic_endpoint.is_none() {
            return Err(ConfigError::MissingEnv("TOPIC_ENDPOINT"));
        }

        let topic = match lookup("TOPIC_ARN") {
            Some(arn) => TopicAddress::from_arn(arn),
            None => TopicAddress::new(
                &var_or("AWS_REGION", "af-south-1"),
                &var_or("AWS_ACCOUNT_ID", "000000000000"),
                &var_or("WITHDRAWAL_TOPIC", "withdrawals"),
            ),
        };

        let batch_size: usize = var_or("PUBLISH_BATCH_SIZE", &DEFAULT_BATCH_SIZE.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PUBLISH_BATCH_SIZE"))?;
        if batch_size == 0 || batch_size > MAX_BATCH_ENTRIES {
            return Err(ConfigError::InvalidValue("PUBLISH_BATCH_SIZE"));
        }

        let queue_capacity: usize = var_or("QUEUE_CAPACITY", &DEFAULT_QUEUE_CAPACITY.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("QUEUE_CAPACITY"))?;
        if queue_capacity < batch_size {
            return Err(ConfigError::InvalidValue("QUEUE_CAPACITY"));
        }

        let publish_timeout = var_or("PUBLISH_TIMEOUT_MS", "5000")
            .parse()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidValue("PUBLISH_TIMEOUT_MS"))?;

        Ok(Self {
            host,
            port,
            environment,
            store_backend,
            database_url,
            database_max_connections,
            transport,
            topic_endpoint,
            topic,
            batch_size,
            queue_capacity,
            publish_timeout,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.transport, TransportKind::Fake);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.publish_timeout, Duration::from_secs(5));
        assert_eq!(
            config.topic.as_str(),
            "arn:aws:sns:af-south-1:000000000000:withdrawals"
        );
    }

    #[test]
    fn test_topic_arn_override() {
        let config = load(&[("TOPIC_ARN", "arn:aws:sns:eu-west-1:1:custom")]).unwrap();
        assert_eq!(config.topic.as_str(), "arn:aws:sns:eu-west-1:1:custom");
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let result = load(&[("STORE_BACKEND", "postgres")]);
        assert!(matches!(result, Err(ConfigError::MissingEnv("DATABASE_URL"))));

        let config = load(&[
            ("STORE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/ledger"),
        ])
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Postgres);
    }

    #[test]
    fn test_http_requires_endpoint() {
        let result = load(&[("TOPIC_TRANSPORT", "http")]);
        assert!(matches!(result, Err(ConfigError::MissingEnv("TOPIC_ENDPOINT"))));
    }

    #[test]
    fn test_batch_size_bounds() {
        for bad in ["0", "11", "ten"] {
            let result = load(&[("PUBLISH_BATCH_SIZE", bad)]);
            assert!(matches!(result, Err(ConfigError::InvalidValue("PUBLISH_BATCH_SIZE"))));
        }
    }

    #[test]
    fn test_queue_smaller_than_batch_rejected() {
        let result = load(&[("PUBLISH_BATCH_SIZE", "10"), ("QUEUE_CAPACITY", "5")]);
        assert!(matches!(result, Err(ConfigError::InvalidValue("QUEUE_CAPACITY"))));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = load(&[("STORE_BACKEND", "redis")]);
        assert!(matches!(result, Err(ConfigError::InvalidValue("STORE_BACKEND"))));
    }
}
