//! Application configuration

use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::infrastructure::ports::TopicSpec;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address
    pub server_host: String,
    pub server_port: u16,

    /// CORS allowed origins (comma-separated, or "*" for any). Unset disables CORS.
    pub cors_allowed_origins: Option<String>,

    pub presence: PresenceConfig,
}

/// Which broker backs the presence topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerBackend {
    Kafka,
    /// Process-local; for development and tests only.
    Memory,
}

impl FromStr for BrokerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kafka" => Ok(Self::Kafka),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown presence broker backend: {other} (expected kafka or memory)"),
        }
    }
}

/// Presence pipeline configuration
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    pub backend: BrokerBackend,
    /// Bootstrap brokers
    pub brokers: Vec<String>,
    pub client_id: String,
    pub topic: String,
    pub partitions: u32,
    pub replication: u32,
    /// Consumer group shared by every bridge instance
    pub group_id: String,
}

impl PresenceConfig {
    pub fn topic_spec(&self) -> TopicSpec {
        TopicSpec {
            name: self.topic.clone(),
            partitions: self.partitions,
            replication: self.replication,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let server_port = lookup("SERVER_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "3000".to_string());

        let presence = PresenceConfig {
            backend: var("PRESENCE_BROKER", "kafka").parse()?,
            brokers: var("KAFKA_BROKERS", "localhost:29092")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            client_id: var("KAFKA_CLIENT_ID", "adventure-terminal"),
            topic: var("PRESENCE_TOPIC", "presence.events"),
            partitions: var("PRESENCE_TOPIC_PARTITIONS", "6")
                .parse()
                .context("PRESENCE_TOPIC_PARTITIONS must be a positive integer")?,
            replication: var("PRESENCE_TOPIC_REPLICATION", "1")
                .parse()
                .context("PRESENCE_TOPIC_REPLICATION must be a positive integer")?,
            group_id: var("PRESENCE_GROUP_ID", "presence-broadcaster"),
        };

        if presence.partitions == 0 {
            bail!("PRESENCE_TOPIC_PARTITIONS must be at least 1");
        }
        if presence.replication == 0 {
            bail!("PRESENCE_TOPIC_REPLICATION must be at least 1");
        }

        Ok(Self {
            server_host: var("SERVER_HOST", "0.0.0.0"),
            server_port: server_port
                .trim()
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            presence,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_local_compose_stack() {
        let config = load(&[]).unwrap();

        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.server_port, 3000);
        assert!(config.cors_allowed_origins.is_none());
        assert_eq!(config.presence.backend, BrokerBackend::Kafka);
        assert_eq!(config.presence.brokers, vec!["localhost:29092"]);
        assert_eq!(config.presence.client_id, "adventure-terminal");
        assert_eq!(
            config.presence.topic_spec(),
            TopicSpec {
                name: "presence.events".to_string(),
                partitions: 6,
                replication: 1,
            }
        );
        assert_eq!(config.presence.group_id, "presence-broadcaster");
    }

    #[test]
    fn port_falls_back_to_port_variable() {
        let config = load(&[("PORT", "8080")]).unwrap();
        assert_eq!(config.server_port, 8080);

        let config = load(&[("SERVER_PORT", "9000"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.server_port, 9000);
    }

    #[test]
    fn broker_list_is_split_and_trimmed() {
        let config = load(&[("KAFKA_BROKERS", "a:9092, b:9092 ,,")]).unwrap();
        assert_eq!(config.presence.brokers, vec!["a:9092", "b:9092"]);
    }

    #[test]
    fn memory_backend_is_opt_in() {
        let config = load(&[("PRESENCE_BROKER", "Memory")]).unwrap();
        assert_eq!(config.presence.backend, BrokerBackend::Memory);

        assert!(config_err(&[("PRESENCE_BROKER", "redis")]));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(config_err(&[("SERVER_PORT", "http")]));
        assert!(config_err(&[("PRESENCE_TOPIC_PARTITIONS", "0")]));
        assert!(config_err(&[("PRESENCE_TOPIC_REPLICATION", "-1")]));
    }

    fn config_err(vars: &[(&str, &str)]) -> bool {
        load(vars).is_err()
    }
}
