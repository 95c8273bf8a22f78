use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DATABASE_URL_ENV: &str = "DATABASE_CONNECTION_STRING";
pub const MONGODB_URL_ENV: &str = "MONGODB_CONNECTION_STRING";

const DEFAULT_ROUTE_DATABASE: &str = "evr";
const DEFAULT_POSTGRES_CONNECTIONS: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub samples: SampleStoreConfig,
    #[serde(default)]
    pub routes: RouteStoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address for the HTTP server to listen on
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SampleStoreConfig {
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
    },
    Postgres {
        url: String,
        #[serde(default = "default_postgres_connections")]
        max_connections: u32,
    },
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RouteStoreConfig {
    #[default]
    Memory,
    Mongodb {
        url: String,
        #[serde(default = "default_route_database")]
        database: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory holding uploaded bodies until they are ingested
    pub scratch_dir: PathBuf,
    /// Upper bound on ingestions running at once
    pub workers: usize,
    /// Uploads that may wait for a free worker
    pub queue_capacity: usize,
    /// Largest accepted upload body; unlimited when unset
    pub max_upload_bytes: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("evr-sensor-collector-server"),
            workers: 4,
            queue_capacity: 64,
            max_upload_bytes: None,
        }
    }
}

fn default_postgres_connections() -> u32 {
    DEFAULT_POSTGRES_CONNECTIONS
}

fn default_route_database() -> String {
    DEFAULT_ROUTE_DATABASE.to_owned()
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Connection strings in the environment take precedence over the file.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|url| !url.is_empty()) {
            let max_connections = match self.samples {
                SampleStoreConfig::Postgres {
                    max_connections, ..
                } => max_connections,
                _ => DEFAULT_POSTGRES_CONNECTIONS,
            };
            self.samples = SampleStoreConfig::Postgres {
                url,
                max_connections,
            };
        }

        if let Some(url) = lookup(MONGODB_URL_ENV).filter(|url| !url.is_empty()) {
            let database = match std::mem::take(&mut self.routes) {
                RouteStoreConfig::Mongodb { database, .. } => database,
                RouteStoreConfig::Memory => default_route_database(),
            };
            self.routes = RouteStoreConfig::Mongodb { url, database };
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.server.http_addr.port(), 8080);
        assert_eq!(config.samples, SampleStoreConfig::Memory);
        assert_eq!(config.routes, RouteStoreConfig::Memory);
        assert_eq!(config.ingest.workers, 4);
        assert_eq!(config.ingest.queue_capacity, 64);
        assert!(config.ingest.max_upload_bytes.is_none());
        assert!(config.ingest.scratch_dir.ends_with("evr-sensor-collector-server"));
    }

    #[test]
    fn test_parse_full_file() {
        let config: Config = toml::from_str(
            r#"
            [server]
            http_addr = "127.0.0.1:9090"

            [samples]
            type = "sqlite"
            path = "/var/lib/evr/samples.db"

            [routes]
            type = "mongodb"
            url = "mongodb://localhost:27017"

            [ingest]
            scratch_dir = "/tmp/evr"
            workers = 2
            max_upload_bytes = 1048576
            "#,
        )
        .unwrap();

        assert_eq!(config.server.http_addr.port(), 9090);
        assert_eq!(
            config.samples,
            SampleStoreConfig::Sqlite {
                path: PathBuf::from("/var/lib/evr/samples.db")
            }
        );
        assert_eq!(
            config.routes,
            RouteStoreConfig::Mongodb {
                url: "mongodb://localhost:27017".into(),
                database: "evr".into(),
            }
        );
        assert_eq!(config.ingest.workers, 2);
        assert_eq!(config.ingest.queue_capacity, 64);
        assert_eq!(config.ingest.max_upload_bytes, Some(1_048_576));
    }

    #[test]
    fn test_postgres_connections_default() {
        let config: Config = toml::from_str(
            r#"
            [samples]
            type = "postgres"
            url = "postgres://evr@localhost/evr"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.samples,
            SampleStoreConfig::Postgres {
                url: "postgres://evr@localhost/evr".into(),
                max_connections: 10,
            }
        );
    }

    #[test]
    fn test_unknown_store_type_is_rejected() {
        let result = toml::from_str::<Config>(
            r#"
            [samples]
            type = "cassandra"
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides_select_remote_stores() {
        let env = HashMap::from([
            (DATABASE_URL_ENV, "postgres://evr@db/evr"),
            (MONGODB_URL_ENV, "mongodb://docs:27017"),
        ]);

        let config =
            Config::default().with_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.samples,
            SampleStoreConfig::Postgres {
                url: "postgres://evr@db/evr".into(),
                max_connections: 10,
            }
        );
        assert_eq!(
            config.routes,
            RouteStoreConfig::Mongodb {
                url: "mongodb://docs:27017".into(),
                database: "evr".into(),
            }
        );
    }

    #[test]
    fn test_env_override_keeps_configured_database() {
        let config = Config {
            routes: RouteStoreConfig::Mongodb {
                url: "mongodb://old:27017".into(),
                database: "staging".into(),
            },
            ..Config::default()
        };

        let config = config.with_env_overrides(|key| {
            (key == MONGODB_URL_ENV).then(|| "mongodb://new:27017".to_owned())
        });

        assert_eq!(
            config.routes,
            RouteStoreConfig::Mongodb {
                url: "mongodb://new:27017".into(),
                database: "staging".into(),
            }
        );
    }

    #[test]
    fn test_no_env_leaves_config_alone() {
        let config = Config::default().with_env_overrides(|_| None);

        assert_eq!(config.samples, SampleStoreConfig::Memory);
        assert_eq!(config.routes, RouteStoreConfig::Memory);
    }
}
