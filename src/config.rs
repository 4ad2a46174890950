// src/config.rs

//! Process configuration: the small set of CLI flags this server accepts,
//! resolved once at startup into an immutable, cheaply-cloneable
//! `ServerConfig`. No configuration file is introduced — the external scope
//! limits configuration to CLI flags plus `RUST_LOG` for logging — so, like
//! the reference server's own `--port`/`--config` override parsing, this is
//! a hand-rolled parse over `std::env::args()` rather than a CLI-parsing
//! crate.

use std::path::PathBuf;

/// The upstream master a replica was started against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaOf {
    pub host: String,
    pub port: u16,
}

/// The fully-resolved process configuration, shared read-only by every task.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub replicaof: Option<ReplicaOf>,
    pub rdb_path: PathBuf,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            replicaof: None,
            rdb_path: default_rdb_path(),
            log_level: default_log_level(),
        }
    }
}

fn default_port() -> u16 {
    6379
}

fn default_rdb_path() -> PathBuf {
    PathBuf::from("data/empty.rdb")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A startup-time configuration error: a bad `--port` value, a malformed
/// `--replicaof` argument, or an unsupported/missing flag value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid --port value '{0}'")]
    InvalidPort(String),
    #[error("--port flag requires a value")]
    MissingPortValue,
    #[error("invalid --replicaof value '{0}', expected \"<host> <port>\"")]
    InvalidReplicaOf(String),
    #[error("--replicaof flag requires a value")]
    MissingReplicaOfValue,
}

impl ServerConfig {
    /// Parses `args` (in the style of `std::env::args()`, i.e. including the
    /// program name at index 0) into a `ServerConfig`. Unrecognized
    /// arguments are ignored, matching the narrow external scope.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        let mut config = ServerConfig::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--port" => {
                    let value = args.get(i + 1).ok_or(ConfigError::MissingPortValue)?;
                    config.port = value
                        .parse()
                        .map_err(|_| ConfigError::InvalidPort(value.clone()))?;
                    i += 2;
                }
                "--replicaof" => {
                    let value = args.get(i + 1).ok_or(ConfigError::MissingReplicaOfValue)?;
                    config.replicaof = Some(parse_replicaof(value)?);
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }

        Ok(config)
    }
}

/// Parses `"<host> <port>"` as used by `--replicaof`.
fn parse_replicaof(value: &str) -> Result<ReplicaOf, ConfigError> {
    let mut parts = value.split_whitespace();
    let host = parts.next().ok_or_else(|| ConfigError::InvalidReplicaOf(value.to_string()))?;
    let port_str = parts.next().ok_or_else(|| ConfigError::InvalidReplicaOf(value.to_string()))?;
    if parts.next().is_some() {
        return Err(ConfigError::InvalidReplicaOf(value.to_string()));
    }
    let port: u16 = port_str
        .parse()
        .map_err(|_| ConfigError::InvalidReplicaOf(value.to_string()))?;
    Ok(ReplicaOf { host: host.to_string(), port })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_master_on_default_port() {
        let config = ServerConfig::from_args(["kvnode"]).unwrap();
        assert_eq!(config.port, 6379);
        assert_eq!(config.replicaof, None);
    }

    #[test]
    fn parses_port_flag() {
        let config = ServerConfig::from_args(["kvnode", "--port", "6380"]).unwrap();
        assert_eq!(config.port, 6380);
    }

    #[test]
    fn parses_replicaof_flag() {
        let config = ServerConfig::from_args(["kvnode", "--replicaof", "localhost 6379"]).unwrap();
        assert_eq!(
            config.replicaof,
            Some(ReplicaOf { host: "localhost".to_string(), port: 6379 })
        );
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = ServerConfig::from_args(["kvnode", "--port", "notanumber"]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort("notanumber".to_string()));
    }

    #[test]
    fn malformed_replicaof_is_an_error() {
        let err = ServerConfig::from_args(["kvnode", "--replicaof", "justahost"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidReplicaOf(_)));
    }
}
