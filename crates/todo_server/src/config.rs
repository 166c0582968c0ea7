//! Server configuration from the process environment.
//!
//! `.env` is loaded by the binary before [`ServerConfig::from_env`] runs and
//! never overrides variables that are already set.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

pub const HOST_VAR: &str = "TODO_HOST";
pub const PORT_VAR: &str = "PORT";
pub const DB_PATH_VAR: &str = "TODO_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "TODO_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "TODO_LOG_DIR";

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DB_PATH: &str = "todo.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "logs";

/// Invalid or unreadable configuration value.
#[derive(Debug)]
pub enum ConfigError {
    InvalidHost(String),
    InvalidPort(String),
    RelativeLogDir(PathBuf),
    WorkingDirectory(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHost(value) => write!(f, "{HOST_VAR} is not an IP address: `{value}`"),
            Self::InvalidPort(value) => write!(f, "{PORT_VAR} is not a valid port: `{value}`"),
            Self::RelativeLogDir(path) => write!(
                f,
                "{LOG_DIR_VAR} must be an absolute path, got `{}`",
                path.display()
            ),
            Self::WorkingDirectory(err) => {
                write!(f, "failed to resolve current working directory: {err}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WorkingDirectory(err) => Some(err),
            _ => None,
        }
    }
}

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDirectory)?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset. `cwd` anchors the default log directory.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cwd: &Path,
    ) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = match read(HOST_VAR) {
            Some(value) => value
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidHost(value))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match read(PORT_VAR) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => DEFAULT_PORT,
        };
        let db_path = read(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        let log_level = read(LOG_LEVEL_VAR)
            .unwrap_or_else(|| todo_core::default_log_level().to_string());
        let log_dir = match read(LOG_DIR_VAR) {
            Some(value) => {
                let path = PathBuf::from(value);
                if !path.is_absolute() {
                    return Err(ConfigError::RelativeLogDir(path));
                }
                path
            }
            None => cwd.join(DEFAULT_LOG_DIR_NAME),
        };

        Ok(Self {
            host,
            port,
            db_path,
            log_level,
            log_dir,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerConfig, DB_PATH_VAR, HOST_VAR, LOG_DIR_VAR, PORT_VAR};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned(), Path::new("/srv/todo"))
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3001");
        assert_eq!(config.db_path, PathBuf::from("todo.sqlite3"));
        assert_eq!(config.log_level, todo_core::default_log_level());
        assert_eq!(config.log_dir, PathBuf::from("/srv/todo/logs"));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            (HOST_VAR, "127.0.0.1"),
            (PORT_VAR, " 8080 "),
            (DB_PATH_VAR, "/var/lib/todo/db.sqlite3"),
            (LOG_DIR_VAR, "/var/log/todo"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.db_path, PathBuf::from("/var/lib/todo/db.sqlite3"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/todo"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[(PORT_VAR, "   ")]).unwrap();
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[(PORT_VAR, "70000")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config_from(&[(HOST_VAR, "localhost")]),
            Err(ConfigError::InvalidHost(_))
        ));
        assert!(matches!(
            config_from(&[(LOG_DIR_VAR, "logs")]),
            Err(ConfigError::RelativeLogDir(_))
        ));
    }
}
