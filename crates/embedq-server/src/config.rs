use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// | Env Var                | Default   |
/// |------------------------|-----------|
/// | `HOST`                 | `0.0.0.0` |
/// | `PORT`                 | `8000`    |
/// | `AUTH_TOKEN`           | required  |
/// | `DATABASE_URL`         | unset: in-memory store |
/// | `REQUEST_TIMEOUT_SECS` | `30`      |
/// | `SUBMIT_WAIT_MAX_SECS` | `25`      |
/// | `POLL_INTERVAL_MS`     | `100`     |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Shared secret expected in `Authorization: Bearer <token>`.
    pub auth_token: String,
    /// SQLite URL. `None` keeps tasks in memory only.
    pub database_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Upper bound for the `wait_secs` of `POST /v1/embeddings`.
    pub submit_wait_max_secs: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("SUBMIT_WAIT_MAX_SECS ({wait}) must be below REQUEST_TIMEOUT_SECS ({timeout})")]
    WaitExceedsTimeout { wait: u64, timeout: u64 },
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_or(&lookup, "HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port = parse_or(&lookup, "PORT", 8000)?;

        let auth_token = lookup("AUTH_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("AUTH_TOKEN"))?;

        let database_url = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty());

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        let submit_wait_max_secs = parse_or(&lookup, "SUBMIT_WAIT_MAX_SECS", 25)?;
        let poll_interval_ms = parse_or(&lookup, "POLL_INTERVAL_MS", 100)?;
        if poll_interval_ms == 0 {
            // 0 だと submit_and_wait が store を読み続ける
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_MS",
                value: poll_interval_ms.to_string(),
            });
        }

        if submit_wait_max_secs >= request_timeout_secs {
            return Err(ConfigError::WaitExceedsTimeout {
                wait: submit_wait_max_secs,
                timeout: request_timeout_secs,
            });
        }

        Ok(Self {
            host,
            port,
            auth_token,
            database_url,
            request_timeout_secs,
            submit_wait_max_secs,
            poll_interval_ms,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn submit_wait_max(&self) -> Duration {
        Duration::from_secs(self.submit_wait_max_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
