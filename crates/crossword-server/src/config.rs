//! Configuration for the session server.
//!
//! Defaults can be overridden via environment variables, and the
//! binary's command-line flags override those in turn:
//!
//! - `CROSSWORD_BIND_ADDR`        (default: "0.0.0.0")
//! - `CROSSWORD_PORT`             (default: "5001")
//! - `CROSSWORD_MAX_CLIENTS`      (default: "1024")
//! - `CROSSWORD_SESSION_DURATION` (default: "300", seconds)
//! - `CROSSWORD_TICK_MS`          (default: "1000")
//! - `CROSSWORD_MAX_FRAME_LEN`    (default: "65536", bytes)
//! - `CROSSWORD_LOG`              (default: "info", used when `RUST_LOG` is unset)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crossword_core::RegistryConfig;
use crossword_protocol::wire_types::DEFAULT_MAX_FRAME_LEN;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,

    /// Countdown of every new game session, in seconds.
    pub session_duration_secs: i64,

    /// Milliseconds between two timer ticks.
    pub tick_interval_ms: u64,

    /// Longest accepted inbound frame, in bytes.
    pub max_frame_len: usize,

    /// Fallback log filter.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 5001,
            max_clients: 1024,
            session_duration_secs: 300,
            tick_interval_ms: 1000,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to defaults.
    ///
    /// Values are parsed but not validated: command-line flags may still
    /// override them. Call `validate` on the final config.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let config = Config {
            bind_addr: env::var("CROSSWORD_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: read_env_or_default("CROSSWORD_PORT", defaults.port)?,
            max_clients: read_env_or_default("CROSSWORD_MAX_CLIENTS", defaults.max_clients)?,
            session_duration_secs: read_env_or_default(
                "CROSSWORD_SESSION_DURATION",
                defaults.session_duration_secs,
            )?,
            tick_interval_ms: read_env_or_default("CROSSWORD_TICK_MS", defaults.tick_interval_ms)?,
            max_frame_len: read_env_or_default("CROSSWORD_MAX_FRAME_LEN", defaults.max_frame_len)?,
            log_level: env::var("CROSSWORD_LOG").unwrap_or(defaults.log_level),
        };

        Ok(config)
    }

    /// Reject values the server can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_duration_secs <= 0 {
            return Err(invalid("session_duration_secs", self.session_duration_secs, "must be positive"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms", self.tick_interval_ms, "must be positive"));
        }
        if self.max_frame_len == 0 {
            return Err(invalid("max_frame_len", self.max_frame_len, "must be positive"));
        }
        if self.max_clients == 0 {
            return Err(invalid("max_clients", self.max_clients, "must be positive"));
        }
        Ok(())
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            session_duration_secs: self.session_duration_secs,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
        }
    }
}

fn read_env_or_default<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: val.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn invalid(key: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_server() {
        let config = Config::default();
        assert_eq!(config.socket_addr_string(), "0.0.0.0:5001");
        assert_eq!(config.registry_config(), RegistryConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_values_are_only_checked_once_overrides_are_applied() {
        env::set_var("CROSSWORD_SESSION_DURATION", "0");
        let loaded = Config::from_env();
        env::remove_var("CROSSWORD_SESSION_DURATION");

        let mut config = loaded.expect("parseable env loads");
        assert_eq!(config.session_duration_secs, 0);
        assert!(config.validate().is_err());

        config.session_duration_secs = 60;
        assert!(config.validate().is_ok());

        // Parsing still fails fast. Same test: env vars are process-wide.
        env::set_var("CROSSWORD_MAX_CLIENTS", "lots");
        let loaded = Config::from_env();
        env::remove_var("CROSSWORD_MAX_CLIENTS");

        assert!(matches!(
            loaded,
            Err(ConfigError::Invalid { key: "CROSSWORD_MAX_CLIENTS", .. })
        ));
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let config = Config {
            tick_interval_ms: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "tick_interval_ms", .. })
        ));
    }
}
