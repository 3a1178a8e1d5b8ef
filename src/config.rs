use chrono::TimeDelta;
use std::{env, fmt::Display, str::FromStr, time::Duration};

use crate::{
    error::{Error, Result},
    logging::LogFormat,
};

pub const DEFAULT_PORT: u16 = 3000;

/// Longest accepted attacker retention: one year.
pub const MAX_RETENTION_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Attack mode at startup.
    pub attack_mode: bool,
    pub heartbeat_secs: u64,
    /// Outbound frames buffered per connection before it counts as failed.
    pub queue_capacity: usize,
    pub retention_secs: u64,
    pub max_attackers: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            attack_mode: false,
            heartbeat_secs: 30,
            queue_capacity: 256,
            retention_secs: 3600,
            max_attackers: 500,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Reads the `CYBERWATCH_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let d = Self::default();
        let l = &lookup;

        let config = Self {
            host: lookup("CYBERWATCH_HOST").unwrap_or(d.host),
            port: parse_var(l, "CYBERWATCH_PORT", d.port)?,
            attack_mode: parse_var(l, "CYBERWATCH_ATTACK_MODE", d.attack_mode)?,
            heartbeat_secs: parse_var(l, "CYBERWATCH_HEARTBEAT_SECS", d.heartbeat_secs)?,
            queue_capacity: parse_var(l, "CYBERWATCH_QUEUE_CAPACITY", d.queue_capacity)?,
            retention_secs: parse_var(l, "CYBERWATCH_RETENTION_SECS", d.retention_secs)?,
            max_attackers: parse_var(l, "CYBERWATCH_MAX_ATTACKERS", d.max_attackers)?,
            log_format: parse_var(l, "CYBERWATCH_LOG_FORMAT", d.log_format)?,
        };

        if config.queue_capacity == 0 {
            return Err(Error::Config {
                var: "CYBERWATCH_QUEUE_CAPACITY",
                reason: "must be at least 1".to_string(),
            });
        }
        if config.heartbeat_secs == 0 {
            return Err(Error::Config {
                var: "CYBERWATCH_HEARTBEAT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }
        if config.retention_secs > MAX_RETENTION_SECS {
            return Err(Error::Config {
                var: "CYBERWATCH_RETENTION_SECS",
                reason: format!("must be at most {MAX_RETENTION_SECS}"),
            });
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    /// Retention window, capped at [`MAX_RETENTION_SECS`].
    pub fn retention(&self) -> TimeDelta {
        let secs = self.retention_secs.min(MAX_RETENTION_SECS);
        TimeDelta::seconds(i64::try_from(secs).unwrap_or_default())
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| Error::Config {
            var,
            reason: format!("{raw:?}: {e}"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert!(!config.attack_mode);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CYBERWATCH_PORT", "8080"),
            ("CYBERWATCH_ATTACK_MODE", "true"),
            ("CYBERWATCH_LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.attack_mode);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_value_names_variable() {
        let lookup = lookup_from(&[("CYBERWATCH_PORT", "not-a-port")]);
        let err = Config::from_lookup(lookup).unwrap_err();
        assert!(err.to_string().contains("CYBERWATCH_PORT"));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let result = Config::from_lookup(lookup_from(&[("CYBERWATCH_QUEUE_CAPACITY", "0")]));
        assert!(matches!(
            result,
            Err(Error::Config { var: "CYBERWATCH_QUEUE_CAPACITY", .. })
        ));
    }

    #[test]
    fn test_out_of_range_retention_rejected() {
        let lookup = lookup_from(&[("CYBERWATCH_RETENTION_SECS", "18446744073709551615")]);
        let result = Config::from_lookup(lookup);
        assert!(matches!(
            result,
            Err(Error::Config { var: "CYBERWATCH_RETENTION_SECS", .. })
        ));
    }

    #[test]
    fn test_retention_is_capped_for_direct_construction() {
        let config = Config {
            retention_secs: u64::MAX,
            ..Config::default()
        };
        let expected = i64::try_from(MAX_RETENTION_SECS).unwrap();
        assert_eq!(config.retention(), TimeDelta::seconds(expected));

        let lookup = lookup_from(&[("CYBERWATCH_RETENTION_SECS", "7200")]);
        let config = Config::from_lookup(lookup).unwrap();
        assert_eq!(config.retention(), TimeDelta::hours(2));
    }
}
