//! Startup configuration, read once from the environment.

use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

pub const DEFAULT_ML_SERVICE_URL: &str = "http://localhost:5001";
pub const DEFAULT_ML_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MlServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl MlServiceConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    DynamoDb {
        medications_table: String,
        logs_table: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub ml_service: MlServiceConfig,
    pub store: StoreBackend,
    pub user_id_header: String,
    /// Offset used for "today", weekdays and hours of day.
    pub reporting_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            None => DEFAULT_PORT,
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value,
                reason: "expected a port number",
            })?,
        };

        let base_url = match var("ML_SERVICE_HOST") {
            Some(host) => format!("https://{}", host.trim()),
            None => DEFAULT_ML_SERVICE_URL.to_string(),
        };

        let timeout_secs = match var("ML_SERVICE_TIMEOUT_SECS") {
            None => DEFAULT_ML_TIMEOUT_SECS,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "ML_SERVICE_TIMEOUT_SECS",
                        value,
                        reason: "expected a positive number of seconds",
                    })
                }
            },
        };

        let store = match var("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("memory") => StoreBackend::Memory,
            Some("dynamodb") => StoreBackend::DynamoDb {
                medications_table: var("DYNAMODB_MEDICATIONS_TABLE")
                    .unwrap_or("medtrack-medications".to_string()),
                logs_table: var("DYNAMODB_ADHERENCE_LOGS_TABLE")
                    .unwrap_or("medtrack-adherence-logs".to_string()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    value: other.to_string(),
                    reason: "expected \"memory\" or \"dynamodb\"",
                })
            }
        };

        let user_id_header = var("USER_ID_HEADER")
            .map(|h| h.trim().to_ascii_lowercase())
            .unwrap_or(DEFAULT_USER_ID_HEADER.to_string());

        let reporting_offset = match var("REPORTING_UTC_OFFSET") {
            None => Utc.fix(),
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "REPORTING_UTC_OFFSET",
                value,
                reason: "expected an offset like +05:30",
            })?,
        };

        Ok(Self {
            port,
            ml_service: MlServiceConfig::new(base_url, Duration::from_secs(timeout_secs)),
            store,
            user_id_header,
            reporting_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_point_at_local_development() {
        let config = config(&[]).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.ml_service.base_url, "http://localhost:5001");
        assert_eq!(config.ml_service.timeout, Duration::from_secs(10));
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.user_id_header, "x-user-id");
        assert_eq!(config.reporting_offset.local_minus_utc(), 0);
    }

    #[test]
    fn ml_host_switches_to_https() {
        let config = config(&[("ML_SERVICE_HOST", "ml.example.com")]).unwrap();
        assert_eq!(config.ml_service.base_url, "https://ml.example.com");
    }

    #[test]
    fn dynamodb_backend_with_table_names() {
        let config = config(&[
            ("STORE_BACKEND", "dynamodb"),
            ("DYNAMODB_MEDICATIONS_TABLE", "meds"),
        ])
        .unwrap();

        assert_eq!(
            config.store,
            StoreBackend::DynamoDb {
                medications_table: "meds".to_string(),
                logs_table: "medtrack-adherence-logs".to_string(),
            }
        );
    }

    #[test]
    fn reporting_offset_parses() {
        let config = config(&[("REPORTING_UTC_OFFSET", "+05:30")]).unwrap();
        assert_eq!(config.reporting_offset.local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("STORE_BACKEND", "mongo")]),
            Err(ConfigError::Invalid { var: "STORE_BACKEND", .. })
        ));
        assert!(matches!(
            config(&[("ML_SERVICE_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid { var: "ML_SERVICE_TIMEOUT_SECS", .. })
        ));
        assert!(matches!(
            config(&[("REPORTING_UTC_OFFSET", "Europe/Paris")]),
            Err(ConfigError::Invalid { var: "REPORTING_UTC_OFFSET", .. })
        ));
    }
}
