use url::Url;

use crate::error::EquipmentError;

pub const DEFAULT_GRPC_PORT: u16 = 50051;
pub const DEFAULT_RECENT_DATASETS_LIMIT: usize = 5;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Limits applied by the engine to uploads and listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub recent_datasets_limit: usize,
    pub max_upload_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recent_datasets_limit: DEFAULT_RECENT_DATASETS_LIMIT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub grpc_port: u16,
    pub database_url: String,
    pub engine: EngineConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, EquipmentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, EquipmentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let grpc_port = parse_or_default(&lookup, "GRPC_PORT", DEFAULT_GRPC_PORT)?;

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| EquipmentError::ConfigError {
                message: "DATABASE_URL environment variable is required".to_string(),
            })?;

        let recent_datasets_limit = parse_or_default(
            &lookup,
            "RECENT_DATASETS_LIMIT",
            DEFAULT_RECENT_DATASETS_LIMIT,
        )?;
        if recent_datasets_limit == 0 {
            return Err(EquipmentError::ConfigError {
                message: "RECENT_DATASETS_LIMIT must be at least 1".to_string(),
            });
        }

        let max_upload_bytes =
            parse_or_default(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Self {
            grpc_port,
            database_url,
            engine: EngineConfig {
                recent_datasets_limit,
                max_upload_bytes,
            },
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, EquipmentError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| EquipmentError::ConfigError {
            message: format!("Invalid {} '{}': {}", key, raw, e),
        }),
    }
}

/// Masks the password of a database URL for logging. URLs without a
/// password, or that do not parse, are returned unchanged.
pub fn redact_database_url(database_url: &str) -> String {
    match Url::parse(database_url) {
        Ok(mut url) if url.password().is_some() => match url.set_password(Some("***")) {
            Ok(()) => url.to_string(),
            Err(()) => database_url.to_string(),
        },
        _ => database_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config =
            ServiceConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/db")]))
                .unwrap();

        assert_eq!(config.grpc_port, DEFAULT_GRPC_PORT);
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.engine.recent_datasets_limit, 5);
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("GRPC_PORT", "6000"),
            ("RECENT_DATASETS_LIMIT", "20"),
            ("MAX_UPLOAD_BYTES", "1024"),
        ]))
        .unwrap();

        assert_eq!(config.grpc_port, 6000);
        assert_eq!(config.engine.recent_datasets_limit, 20);
        assert_eq!(config.engine.max_upload_bytes, 1024);
    }

    #[test]
    fn rejects_missing_or_malformed_values() {
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[])),
            Err(EquipmentError::ConfigError { .. })
        ));
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://localhost/db"),
                ("GRPC_PORT", "not-a-port"),
            ])),
            Err(EquipmentError::ConfigError { .. })
        ));
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://localhost/db"),
                ("RECENT_DATASETS_LIMIT", "0"),
            ])),
            Err(EquipmentError::ConfigError { .. })
        ));
    }

    #[test]
    fn redacts_credentials() {
        assert_eq!(
            redact_database_url("postgres://user:secret@db:5432/equipment"),
            "postgres://user:***@db:5432/equipment"
        );
        assert_eq!(
            redact_database_url("postgres://localhost/equipment"),
            "postgres://localhost/equipment"
        );
        assert_eq!(redact_database_url("not a url"), "not a url");
    }

    #[test]
    fn at_sign_outside_credentials_is_left_alone() {
        let url = "postgres://localhost:5432/equipment?application_name=ops@plant";
        assert_eq!(redact_database_url(url), url);

        assert_eq!(
            redact_database_url("postgres://ops:p@ss@db/equipment?application_name=a@b"),
            "postgres://ops:***@db/equipment?application_name=a@b"
        );
    }
}
