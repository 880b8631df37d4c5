//! Configuration loaded from environment variables

use std::fmt;
use std::str::FromStr;

use crate::auth::{DEFAULT_ISSUER, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_REVOCATION_SWEEP_SECS: u64 = 300;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Development user created at startup when `SEED_USERNAME`/`SEED_PASSWORD` are set
#[derive(Clone)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    /// HMAC secret for session tokens. Changing it voids every outstanding token.
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiry_secs: i64,
    pub revocation_sweep_secs: u64,
    pub allowed_origins: Vec<String>,
    pub log_format: LogFormat,
    pub seed_user: Option<SeedUser>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("database_url", &"<redacted>")
            .field("database_max_connections", &self.database_max_connections)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_expiry_secs", &self.jwt_expiry_secs)
            .field("revocation_sweep_secs", &self.revocation_sweep_secs)
            .field("allowed_origins", &self.allowed_origins)
            .field("log_format", &self.log_format)
            .field("seed_user", &self.seed_user)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_expiry_secs: i64 = parse_or(&get, "JWT_EXPIRY_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&jwt_expiry_secs) {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRY_SECS",
                reason: format!("must be between 1 and {MAX_TOKEN_TTL_SECS}"),
            });
        }

        let revocation_sweep_secs: u64 = parse_or(
            &get,
            "REVOCATION_SWEEP_SECS",
            DEFAULT_REVOCATION_SWEEP_SECS,
        )?;
        if revocation_sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "REVOCATION_SWEEP_SECS",
                reason: "must be positive".to_string(),
            });
        }

        let database_max_connections: u32 = parse_or(
            &get,
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_DATABASE_MAX_CONNECTIONS,
        )?;

        let allowed_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        let log_format = match get("LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    reason: format!("expected `text` or `json`, got `{other}`"),
                })
            }
        };

        let seed_user = match (get("SEED_USERNAME"), get("SEED_PASSWORD")) {
            (Some(username), Some(password)) => Some(SeedUser { username, password }),
            _ => None,
        };

        Ok(Self {
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database_url,
            database_max_connections,
            jwt_secret,
            jwt_issuer: get("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            jwt_expiry_secs,
            revocation_sweep_secs,
            allowed_origins,
            log_format,
            seed_user,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("JWT_SECRET", "s3cret"),
        ("DATABASE_URL", "postgres://localhost/penbun"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.jwt_issuer, "PenbunAPI");
        assert_eq!(config.jwt_expiry_secs, 3600);
        assert_eq!(config.revocation_sweep_secs, 300);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(config.seed_user.is_none());
    }

    #[test]
    fn test_missing_secret() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_blank_secret_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "   "),
            ("DATABASE_URL", "postgres://x"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_invalid_numbers() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("JWT_EXPIRY_SECS", "an hour"));
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid {
                name: "JWT_EXPIRY_SECS",
                ..
            })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("JWT_EXPIRY_SECS", "0"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("REVOCATION_SWEEP_SECS", "0"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_expiry_upper_bound() {
        let max = MAX_TOKEN_TTL_SECS.to_string();
        let mut vars = REQUIRED.to_vec();
        vars.push(("JWT_EXPIRY_SECS", &max));
        assert_eq!(
            Config::from_lookup(lookup(&vars)).unwrap().jwt_expiry_secs,
            MAX_TOKEN_TTL_SECS
        );

        let too_long = (MAX_TOKEN_TTL_SECS + 1).to_string();
        let overflowing = i64::MAX.to_string();
        for value in [too_long.as_str(), overflowing.as_str()] {
            let mut vars = REQUIRED.to_vec();
            vars.push(("JWT_EXPIRY_SECS", value));
            assert!(matches!(
                Config::from_lookup(lookup(&vars)),
                Err(ConfigError::Invalid {
                    name: "JWT_EXPIRY_SECS",
                    ..
                })
            ));
        }
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("JWT_ISSUER", "PenbunStaging"),
            ("JWT_EXPIRY_SECS", "900"),
            ("ALLOWED_ORIGINS", "https://shop.example.com, ,https://admin.example.com"),
            ("LOG_FORMAT", "JSON"),
            ("SEED_USERNAME", "admin"),
            ("SEED_PASSWORD", "changeme"),
        ]);

        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.jwt_issuer, "PenbunStaging");
        assert_eq!(config.jwt_expiry_secs, 900);
        assert_eq!(
            config.allowed_origins,
            vec!["https://shop.example.com", "https://admin.example.com"]
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.seed_user.unwrap().username, "admin");
    }

    #[test]
    fn test_unknown_log_format() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("LOG_FORMAT", "xml"));
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid {
                name: "LOG_FORMAT",
                ..
            })
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([("SEED_USERNAME", "admin"), ("SEED_PASSWORD", "changeme")]);
        let rendered = format!("{:?}", Config::from_lookup(lookup(&vars)).unwrap());

        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("postgres://localhost"));
        assert!(!rendered.contains("changeme"));
        assert!(rendered.contains("admin"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        // SERIAL TEST: Modifies environment variables
        std::env::set_var("JWT_SECRET", "env-secret");
        std::env::set_var("DATABASE_URL", "postgres://localhost/env");
        std::env::set_var("JWT_EXPIRY_SECS", "120");

        let config = Config::from_env().unwrap();
        assert_eq!(config.jwt_secret, "env-secret");
        assert_eq!(config.jwt_expiry_secs, 120);

        std::env::remove_var("JWT_SECRET");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));

        // Cleanup
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("JWT_EXPIRY_SECS");
    }
}
