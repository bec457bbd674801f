use std::str::FromStr;

use axum::http::HeaderValue;
use lettre::Address;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const SMTP_RELAY_HOST: &str = "smtp.gmail.com";
pub const SMTP_RELAY_PORT: u16 = 465;

/// Origins of the local static dev server, always allowed.
pub const LOCAL_DEV_ORIGINS: [&str; 2] = ["http://127.0.0.1:5500", "http://localhost:5500"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub file_path: Option<String>,
    pub archive_pattern: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<HeaderValue>,
    /// Operator mailbox: SMTP login, sender of both mails, recipient of the notification.
    pub admin_address: Address,
    pub smtp: SmtpSettings,
    pub log: LogSettings,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let mut allowed_origins = Vec::new();
        for var in ["FRONTEND_URL", "PRODUCTION_URL"] {
            if let Some(origin) = get(var) {
                allowed_origins.push(parse_origin(var, &origin)?);
            }
        }
        for origin in LOCAL_DEV_ORIGINS {
            allowed_origins.push(HeaderValue::from_static(origin));
        }

        let admin_email = get("ADMIN_EMAIL").ok_or(ConfigError::Missing("ADMIN_EMAIL"))?;
        let admin_address =
            Address::from_str(admin_email.trim()).map_err(|e| ConfigError::Invalid {
                var: "ADMIN_EMAIL",
                reason: e.to_string(),
            })?;
        let password = lookup("ADMIN_PASSWORD").ok_or(ConfigError::Missing("ADMIN_PASSWORD"))?;

        Ok(Self {
            host,
            port,
            allowed_origins,
            smtp: SmtpSettings {
                host: SMTP_RELAY_HOST.to_string(),
                port: SMTP_RELAY_PORT,
                user: admin_address.to_string(),
                password,
            },
            admin_address,
            log: LogSettings {
                file_path: get("LOG_FILE_PATH"),
                archive_pattern: get("LOG_ARCHIVE_PATTERN"),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origin(var: &'static str, origin: &str) -> Result<HeaderValue, ConfigError> {
    // Browsers send the origin without a trailing slash.
    let origin = origin.trim().trim_end_matches('/');
    HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("ADMIN_EMAIL", "admin@abmgroups.in"),
            ("ADMIN_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.admin_address.to_string(), "admin@abmgroups.in");
        assert_eq!(config.smtp.user, "admin@abmgroups.in");
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(config.log.file_path.is_none());
    }

    #[test]
    fn test_origins_and_port() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "3000"),
            ("FRONTEND_URL", "https://abmgroups.in/"),
            ("PRODUCTION_URL", "https://www.abmgroups.in"),
            ("ADMIN_EMAIL", "admin@abmgroups.in"),
            ("ADMIN_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        let origins: Vec<&str> = config
            .allowed_origins
            .iter()
            .map(|o| o.to_str().unwrap())
            .collect();
        assert_eq!(
            origins,
            vec![
                "https://abmgroups.in",
                "https://www.abmgroups.in",
                "http://127.0.0.1:5500",
                "http://localhost:5500",
            ]
        );
    }

    #[test]
    fn test_missing_credentials() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("ADMIN_PASSWORD", "secret")])),
            Err(ConfigError::Missing("ADMIN_EMAIL"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("ADMIN_EMAIL", "admin@abmgroups.in")])),
            Err(ConfigError::Missing("ADMIN_PASSWORD"))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[
                ("PORT", "eighty"),
                ("ADMIN_EMAIL", "admin@abmgroups.in"),
                ("ADMIN_PASSWORD", "secret"),
            ])),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[
                ("ADMIN_EMAIL", "not a mailbox"),
                ("ADMIN_PASSWORD", "secret"),
            ])),
            Err(ConfigError::Invalid {
                var: "ADMIN_EMAIL",
                ..
            })
        ));
    }
}
