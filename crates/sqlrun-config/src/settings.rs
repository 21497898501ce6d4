//! Persisted settings
//!
//! The settings file keeps the scripts folder plus the five connection
//! fields, all strings, so a hand-edited file stays forgiving. Typing
//! and validation happen in [`Settings::connection_params`].

use serde::{Deserialize, Serialize};

use sqlrun_core::{ConnectionParams, Result, SqlRunError};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "1521";
pub const DEFAULT_SERVICE: &str = "XE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Folder whose `.sql` files make up the default run.
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_service")]
    pub service: String,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folder: String::new(),
            user: String::new(),
            password: String::new(),
            host: default_host(),
            port: default_port(),
            service: default_service(),
        }
    }
}

impl Settings {
    /// Validate the connection fields and produce typed parameters.
    ///
    /// Every missing field is reported in one message rather than one at
    /// a time. The password keeps its whitespace; the identity fields are
    /// trimmed.
    pub fn connection_params(&self) -> Result<ConnectionParams> {
        let mut missing = Vec::new();
        if self.user.trim().is_empty() {
            missing.push("user");
        }
        if self.password.trim().is_empty() {
            missing.push("password");
        }
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.port.trim().is_empty() {
            missing.push("port");
        }
        if self.service.trim().is_empty() {
            missing.push("service");
        }
        if !missing.is_empty() {
            return Err(SqlRunError::Config(format!(
                "missing required connection fields: {}",
                missing.join(", ")
            )));
        }

        let port: u16 = self
            .port
            .trim()
            .parse()
            .map_err(|_| SqlRunError::Config(format!("invalid port '{}'", self.port)))?;

        Ok(ConnectionParams::new(
            self.user.trim(),
            self.password.clone(),
            self.host.trim(),
            port,
            self.service.trim(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_the_conventional_oracle_setup() {
        let settings = Settings::default();
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, "1521");
        assert_eq!(settings.service, "XE");
        assert!(settings.folder.is_empty());
    }

    #[test]
    fn test_partial_json_fills_in_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"user": "scott"}"#).unwrap();
        assert_eq!(settings.user, "scott");
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, "1521");
    }

    #[test]
    fn test_connection_params_from_complete_settings() {
        let settings = Settings {
            user: " scott ".to_string(),
            password: "tiger".to_string(),
            host: "db.example.com".to_string(),
            port: "1522".to_string(),
            service: "ORCL".to_string(),
            ..Settings::default()
        };
        let params = settings.connection_params().unwrap();
        assert_eq!(params.user, "scott");
        assert_eq!(params.port, 1522);
        assert_eq!(params.service_name, "ORCL");
    }

    #[test]
    fn test_validation_reports_every_missing_field_at_once() {
        let settings = Settings {
            host: String::new(),
            port: String::new(),
            service: String::new(),
            ..Settings::default()
        };
        let error = settings.connection_params().unwrap_err();
        let message = error.to_string();
        for field in ["user", "password", "host", "port", "service"] {
            assert!(message.contains(field), "missing '{field}' in: {message}");
        }
    }

    #[test]
    fn test_non_numeric_port_is_rejected() {
        let settings = Settings {
            user: "scott".to_string(),
            password: "tiger".to_string(),
            port: "fifteen21".to_string(),
            ..Settings::default()
        };
        let error = settings.connection_params().unwrap_err();
        assert!(error.to_string().contains("invalid port"));
    }
}
