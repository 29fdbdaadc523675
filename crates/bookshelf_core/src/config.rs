//! Process configuration shared by the CLI and embedding hosts.

use crate::logging::{default_log_level, normalize_level, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Database file used when none is configured.
pub const DEFAULT_DB_PATH: &str = "bookshelf.sqlite3";

/// Login entry point anonymous requests are redirected to.
pub const DEFAULT_LOGIN_URL: &str = "/relationship/login/";

/// Invalid configuration value.
#[derive(Debug)]
pub enum ConfigError {
    EmptyDbPath,
    InvalidLogLevel(LoggingError),
    RelativeLogDir(PathBuf),
    InvalidLoginUrl(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDbPath => write!(f, "database path cannot be empty"),
            Self::InvalidLogLevel(err) => write!(f, "{err}"),
            Self::RelativeLogDir(path) => write!(
                f,
                "log directory must be an absolute path, got `{}`",
                path.display()
            ),
            Self::InvalidLoginUrl(url) => write!(
                f,
                "login url must be a site path or http(s) url, got `{url}`"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(err) => Some(err),
            _ => None,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    db_path: PathBuf,
    log_level: String,
    /// File logging is off when unset.
    log_dir: Option<PathBuf>,
    login_url: String,
}

impl AppConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            log_level: default_log_level().to_string(),
            log_dir: None,
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    /// Checks every value and normalizes the log level.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }
        self.log_level = normalize_level(&self.log_level)
            .map_err(ConfigError::InvalidLogLevel)?
            .to_string();
        if let Some(dir) = self.log_dir.as_deref() {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.to_path_buf()));
            }
        }
        let url = self.login_url.trim();
        if !(url.starts_with('/') || url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidLoginUrl(self.login_url.clone()));
        }
        Ok(self)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DEFAULT_LOGIN_URL};

    #[test]
    fn default_config_validates() {
        let config = AppConfig::default().validate().expect("default is valid");
        assert_eq!(config.login_url(), DEFAULT_LOGIN_URL);
        assert!(config.log_dir().is_none());
    }

    #[test]
    fn validate_normalizes_level_and_rejects_bad_values() {
        let config = AppConfig::new("library.db")
            .with_log_level(" WARNING ")
            .validate()
            .expect("warning is a known level");
        assert_eq!(config.log_level(), "warn");

        assert!(matches!(
            AppConfig::new("").validate(),
            Err(ConfigError::EmptyDbPath)
        ));
        assert!(matches!(
            AppConfig::new("library.db").with_log_level("loud").validate(),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            AppConfig::new("library.db").with_log_dir("logs").validate(),
            Err(ConfigError::RelativeLogDir(_))
        ));
        assert!(matches!(
            AppConfig::new("library.db")
                .with_login_url("login")
                .validate(),
            Err(ConfigError::InvalidLoginUrl(_))
        ));
    }
}
