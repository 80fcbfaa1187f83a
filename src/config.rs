//! Service configuration.
//!
//! Configuration is read from a TOML file in which every key is optional.
//! `DATABASE_URL` in the environment overrides `database_url` from the file.

use crate::auth::{CredentialScheme, CredentialVerifier};
use crate::tool_registry::domain::{DEFAULT_TABLE_PREFIX, PaginationLimits, TableSynthesizer};
use crate::tool_registry::services::DeregistrationPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding [`ServiceConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {message}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
    /// The configuration is not valid TOML for [`ServiceConfig`].
    #[error("invalid config: {0}")]
    Parse(String),
    /// A value is out of range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Top-level service configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// `PostgreSQL` connection string.
    pub database_url: Option<String>,
    /// Admin credential in the at-rest form of `credential_scheme`. No admin
    /// operation succeeds while this is unset.
    pub admin_token: Option<String>,
    /// Tokens accepted for sensitive common records, in at-rest form.
    pub common_tokens: Vec<String>,
    /// How credentials are kept at rest and compared.
    pub credential_scheme: CredentialScheme,
    /// Prefix prepended to tool names to form relation names.
    pub table_prefix: String,
    /// Page size defaults and ceiling.
    pub pagination: PaginationLimits,
    /// What deregistration does when a relation cannot be dropped.
    pub deregistration: DeregistrationPolicy,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Maximum number of pooled database connections.
    pub pool_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            admin_token: None,
            common_tokens: Vec::new(),
            credential_scheme: CredentialScheme::default(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_owned(),
            pagination: PaginationLimits::default(),
            deregistration: DeregistrationPolicy::default(),
            log_level: "info".to_owned(),
            pool_size: 4,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServiceConfig")
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field("common_tokens", &self.common_tokens.len())
            .field("credential_scheme", &self.credential_scheme)
            .field("table_prefix", &self.table_prefix)
            .field("pagination", &self.pagination)
            .field("deregistration", &self.deregistration)
            .field("log_level", &self.log_level)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

impl ServiceConfig {
    /// Loads and validates configuration from a TOML file, then applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(Self::from_toml_str(&text)?.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`, normally the process environment.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
            self.database_url = Some(url);
        }
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.synthesizer()?;
        if self.pagination.max_limit == 0 {
            return Err(ConfigError::Invalid(
                "pagination.max_limit must be at least 1".to_owned(),
            ));
        }
        if self.pagination.default_limit == 0
            || self.pagination.default_limit > self.pagination.max_limit
        {
            return Err(ConfigError::Invalid(format!(
                "pagination.default_limit must be between 1 and {}",
                self.pagination.max_limit
            )));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid(
                "pool_size must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Builds the table synthesizer for the configured prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the prefix is not usable.
    pub fn synthesizer(&self) -> Result<TableSynthesizer, ConfigError> {
        TableSynthesizer::new(self.table_prefix.clone())
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Returns the database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when neither the file nor the
    /// environment provides one.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "database_url is not configured and {DATABASE_URL_ENV} is unset"
            ))
        })
    }

    /// Seals `secret` with the configured scheme, for writing `admin_token`
    /// or `common_tokens` entries.
    #[must_use]
    pub fn seal(&self, secret: &str) -> String {
        crate::auth::ConfiguredVerifier::from(self.credential_scheme).seal(secret)
    }
}
