//! Configuration for the object permission backend and guards.

mod loader;

use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;

/// Highest supported decision-log verbosity.
pub const MAX_LOG_VERBOSITY: u8 = 2;

fn default_login_url() -> String {
    "/accounts/login/".to_string()
}

/// Settings for [`ObjectPermissionsBackend`](crate::backend::ObjectPermissionsBackend)
/// and the request guards.
///
/// Can be deserialized from the `objperm` section of `application.yaml`.
/// Every field has a default.
///
/// ```yaml
/// objperm:
///   universal: false              # default: false
///   log_verbosity: 0              # 0 (off), 1 or 2; default: 0
///   default_403: false            # default: false
///   login_url: "/accounts/login/" # default
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OlpConfig {
    /// Subject superusers to object-level rules. Their model-level permission
    /// stays implicit. Default: false.
    #[serde(default)]
    pub universal: bool,
    /// Automatic decision logging: 0 disables it, 1 records access check
    /// output and the result, 2 adds a preamble and the model-level result.
    #[serde(default)]
    pub log_verbosity: u8,
    /// Guards reject with 403 instead of redirecting to the login page.
    /// Default: false.
    #[serde(default)]
    pub default_403: bool,
    /// Where guards redirect denied requests. Default: `/accounts/login/`.
    #[serde(default = "default_login_url")]
    pub login_url: String,
}

impl Default for OlpConfig {
    fn default() -> Self {
        Self {
            universal: false,
            log_verbosity: 0,
            default_403: false,
            login_url: default_login_url(),
        }
    }
}

impl OlpConfig {
    /// Top-level YAML key holding these settings.
    pub const SECTION: &'static str = "objperm";

    /// Prefix of environment variable overrides.
    pub const ENV_PREFIX: &'static str = "OBJPERM_";

    /// Create a configuration with every default.
    ///
    /// # Examples
    ///
    /// ```
    /// use objperm_core::OlpConfig;
    ///
    /// let config = OlpConfig::new().with_universal(true);
    /// assert!(config.universal);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable universal object-level permissions.
    pub fn with_universal(mut self, universal: bool) -> Self {
        self.universal = universal;
        self
    }

    /// Set the automatic decision log verbosity.
    pub fn with_log_verbosity(mut self, verbosity: u8) -> Self {
        self.log_verbosity = verbosity;
        self
    }

    /// Make guards reject with 403 by default.
    pub fn with_default_403(mut self, default_403: bool) -> Self {
        self.default_403 = default_403;
        self
    }

    /// Set the login URL guards redirect to.
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_verbosity > MAX_LOG_VERBOSITY {
            return Err(ConfigError::Invalid(format!(
                "log_verbosity must be between 0 and {MAX_LOG_VERBOSITY}, got {}",
                self.log_verbosity
            )));
        }
        if self.login_url.is_empty() {
            return Err(ConfigError::Invalid("login_url cannot be empty".into()));
        }
        Ok(())
    }

    /// Parse the `objperm` section of a YAML document.
    ///
    /// A document without the section yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let mut values = Mapping::new();
        loader::load_yaml_str(content, Self::SECTION, &mut values)?;
        Self::from_values(values)
    }

    /// Load from the current working directory. See [`load_from_dir`](Self::load_from_dir).
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."), profile)
    }

    /// Load configuration for the given profile.
    ///
    /// Resolution order (lowest to highest priority):
    /// 1. `application.yaml`
    /// 2. `application-{profile}.yaml`
    /// 3. `.env` and `.env.{profile}` files (loaded into the process
    ///    environment, never overwriting variables that are already set)
    /// 4. `OBJPERM_*` environment variables
    ///
    /// The profile is `OBJPERM_PROFILE` if set, else the argument.
    pub fn load_from_dir(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var("OBJPERM_PROFILE").unwrap_or_else(|_| profile.to_string());

        let mut values = Mapping::new();
        loader::load_yaml_file(&dir.join("application.yaml"), Self::SECTION, &mut values)?;
        let profile_path = dir.join(format!("application-{active_profile}.yaml"));
        loader::load_yaml_file(&profile_path, Self::SECTION, &mut values)?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        loader::overlay_env(Self::ENV_PREFIX, &mut values);

        tracing::debug!(profile = %active_profile, "loaded objperm configuration");
        Self::from_values(values)
    }

    fn from_values(values: Mapping) -> Result<Self, ConfigError> {
        let config: OlpConfig = serde_yaml::from_value(Value::Mapping(values))
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
