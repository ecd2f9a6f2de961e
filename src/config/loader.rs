//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered with the `config`
//! crate: struct defaults, then the TOML file, then `BUNDLER__*` environment variables.

use super::error::{ConfigResult, ConfigurationError};
use super::BundlerConfig;
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "BUNDLER_CONFIG";
/// Prefix for per-field environment overrides, e.g. `BUNDLER__QUEUE__CAPACITY`
pub const ENV_PREFIX: &str = "BUNDLER";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_CONFIG_FILE: &str = "config/bundler.toml";

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: BundlerConfig,
    environment: String,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection.
    ///
    /// Uses the file named by `BUNDLER_CONFIG` if set (it must exist), otherwise
    /// `config/bundler.toml` when present, otherwise defaults only.
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(Path::new(&path)),
            Err(_) => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                let file = default_path.exists().then_some(default_path);
                Self::build(file.as_deref(), None)
            }
        }
    }

    /// Load configuration from an explicit file; a missing file is an error
    pub fn load_from_file(path: &Path) -> ConfigResult<Arc<ConfigManager>> {
        if !path.exists() {
            return Err(ConfigurationError::config_file_not_found(
                path.display().to_string(),
            ));
        }
        Self::build(Some(path), None)
    }

    /// Build from an optional file and an explicit environment map instead of the
    /// process environment. Tests use this to avoid mutating global state.
    pub fn load_with_env(
        path: Option<&Path>,
        env_vars: HashMap<String, String>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::build(path, Some(env_vars))
    }

    fn build(
        path: Option<&Path>,
        env_vars: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();

        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Loading configuration file: {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env_vars),
        );

        let source_name = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "environment".to_string());

        let config: BundlerConfig = builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| ConfigurationError::load_failed(source_name, e))?;

        config.validate()?;

        info!(
            environment = %environment,
            config_file = ?path,
            path_plan_timeout_seconds = config.planner.path_plan_timeout_seconds,
            permute_last_committed = config.search.permute_last_committed,
            queue_capacity = config.queue.capacity,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
            config_file: path.map(Path::to_path_buf),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &BundlerConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    fn detect_environment() -> String {
        env::var("BUNDLER_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp config");
        file.write_all(contents.as_bytes()).expect("write temp config");
        file
    }

    #[test]
    fn test_defaults_without_sources() {
        let manager = ConfigManager::load_with_env(None, HashMap::new()).unwrap();
        assert_eq!(manager.config().queue.capacity, 100);
        assert!(manager.config_file().is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = toml_file(
            r#"
            [planner]
            path_plan_timeout_seconds = 2.5

            [search]
            permute_last_committed = 3
            "#,
        );

        let manager = ConfigManager::load_with_env(Some(file.path()), HashMap::new()).unwrap();
        let config = manager.config();
        assert_eq!(config.planner.path_plan_timeout_seconds, 2.5);
        assert_eq!(config.search.permute_last_committed, 3);
        // untouched sections keep their defaults
        assert_eq!(config.queue.capacity, 100);
        assert_eq!(config.events.topic, "GoalEvaluator");
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = toml_file("[queue]\ncapacity = 20\n");
        let env_vars = HashMap::from([
            ("BUNDLER__QUEUE__CAPACITY".to_string(), "7".to_string()),
            ("BUNDLER__PLANNER__WARM_UP".to_string(), "false".to_string()),
        ]);

        let manager = ConfigManager::load_with_env(Some(file.path()), env_vars).unwrap();
        assert_eq!(manager.config().queue.capacity, 7);
        assert!(!manager.config().planner.warm_up);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let file = toml_file("[worker]\ncleanup_every_requests = 0\n");
        let result = ConfigManager::load_with_env(Some(file.path()), HashMap::new());
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = ConfigManager::load_from_file(Path::new("/nonexistent/bundler.toml"));
        assert!(matches!(
            result,
            Err(ConfigurationError::ConfigFileNotFound { .. })
        ));
    }
}
