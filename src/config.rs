use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_STORE_BACKEND: &str = "memory";
const DEFAULT_COLLECTION: &str = "items";
const DEFAULT_SUBMIT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SUCCESS_DISPLAY_MS: u64 = 2_000;

/// Which implementation of the item store the application talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    RealtimeDb,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Item store backend: "memory" or "realtime-db"
    #[serde(default = "default_store_backend")]
    #[validate(custom = "validate_store_backend")]
    pub store_backend: String,

    /// Base URL of the realtime database, e.g. https://<project>.firebaseio.com
    #[serde(default)]
    pub database_url: Option<String>,

    /// Database secret or ID token appended as `auth` to every request
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Collection path new items are pushed under
    #[serde(default = "default_collection")]
    #[validate(custom = "validate_collection")]
    pub collection: String,

    /// Upper bound on a single store write (milliseconds)
    #[serde(default = "default_submit_timeout_ms")]
    #[validate(range(min = 100, max = 60000))]
    pub submit_timeout_ms: u64,

    /// How long the success banner stays before the form is cleared (milliseconds)
    #[serde(default = "default_success_display_ms")]
    #[validate(range(max = 30000))]
    pub success_display_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENV.to_string(),
            log_level: default_log_level(),
            log_json: false,
            store_backend: default_store_backend(),
            database_url: None,
            auth_token: None,
            collection: default_collection(),
            submit_timeout_ms: DEFAULT_SUBMIT_TIMEOUT_MS,
            success_display_ms: DEFAULT_SUCCESS_DISPLAY_MS,
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Parsed store backend. Validation guarantees one of the known values.
    pub fn backend(&self) -> StoreBackend {
        match self.store_backend.to_ascii_lowercase().as_str() {
            "realtime-db" => StoreBackend::RealtimeDb,
            _ => StoreBackend::Memory,
        }
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }

    /// Cross-field checks the derive cannot express.
    pub fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.backend() == StoreBackend::RealtimeDb {
            match self.database_url.as_deref().map(str::trim) {
                None | Some("") => {
                    let mut err = ValidationError::new("database_url");
                    err.message =
                        Some("database_url is required when store_backend is realtime-db".into());
                    errors.add("database_url", err);
                }
                Some(url) if !(url.starts_with("https://") || url.starts_with("http://")) => {
                    let mut err = ValidationError::new("database_url");
                    err.message = Some("database_url must be an http(s) URL".into());
                    errors.add("database_url", err);
                }
                Some(_) => {}
            }
        }

        if self.is_production() && self.backend() == StoreBackend::Memory {
            let mut err = ValidationError::new("store_backend");
            err.message = Some("production requires a persistent store backend".into());
            errors.add("store_backend", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_store_backend() -> String {
    DEFAULT_STORE_BACKEND.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_submit_timeout_ms() -> u64 {
    DEFAULT_SUBMIT_TIMEOUT_MS
}

fn default_success_display_ms() -> u64 {
    DEFAULT_SUCCESS_DISPLAY_MS
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_store_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "memory" | "realtime-db" => Ok(()),
        _ => {
            let mut err = ValidationError::new("store_backend");
            err.message = Some("Must be one of: memory, realtime-db".into());
            Err(err)
        }
    }
}

/// Realtime database paths cannot contain `.`, `#`, `$`, `[` or `]`.
fn validate_collection(path: &str) -> Result<(), ValidationError> {
    let forbidden = ['.', '#', '$', '[', ']'];
    if path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path.contains(&forbidden[..])
    {
        let mut err = ValidationError::new("collection");
        err.message = Some("collection must be a non-empty relative path without . # $ [ ]".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("stockroom={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Loads application configuration from the `config` directory of the
/// working directory.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config ({dir}/default.toml)
/// 3. Environment-specific config ({dir}/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config_from(dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            dir.display()
        );
    }

    let config = Config::builder()
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("store_backend", DEFAULT_STORE_BACKEND)?
        .set_default("collection", DEFAULT_COLLECTION)?
        .set_default("submit_timeout_ms", DEFAULT_SUBMIT_TIMEOUT_MS)?
        .set_default("success_display_ms", DEFAULT_SUCCESS_DISPLAY_MS)?
        .add_source(File::from(dir.join("default")).required(false))
        .add_source(File::from(dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration constraint validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
