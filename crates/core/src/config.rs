use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::role::UserType;

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["roster.toml", "config/roster.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub graphql: GraphqlConfig,
    pub cache: CacheConfig,
    pub screen: ScreenConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct GraphqlConfig {
    pub endpoint: String,
    pub api_key: Option<SecretString>,
    pub api_key_header: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Zero keeps snapshots for the lifetime of the process.
    pub ttl_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenConfig {
    pub default_role: UserType,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub graphql_endpoint: Option<String>,
    pub log_level: Option<String>,
    pub cache_enabled: Option<bool>,
    pub default_role: Option<UserType>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            graphql: GraphqlConfig {
                endpoint: "http://localhost:4000/graphql".to_string(),
                api_key: None,
                api_key_header: "x-api-key".to_string(),
                timeout_secs: 15,
            },
            cache: CacheConfig { enabled: true, ttl_secs: 0 },
            screen: ScreenConfig { default_role: UserType::Admin },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(graphql) = patch.graphql {
            if let Some(endpoint) = graphql.endpoint {
                self.graphql.endpoint = endpoint;
            }
            if let Some(api_key_value) = graphql.api_key {
                self.graphql.api_key = Some(secret_value(api_key_value));
            }
            if let Some(api_key_header) = graphql.api_key_header {
                self.graphql.api_key_header = api_key_header;
            }
            if let Some(timeout_secs) = graphql.timeout_secs {
                self.graphql.timeout_secs = timeout_secs;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(enabled) = cache.enabled {
                self.cache.enabled = enabled;
            }
            if let Some(ttl_secs) = cache.ttl_secs {
                self.cache.ttl_secs = ttl_secs;
            }
        }

        if let Some(screen) = patch.screen {
            if let Some(default_role) = screen.default_role {
                self.screen.default_role = parse_role("screen.default_role", &default_role)?;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ROSTER_GRAPHQL_ENDPOINT") {
            self.graphql.endpoint = value;
        }
        if let Some(value) = read_env("ROSTER_GRAPHQL_API_KEY") {
            self.graphql.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("ROSTER_GRAPHQL_API_KEY_HEADER") {
            self.graphql.api_key_header = value;
        }
        if let Some(value) = read_env("ROSTER_GRAPHQL_TIMEOUT_SECS") {
            self.graphql.timeout_secs = parse_u64("ROSTER_GRAPHQL_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ROSTER_CACHE_ENABLED") {
            self.cache.enabled = parse_bool("ROSTER_CACHE_ENABLED", &value)?;
        }
        if let Some(value) = read_env("ROSTER_CACHE_TTL_SECS") {
            self.cache.ttl_secs = parse_u64("ROSTER_CACHE_TTL_SECS", &value)?;
        }

        if let Some(value) = read_env("ROSTER_SCREEN_DEFAULT_ROLE") {
            self.screen.default_role = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "ROSTER_SCREEN_DEFAULT_ROLE".to_string(),
                    value: value.clone(),
                }
            })?;
        }

        let log_level = read_env("ROSTER_LOGGING_LEVEL").or_else(|| read_env("ROSTER_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ROSTER_LOGGING_FORMAT").or_else(|| read_env("ROSTER_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(endpoint) = overrides.graphql_endpoint {
            self.graphql.endpoint = endpoint;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = enabled;
        }
        if let Some(default_role) = overrides.default_role {
            self.screen.default_role = default_role;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_graphql(&self.graphql)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_graphql(graphql: &GraphqlConfig) -> Result<(), ConfigError> {
    let endpoint = graphql.endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::Validation(
            "graphql.endpoint is required (e.g. `https://example.com/graphql`)".to_string(),
        ));
    }
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ConfigError::Validation(
            "graphql.endpoint must start with http:// or https://".to_string(),
        ));
    }

    if graphql.timeout_secs == 0 || graphql.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "graphql.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let header = graphql.api_key_header.trim();
    let valid_header = !header.is_empty()
        && header.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if !valid_header {
        return Err(ConfigError::Validation(
            "graphql.api_key_header must be a non-empty HTTP header name".to_string(),
        ));
    }

    if let Some(api_key) = &graphql.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "graphql.api_key is set but empty; remove it or provide a key".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_role(key: &str, value: &str) -> Result<UserType, ConfigError> {
    value.parse::<UserType>().map_err(|error| ConfigError::Validation(format!("{key}: {error}")))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    graphql: Option<GraphqlPatch>,
    cache: Option<CachePatch>,
    screen: Option<ScreenPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphqlPatch {
    endpoint: Option<String>,
    api_key: Option<String>,
    api_key_header: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    enabled: Option<bool>,
    ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ScreenPatch {
    default_role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::domain::role::UserType;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ROSTER_VARS: [&str; 11] = [
        "ROSTER_GRAPHQL_ENDPOINT",
        "ROSTER_GRAPHQL_API_KEY",
        "ROSTER_GRAPHQL_API_KEY_HEADER",
        "ROSTER_GRAPHQL_TIMEOUT_SECS",
        "ROSTER_CACHE_ENABLED",
        "ROSTER_CACHE_TTL_SECS",
        "ROSTER_SCREEN_DEFAULT_ROLE",
        "ROSTER_LOGGING_LEVEL",
        "ROSTER_LOG_LEVEL",
        "ROSTER_LOGGING_FORMAT",
        "ROSTER_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_without_file_or_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ROSTER_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let config = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.graphql.endpoint == "http://localhost:4000/graphql", "default endpoint")?;
        ensure(config.graphql.api_key.is_none(), "api key should default to unset")?;
        ensure(config.graphql.api_key_header == "x-api-key", "default api key header")?;
        ensure(config.cache.enabled && config.cache.ttl_secs == 0, "cache defaults")?;
        ensure(config.screen.default_role == UserType::Admin, "admin is the default role")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact logging default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ROSTER_VARS);
        env::set_var("TEST_ROSTER_API_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("roster.toml");
            fs::write(
                &path,
                r#"
[graphql]
endpoint = "https://directory.example.com/graphql"
api_key = "${TEST_ROSTER_API_KEY}"

[screen]
default_role = "Manager"

[cache]
ttl_secs = 60
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.graphql.api_key.as_ref().map(|key| key.expose_secret().to_string())
                    == Some("key-from-env".to_string()),
                "api key should be interpolated from environment",
            )?;
            ensure(
                config.graphql.endpoint == "https://directory.example.com/graphql",
                "endpoint should come from file",
            )?;
            ensure(config.screen.default_role == UserType::Manager, "role parsed from file")?;
            ensure(config.cache.ttl_secs == 60, "ttl parsed from file")?;
            Ok(())
        })();

        clear_vars(&["TEST_ROSTER_API_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ROSTER_VARS);
        env::remove_var("TEST_ROSTER_UNSET_KEY");

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("roster.toml");
        fs::write(&path, "[graphql]\napi_key = \"${TEST_ROSTER_UNSET_KEY}\"\n")
            .map_err(|err| err.to_string())?;

        let outcome =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(
                outcome,
                Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "TEST_ROSTER_UNSET_KEY"
            ),
            "unset interpolation variable should fail the load",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ROSTER_VARS);

        env::set_var("ROSTER_LOG_LEVEL", "warn");
        env::set_var("ROSTER_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&ROSTER_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ROSTER_VARS);

        env::set_var("ROSTER_GRAPHQL_ENDPOINT", "https://from-env.example.com/graphql");
        env::set_var("ROSTER_CACHE_ENABLED", "false");
        env::set_var("ROSTER_SCREEN_DEFAULT_ROLE", "manager");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("roster.toml");
            fs::write(
                &path,
                r#"
[graphql]
endpoint = "https://from-file.example.com/graphql"
timeout_secs = 42

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    graphql_endpoint: Some("https://from-override.example.com/graphql".to_string()),
                    log_level: Some("debug".to_string()),
                    cache_enabled: Some(true),
                    default_role: Some(UserType::Admin),
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.graphql.endpoint == "https://from-override.example.com/graphql",
                "override endpoint should win",
            )?;
            ensure(config.graphql.timeout_secs == 42, "file timeout should beat the default")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.cache.enabled, "override cache flag should beat env")?;
            ensure(
                config.screen.default_role == UserType::Admin,
                "override default role should beat env",
            )?;
            Ok(())
        })();

        clear_vars(&ROSTER_VARS);
        result
    }

    #[test]
    fn invalid_env_numbers_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ROSTER_VARS);
        env::set_var("ROSTER_GRAPHQL_TIMEOUT_SECS", "soon");

        let outcome = AppConfig::load(LoadOptions::default());
        clear_vars(&ROSTER_VARS);

        ensure(
            matches!(
                outcome,
                Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "ROSTER_GRAPHQL_TIMEOUT_SECS"
            ),
            "non-numeric timeout should be rejected",
        )
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ROSTER_VARS);
        env::set_var("ROSTER_GRAPHQL_ENDPOINT", "ftp://directory.example.com");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("graphql.endpoint")
            );
            ensure(has_message, "validation failure should mention graphql.endpoint")
        })();

        clear_vars(&ROSTER_VARS);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("missing.toml");

        let outcome = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(outcome, Err(ConfigError::MissingConfigFile(ref missing)) if *missing == path),
            "missing required file should be reported with its path",
        )
    }

    #[test]
    fn api_key_is_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ROSTER_VARS);
        env::set_var("ROSTER_GRAPHQL_API_KEY", "super-secret-key-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("super-secret-key-value"),
                "debug output should not contain api key",
            )?;
            ensure(config.graphql.api_key.is_some(), "api key should still be loaded")
        })();

        clear_vars(&ROSTER_VARS);
        result
    }
}
