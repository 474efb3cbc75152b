use std::env;
use std::fs;
use std::path::Path;

use roster_core::config::{resolve_config_path, AppConfig, ConfigOverrides, LoadOptions};
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    /// The CLI flag for this key, and whether it was passed.
    flag: Option<(&'static str, bool)>,
    value: String,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let overrides = options.overrides.clone();

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for field in fields(&config, &overrides) {
        let source = field_source(&field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult::rendered(0, lines.join("\n"))
}

fn fields(config: &AppConfig, overrides: &ConfigOverrides) -> Vec<Field> {
    let api_key = if config.graphql.api_key.is_some() { "<redacted>" } else { "<unset>" };
    vec![
        field(
            "graphql.endpoint",
            &["ROSTER_GRAPHQL_ENDPOINT"],
            Some(("--endpoint", overrides.graphql_endpoint.is_some())),
            config.graphql.endpoint.clone(),
        ),
        field(
            "graphql.api_key",
            &["ROSTER_GRAPHQL_API_KEY"],
            None,
            api_key.to_string(),
        ),
        field(
            "graphql.api_key_header",
            &["ROSTER_GRAPHQL_API_KEY_HEADER"],
            None,
            config.graphql.api_key_header.clone(),
        ),
        field(
            "graphql.timeout_secs",
            &["ROSTER_GRAPHQL_TIMEOUT_SECS"],
            None,
            config.graphql.timeout_secs.to_string(),
        ),
        field(
            "cache.enabled",
            &["ROSTER_CACHE_ENABLED"],
            Some(("--no-cache", overrides.cache_enabled.is_some())),
            config.cache.enabled.to_string(),
        ),
        field(
            "cache.ttl_secs",
            &["ROSTER_CACHE_TTL_SECS"],
            None,
            config.cache.ttl_secs.to_string(),
        ),
        field(
            "screen.default_role",
            &["ROSTER_SCREEN_DEFAULT_ROLE"],
            Some(("--default-role", overrides.default_role.is_some())),
            config.screen.default_role.query_variable().to_ascii_lowercase(),
        ),
        field(
            "logging.level",
            &["ROSTER_LOGGING_LEVEL", "ROSTER_LOG_LEVEL"],
            Some(("--log-level", overrides.log_level.is_some())),
            config.logging.level.clone(),
        ),
        field(
            "logging.format",
            &["ROSTER_LOGGING_FORMAT", "ROSTER_LOG_FORMAT"],
            None,
            config.logging.format.as_str().to_string(),
        ),
    ]
}

fn field(
    key_path: &'static str,
    env_keys: &'static [&'static str],
    flag: Option<(&'static str, bool)>,
    value: String,
) -> Field {
    Field { key_path, env_keys, flag, value }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &Field,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some((flag, true)) = field.flag {
        return format!("flag ({flag})");
    }

    // Blank variables are ignored by the loader, so they are not a source either.
    for env_key in field.env_keys {
        if env::var(env_key).is_ok_and(|value| !value.trim().is_empty()) {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
