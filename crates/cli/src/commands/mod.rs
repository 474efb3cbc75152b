pub mod browse;
pub mod config;
pub mod doctor;
pub mod list;

use roster_core::cache::{CacheSettings, CachedDirectory};
use roster_core::config::AppConfig;
use roster_core::screen::CustomerScreen;
use roster_core::UserType;
use roster_graphql::{GatewayBuildError, GraphqlDirectoryGateway};
use serde::Serialize;

pub type DirectoryScreen = CustomerScreen<CachedDirectory<GraphqlDirectoryGateway>>;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_FETCH: u8 = 3;
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn rendered(exit_code: u8, output: impl Into<String>) -> Self {
        Self { exit_code, output: output.into() }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Wires the GraphQL gateway behind the snapshot cache into a fresh screen.
pub fn build_screen(
    config: &AppConfig,
    role: Option<UserType>,
) -> Result<DirectoryScreen, GatewayBuildError> {
    let gateway = GraphqlDirectoryGateway::from_config(&config.graphql)?;
    let directory = CachedDirectory::new(gateway, CacheSettings::from(&config.cache));
    Ok(CustomerScreen::new(directory, role.unwrap_or(config.screen.default_role)))
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread().enable_all().build()
}
