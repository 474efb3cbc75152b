use roster_core::config::{AppConfig, LoadOptions};
use roster_core::{ApplicationError, DomainError, UserType};
use tracing::info;

use crate::commands::{build_screen, runtime, CommandResult, EXIT_CONFIG, EXIT_FETCH, EXIT_RUNTIME};
use crate::render::{render_human, render_json};

#[derive(Clone, Debug, Default)]
pub struct ListArgs {
    pub role: Option<UserType>,
    pub search: Option<String>,
    pub json: bool,
}

pub fn run(options: LoadOptions, args: ListArgs) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "list",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let mut screen = match build_screen(&config, args.role) {
        Ok(screen) => screen,
        Err(error) => {
            return CommandResult::failure("list", "gateway_setup", error.to_string(), EXIT_CONFIG)
        }
    };

    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "list",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            )
        }
    };

    if let Err(error) = runtime.block_on(screen.mount()) {
        let interface = ApplicationError::from(DomainError::from(error)).into_interface("cli.list");
        return CommandResult::failure("list", "screen_state", interface.to_string(), EXIT_RUNTIME);
    }
    let view = match args.search {
        Some(search) => screen.set_search_text(search),
        None => screen.view_model(),
    };

    info!(
        event_name = "cli.list.rendered",
        role = view.role.query_variable(),
        items = view.items.len(),
        failed = view.error_message.is_some(),
        "customer list rendered"
    );

    let exit_code = if view.error_message.is_some() { EXIT_FETCH } else { 0 };
    let output = if args.json { render_json(&view) } else { render_human(&view) };
    CommandResult::rendered(exit_code, output)
}
