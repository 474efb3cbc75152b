pub mod commands;
pub mod logging;
pub mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use roster_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use roster_core::UserType;

use crate::commands::list::ListArgs;

#[derive(Debug, Parser)]
#[command(
    name = "roster",
    about = "Browse Zeller customers by role",
    long_about = "List and interactively browse customers from the ListZellerCustomers GraphQL query, filtered by role and name.",
    after_help = "Examples:\n  roster list --role manager --search tho\n  roster browse --no-cache --default-role manager\n  roster doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a roster.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "GraphQL endpoint URL, overriding config and env")]
    endpoint: Option<String>,
    #[arg(long, global = true, help = "Log level (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Bypass the snapshot cache for every fetch")]
    no_cache: bool,
    #[arg(
        long,
        global = true,
        value_parser = parse_role,
        help = "Role shown when no --role is given (admin|manager)"
    )]
    default_role: Option<UserType>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Fetch customers for one role and print the filtered list")]
    List {
        #[arg(long, value_parser = parse_role, help = "Role to list (admin|manager)")]
        role: Option<UserType>,
        #[arg(long, help = "Case-insensitive name filter")]
        search: Option<String>,
        #[arg(long, help = "Emit the view model as JSON")]
        json: bool,
    },
    #[command(about = "Interactive session driven by commands on stdin")]
    Browse,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and probe the GraphQL endpoint")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

fn parse_role(value: &str) -> Result<UserType, String> {
    value.parse::<UserType>().map_err(|error| error.to_string())
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                graphql_endpoint: self.endpoint.clone(),
                log_level: self.log_level.clone(),
                cache_enabled: self.no_cache.then_some(false),
                default_role: self.default_role,
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let logging = AppConfig::load(options.clone())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    if let Err(error) = logging::init_logging(&logging) {
        eprintln!("{error:#}");
    }

    let result = match cli.command {
        Command::List { role, search, json } => {
            commands::list::run(options, ListArgs { role, search, json })
        }
        Command::Browse => commands::browse::run(options),
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(options, json),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
