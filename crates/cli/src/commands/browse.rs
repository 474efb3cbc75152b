use std::io::{self, BufRead, Write};

use roster_core::cache::DirectorySource;
use roster_core::config::{AppConfig, LoadOptions};
use roster_core::screen::CustomerScreen;
use roster_core::UserType;
use tracing::warn;

use crate::commands::{build_screen, runtime, CommandResult, EXIT_CONFIG, EXIT_RUNTIME};
use crate::render::render_human;

const HELP: &str = "commands: role <admin|manager> | search [text] | refresh | show | help | quit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrowseCommand {
    Role(UserType),
    Search(String),
    Refresh,
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<BrowseCommand, String> {
    let trimmed = line.trim();
    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "role" => rest.parse::<UserType>().map(BrowseCommand::Role).map_err(|e| e.to_string()),
        "search" => Ok(BrowseCommand::Search(rest.to_string())),
        "refresh" => Ok(BrowseCommand::Refresh),
        "" | "show" => Ok(BrowseCommand::Show),
        "help" | "?" => Ok(BrowseCommand::Help),
        "quit" | "exit" | "q" => Ok(BrowseCommand::Quit),
        other => Err(format!("unknown command `{other}`; {HELP}")),
    }
}

/// Drives one screen from line-oriented input until `quit` or end of input.
pub async fn run_session<S, R, W>(
    screen: &mut CustomerScreen<S>,
    input: R,
    output: &mut W,
) -> io::Result<()>
where
    S: DirectorySource,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{HELP}")?;
    let view = match screen.mount().await {
        Ok(view) => view,
        Err(error) => return Err(io::Error::other(error.to_string())),
    };
    writeln!(output, "{}", render_human(&view))?;

    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "{message}")?;
                continue;
            }
        };

        let view = match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                writeln!(output, "{HELP}")?;
                continue;
            }
            BrowseCommand::Show => screen.view_model(),
            BrowseCommand::Search(text) => screen.set_search_text(text),
            BrowseCommand::Role(role) => match screen.select_role(role).await {
                Ok(view) => view,
                Err(error) => {
                    writeln!(output, "{error}")?;
                    continue;
                }
            },
            BrowseCommand::Refresh => match screen.refresh().await {
                Ok(view) => view,
                Err(error) => {
                    warn!(
                        event_name = "cli.browse.refresh_rejected",
                        error = %error,
                        "refresh ignored"
                    );
                    writeln!(output, "refresh is not available while a fetch is in progress")?;
                    continue;
                }
            },
        };
        writeln!(output, "{}", render_human(&view))?;
    }

    if let Err(error) = screen.unmount() {
        warn!(event_name = "cli.browse.unmount_rejected", error = %error, "unmount ignored");
    }
    Ok(())
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "browse",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let mut screen = match build_screen(&config, None) {
        Ok(screen) => screen,
        Err(error) => {
            return CommandResult::failure(
                "browse",
                "gateway_setup",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "browse",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            )
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    match runtime.block_on(run_session(&mut screen, stdin.lock(), &mut stdout)) {
        Ok(()) => CommandResult::rendered(0, String::new()),
        Err(error) => CommandResult::failure("browse", "io", error.to_string(), EXIT_RUNTIME),
    }
}
