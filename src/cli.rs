//! Command-line entrypoint for leakcheck.
//!
//! Parses the command, loads the serialized compilation and config, runs the analyzers
//! and prints diagnostics.

use crate::analysis::dispose_analysis::CancellationToken;
use crate::analyzers::analyze_compilation;
use crate::compiler_messages::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_messages::display_messages::{print_compiler_messages, print_formatted_error};
use crate::flow_graph::compilation::Compilation;
use crate::settings::{CONFIG_FILE_NAME, Config};
use saying::say;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Check {
        compilation: PathBuf,
        config: Option<PathBuf>,
        sorted: bool,
    },

    Help,
}

/// Returns the process exit code
pub fn start_cli() -> i32 {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help(false);
        return 2;
    }

    let command = match get_command(&args[1..]) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return 2;
        }
    };

    match command {
        Command::Help => {
            print_help(false);
            0
        }

        Command::Check {
            compilation,
            config,
            sorted,
        } => match run_check(&compilation, config.as_deref(), sorted) {
            Ok(messages) => {
                print_compiler_messages(&messages);

                if messages.has_output() {
                    1
                } else {
                    say!(Green "No undisposed objects found");
                    0
                }
            }
            Err(error) => {
                print_formatted_error(&error);
                2
            }
        },
    }
}

fn run_check(
    compilation_path: &Path,
    config_path: Option<&Path>,
    sorted: bool,
) -> Result<CompilerMessages, CompilerError> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => compilation_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(CONFIG_FILE_NAME),
    };

    let mut config = Config::load(&config_path)?;
    if sorted {
        config.analysis.sort_diagnostics = true;
    }

    let compilation = Compilation::load(compilation_path)?;
    let report = analyze_compilation(&compilation, &config, &CancellationToken::new())?;

    let mut messages = report.messages;
    for warning in &mut messages.warnings {
        warning.location.scope = compilation_path.to_path_buf();
    }
    for error in &mut messages.errors {
        if error.location.scope.as_os_str().is_empty() {
            error.location.scope = compilation_path.to_path_buf();
        }
    }

    Ok(messages)
}

fn get_command(args: &[String]) -> Result<Command, String> {
    let command = args.first().map(String::as_str);

    match command {
        Some("help") | Some("--help") => Ok(Command::Help),
        Some("check") => parse_check_command(args),
        Some(other) => Err(format!("Invalid command: '{other}'")),
        None => Err(String::from("Missing command")),
    }
}

fn parse_check_command(args: &[String]) -> Result<Command, String> {
    let mut compilation = None;
    let mut config = None;
    let mut sorted = false;
    let mut index = 1usize;

    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.get(index + 1) else {
                    return Err(String::from("Missing value for --config"));
                };
                if path.starts_with("--") {
                    return Err(String::from("Missing value for --config"));
                }
                config = Some(PathBuf::from(path));
                index += 2;
            }
            "--sorted" => {
                sorted = true;
                index += 1;
            }
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown check flag: '{flag}'"));
            }
            path => {
                if compilation.is_some() {
                    return Err(format!("Unexpected extra argument: '{path}'"));
                }
                compilation = Some(PathBuf::from(path));
                index += 1;
            }
        }
    }

    let Some(compilation) = compilation else {
        return Err(String::from("Missing compilation file for 'check'"));
    };

    Ok(Command::Check {
        compilation,
        config,
        sorted,
    })
}

fn print_help(commands_only: bool) {
    if !commands_only {
        say!(Bright Black "------------------------------------");
        say!(Green Bold "leakcheck - finds disposable objects that are never disposed");
        say!("Usage: ", Bold "<command>", Italic " <args>");
    }
    say!(Green Bold "\nCommands:");
    say!("  check <compilation.json>   - Analyses a serialized compilation");
    say!("  help                       - Shows this message");

    say!(Green Bold "\nCheck options:");
    say!("  --config <file.toml>       (default: leakcheck.toml next to the input)");
    say!("  --sorted                   Sort diagnostics by method and position");
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
