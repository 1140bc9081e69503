//! CLI command definitions and argument parsing.
//!
//! This module defines all the CLI commands and their arguments using the clap
//! builder API. Execution lives in [`crate::actions`].

use clap::{Arg, ArgAction, ArgMatches, Command};

pub mod addressing;
pub mod config;
pub mod params;
pub mod password;
pub mod token;

pub use params::*;

/// Builds the complete command tree of the `personium` binary.
pub fn cli_command() -> Command {
    Command::new("personium")
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(PARAMETER_VERBOSE)
                .short('v')
                .long(PARAMETER_VERBOSE)
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable verbose output for debugging"),
        )
        .arg(params::base_url_parameter())
        .arg(params::addressing_parameter())
        .arg(params::insecure_parameter())
        .subcommand(token::token_command())
        .subcommand(addressing::resolve_command())
        .subcommand(addressing::extract_command())
        .subcommand(password::password_command())
        .subcommand(config::config_command())
}

/// Parses the process arguments.
pub fn create_cli_commands() -> ArgMatches {
    cli_command().get_matches()
}
