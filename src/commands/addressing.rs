//! Commands mapping cell names to URLs and back.

use crate::commands::params::{
    COMMAND_EXTRACT, COMMAND_RESOLVE, PARAMETER_IDENTIFIER, PARAMETER_TRAILING_SLASH,
    PARAMETER_URL,
};
use clap::{Arg, ArgAction, Command};

pub fn resolve_command() -> Command {
    Command::new(COMMAND_RESOLVE)
        .about("Print the URL of a cell")
        .arg(
            Arg::new(PARAMETER_IDENTIFIER)
                .num_args(1)
                .required(true)
                .help("Cell name or cell URL"),
        )
        .arg(
            Arg::new(PARAMETER_TRAILING_SLASH)
                .long(PARAMETER_TRAILING_SLASH)
                .action(ArgAction::SetTrue)
                .help("Print the URL in the form sent to the server, ending with '/'"),
        )
}

pub fn extract_command() -> Command {
    Command::new(COMMAND_EXTRACT)
        .about("Print the cell name contained in a cell URL")
        .arg(
            Arg::new(PARAMETER_URL)
                .num_args(1)
                .required(true)
                .help("Cell URL or cell name"),
        )
}
