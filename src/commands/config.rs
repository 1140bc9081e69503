//! Configuration command definitions.

use crate::commands::params::{
    COMMAND_CONFIG, COMMAND_PATH, COMMAND_SET, COMMAND_SHOW, PARAMETER_NAME, PARAMETER_VALUE,
};
use clap::{Arg, Command};

/// Create the config command with all its subcommands.
pub fn config_command() -> Command {
    Command::new(COMMAND_CONFIG)
        .about("Configuration management")
        .subcommand_required(true)
        .subcommand(Command::new(COMMAND_SHOW).about("Print the effective configuration"))
        .subcommand(Command::new(COMMAND_PATH).about("Show configuration file path"))
        .subcommand(
            Command::new(COMMAND_SET)
                .about("Set a configuration property and save it")
                .arg(
                    Arg::new(PARAMETER_NAME)
                        .num_args(1)
                        .required(true)
                        .help("Property name")
                        .value_parser([
                            "base_url",
                            "addressing",
                            "connection_timeout",
                            "insecure",
                            "personium_version",
                        ]),
                )
                .arg(
                    Arg::new(PARAMETER_VALUE)
                        .num_args(1)
                        .required(true)
                        .help("New value; an empty personium_version removes it"),
                ),
        )
}
