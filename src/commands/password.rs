//! Password command definition.

use crate::commands::params::{
    cell_parameter, password_parameter, COMMAND_PASSWORD, PARAMETER_NEW_PASSWORD, PARAMETER_USER,
};
use clap::{Arg, Command};

/// Create the password command.
pub fn password_command() -> Command {
    Command::new(COMMAND_PASSWORD)
        .about("Change the password of a cell account")
        .arg(cell_parameter())
        .arg(
            Arg::new(PARAMETER_USER)
                .short('u')
                .long(PARAMETER_USER)
                .num_args(1)
                .required(true)
                .help("Account name"),
        )
        .arg(password_parameter().required(true))
        .arg(
            Arg::new(PARAMETER_NEW_PASSWORD)
                .long(PARAMETER_NEW_PASSWORD)
                .num_args(1)
                .required(true)
                .env("PERSONIUM_NEW_PASSWORD")
                .hide_env_values(true)
                .help("The new password"),
        )
}
