//! Token command definition.

use crate::commands::params::{
    assertion_parameter, cell_parameter, grant_group, owner_parameter, password_parameter,
    refresh_token_parameter, schema_parameters, target_parameter, user_parameter, COMMAND_TOKEN,
};
use clap::Command;

/// Create the token command.
pub fn token_command() -> Command {
    Command::new(COMMAND_TOKEN)
        .about("Authenticate at a cell and print the issued token")
        .arg(cell_parameter())
        .arg(user_parameter())
        .arg(password_parameter())
        .arg(assertion_parameter())
        .arg(refresh_token_parameter())
        .group(grant_group())
        .args(schema_parameters())
        .arg(target_parameter())
        .arg(owner_parameter())
}
