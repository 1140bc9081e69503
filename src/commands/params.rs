//! Shared command parameters for all CLI commands.
//!
//! Parameter names live here so that command definitions and the actions
//! reading the matches agree on them.

use crate::url_resolver::AddressingPolicy;
use clap::{Arg, ArgAction, ArgGroup};

// Top level commands
pub const COMMAND_TOKEN: &str = "token";
pub const COMMAND_RESOLVE: &str = "resolve";
pub const COMMAND_EXTRACT: &str = "extract";
pub const COMMAND_PASSWORD: &str = "password";

// Config commands
pub const COMMAND_CONFIG: &str = "config";
pub const COMMAND_SHOW: &str = "show";
pub const COMMAND_PATH: &str = "path";
pub const COMMAND_SET: &str = "set";

// Parameter names
pub const PARAMETER_VERBOSE: &str = "verbose";
pub const PARAMETER_BASE_URL: &str = "base-url";
pub const PARAMETER_ADDRESSING: &str = "addressing";
pub const PARAMETER_INSECURE: &str = "insecure";
pub const PARAMETER_CELL: &str = "cell";
pub const PARAMETER_USER: &str = "user";
pub const PARAMETER_PASSWORD: &str = "password";
pub const PARAMETER_NEW_PASSWORD: &str = "new-password";
pub const PARAMETER_ASSERTION: &str = "assertion";
pub const PARAMETER_REFRESH_TOKEN: &str = "refresh-token";
pub const PARAMETER_SCHEMA: &str = "schema";
pub const PARAMETER_SCHEMA_USER: &str = "schema-user";
pub const PARAMETER_SCHEMA_PASSWORD: &str = "schema-password";
pub const PARAMETER_TARGET: &str = "target";
pub const PARAMETER_OWNER: &str = "owner";
pub const PARAMETER_IDENTIFIER: &str = "identifier";
pub const PARAMETER_URL: &str = "url";
pub const PARAMETER_TRAILING_SLASH: &str = "trailing-slash";
pub const PARAMETER_NAME: &str = "name";
pub const PARAMETER_VALUE: &str = "value";

pub const GROUP_GRANT: &str = "grant";

/// Overrides the configured base URL for one invocation.
pub fn base_url_parameter() -> Arg {
    Arg::new(PARAMETER_BASE_URL)
        .long(PARAMETER_BASE_URL)
        .num_args(1)
        .required(false)
        .global(true)
        .env("PERSONIUM_BASE_URL")
        .help("Base URL of the Personium unit (overrides the configuration)")
}

/// Overrides the configured addressing policy for one invocation.
pub fn addressing_parameter() -> Arg {
    Arg::new(PARAMETER_ADDRESSING)
        .long(PARAMETER_ADDRESSING)
        .num_args(1)
        .required(false)
        .global(true)
        .env("PERSONIUM_ADDRESSING")
        .help("How cell names map to URLs (overrides the configuration)")
        .value_parser(AddressingPolicy::names())
}

pub fn insecure_parameter() -> Arg {
    Arg::new(PARAMETER_INSECURE)
        .long(PARAMETER_INSECURE)
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Accept invalid TLS certificates")
}

pub fn cell_parameter() -> Arg {
    Arg::new(PARAMETER_CELL)
        .short('c')
        .long(PARAMETER_CELL)
        .num_args(1)
        .required(true)
        .help("Cell name or cell URL to authenticate at")
}

pub fn user_parameter() -> Arg {
    Arg::new(PARAMETER_USER)
        .short('u')
        .long(PARAMETER_USER)
        .num_args(1)
        .help("Account name")
}

pub fn password_parameter() -> Arg {
    Arg::new(PARAMETER_PASSWORD)
        .short('p')
        .long(PARAMETER_PASSWORD)
        .num_args(1)
        .env("PERSONIUM_PASSWORD")
        .hide_env_values(true)
        .help("Account password")
}

pub fn assertion_parameter() -> Arg {
    Arg::new(PARAMETER_ASSERTION)
        .long(PARAMETER_ASSERTION)
        .num_args(1)
        .help("Trans-cell token issued by another cell")
}

pub fn refresh_token_parameter() -> Arg {
    Arg::new(PARAMETER_REFRESH_TOKEN)
        .long(PARAMETER_REFRESH_TOKEN)
        .num_args(1)
        .help("Refresh token from an earlier authentication")
}

/// Exactly one grant must be given; `--password` goes with `--user`.
pub fn grant_group() -> ArgGroup {
    ArgGroup::new(GROUP_GRANT)
        .args([PARAMETER_USER, PARAMETER_ASSERTION, PARAMETER_REFRESH_TOKEN])
        .required(true)
        .multiple(false)
}

pub fn schema_parameters() -> Vec<Arg> {
    vec![
        Arg::new(PARAMETER_SCHEMA)
            .long(PARAMETER_SCHEMA)
            .num_args(1)
            .requires_all([PARAMETER_SCHEMA_USER, PARAMETER_SCHEMA_PASSWORD])
            .help("Schema cell identifying the calling application"),
        Arg::new(PARAMETER_SCHEMA_USER)
            .long(PARAMETER_SCHEMA_USER)
            .num_args(1)
            .requires(PARAMETER_SCHEMA)
            .help("Account on the schema cell"),
        Arg::new(PARAMETER_SCHEMA_PASSWORD)
            .long(PARAMETER_SCHEMA_PASSWORD)
            .num_args(1)
            .requires(PARAMETER_SCHEMA)
            .env("PERSONIUM_SCHEMA_PASSWORD")
            .hide_env_values(true)
            .help("Password of the schema cell account"),
    ]
}

pub fn target_parameter() -> Arg {
    Arg::new(PARAMETER_TARGET)
        .short('t')
        .long(PARAMETER_TARGET)
        .num_args(1)
        .help("Cell the issued token should be scoped to")
}

pub fn owner_parameter() -> Arg {
    Arg::new(PARAMETER_OWNER)
        .long(PARAMETER_OWNER)
        .action(ArgAction::SetTrue)
        .help("Request a cell owner token")
}
