//! Execution of the CLI commands.
//!
//! Actions take already parsed [`ArgMatches`] and return values the binary
//! prints, so they can be exercised without spawning a process.

use clap::ArgMatches;

use crate::{
    commands::{PARAMETER_ADDRESSING, PARAMETER_BASE_URL, PARAMETER_INSECURE},
    configuration::Configuration,
    error::CliError,
};

pub mod addressing;
pub mod config;
pub mod password;
pub mod token;

/// Returns a required string argument, or a usage error naming it
pub fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, CliError> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| CliError::MissingRequiredArgument(name.to_string()))
}

/// Descends to the matches of the innermost subcommand
pub fn leaf_matches(matches: &ArgMatches) -> &ArgMatches {
    let mut current = matches;
    while let Some((_, sub_matches)) = current.subcommand() {
        current = sub_matches;
    }
    current
}

/// Applies the global `--base-url`, `--addressing` and `--insecure` flags to a
/// configuration for this invocation only.
pub fn apply_overrides(
    configuration: &mut Configuration,
    matches: &ArgMatches,
) -> Result<(), CliError> {
    if let Some(base_url) = matches.get_one::<String>(PARAMETER_BASE_URL) {
        configuration.set_base_url(base_url);
    }
    if let Some(addressing) = matches.get_one::<String>(PARAMETER_ADDRESSING) {
        configuration.set_property("addressing", addressing)?;
    }
    if matches.get_flag(PARAMETER_INSECURE) {
        configuration.set_insecure(true);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use clap::ArgMatches;

    use crate::commands::cli_command;

    /// Parses a full command line and returns the matches of its subcommand
    pub fn sub_matches(args: &[&str]) -> ArgMatches {
        let matches = cli_command()
            .try_get_matches_from(std::iter::once("personium").chain(args.iter().copied()))
            .unwrap();
        super::leaf_matches(&matches).clone()
    }
}
