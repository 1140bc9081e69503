use clap::ArgMatches;
use personium_client::{
    actions::{self, addressing, config, password, required, token},
    commands::{
        COMMAND_CONFIG, COMMAND_EXTRACT, COMMAND_PASSWORD, COMMAND_PATH, COMMAND_RESOLVE,
        COMMAND_SET, COMMAND_SHOW, COMMAND_TOKEN, PARAMETER_IDENTIFIER, PARAMETER_NAME,
        PARAMETER_TRAILING_SLASH, PARAMETER_URL, PARAMETER_VALUE,
    },
    configuration::Configuration,
    context::PlatformContext,
    error::CliError,
    url_resolver::UrlResolver,
};

fn extract_subcommand_name(sub_matches: &ArgMatches) -> String {
    let message = match sub_matches.subcommand() {
        Some(m) => m.0,
        None => "unknown",
    };

    message.to_string()
}

/// Effective configuration for commands that talk to a unit
fn effective(configuration: &Configuration, matches: &ArgMatches) -> Result<Configuration, CliError> {
    let mut configuration = configuration.clone();
    actions::apply_overrides(&mut configuration, matches)?;
    Ok(configuration)
}

fn resolver(configuration: &Configuration) -> Result<UrlResolver, CliError> {
    Ok(UrlResolver::new(
        configuration.base_url(),
        configuration.addressing(),
    )?)
}

pub fn execute_command(
    mut configuration: Configuration,
    commands: ArgMatches,
) -> Result<(), CliError> {
    match commands.subcommand() {
        Some((COMMAND_TOKEN, sub_matches)) => {
            let platform = PlatformContext::new(&effective(&configuration, sub_matches)?)?;
            let report = token::issue_token(&platform, sub_matches)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Some((COMMAND_RESOLVE, sub_matches)) => {
            let resolver = resolver(&effective(&configuration, sub_matches)?)?;
            let identifier = required(sub_matches, PARAMETER_IDENTIFIER)?;
            let trailing_slash = sub_matches.get_flag(PARAMETER_TRAILING_SLASH);
            println!("{}", addressing::resolve(&resolver, identifier, trailing_slash)?);
            Ok(())
        }
        Some((COMMAND_EXTRACT, sub_matches)) => {
            let resolver = resolver(&effective(&configuration, sub_matches)?)?;
            let url = required(sub_matches, PARAMETER_URL)?;
            println!("{}", addressing::extract(&resolver, url)?);
            Ok(())
        }
        Some((COMMAND_PASSWORD, sub_matches)) => {
            let platform = PlatformContext::new(&effective(&configuration, sub_matches)?)?;
            password::change_password(&platform, sub_matches)?;
            println!("Password changed");
            Ok(())
        }
        Some((COMMAND_CONFIG, sub_matches)) => match sub_matches.subcommand() {
            Some((COMMAND_SHOW, sub_matches)) => {
                config::show(&effective(&configuration, sub_matches)?)
            }
            Some((COMMAND_PATH, _)) => {
                let path = config::path()?;
                println!("{}", path.display());
                Ok(())
            }
            Some((COMMAND_SET, sub_matches)) => {
                let name = required(sub_matches, PARAMETER_NAME)?;
                let value = required(sub_matches, PARAMETER_VALUE)?;
                let path = config::path()?;
                config::set(&mut configuration, name, value, &path)
            }
            _ => Err(CliError::UnsupportedSubcommand(extract_subcommand_name(
                sub_matches,
            ))),
        },
        _ => Err(CliError::UnsupportedSubcommand(extract_subcommand_name(
            &commands,
        ))),
    }
}
