use personium_client::{
    actions::leaf_matches,
    commands::{create_cli_commands, PARAMETER_VERBOSE},
    configuration::Configuration,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::execute_command;

/// Main entry point for the program
fn main() {
    let commands = create_cli_commands();

    // Initialize the logging subsystem; RUST_LOG wins over --verbose
    let verbose = leaf_matches(&commands).get_flag(PARAMETER_VERBOSE);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let configuration = match Configuration::load_or_create_default() {
        Ok(configuration) => configuration,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("ERROR: {}", e);
            std::process::exit(exitcode::CONFIG);
        }
    };
    debug!("Using base URL {}", configuration.base_url());

    if let Err(e) = execute_command(configuration, commands) {
        let code = e.exit_code();
        eprintln!("ERROR: {}", e);
        debug!("Exiting with {} ({})", code.code(), code.message());
        std::process::exit(code.code());
    }
}
