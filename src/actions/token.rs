use clap::ArgMatches;
use serde::Serialize;
use tracing::debug;

use crate::{
    actions::required,
    commands::{
        PARAMETER_ASSERTION, PARAMETER_CELL, PARAMETER_OWNER, PARAMETER_PASSWORD,
        PARAMETER_REFRESH_TOKEN, PARAMETER_SCHEMA, PARAMETER_SCHEMA_PASSWORD,
        PARAMETER_SCHEMA_USER, PARAMETER_TARGET, PARAMETER_USER,
    },
    context::PlatformContext,
    credentials::Credentials,
    error::{CliError, ClientError},
    token::TokenStore,
};

/// What the `token` command prints
#[derive(Debug, Serialize)]
pub struct TokenReport {
    pub cell_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_cell_url: Option<String>,
    pub owner: bool,
    #[serde(flatten)]
    pub tokens: TokenStore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
}

/// Assembles credentials from the grant and schema options
pub fn credentials_from_matches(matches: &ArgMatches) -> Result<Credentials, CliError> {
    let mut builder = Credentials::builder();

    if let Some(user) = matches.get_one::<String>(PARAMETER_USER) {
        let password = required(matches, PARAMETER_PASSWORD)?;
        builder = builder.password(user, password);
    }
    if let Some(assertion) = matches.get_one::<String>(PARAMETER_ASSERTION) {
        builder = builder.bearer_assertion(assertion);
    }
    if let Some(token) = matches.get_one::<String>(PARAMETER_REFRESH_TOKEN) {
        builder = builder.refresh_token(token);
    }
    if let Some(schema) = matches.get_one::<String>(PARAMETER_SCHEMA) {
        builder = builder.schema(
            schema,
            required(matches, PARAMETER_SCHEMA_USER)?,
            required(matches, PARAMETER_SCHEMA_PASSWORD)?,
        );
    }

    Ok(builder.build().map_err(ClientError::from)?)
}

/// Authenticates as described by the options and reports the issued token
pub fn issue_token(platform: &PlatformContext, matches: &ArgMatches) -> Result<TokenReport, CliError> {
    let cell = required(matches, PARAMETER_CELL)?;
    let credentials = credentials_from_matches(matches)?;
    debug!("Requesting token at {} with {} grant", cell, credentials.primary().kind());

    let mut session = platform.session(cell, credentials);
    session.set_target_cell(matches.get_one::<String>(PARAMETER_TARGET).map(String::as_str));

    let session = if matches.get_flag(PARAMETER_OWNER) {
        session.derive_owner_session()?
    } else {
        session.authenticate()?;
        session
    };

    let target_cell_url = session
        .target_cell()
        .map(|target| platform.resolver().tenant_url(target))
        .transpose()?;

    Ok(TokenReport {
        cell_url: session.cell_url()?,
        target_cell_url,
        owner: session.is_owner(),
        tokens: session.tokens().clone(),
        server_version: platform.server_version(),
    })
}
