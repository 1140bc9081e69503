use clap::ArgMatches;
use tracing::debug;

use crate::{
    actions::required,
    commands::{PARAMETER_CELL, PARAMETER_NEW_PASSWORD, PARAMETER_PASSWORD, PARAMETER_USER},
    context::PlatformContext,
    error::CliError,
};

/// Logs in with the current password and sets the new one
pub fn change_password(platform: &PlatformContext, matches: &ArgMatches) -> Result<(), CliError> {
    let cell = required(matches, PARAMETER_CELL)?;
    let user = required(matches, PARAMETER_USER)?;
    let password = required(matches, PARAMETER_PASSWORD)?;
    let new_password = required(matches, PARAMETER_NEW_PASSWORD)?;

    let mut session = platform.as_account(cell, user, password)?;
    session.change_password(new_password)?;
    debug!("Password of {} at {} changed", user, cell);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actions::testing::sub_matches,
        configuration::Configuration,
        error::ClientError,
        session::CREDENTIAL_HEADER,
        transport::testing::{token_json, FakeTransport},
        url_resolver::AddressingPolicy,
    };
    use std::sync::Arc;

    #[test]
    fn test_change_password() {
        let transport = Arc::new(
            FakeTransport::new()
                .reply(200, &token_json("tok1"))
                .reply(204, ""),
        );
        let platform = PlatformContext::with_transport(
            &Configuration::new("https://unit.example/", AddressingPolicy::Path),
            transport.clone(),
        )
        .unwrap();
        let matches = sub_matches(&[
            "password", "-c", "alice", "-u", "alice", "-p", "old", "--new-password", "new",
        ]);

        change_password(&platform, &matches).unwrap();
        let requests = transport.requests();
        assert_eq!(requests[1].url, "https://unit.example/alice/__mypassword");
        assert_eq!(requests[1].header_value(CREDENTIAL_HEADER), Some("new"));
    }

    #[test]
    fn test_rejected_login_is_an_auth_error() {
        let transport = Arc::new(FakeTransport::new().reply(400, r#"{"error":"invalid_grant"}"#));
        let platform = PlatformContext::with_transport(
            &Configuration::new("https://unit.example/", AddressingPolicy::Path),
            transport.clone(),
        )
        .unwrap();
        let matches = sub_matches(&[
            "password", "-c", "alice", "-u", "alice", "-p", "bad", "--new-password", "new",
        ]);

        assert!(matches!(
            change_password(&platform, &matches),
            Err(CliError::ClientError(ClientError::Auth { .. }))
        ));
        assert_eq!(transport.call_count(), 1);
    }
}
