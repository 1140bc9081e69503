use std::collections::HashMap;
use tracing::{debug, error, warn};

use crate::{
    assertion,
    context::PlatformContext,
    credentials::{GrantBody, SchemaCredential},
    error::ClientError,
    session::SessionContext,
    token::TokenStore,
    transport::{HttpRequest, HttpResponse, Method, CONTENT_TYPE_FORM},
    url_resolver::append,
};

pub const TOKEN_ENDPOINT: &str = "__token";

/// Result of a successful token exchange
#[derive(Debug, Clone)]
pub struct GrantOutcome {
    pub tokens: TokenStore,
    pub response_headers: HashMap<String, String>,
}

/// Performs token exchanges against cell `__token` endpoints.
///
/// This is the only place where authentication touches the network. It never
/// mutates a session; the caller commits the returned [`TokenStore`] once the
/// whole exchange has succeeded.
pub struct AuthClient {
    platform: PlatformContext,
}

impl AuthClient {
    pub fn new(platform: &PlatformContext) -> Self {
        Self {
            platform: platform.clone(),
        }
    }

    /// Exchanges the session's credentials for a new token.
    ///
    /// When a schema credential is present, the nested client exchange runs
    /// first and the primary request is only sent if it succeeded.
    pub fn exchange(&self, session: &SessionContext) -> Result<GrantOutcome, ClientError> {
        let credentials = session.credentials();
        let resolver = self.platform.resolver();

        let cell_url = self.token_endpoint_cell_url(session)?;
        let target_url = session
            .target_cell()
            .map(|target| resolver.tenant_url(target))
            .transpose()?;

        let mut body = credentials.build_grant_body(target_url.as_deref())?;

        if let Some(schema) = credentials.schema() {
            let schema_url = resolver.tenant_url(&schema.schema_cell_url)?;
            let client_secret = self.client_assertion(schema, &schema_url, &cell_url)?;
            body.push("client_id", &schema_url);
            body.push("client_secret", &client_secret);
        }

        if session.is_owner() {
            body.push("cell_owner", "true");
        }

        debug!(
            "Authenticating against {} with {} grant",
            cell_url,
            credentials.primary().kind()
        );
        let response = self.post_grant(&cell_url, &body)?;
        let tokens = TokenStore::from_grant_response(&response.body)?;
        debug!("Authentication successful, received token");

        Ok(GrantOutcome {
            tokens,
            response_headers: response.headers,
        })
    }

    /// Cell whose token endpoint receives the grant. A bearer assertion is
    /// exchanged at its audience, everything else at the session's own cell.
    fn token_endpoint_cell_url(&self, session: &SessionContext) -> Result<String, ClientError> {
        match session.credentials().bearer_assertion() {
            Some(token) => {
                let audience = assertion::audience(token)?;
                Ok(self.platform.resolver().tenant_url(&audience)?)
            }
            None => session.cell_url(),
        }
    }

    /// Password grant against the schema cell; its access token becomes the
    /// `client_secret` of the primary grant.
    fn client_assertion(
        &self,
        schema: &SchemaCredential,
        schema_url: &str,
        cell_url: &str,
    ) -> Result<String, ClientError> {
        debug!(
            "Requesting client assertion from schema cell {} for {}",
            schema_url, cell_url
        );
        let response = self.post_grant(schema_url, &schema.grant_body(cell_url))?;
        let tokens = TokenStore::from_grant_response(&response.body)?;
        tokens
            .access_token()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Protocol("schema grant returned no token".to_string()))
    }

    fn post_grant(&self, cell_url: &str, body: &GrantBody) -> Result<HttpResponse, ClientError> {
        let mut request = HttpRequest::new(Method::POST, append(cell_url, TOKEN_ENDPOINT))
            .header("Content-Type", CONTENT_TYPE_FORM)
            .header("Accept", "application/json")
            .body(body.encode());
        for (name, value) in self.platform.default_headers() {
            request = request.header(name, value);
        }

        let response = self.platform.transport().send(request)?;
        self.platform.note_response_headers(&response.headers);

        debug!("Authentication response status: {}", response.status);

        if response.is_success() {
            Ok(response)
        } else {
            error!(
                "Authentication request to {} failed with status {}",
                cell_url, response.status
            );
            Err(ClientError::auth(
                Some(response.status),
                describe_error_body(&response.body),
            ))
        }
    }
}

/// Turns an OAuth error response into a readable message
pub(crate) fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(error_json) => {
            let Some(error_val) = error_json.get("error") else {
                return match error_json
                    .get("message")
                    .and_then(|m| m.get("value").or(Some(m)))
                    .and_then(|v| v.as_str())
                {
                    Some(message) => message.to_string(),
                    None => body.to_string(),
                };
            };
            let error_str = error_val.as_str().unwrap_or("unknown");

            let error_description = match error_json
                .get("error_description")
                .and_then(|d| d.as_str())
            {
                Some(desc) => format!(" - {}", desc),
                None => String::new(),
            };

            match error_str {
                "invalid_client" => format!(
                    "Invalid client credentials{}. Please check the schema cell account.",
                    error_description
                ),
                "invalid_grant" => format!(
                    "Invalid grant{}. The credentials, assertion or refresh token were rejected.",
                    error_description
                ),
                "unauthorized_client" => format!(
                    "Unauthorized client{}. The client is not authorized to use this grant type.",
                    error_description
                ),
                "invalid_request" => format!(
                    "Invalid request{}. The request is missing required parameters or contains invalid parameters.",
                    error_description
                ),
                _ => format!("{}{}", error_str, error_description),
            }
        }
        Err(json_err) => {
            warn!(
                "Failed to parse error response as JSON: {}. Raw error: {}",
                json_err, body
            );
            body.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assertion::encode_assertion,
        configuration::Configuration,
        credentials::Credentials,
        transport::{
            testing::{token_json, FakeTransport},
            TransportError,
        },
        url_resolver::AddressingPolicy,
    };
    use std::sync::Arc;

    fn platform(transport: Arc<FakeTransport>) -> PlatformContext {
        PlatformContext::with_transport(
            &Configuration::new("https://unit.example/", AddressingPolicy::Path),
            transport,
        )
        .unwrap()
    }

    fn session(platform: &PlatformContext, credentials: Credentials) -> SessionContext {
        SessionContext::new(platform, "alice", credentials)
    }

    fn alice() -> Credentials {
        Credentials::builder()
            .password("alice", "secret")
            .build()
            .unwrap()
    }

    #[test]
    fn test_password_exchange_request() {
        let transport = Arc::new(FakeTransport::new().reply(200, &token_json("tok1")));
        let platform = platform(transport.clone());

        let outcome = AuthClient::new(&platform)
            .exchange(&session(&platform, alice()))
            .unwrap();
        assert_eq!(outcome.tokens.access_token(), Some("tok1"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url, "https://unit.example/alice/__token");
        assert_eq!(
            requests[0].header_value("Content-Type"),
            Some(CONTENT_TYPE_FORM)
        );
        assert_eq!(
            requests[0].body.as_deref(),
            Some("grant_type=password&username=alice&password=secret")
        );
    }

    #[test]
    fn test_schema_exchange_runs_first() {
        let transport = Arc::new(
            FakeTransport::new()
                .reply(200, &token_json("client-tok"))
                .reply(200, &token_json("tok1")),
        );
        let platform = platform(transport.clone());
        let credentials = Credentials::builder()
            .password("alice", "secret")
            .schema("app", "appuser", "apppw")
            .build()
            .unwrap();
        let mut session = session(&platform, credentials);
        session.set_target_cell(Some("https://b.example/"));

        let outcome = AuthClient::new(&platform).exchange(&session).unwrap();
        assert_eq!(outcome.tokens.access_token(), Some("tok1"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://unit.example/app/__token");
        assert_eq!(
            requests[0].body.as_deref(),
            Some("grant_type=password&username=appuser&password=apppw&p_target=https://unit.example/alice/")
        );
        assert_eq!(requests[1].url, "https://unit.example/alice/__token");
        assert_eq!(
            requests[1].body.as_deref(),
            Some("grant_type=password&username=alice&password=secret&p_target=https://b.example/&client_id=https://unit.example/app/&client_secret=client-tok")
        );
    }

    #[test]
    fn test_failed_schema_exchange_skips_primary() {
        let transport = Arc::new(
            FakeTransport::new()
                .reply(401, r#"{"error":"invalid_grant"}"#)
                .reply(200, &token_json("tok1")),
        );
        let platform = platform(transport.clone());
        let credentials = Credentials::builder()
            .password("alice", "secret")
            .schema("https://app.example", "appuser", "wrong")
            .build()
            .unwrap();

        let result = AuthClient::new(&platform).exchange(&session(&platform, credentials));
        assert!(matches!(
            result,
            Err(ClientError::Auth {
                status: Some(401),
                ..
            })
        ));
        assert_eq!(transport.call_count(), 1);
        assert_eq!(
            transport.requests()[0].url,
            "https://app.example/__token"
        );
    }

    #[test]
    fn test_owner_flag_is_appended_last() {
        let transport = Arc::new(FakeTransport::new().reply(200, &token_json("owner-tok")));
        let platform = platform(transport.clone());
        let session = session(&platform, alice());
        let owner = session.derive_owner_session().unwrap();

        assert_eq!(owner.current_access_token().unwrap(), "owner-tok");
        assert_eq!(
            transport.requests()[0].body.as_deref(),
            Some("grant_type=password&username=alice&password=secret&cell_owner=true")
        );
    }

    #[test]
    fn test_bearer_assertion_is_exchanged_at_audience() {
        let transport = Arc::new(FakeTransport::new().reply(200, &token_json("tok1")));
        let platform = platform(transport.clone());
        let assertion = encode_assertion("https://other.example/bob/");
        let credentials = Credentials::builder()
            .bearer_assertion(&assertion)
            .build()
            .unwrap();

        AuthClient::new(&platform)
            .exchange(&session(&platform, credentials))
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, "https://other.example/bob/__token");
        assert!(requests[0]
            .body
            .as_deref()
            .unwrap()
            .starts_with("grant_type=urn:ietf:params:oauth:grant-type:saml2-bearer&assertion="));
    }

    #[test]
    fn test_undecodable_assertion_fails_without_io() {
        let transport = Arc::new(FakeTransport::new().reply(200, &token_json("tok1")));
        let platform = platform(transport.clone());
        let credentials = Credentials::builder()
            .bearer_assertion("not-an-assertion")
            .build()
            .unwrap();

        let result = AuthClient::new(&platform).exchange(&session(&platform, credentials));
        assert!(matches!(result, Err(ClientError::Auth { .. })));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_failure_kinds() {
        let transport = Arc::new(
            FakeTransport::new()
                .timeout()
                .reply(400, r#"{"error":"invalid_grant","error_description":"bad password"}"#)
                .reply(200, r#"{"token_type":"Bearer"}"#),
        );
        let platform = platform(transport.clone());
        let client = AuthClient::new(&platform);
        let session = session(&platform, alice());

        assert!(matches!(
            client.exchange(&session),
            Err(ClientError::Transport(TransportError::Timeout { .. }))
        ));
        match client.exchange(&session) {
            Err(ClientError::Auth { status, message }) => {
                assert_eq!(status, Some(400));
                assert!(message.contains("bad password"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            client.exchange(&session),
            Err(ClientError::Protocol(_))
        ));
    }

    #[test]
    fn test_describe_error_body() {
        assert_eq!(
            describe_error_body(r#"{"error":"custom","error_description":"details"}"#),
            "custom - details"
        );
        assert_eq!(
            describe_error_body(r#"{"code":"PR401","message":{"lang":"en","value":"Unauthorized"}}"#),
            "Unauthorized"
        );
        assert_eq!(describe_error_body("plain text"), "plain text");
    }
}
