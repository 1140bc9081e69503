//! Authentication inputs of a session.
//!
//! A session authenticates with exactly one primary [`CredentialSet`],
//! optionally accompanied by a [`SchemaCredential`] that identifies the
//! calling application. [`CredentialsBuilder`] rejects ambiguous combinations
//! when the credentials are built, so the grant shape never has to be guessed
//! from which fields happen to be filled in.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;
use thiserror::Error;

use crate::error::ClientError;

pub const GRANT_TYPE_SAML2_BEARER: &str = "urn:ietf:params:oauth:grant-type:saml2-bearer";
pub const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";
pub const GRANT_TYPE_PASSWORD: &str = "password";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{existing} credentials are already set, cannot also use {requested}")]
    Ambiguous {
        existing: &'static str,
        requested: &'static str,
    },
    #[error("a schema credential requires a grant that is exchanged, not a pre-issued token")]
    SchemaWithoutExchange,
    #[error("{0} must not be empty")]
    EmptyValue(&'static str),
}

/// The primary grant shape of a session
#[derive(Clone, PartialEq, Eq, Default)]
pub enum CredentialSet {
    #[default]
    None,
    Password {
        user_id: String,
        password: String,
    },
    /// A trans-cell token issued by another cell
    BearerAssertion {
        assertion: String,
    },
    RefreshToken {
        token: String,
    },
    /// A token obtained elsewhere; the session never exchanges it
    PreIssuedToken {
        token: String,
    },
}

impl CredentialSet {
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialSet::None => "no",
            CredentialSet::Password { .. } => "password",
            CredentialSet::BearerAssertion { .. } => "bearer assertion",
            CredentialSet::RefreshToken { .. } => "refresh token",
            CredentialSet::PreIssuedToken { .. } => "pre-issued token",
        }
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSet::Password { user_id, .. } => f
                .debug_struct("Password")
                .field("user_id", user_id)
                .field("password", &"***")
                .finish(),
            other => write!(f, "CredentialSet({})", other.kind()),
        }
    }
}

/// Account on the schema cell that identifies the calling application
#[derive(Clone, PartialEq, Eq)]
pub struct SchemaCredential {
    pub schema_cell_url: String,
    pub schema_user_id: String,
    pub schema_password: String,
}

impl fmt::Debug for SchemaCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCredential")
            .field("schema_cell_url", &self.schema_cell_url)
            .field("schema_user_id", &self.schema_user_id)
            .field("schema_password", &"***")
            .finish()
    }
}

impl SchemaCredential {
    /// Form body of the password grant against the schema cell
    pub fn grant_body(&self, own_cell_url: &str) -> GrantBody {
        let mut body = GrantBody::new();
        body.push("grant_type", GRANT_TYPE_PASSWORD);
        body.push("username", &self.schema_user_id);
        body.push("password", &self.schema_password);
        body.push("p_target", own_cell_url);
        body
    }
}

/// Validated, immutable authentication inputs.
///
/// Only [`CredentialsBuilder`] creates values of this type; changing
/// credentials means building a new value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    primary: CredentialSet,
    schema: Option<SchemaCredential>,
}

impl Credentials {
    pub fn builder() -> CredentialsBuilder {
        CredentialsBuilder::default()
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> &CredentialSet {
        &self.primary
    }

    pub fn schema(&self) -> Option<&SchemaCredential> {
        self.schema.as_ref()
    }

    pub fn is_token_only(&self) -> bool {
        matches!(self.primary, CredentialSet::PreIssuedToken { .. })
    }

    pub fn bearer_assertion(&self) -> Option<&str> {
        match &self.primary {
            CredentialSet::BearerAssertion { assertion } => Some(assertion),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.primary {
            CredentialSet::Password { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    /// A copy of these credentials with the password replaced.
    ///
    /// Credentials without a password grant are returned unchanged.
    pub fn with_password(&self, new_password: &str) -> Self {
        let primary = match &self.primary {
            CredentialSet::Password { user_id, .. } => CredentialSet::Password {
                user_id: user_id.clone(),
                password: new_password.to_string(),
            },
            other => other.clone(),
        };
        Self {
            primary,
            schema: self.schema.clone(),
        }
    }

    /// Builds the primary part of the grant body.
    ///
    /// The grant comes first, followed by `p_target` when the token is to be
    /// scoped to another cell. Client credentials and owner promotion are
    /// appended by the auth client, since they depend on a nested exchange.
    pub fn build_grant_body(&self, target_cell_url: Option<&str>) -> Result<GrantBody, ClientError> {
        let mut body = GrantBody::new();
        match &self.primary {
            CredentialSet::BearerAssertion { assertion } => {
                body.push("grant_type", GRANT_TYPE_SAML2_BEARER);
                body.push("assertion", assertion);
            }
            CredentialSet::RefreshToken { token } => {
                body.push("grant_type", GRANT_TYPE_REFRESH_TOKEN);
                body.push("refresh_token", token);
            }
            CredentialSet::Password { user_id, password } => {
                body.push("grant_type", GRANT_TYPE_PASSWORD);
                body.push("username", user_id);
                body.push("password", password);
            }
            CredentialSet::None | CredentialSet::PreIssuedToken { .. } => {
                return Err(ClientError::auth(
                    None,
                    format!(
                        "{} credentials cannot be exchanged for a token",
                        self.primary.kind()
                    ),
                ));
            }
        }

        if let Some(target) = target_cell_url {
            body.push("p_target", target);
        }

        Ok(body)
    }
}

/// Builder for [`Credentials`]; every setter after the first primary one fails.
#[derive(Debug, Default)]
pub struct CredentialsBuilder {
    primary: CredentialSet,
    schema: Option<SchemaCredential>,
    error: Option<CredentialError>,
}

impl CredentialsBuilder {
    fn set_primary(mut self, primary: CredentialSet) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.primary != CredentialSet::None {
            self.error = Some(CredentialError::Ambiguous {
                existing: self.primary.kind(),
                requested: primary.kind(),
            });
            return self;
        }
        self.primary = primary;
        self
    }

    pub fn password(self, user_id: &str, password: &str) -> Self {
        self.set_primary(CredentialSet::Password {
            user_id: user_id.to_string(),
            password: password.to_string(),
        })
    }

    pub fn bearer_assertion(self, assertion: &str) -> Self {
        self.set_primary(CredentialSet::BearerAssertion {
            assertion: assertion.to_string(),
        })
    }

    pub fn refresh_token(self, token: &str) -> Self {
        self.set_primary(CredentialSet::RefreshToken {
            token: token.to_string(),
        })
    }

    pub fn pre_issued_token(self, token: &str) -> Self {
        self.set_primary(CredentialSet::PreIssuedToken {
            token: token.to_string(),
        })
    }

    pub fn schema(mut self, schema_cell_url: &str, user_id: &str, password: &str) -> Self {
        self.schema = Some(SchemaCredential {
            schema_cell_url: schema_cell_url.to_string(),
            schema_user_id: user_id.to_string(),
            schema_password: password.to_string(),
        });
        self
    }

    /// Forgets the primary credential so another one can be set
    pub fn clear_primary(mut self) -> Self {
        self.primary = CredentialSet::None;
        self.error = None;
        self
    }

    pub fn build(self) -> Result<Credentials, CredentialError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        match &self.primary {
            CredentialSet::Password { user_id, .. } if user_id.is_empty() => {
                return Err(CredentialError::EmptyValue("user id"))
            }
            CredentialSet::BearerAssertion { assertion } if assertion.is_empty() => {
                return Err(CredentialError::EmptyValue("bearer assertion"))
            }
            CredentialSet::RefreshToken { token } if token.is_empty() => {
                return Err(CredentialError::EmptyValue("refresh token"))
            }
            _ => {}
        }

        if let Some(schema) = &self.schema {
            if self.primary_is_pre_issued() {
                return Err(CredentialError::SchemaWithoutExchange);
            }
            if schema.schema_cell_url.is_empty() {
                return Err(CredentialError::EmptyValue("schema cell URL"));
            }
        }

        Ok(Credentials {
            primary: self.primary,
            schema: self.schema,
        })
    }

    fn primary_is_pre_issued(&self) -> bool {
        matches!(self.primary, CredentialSet::PreIssuedToken { .. })
    }
}

/// Characters that would change the structure of a form body
const FORM_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'%')
    .add(b'&')
    .add(b'=')
    .add(b'+')
    .add(b'#');

/// An ordered `application/x-www-form-urlencoded` body.
///
/// Values keep URL characters such as `:` and `/` as they are. Only
/// characters that would change the form structure are escaped.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct GrantBody {
    pairs: Vec<(&'static str, String)>,
}

impl GrantBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &'static str, value: &str) {
        self.pairs.push((key, value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.pairs.iter().map(|(k, _)| *k).collect()
    }

    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(value, FORM_VALUE)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for GrantBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for GrantBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // keys only, values are secrets
        f.debug_struct("GrantBody").field("keys", &self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Credentials {
        Credentials::builder()
            .password("alice", "secret")
            .build()
            .unwrap()
    }

    #[test]
    fn test_password_grant_body() {
        assert_eq!(
            alice().build_grant_body(None).unwrap().encode(),
            "grant_type=password&username=alice&password=secret"
        );
    }

    #[test]
    fn test_password_grant_body_with_target() {
        assert_eq!(
            alice()
                .build_grant_body(Some("https://b.example/"))
                .unwrap()
                .encode(),
            "grant_type=password&username=alice&password=secret&p_target=https://b.example/"
        );
    }

    #[test]
    fn test_bearer_and_refresh_grant_bodies() {
        let bearer = Credentials::builder()
            .bearer_assertion("PHNhbWw+")
            .build()
            .unwrap();
        assert_eq!(
            bearer.build_grant_body(None).unwrap().encode(),
            "grant_type=urn:ietf:params:oauth:grant-type:saml2-bearer&assertion=PHNhbWw%2B"
        );

        let refresh = Credentials::builder().refresh_token("ref1").build().unwrap();
        assert_eq!(
            refresh.build_grant_body(None).unwrap().encode(),
            "grant_type=refresh_token&refresh_token=ref1"
        );
    }

    #[test]
    fn test_second_primary_credential_fails_fast() {
        let result = Credentials::builder()
            .password("alice", "secret")
            .refresh_token("ref1")
            .build();
        assert_eq!(
            result,
            Err(CredentialError::Ambiguous {
                existing: "password",
                requested: "refresh token",
            })
        );

        let result = Credentials::builder()
            .bearer_assertion("a")
            .password("alice", "secret")
            .pre_issued_token("t")
            .build();
        assert!(matches!(result, Err(CredentialError::Ambiguous { .. })));
    }

    #[test]
    fn test_clear_primary_allows_replacement() {
        let credentials = Credentials::builder()
            .password("alice", "secret")
            .clear_primary()
            .refresh_token("ref1")
            .build()
            .unwrap();
        assert_eq!(
            credentials.primary(),
            &CredentialSet::RefreshToken {
                token: "ref1".to_string()
            }
        );
    }

    #[test]
    fn test_schema_with_pre_issued_token_is_rejected() {
        let result = Credentials::builder()
            .pre_issued_token("t")
            .schema("https://app.example/", "app", "pw")
            .build();
        assert_eq!(result, Err(CredentialError::SchemaWithoutExchange));
    }

    #[test]
    fn test_empty_values_are_rejected() {
        assert_eq!(
            Credentials::builder().password("", "pw").build(),
            Err(CredentialError::EmptyValue("user id"))
        );
        assert_eq!(
            Credentials::builder().refresh_token("").build(),
            Err(CredentialError::EmptyValue("refresh token"))
        );
    }

    #[test]
    fn test_no_credentials_cannot_be_exchanged() {
        assert!(matches!(
            Credentials::none().build_grant_body(None),
            Err(ClientError::Auth { status: None, .. })
        ));
        let token_only = Credentials::builder().pre_issued_token("t").build().unwrap();
        assert!(token_only.is_token_only());
        assert!(token_only.build_grant_body(None).is_err());
    }

    #[test]
    fn test_schema_grant_body() {
        let schema = SchemaCredential {
            schema_cell_url: "https://app.example/".to_string(),
            schema_user_id: "app".to_string(),
            schema_password: "apppw".to_string(),
        };
        assert_eq!(
            schema.grant_body("https://unit.example/alice/").encode(),
            "grant_type=password&username=app&password=apppw&p_target=https://unit.example/alice/"
        );
    }

    #[test]
    fn test_with_password_keeps_other_fields() {
        let credentials = Credentials::builder()
            .password("alice", "old")
            .schema("https://app.example/", "app", "pw")
            .build()
            .unwrap();
        let updated = credentials.with_password("new");

        assert_eq!(
            updated.primary(),
            &CredentialSet::Password {
                user_id: "alice".to_string(),
                password: "new".to_string()
            }
        );
        assert_eq!(updated.schema(), credentials.schema());
    }

    #[test]
    fn test_form_structure_characters_are_escaped() {
        let credentials = Credentials::builder()
            .password("alice", "p&ss=w0rd +#%")
            .build()
            .unwrap();
        assert_eq!(
            credentials.build_grant_body(None).unwrap().encode(),
            "grant_type=password&username=alice&password=p%26ss%3Dw0rd%20%2B%23%25"
        );
    }

    #[test]
    fn test_non_ascii_values_are_utf8_escaped() {
        let credentials = Credentials::builder()
            .password("jürgen", "pa\tss")
            .build()
            .unwrap();
        assert_eq!(
            credentials
                .build_grant_body(Some("https://b.example/"))
                .unwrap()
                .encode(),
            "grant_type=password&username=j%C3%BCrgen&password=pa%09ss&p_target=https://b.example/"
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let rendered = format!("{:?}", alice());
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret"));
    }
}
