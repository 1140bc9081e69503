use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Grant response returned by a cell's `__token` endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_token_expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Token state of one session.
///
/// A store is replaced as a whole after every successful exchange and copied
/// by value into derived sessions; it is never merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenStore {
    access_token: Option<String>,
    expires_in: u64,
    refresh_token: Option<String>,
    refresh_expires_in: u64,
    token_type: Option<String>,
}

impl TokenStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A store holding a token obtained elsewhere, with no refresh information
    pub fn pre_issued(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Builds a store from a grant response body.
    ///
    /// Fails with [`ClientError::Protocol`] when the body is not JSON or lacks
    /// `access_token`. Optional fields missing from the response are reset,
    /// not inherited.
    pub fn from_grant_response(body: &str) -> Result<Self, ClientError> {
        let response: TokenResponse = serde_json::from_str(body)
            .map_err(|e| ClientError::Protocol(format!("unreadable grant response: {}", e)))?;
        let access_token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ClientError::Protocol("grant response is missing access_token".to_string())
            })?;

        Ok(Self {
            access_token: Some(access_token),
            expires_in: response.expires_in.unwrap_or_default(),
            refresh_token: response.refresh_token,
            refresh_expires_in: response.refresh_token_expires_in.unwrap_or_default(),
            token_type: response.token_type,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn refresh_expires_in(&self) -> u64 {
        self.refresh_expires_in
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }
}
