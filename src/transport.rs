//! HTTP transport for the Personium client.
//!
//! Sessions never talk to `reqwest` directly. Every request goes through the
//! [`HttpTransport`] trait so the blocking client can be swapped out, e.g. for
//! a recording fake in tests. [`ReqwestTransport`] is the default implementation.

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
pub use reqwest::Method;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

use crate::configuration::Configuration;

pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const USER_AGENT: &str = concat!("personium-client/", env!("CARGO_PKG_VERSION"));

/// Failure reported by a transport before any HTTP response was received
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A blocking HTTP client.
///
/// Implementations must not retry on their own and must report timeouts and
/// connection failures as [`TransportError`], never as a response.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Settings used to build the default transport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportConfig {
    /// `None` disables the timeout
    pub timeout: Option<Duration>,
    /// Accept self-signed and otherwise invalid server certificates
    pub insecure: bool,
}

impl TransportConfig {
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self {
            timeout: configuration.connection_timeout(),
            insecure: configuration.insecure(),
        }
    }
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .redirect(Policy::none())
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let map_error = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout {
                    url: request.url.clone(),
                }
            } else {
                TransportError::Request {
                    url: request.url.clone(),
                    message: e.to_string(),
                }
            }
        };

        let response = builder.send().map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().map_err(map_error)?;

        debug!("Response status: {}", status);
        trace!("Response body of {} bytes", body.len());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::new(Method::POST, "https://unit.example/alice/__token")
            .header("Content-Type", CONTENT_TYPE_FORM)
            .body("grant_type=password");

        assert_eq!(request.header_value("content-type"), Some(CONTENT_TYPE_FORM));
        assert_eq!(request.body.as_deref(), Some("grant_type=password"));
        assert_eq!(request.method.to_string(), "POST");
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(401, "").is_success());
    }

    #[test]
    fn test_transport_config_from_configuration() {
        let mut configuration = Configuration::default();
        configuration.set_connection_timeout(20);
        configuration.set_insecure(true);

        let config = TransportConfig::from_configuration(&configuration);
        assert_eq!(config.timeout, Some(Duration::from_secs(20)));
        assert!(config.insecure);
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(&TransportConfig::default()).is_ok());
    }
}
