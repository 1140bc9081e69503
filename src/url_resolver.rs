//! Cell addressing.
//!
//! A cell can be addressed either as a path segment under the unit URL
//! (`https://unit.example/alice`) or as a subdomain of the unit host
//! (`https://alice.unit.example`). [`UrlResolver`] maps a cell name to its URL
//! under one of these policies and back.

use crate::configuration::ConfigurationError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::trace;
use url::Url;

/// How cell names are turned into cell URLs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AddressingPolicy {
    /// `https://unit.example/<cell>`
    #[default]
    Path,
    /// `https://<cell>.unit.example`
    Subdomain,
}

impl AddressingPolicy {
    pub fn names() -> Vec<&'static str> {
        use strum::IntoEnumIterator;
        AddressingPolicy::iter().map(<&'static str>::from).collect()
    }
}

/// Returns true when `value` is an absolute http(s) URL rather than a cell name.
pub fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Joins `segment` onto `base` with exactly one slash between them.
pub fn append(base: &str, segment: &str) -> String {
    let segment = segment.trim_start_matches('/');
    if base.ends_with('/') {
        format!("{}{}", base, segment)
    } else {
        format!("{}/{}", base, segment)
    }
}

/// Ensures the URL ends with a single `/`.
pub fn with_trailing_slash(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    base_url: String,
    host: String,
    policy: AddressingPolicy,
}

impl UrlResolver {
    /// Creates a resolver for the given unit URL.
    ///
    /// The base URL is normalized to end with `/`. A URL that does not parse or
    /// has no host is rejected, since neither policy can address a cell under it.
    pub fn new(base_url: &str, policy: AddressingPolicy) -> Result<Self, ConfigurationError> {
        let parsed = Url::parse(base_url).map_err(|cause| ConfigurationError::MalformedUrl {
            url: base_url.to_string(),
            cause: cause.to_string(),
        })?;
        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => {
                return Err(ConfigurationError::MissingHost {
                    url: base_url.to_string(),
                })
            }
        };

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            host,
            policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> AddressingPolicy {
        self.policy
    }

    /// Resolves a cell name to its URL. Absolute URLs are returned unchanged.
    ///
    /// The returned URL carries no trailing slash; use [`UrlResolver::tenant_url`]
    /// for the form sent over the wire.
    pub fn resolve(&self, identifier: &str) -> Result<String, ConfigurationError> {
        if is_url(identifier) {
            return Ok(identifier.to_string());
        }

        let url = match self.policy {
            AddressingPolicy::Path => append(&self.base_url, identifier)
                .trim_end_matches('/')
                .to_string(),
            AddressingPolicy::Subdomain => {
                let mut url = Url::parse(&self.base_url).map_err(|cause| {
                    ConfigurationError::MalformedUrl {
                        url: self.base_url.clone(),
                        cause: cause.to_string(),
                    }
                })?;
                let host = format!("{}.{}", identifier, self.host);
                url.set_host(Some(&host))
                    .map_err(|cause| ConfigurationError::MalformedUrl {
                        url: host.clone(),
                        cause: cause.to_string(),
                    })?;
                url.as_str().trim_end_matches('/').to_string()
            }
        };

        trace!("Resolved cell {} to {}", identifier, url);
        Ok(url)
    }

    /// Resolves a cell and normalizes the result to end with `/`.
    pub fn tenant_url(&self, identifier: &str) -> Result<String, ConfigurationError> {
        Ok(with_trailing_slash(&self.resolve(identifier)?))
    }

    /// Extracts the cell name from a cell URL. Names are returned unchanged.
    pub fn extract_identifier(&self, value: &str) -> Result<String, ConfigurationError> {
        if !is_url(value) {
            return Ok(value.to_string());
        }

        let url = Url::parse(value).map_err(|cause| ConfigurationError::MalformedUrl {
            url: value.to_string(),
            cause: cause.to_string(),
        })?;
        let host = url.host_str().unwrap_or_default();

        if let Some(name) = self.extract_under_base(value, host) {
            return Ok(name);
        }

        match url.path_segments().and_then(|mut s| s.find(|s| !s.is_empty())) {
            Some(segment) => Ok(segment.to_string()),
            None => match host.split('.').next() {
                Some(label) if !label.is_empty() => Ok(label.to_string()),
                _ => Err(ConfigurationError::MissingHost {
                    url: value.to_string(),
                }),
            },
        }
    }

    fn extract_under_base(&self, value: &str, host: &str) -> Option<String> {
        match self.policy {
            AddressingPolicy::Path => value
                .strip_prefix(self.base_url.as_str())
                .and_then(|rest| rest.split('/').find(|s| !s.is_empty()))
                .map(str::to_string),
            AddressingPolicy::Subdomain => host
                .strip_suffix(self.host.as_str())
                .and_then(|prefix| prefix.strip_suffix('.'))
                .filter(|label| !label.is_empty() && !label.contains('.'))
                .map(str::to_string),
        }
    }
}
