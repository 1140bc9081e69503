//! Platform context for the Personium client.
//!
//! A [`PlatformContext`] is created once per unit from a [`Configuration`]. It
//! owns everything that sessions share: the URL resolver, the transport, the
//! default request headers and the server version reported by the unit.
//! Sessions are created from it with one of the `as_*` / `with_*` factories.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::{
    configuration::Configuration,
    credentials::Credentials,
    error::ClientError,
    session::SessionContext,
    transport::{HttpTransport, ReqwestTransport, TransportConfig},
    url_resolver::UrlResolver,
};

/// Header carrying the platform API version, in both directions
pub const PERSONIUM_VERSION: &str = "X-Personium-Version";

struct PlatformInner {
    resolver: UrlResolver,
    transport: Arc<dyn HttpTransport>,
    default_headers: RwLock<BTreeMap<String, String>>,
    server_version: RwLock<Option<String>>,
}

/// Shared, cheaply cloneable handle to the unit a client talks to.
///
/// Default headers are shared: a header set through any clone is sent by
/// every session created from this context, including already derived ones.
#[derive(Clone)]
pub struct PlatformContext {
    inner: Arc<PlatformInner>,
}

impl PlatformContext {
    /// Creates a context with the default `reqwest` transport
    pub fn new(configuration: &Configuration) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(&TransportConfig::from_configuration(configuration))?;
        Self::with_transport(configuration, Arc::new(transport))
    }

    /// Creates a context that sends every request through `transport`
    pub fn with_transport(
        configuration: &Configuration,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ClientError> {
        let resolver = UrlResolver::new(configuration.base_url(), configuration.addressing())?;

        let mut default_headers = configuration.default_headers().clone();
        if let Some(version) = configuration.personium_version() {
            default_headers.insert(PERSONIUM_VERSION.to_string(), version.to_string());
        }

        debug!(
            "Platform context for {} ({} addressing)",
            resolver.base_url(),
            resolver.policy()
        );

        Ok(Self {
            inner: Arc::new(PlatformInner {
                resolver,
                transport,
                default_headers: RwLock::new(default_headers),
                server_version: RwLock::new(None),
            }),
        })
    }

    pub fn resolver(&self) -> &UrlResolver {
        &self.inner.resolver
    }

    pub fn base_url(&self) -> &str {
        self.inner.resolver.base_url()
    }

    pub(crate) fn transport(&self) -> &dyn HttpTransport {
        self.inner.transport.as_ref()
    }

    /// Snapshot of the headers currently added to every request
    pub fn default_headers(&self) -> BTreeMap<String, String> {
        self.inner.default_headers.read().clone()
    }

    pub fn set_default_header(&self, name: &str, value: &str) {
        self.inner
            .default_headers
            .write()
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_default_header(&self, name: &str) {
        self.inner.default_headers.write().remove(name);
    }

    /// Requests a specific API version; forgets the version last reported by the server
    pub fn set_personium_version(&self, version: &str) {
        self.set_default_header(PERSONIUM_VERSION, version);
        *self.inner.server_version.write() = None;
    }

    pub fn personium_version(&self) -> Option<String> {
        self.inner.default_headers.read().get(PERSONIUM_VERSION).cloned()
    }

    /// API version reported by the server in its last response
    pub fn server_version(&self) -> Option<String> {
        self.inner.server_version.read().clone()
    }

    pub(crate) fn note_response_headers(&self, headers: &HashMap<String, String>) {
        if let Some((_, version)) = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(PERSONIUM_VERSION))
        {
            *self.inner.server_version.write() = Some(version.clone());
        }
    }

    /// Session authenticating with the given credentials at `cell`
    pub fn session(&self, cell: &str, credentials: Credentials) -> SessionContext {
        SessionContext::new(self, cell, credentials)
    }

    pub fn as_account(
        &self,
        cell: &str,
        user_id: &str,
        password: &str,
    ) -> Result<SessionContext, ClientError> {
        let credentials = Credentials::builder().password(user_id, password).build()?;
        Ok(self.session(cell, credentials))
    }

    pub fn as_account_with_schema_authn(
        &self,
        cell: &str,
        user_id: &str,
        password: &str,
        schema_url: &str,
        schema_user_id: &str,
        schema_password: &str,
    ) -> Result<SessionContext, ClientError> {
        let credentials = Credentials::builder()
            .password(user_id, password)
            .schema(schema_url, schema_user_id, schema_password)
            .build()?;
        Ok(self.session(cell, credentials))
    }

    pub fn with_transcell_token(
        &self,
        cell: &str,
        token: &str,
    ) -> Result<SessionContext, ClientError> {
        let credentials = Credentials::builder().bearer_assertion(token).build()?;
        Ok(self.session(cell, credentials))
    }

    pub fn with_transcell_token_and_schema_authn(
        &self,
        cell: &str,
        token: &str,
        schema_url: &str,
        schema_user_id: &str,
        schema_password: &str,
    ) -> Result<SessionContext, ClientError> {
        let credentials = Credentials::builder()
            .bearer_assertion(token)
            .schema(schema_url, schema_user_id, schema_password)
            .build()?;
        Ok(self.session(cell, credentials))
    }

    pub fn with_refresh_token(
        &self,
        cell: &str,
        token: &str,
    ) -> Result<SessionContext, ClientError> {
        let credentials = Credentials::builder().refresh_token(token).build()?;
        Ok(self.session(cell, credentials))
    }

    /// Session using a token obtained elsewhere; it never authenticates
    pub fn with_token(&self, cell: &str, token: &str) -> Result<SessionContext, ClientError> {
        let credentials = Credentials::builder().pre_issued_token(token).build()?;
        Ok(self.session(cell, credentials))
    }
}

impl std::fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformContext")
            .field("resolver", &self.inner.resolver)
            .field("default_headers", &self.default_headers().keys())
            .field("server_version", &self.server_version())
            .finish()
    }
}
