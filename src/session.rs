//! Per-identity session state.
//!
//! A [`SessionContext`] ties credentials, the token they produced and the cell
//! they address together. Sessions are never shared between resource handles;
//! each handle gets its own copy through [`SessionContext::derive_child_session`],
//! so re-authenticating one of them never changes the token another one holds.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::{
    auth::AuthClient,
    cell::{Cell, UnitHandle},
    context::PlatformContext,
    credentials::{CredentialSet, Credentials},
    error::ClientError,
    token::TokenStore,
    transport::{HttpRequest, HttpResponse, Method},
    url_resolver::append,
};

pub const CREDENTIAL_HEADER: &str = "X-Personium-Credential";
pub const PASSWORD_ENDPOINT: &str = "__mypassword";

pub struct SessionContext {
    platform: PlatformContext,
    cell: String,
    target_cell: Option<String>,
    credentials: Arc<Credentials>,
    tokens: TokenStore,
    owner: bool,
    response_headers: HashMap<String, String>,
}

impl SessionContext {
    /// Creates an unauthenticated session for `cell`.
    ///
    /// Sessions built from a pre-issued token start out holding that token.
    pub fn new(platform: &PlatformContext, cell: &str, credentials: Credentials) -> Self {
        let tokens = match credentials.primary() {
            CredentialSet::PreIssuedToken { token } => TokenStore::pre_issued(token.as_str()),
            _ => TokenStore::empty(),
        };

        Self {
            platform: platform.clone(),
            cell: cell.to_string(),
            target_cell: None,
            credentials: Arc::new(credentials),
            tokens,
            owner: false,
            response_headers: HashMap::new(),
        }
    }

    pub fn platform(&self) -> &PlatformContext {
        &self.platform
    }

    /// The cell the session authenticates at, as given by the caller
    pub fn cell_name(&self) -> &str {
        &self.cell
    }

    /// URL of the session's own cell, ending with `/`
    pub fn cell_url(&self) -> Result<String, ClientError> {
        Ok(self.platform.resolver().tenant_url(&self.cell)?)
    }

    /// The cell the issued token is scoped to, when it is not the session's own cell
    pub fn target_cell(&self) -> Option<&str> {
        self.target_cell.as_deref()
    }

    pub fn set_target_cell(&mut self, target: Option<&str>) {
        self.target_cell = target.map(str::to_string);
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Swaps in new credentials, e.g. a refresh token, keeping the current token
    /// until the next [`SessionContext::authenticate`].
    pub fn replace_credentials(&mut self, credentials: Credentials) {
        self.credentials = Arc::new(credentials);
    }

    pub fn is_owner(&self) -> bool {
        self.owner
    }

    pub fn is_token_only(&self) -> bool {
        self.credentials.is_token_only()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Exchanges the credentials for a fresh token.
    ///
    /// Always performs the exchange, even if a token is already held. On any
    /// failure the current token is left untouched. Token-only sessions
    /// return immediately.
    pub fn authenticate(&mut self) -> Result<(), ClientError> {
        if self.is_token_only() {
            trace!("Session for {} uses a pre-issued token", self.cell);
            return Ok(());
        }

        let outcome = AuthClient::new(&self.platform).exchange(self)?;
        self.tokens = outcome.tokens;
        self.record_response_headers(&outcome.response_headers);
        Ok(())
    }

    /// Authenticates only when no token is held yet
    pub fn reauthenticate_if_needed(&mut self) -> Result<(), ClientError> {
        if self.is_token_only() || self.tokens.is_authenticated() {
            return Ok(());
        }
        self.authenticate()
    }

    /// An independent session with the same identity.
    ///
    /// Credentials and the platform context are shared, the token is copied.
    pub fn derive_child_session(&self) -> SessionContext {
        SessionContext {
            platform: self.platform.clone(),
            cell: self.cell.clone(),
            target_cell: self.target_cell.clone(),
            credentials: Arc::clone(&self.credentials),
            tokens: self.tokens.clone(),
            owner: self.owner,
            response_headers: HashMap::new(),
        }
    }

    /// A copy of this session promoted to cell owner.
    ///
    /// The promoted session authenticates before it is returned, so its token
    /// already carries owner scope.
    pub fn derive_owner_session(&self) -> Result<SessionContext, ClientError> {
        let mut owner = self.derive_child_session();
        owner.owner = true;
        owner.authenticate()?;
        debug!("Session for {} promoted to cell owner", owner.cell);
        Ok(owner)
    }

    /// Unit-level operations, available to owner sessions only
    pub fn unit(&self) -> Result<UnitHandle, ClientError> {
        if !self.owner {
            return Err(ClientError::auth(
                Some(403),
                "unit operations require a session promoted to cell owner",
            ));
        }
        Ok(UnitHandle::new(self.derive_child_session()))
    }

    /// Opens the session's own cell
    pub fn own_cell(&mut self) -> Result<Cell, ClientError> {
        let cell = self.cell.clone();
        self.cell(&cell)
    }

    /// Opens `identifier`, scoping the token to it when it is another cell.
    ///
    /// Owner sessions were authenticated at promotion and are not
    /// re-authenticated here. When the exchange fails the previous target
    /// is kept, so it still matches the token held.
    pub fn cell(&mut self, identifier: &str) -> Result<Cell, ClientError> {
        let resolver = self.platform.resolver();
        let target = if resolver.tenant_url(identifier)? == resolver.tenant_url(&self.cell)? {
            None
        } else {
            Some(identifier.to_string())
        };

        let previous = std::mem::replace(&mut self.target_cell, target);
        if !self.owner {
            if let Err(e) = self.authenticate() {
                self.target_cell = previous;
                return Err(e);
            }
        }

        Cell::new(self.derive_child_session(), identifier)
    }

    /// Changes the password of the authenticated account.
    ///
    /// On success the session's credentials are replaced with ones carrying
    /// the new password, so later authentications keep working.
    pub fn change_password(&mut self, new_password: &str) -> Result<(), ClientError> {
        self.reauthenticate_if_needed()?;

        let url = append(&self.cell_url()?, PASSWORD_ENDPOINT);
        let request = self
            .authorized_request(Method::PUT, &url)?
            .header(CREDENTIAL_HEADER, new_password);
        let response = self.send(request)?;
        if !response.is_success() {
            return Err(ClientError::Api {
                status: response.status,
                message: crate::auth::describe_error_body(&response.body),
            });
        }

        self.credentials = Arc::new(self.credentials.with_password(new_password));
        debug!("Password changed for cell {}", self.cell);
        Ok(())
    }

    /// The current access token; fails before any request is made when none is held
    pub fn current_access_token(&self) -> Result<&str, ClientError> {
        self.tokens
            .access_token()
            .ok_or_else(ClientError::unauthorized)
    }

    pub fn current_base_url(&self) -> &str {
        self.platform.base_url()
    }

    pub fn default_headers(&self) -> BTreeMap<String, String> {
        self.platform.default_headers()
    }

    /// Headers of the last response this session received
    pub fn response_headers(&self) -> &HashMap<String, String> {
        &self.response_headers
    }

    /// Remembers the headers of a response and picks up the server version
    pub fn record_response_headers(&mut self, headers: &HashMap<String, String>) {
        self.platform.note_response_headers(headers);
        self.response_headers = headers.clone();
    }

    /// A request carrying the bearer token and the default headers
    pub fn authorized_request(&self, method: Method, url: &str) -> Result<HttpRequest, ClientError> {
        let token = self.current_access_token()?;
        let mut request =
            HttpRequest::new(method, url).header("Authorization", format!("Bearer {}", token));
        for (name, value) in self.default_headers() {
            request = request.header(name, value);
        }
        Ok(request)
    }

    /// Sends a request through the platform transport and records the response headers
    pub fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let response = self.platform.transport().send(request)?;
        self.record_response_headers(&response.headers);
        Ok(response)
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("cell", &self.cell)
            .field("target_cell", &self.target_cell)
            .field("credentials", &self.credentials)
            .field("authenticated", &self.tokens.is_authenticated())
            .field("owner", &self.owner)
            .finish()
    }
}
