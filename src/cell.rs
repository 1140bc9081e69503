//! Cell handles and the resource handles hanging off them.
//!
//! A [`Cell`] is what callers get back from [`SessionContext::cell`]. It holds
//! its own derived session, and every [`ResourceHandle`] it hands out derives
//! another one, so no two handles ever share a token store.

use serde_json::Value;
use strum::{Display, EnumIter};
use tracing::trace;

use crate::{
    error::ClientError,
    session::SessionContext,
    transport::{HttpRequest, Method},
    url_resolver::{append, with_trailing_slash},
};

/// The kinds of resources addressable below a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ResourceKind {
    Account,
    Box,
    Role,
    Relation,
    ExtCell,
    ExtRole,
    Acl,
    Event,
    CurrentLog,
    ArchiveLog,
}

impl ResourceKind {
    /// Path of the resource relative to the cell URL
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Account => "__ctl/Account",
            ResourceKind::Box => "__ctl/Box",
            ResourceKind::Role => "__ctl/Role",
            ResourceKind::Relation => "__ctl/Relation",
            ResourceKind::ExtCell => "__ctl/ExtCell",
            ResourceKind::ExtRole => "__ctl/ExtRole",
            // ACLs are set on the cell root itself
            ResourceKind::Acl => "",
            ResourceKind::Event => "__event",
            ResourceKind::CurrentLog => "__log/current",
            ResourceKind::ArchiveLog => "__log/archive",
        }
    }
}

#[derive(Debug)]
pub struct Cell {
    name: String,
    url: String,
    location: Option<String>,
    session: SessionContext,
}

impl Cell {
    /// Opens a cell by name or URL with an already prepared session
    pub fn new(session: SessionContext, identifier: &str) -> Result<Self, ClientError> {
        let resolver = session.platform().resolver();
        let name = resolver.extract_identifier(identifier)?;
        let url = resolver.tenant_url(identifier)?;
        trace!("Opened cell {} at {}", name, url);

        Ok(Self {
            name,
            url,
            location: None,
            session,
        })
    }

    /// Builds a cell from a server entity, either bare or wrapped in `d.results`
    pub fn from_json(session: SessionContext, json: &Value) -> Result<Self, ClientError> {
        let entity = json
            .get("d")
            .and_then(|d| d.get("results"))
            .unwrap_or(json);

        let name = entity
            .get("Name")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Protocol("cell entity has no Name".to_string()))?;
        let location = entity
            .get("__metadata")
            .and_then(|m| m.get("uri"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut cell = Self::new(session, name)?;
        cell.location = location;
        Ok(cell)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cell URL, always ending with `/`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Entity URI reported by the server, when the cell came from a payload
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn access_token(&self) -> Result<&str, ClientError> {
        self.session.current_access_token()
    }

    pub fn refresh_token(&self) -> Result<&str, ClientError> {
        self.session
            .tokens()
            .refresh_token()
            .ok_or_else(ClientError::unauthorized)
    }

    pub fn expires_in(&self) -> u64 {
        self.session.tokens().expires_in()
    }

    pub fn refresh_expires_in(&self) -> u64 {
        self.session.tokens().refresh_expires_in()
    }

    pub fn token_type(&self) -> Option<&str> {
        self.session.tokens().token_type()
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionContext {
        &mut self.session
    }

    /// A handle on one kind of resource of this cell, with its own session
    pub fn resource(&self, kind: ResourceKind) -> ResourceHandle {
        ResourceHandle {
            kind,
            url: append(&self.url, kind.path()),
            session: self.session.derive_child_session(),
        }
    }
}

#[derive(Debug)]
pub struct ResourceHandle {
    kind: ResourceKind,
    url: String,
    session: SessionContext,
}

impl ResourceHandle {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Authorized request against the resource URL
    pub fn request(&self, method: Method) -> Result<HttpRequest, ClientError> {
        self.session.authorized_request(method, &self.url)
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionContext {
        &mut self.session
    }
}

/// Unit-level operations, handed out only to owner sessions
#[derive(Debug)]
pub struct UnitHandle {
    session: SessionContext,
}

impl UnitHandle {
    pub(crate) fn new(session: SessionContext) -> Self {
        Self { session }
    }

    pub fn base_url(&self) -> String {
        with_trailing_slash(self.session.current_base_url())
    }

    /// Collection of all cells on the unit
    pub fn cells_url(&self) -> String {
        append(&self.base_url(), "__ctl/Cell")
    }

    /// Authorized request to `path` below the unit base URL
    pub fn request(&self, method: Method, path: &str) -> Result<HttpRequest, ClientError> {
        self.session
            .authorized_request(method, &append(&self.base_url(), path))
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }
}
