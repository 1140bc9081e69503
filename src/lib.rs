//! Client library for authenticating against Personium cells.
//!
//! The crate turns credential inputs into bearer tokens, maps cell names to
//! URLs under path or subdomain addressing, and hands independent sessions to
//! every cell and resource handle so that re-authenticating one never
//! disturbs another.
//!
//! # Modules
//!
//! - `url_resolver`: cell name <-> cell URL mapping
//! - `credentials`: validated credential inputs and grant bodies
//! - `token`: token state of a session
//! - `transport`: blocking HTTP transport seam and its `reqwest` implementation
//! - `assertion`: audience decoding of trans-cell tokens
//! - `auth`: token exchanges against `__token` endpoints
//! - `context`: the shared platform context and session factories
//! - `session`: per-identity session state
//! - `cell`: cell, resource and unit handles
//! - `configuration`: YAML configuration file
//! - `commands` / `actions`: the `personium` command line

pub mod actions;
pub mod assertion;
pub mod auth;
pub mod cell;
pub mod commands;
pub mod configuration;
pub mod context;
pub mod credentials;
pub mod error;
pub mod exit_codes;
pub mod session;
pub mod token;
pub mod transport;
pub mod url_resolver;

pub use cell::{Cell, ResourceHandle, ResourceKind, UnitHandle};
pub use configuration::Configuration;
pub use context::PlatformContext;
pub use credentials::Credentials;
pub use error::ClientError;
pub use session::SessionContext;
