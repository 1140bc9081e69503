use thiserror::Error;

use crate::{
    configuration::ConfigurationError, credentials::CredentialError,
    exit_codes::PersoniumExitCode, transport::TransportError,
};

/// Errors surfaced by sessions, the auth client and cell handles
#[derive(Debug, Error)]
pub enum ClientError {
    /// Malformed base URL, unknown addressing policy or a broken configuration file
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    /// Credentials were assembled in a way that cannot be used
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
    /// The token endpoint rejected the grant, or no usable credential or token exists
    #[error("Authentication failed{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Auth {
        status: Option<u16>,
        message: String,
    },
    /// Network failure or timeout reported by the transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    /// The server answered with something that is not a valid grant response
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// A non-token endpoint answered with a non-success status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    pub fn auth(status: Option<u16>, message: impl Into<String>) -> Self {
        ClientError::Auth {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        ClientError::auth(Some(401), "Unauthorized")
    }

    /// HTTP status attached to the failure, when the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Auth { status, .. } => *status,
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> PersoniumExitCode {
        match self {
            ClientError::Configuration(_) => PersoniumExitCode::ConfigError,
            ClientError::Credential(_) => PersoniumExitCode::UsageError,
            ClientError::Auth { .. } => PersoniumExitCode::AuthError,
            ClientError::Transport(_) => PersoniumExitCode::NetworkError,
            ClientError::Protocol(_) => PersoniumExitCode::DataError,
            ClientError::Api { .. } => PersoniumExitCode::ApiError,
        }
    }
}

/// Error types that can occur during CLI command execution
#[derive(Debug, Error)]
pub enum CliError {
    /// Error when an unsupported or undefined subcommand is encountered
    #[error("Undefined or unsupported subcommand: {0}")]
    UnsupportedSubcommand(String),
    /// Error when a required command-line argument is missing
    #[error("Missing required argument: {0}")]
    MissingRequiredArgument(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),
    #[error("{0}")]
    ClientError(#[from] ClientError),
    /// Error related to JSON serialization
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> PersoniumExitCode {
        match self {
            CliError::UnsupportedSubcommand(_) => PersoniumExitCode::UsageError,
            CliError::MissingRequiredArgument(_) => PersoniumExitCode::UsageError,
            CliError::ConfigurationError(_) => PersoniumExitCode::ConfigError,
            CliError::ClientError(e) => e.exit_code(),
            CliError::JsonError(_) => PersoniumExitCode::DataError,
        }
    }
}
