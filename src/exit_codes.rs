//! Custom exit codes for the personium binary
//!
//! Codes follow the BSD sysexits.h conventions where possible, with
//! application-specific codes from 100 up.

/// Exit codes reported by the `personium` binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersoniumExitCode {
    /// Success (0) - Command completed successfully
    Success = 0,

    /// Command line usage error (64) - User input error
    UsageError = 64,

    /// Data format error (65) - The server returned data we could not read
    DataError = 65,

    /// Internal software error (70) - Unexpected application error
    SoftwareError = 70,

    /// Configuration error (78) - Application configuration issue
    ConfigError = 78,

    /// Authentication error (100) - Login or token issues
    AuthError = 100,

    /// Network error (101) - Connection or communication issues
    NetworkError = 101,

    /// API error (102) - Remote API returned an error
    ApiError = 102,
}

impl PersoniumExitCode {
    /// Convert to numeric exit code
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Get descriptive message for the exit code
    pub fn message(&self) -> &'static str {
        match self {
            PersoniumExitCode::Success => "Success",
            PersoniumExitCode::UsageError => "Command line usage error",
            PersoniumExitCode::DataError => "Data format error",
            PersoniumExitCode::SoftwareError => "Internal software error",
            PersoniumExitCode::ConfigError => "Configuration error",
            PersoniumExitCode::AuthError => "Authentication error",
            PersoniumExitCode::NetworkError => "Network communication error",
            PersoniumExitCode::ApiError => "Remote API error",
        }
    }
}

impl From<PersoniumExitCode> for i32 {
    fn from(code: PersoniumExitCode) -> Self {
        code.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_sysexits() {
        assert_eq!(PersoniumExitCode::Success.code(), exitcode::OK);
        assert_eq!(PersoniumExitCode::UsageError.code(), exitcode::USAGE);
        assert_eq!(PersoniumExitCode::DataError.code(), exitcode::DATAERR);
        assert_eq!(PersoniumExitCode::SoftwareError.code(), exitcode::SOFTWARE);
        assert_eq!(PersoniumExitCode::ConfigError.code(), exitcode::CONFIG);
        assert_eq!(i32::from(PersoniumExitCode::AuthError), 100);
    }
}
