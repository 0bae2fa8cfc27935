//! Load-time policy errors.
//!
//! Every variant here is a configuration failure detected while the policy is
//! being built. Decision-time code never produces these.

use thiserror::Error;

/// Result type used by policy construction and loading.
pub type PolicyResult<T> = Result<T, PolicyError>;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// A permission pattern failed validation.
    #[error("invalid permission pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("role name must not be empty")]
    EmptyRoleName,

    /// The same role name was registered twice.
    #[error("duplicate role '{0}'")]
    DuplicateRole(String),

    #[error("role '{role}' declares invalid route '{route}' (routes must start with '/')")]
    InvalidRoute { role: String, route: String },

    /// The landing table names a role the registry does not know.
    #[error("landing table references unknown role '{0}'")]
    UnknownLandingRole(String),

    #[error("landing table lists role '{0}' more than once")]
    DuplicateLandingRole(String),

    #[error("duplicate operation '{0}'")]
    DuplicateOperation(String),

    #[error("operation '{operation}' declares a blank required permission")]
    EmptyRequirement { operation: String },

    #[error("failed to read policy file `{path}`")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse policy file `{path}`")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PolicyError {
    pub fn invalid_pattern(pattern: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason,
        }
    }

    pub fn invalid_route(role: impl Into<String>, route: impl Into<String>) -> Self {
        Self::InvalidRoute {
            role: role.into(),
            route: route.into(),
        }
    }
}
