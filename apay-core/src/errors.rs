//! Error types for the session, guard and authentication layers.
//!
//! Storage errors never escape the session store; they are logged there and
//! degrade to "no identity". Authentication and policy errors are returned to
//! the caller.

use std::path::PathBuf;

use apay_model::Role;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage value for '{0}' is not valid UTF-8")]
    CorruptedData(String),
}

/// Authentication errors surfaced to the login form
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,

    /// The backend answered with an error payload
    #[error("login rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("could not reach the server")]
    Connection(#[source] reqwest::Error),

    #[error("invalid response from server: {0}")]
    InvalidResponse(String),
}

/// Route policy invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("no routes configured for role {0}")]
    MissingRole(Role),

    #[error("route '{0}' must start with '/'")]
    RelativePath(String),

    #[error("landing page {landing} of role {role} is not among its allowed routes")]
    LandingNotAllowed { role: Role, landing: String },

    #[error("role {role} may not list the login page {login}")]
    LoginPathAllowed { role: Role, login: String },
}

/// Failures while assembling a [`crate::ClientContext`]
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid route policy")]
    Policy(#[from] PolicyError),

    #[error("failed to build HTTP client")]
    Auth(#[from] AuthError),
}
