//! Error types for the ga_reports crate.

use std::fmt;

use thiserror::Error;

use crate::locator::HierarchyLevel;

/// Why authentication failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthReason {
    MissingKey,
    InvalidKey,
    ScopeRejected,
}

impl fmt::Display for AuthReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthReason::MissingKey => "missing_key",
            AuthReason::InvalidKey => "invalid_key",
            AuthReason::ScopeRejected => "scope_rejected",
        })
    }
}

/// Why a service handle could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryReason {
    UnknownApi,
    VersionMismatch,
    NetworkUnreachable,
}

impl fmt::Display for DiscoveryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiscoveryReason::UnknownApi => "unknown_api",
            DiscoveryReason::VersionMismatch => "version_mismatch",
            DiscoveryReason::NetworkUnreachable => "network_unreachable",
        })
    }
}

/// Errors that can occur when talking to Google Analytics or Google Drive.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Authentication failed ({reason}): {detail}")]
    Auth { reason: AuthReason, detail: String },

    #[error("Cannot build {api} {version} client ({reason}): {detail}")]
    Discovery {
        api: String,
        version: String,
        reason: DiscoveryReason,
        detail: String,
    },

    #[error("No {level} found")]
    NotFound { level: HierarchyLevel },

    #[error("There was an error in constructing your query: {0}")]
    QueryConstruction(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ResponseParseError(#[from] serde_json::Error),

    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),

    #[error("Download of {file} interrupted after {written} bytes: {message}")]
    PartialWrite {
        file: String,
        written: u64,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`ReportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Discovery,
    NotFound,
    QueryConstruction,
    Transport,
    PartialWrite,
    Local,
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::Auth { .. } => ErrorKind::Auth,
            ReportError::Discovery { .. } => ErrorKind::Discovery,
            ReportError::NotFound { .. } => ErrorKind::NotFound,
            ReportError::QueryConstruction(_) => ErrorKind::QueryConstruction,
            ReportError::HttpError(_)
            | ReportError::ApiError { .. }
            | ReportError::ResponseParseError(_)
            | ReportError::InvalidResponse(_) => ErrorKind::Transport,
            ReportError::PartialWrite { .. } => ErrorKind::PartialWrite,
            ReportError::Io(_) => ErrorKind::Local,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Local => 1,
            ErrorKind::Auth => 2,
            ErrorKind::Discovery => 3,
            ErrorKind::NotFound => 4,
            ErrorKind::QueryConstruction => 5,
            ErrorKind::Transport => 6,
            ErrorKind::PartialWrite => 7,
        }
    }
}

/// Result type alias for ReportError.
pub type Result<T> = std::result::Result<T, ReportError>;
