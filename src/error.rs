//! Typed errors returned at the calendar store boundary

use std::path::PathBuf;

use thiserror::Error;

/// Why a calendar store could not answer a query or accept a new event.
///
/// An empty list of events is never an error: callers can tell "nothing on that day" from "could not reach the calendar".
#[derive(Debug, Error)]
pub enum StoreError {
    /// The server could not be reached (DNS, refused connection, TLS, transport timeout...)
    #[error("unable to reach the calendar server: {0}")]
    Connection(#[from] reqwest::Error),

    /// The server refused our credentials
    #[error("the calendar server rejected the credentials (HTTP {0})")]
    Auth(u16),

    /// The server does not know the requested resource
    #[error("no such calendar resource: {0}")]
    NotFound(String),

    /// Any other non-success HTTP answer
    #[error("unexpected HTTP status code {0}")]
    UnexpectedStatus(u16),

    /// The server or the local file sent something that is not valid CalDAV/iCal data
    #[error("invalid calendar data: {0}")]
    InvalidData(String),

    /// The local calendar file could not be read or written
    #[error("local calendar file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    /// Build an error from a non-success HTTP status code
    pub(crate) fn from_status(status: reqwest::StatusCode, url: &url::Url) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Auth(status.as_u16()),
            404 => Self::NotFound(url.to_string()),
            other => Self::UnexpectedStatus(other),
        }
    }
}

/// Errors that happen while loading the skill configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON settings in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
