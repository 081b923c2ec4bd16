//! Error taxonomy for the synchronization layer
//!
//! Failures are classified, in priority order, as:
//! 1. local failures (no response was received at all)
//! 2. HTTP failures (a response with a non-success status)
//! 3. contract violations detected before any request is issued

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sentinel published on the error channel when no server was reached.
pub const LOCAL_FAILURE_CODE: i32 = -1;

/// Message shown for every search failure other than "nothing found".
pub const GENERIC_ERROR_MESSAGE: &str = "Ein Fehler ist aufgetreten.";

const HTTP_NOT_FOUND: i32 = 404;

/// Errors that can occur while talking to the REST API.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no response received: {0}")]
    Local(String),

    #[error("server responded with HTTP {status}")]
    Http { status: u16, body: Option<Value> },

    #[error("malformed response body (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("entity {id} carries no version")]
    MissingVersion { id: String },

    #[error("entity carries no identity")]
    MissingIdentity,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// Returns true if no server was reached.
    pub fn is_local(&self) -> bool {
        matches!(self, SyncError::Local(_))
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Http { status, .. } | SyncError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for the statuses a server uses to reject a stale `If-Match`.
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409) | Some(412))
    }

    /// Value published on an error channel for this failure.
    ///
    /// A body that cannot be decoded came with a success status, so it is
    /// published as the generic message rather than as that status.
    pub fn channel_value(&self) -> ErrorValue {
        match self {
            SyncError::Http { status, .. } => ErrorValue::Code(i32::from(*status)),
            SyncError::Decode { .. } => ErrorValue::Message(GENERIC_ERROR_MESSAGE.to_string()),
            _ => ErrorValue::Code(LOCAL_FAILURE_CODE),
        }
    }
}

/// Value carried by an error channel.
///
/// Statuses and the local-failure sentinel travel as codes; failures with
/// no meaningful status travel as a ready-to-render message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorValue {
    Code(i32),
    Message(String),
}

impl ErrorValue {
    pub fn local_failure() -> Self {
        ErrorValue::Code(LOCAL_FAILURE_CODE)
    }

    pub fn is_local_failure(&self) -> bool {
        *self == ErrorValue::Code(LOCAL_FAILURE_CODE)
    }
}

/// Map an error-channel value to the fixed text rendered for a failed search.
///
/// `None` stands for a missing error value and maps to the generic message.
pub fn describe_search_error(error: Option<&ErrorValue>, not_found_message: &str) -> String {
    match error {
        Some(ErrorValue::Message(message)) => message.clone(),
        Some(ErrorValue::Code(HTTP_NOT_FOUND)) => not_found_message.to_string(),
        Some(ErrorValue::Code(_)) | None => GENERIC_ERROR_MESSAGE.to_string(),
    }
}
