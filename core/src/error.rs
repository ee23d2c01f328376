//! Failure types shared by every service adapter.
//!
//! Adapters report transport-level failures as [`ServiceError`]. Components
//! never inspect those directly: they pass them through
//! [`classify`](crate::classify::classify) and hand the resulting
//! [`ClassifiedError`] to the caller.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type alias for service calls.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Fixed taxonomy of user-facing failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// HTTP 400
    BadRequest,
    /// HTTP 401, or no session for an operation that needs one
    Unauthenticated,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// HTTP 409
    Conflict,
    /// HTTP 422
    ValidationFailed,
    /// HTTP 500
    ServerError,
    /// HTTP 503
    Unavailable,
    /// The request never reached a server
    NetworkUnreachable,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    /// Map a status code (or its absence) to a kind.
    #[must_use]
    pub const fn from_status(status: Option<u16>, network: bool) -> Self {
        match status {
            Some(400) => Self::BadRequest,
            Some(401) => Self::Unauthenticated,
            Some(403) => Self::Forbidden,
            Some(404) => Self::NotFound,
            Some(409) => Self::Conflict,
            Some(422) => Self::ValidationFailed,
            Some(500) => Self::ServerError,
            Some(503) => Self::Unavailable,
            None if network => Self::NetworkUnreachable,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BadRequest => "bad request",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::ValidationFailed => "validation failed",
            Self::ServerError => "server error",
            Self::Unavailable => "unavailable",
            Self::NetworkUnreachable => "network unreachable",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Body of a failed response, in whatever shape the service sent it.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// Plain-text body
    Text(String),
    /// JSON body
    Json(Value),
}

impl ErrorBody {
    /// Interpret raw response text, keeping JSON when it parses.
    #[must_use]
    pub fn from_text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value @ (Value::Object(_) | Value::String(_))) => Self::Json(value),
            _ => Self::Text(raw),
        }
    }

    /// The human-oriented text carried by the body, if any.
    ///
    /// Objects yield the first non-empty string among `error`, `message` and
    /// `detail`. A `detail` list (as produced by request validators) yields its
    /// `msg` entries joined with `"; "`.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let text = match self {
            Self::Text(text) => Some(text.clone()),
            Self::Json(Value::String(text)) => Some(text.clone()),
            Self::Json(Value::Object(map)) => ["error", "message", "detail"]
                .iter()
                .find_map(|key| match map.get(*key) {
                    Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
                    Some(Value::Array(items)) => detail_messages(items),
                    _ => None,
                }),
            Self::Json(_) => None,
        };
        text.filter(|text| !text.trim().is_empty())
    }
}

fn detail_messages(items: &[Value]) -> Option<String> {
    let messages: Vec<&str> = items
        .iter()
        .filter_map(|item| item.get("msg").and_then(Value::as_str))
        .collect();
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

/// A failed request outcome, reduced to what the classifier needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFailure {
    /// HTTP status, absent when no response arrived
    pub status: Option<u16>,
    /// Response body, if any
    pub body: Option<ErrorBody>,
    /// The failure happened below HTTP (connect, DNS, reset)
    pub network: bool,
}

impl RawFailure {
    /// A failure with a status and a plain-text body.
    #[must_use]
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(ErrorBody::Text(body.into())),
            network: false,
        }
    }

    /// A failure with a status and a JSON body.
    #[must_use]
    pub fn http_json(status: u16, body: Value) -> Self {
        Self {
            status: Some(status),
            body: Some(ErrorBody::Json(body)),
            network: false,
        }
    }

    /// A network-level failure.
    #[must_use]
    pub fn network(description: impl Into<String>) -> Self {
        Self {
            status: None,
            body: Some(ErrorBody::Text(description.into())),
            network: true,
        }
    }
}

/// Errors reported by service adapters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        body: Option<ErrorBody>,
    },

    /// The request never completed at the transport level.
    #[error("network failure: {0}")]
    Network(String),

    /// The operation needs a session and none is active.
    #[error("authentication required")]
    MissingSession,

    /// The client refused to send the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The response could not be interpreted.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// A status failure with a plain-text body.
    #[must_use]
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: Some(ErrorBody::Text(body.into())),
        }
    }

    /// A status failure with a `{"error": ..}` body, the services' usual shape.
    #[must_use]
    pub fn status_json(status: u16, error: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: Some(ErrorBody::Json(serde_json::json!({ "error": error.into() }))),
        }
    }

    /// HTTP status carried by this error, if any.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Reduce to the classifier's input.
    ///
    /// A missing session reads as a 401 and a client-side rejection as a 400,
    /// so they classify exactly like the equivalent service answers. Decode
    /// failures carry no displayable text.
    #[must_use]
    pub fn raw(&self) -> RawFailure {
        match self {
            Self::Status { status, body } => RawFailure {
                status: Some(*status),
                body: body.clone(),
                network: false,
            },
            Self::Network(description) => RawFailure::network(description.clone()),
            Self::MissingSession => {
                RawFailure::http(401, "Authentication required. Please log in.")
            }
            Self::Rejected(reason) => RawFailure::http(400, reason.clone()),
            Self::Decode(_) => RawFailure::default(),
        }
    }
}

/// A failure translated for display: a kind plus one clean sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    /// Failure kind
    pub kind: ErrorKind,
    /// Capitalized, punctuated sentence suitable for direct display
    pub message: String,
}

impl ClassifiedError {
    /// Create a classified error.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
