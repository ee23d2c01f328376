//! Error classification: the single translation point from a failed request
//! to a `{kind, message}` pair fit for display.
//!
//! The three services disagree on error shapes. Some answer with plain text,
//! some with `{"error": ..}`, `{"message": ..}` or `{"detail": ..}`, and
//! gateway errors may embed a serialized JSON object from a lower layer inside
//! a string. Classification is pure: the same input always yields the same
//! output, and nothing here performs I/O.
//!
//! # Example
//!
//! ```
//! use ticketdesk_core::classify::{classify, ClassifyContext};
//! use ticketdesk_core::error::{ErrorKind, RawFailure};
//!
//! let raw = RawFailure::http(422, "validation error on field 'email': email is required");
//! let error = classify(&raw, &ClassifyContext::new("Registration failed"));
//!
//! assert_eq!(error.kind, ErrorKind::ValidationFailed);
//! assert_eq!(error.message, "Email address is required.");
//! ```

use crate::error::{ClassifiedError, ErrorBody, ErrorKind, RawFailure, ServiceError};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

const FALLBACK_DEFAULT: &str = "An error occurred.";

const NETWORK_UNREACHABLE: &str =
    "Unable to connect to the server. Please check your internet connection.";
const UNAUTHENTICATED: &str = "You need to log in to perform this action.";
const FORBIDDEN: &str = "You don't have permission to perform this action.";
const CONFLICT: &str = "This item already exists or conflicts with existing data.";
const SERVER_ERROR: &str = "Server error. Please try again later.";
const UNAVAILABLE: &str = "Service temporarily unavailable. Please try again later.";
const INVALID_REQUEST: &str = "Invalid request. Please check your input.";
const INVALID_DATA: &str = "Invalid data provided. Please check your input.";

const NOT_FOUND_GENERIC: &str = "The requested resource was not found.";
const NOT_FOUND_BY_ID: &str = "The requested item was not found. It may have been deleted.";

const TICKET_TARGET_GONE: &str = "Unable to create ticket: Event or packet not found.";
const ITEM_GONE: &str = "The selected item no longer exists. Please refresh and try again.";
const EMAIL_REQUIRED: &str = "Email address is required.";
const EMAIL_INVALID: &str = "Please provide a valid email address.";
const PASSWORD_REQUIRED: &str = "Password is required.";
const ALREADY_EXISTS: &str = "This item already exists.";
const CHECK_INPUT: &str = "Please check your input and try again.";

/// Entity keywords checked in order against 404 bodies.
const NOT_FOUND_ENTITIES: [(&str, &str); 4] = [
    ("user", "User not found."),
    ("event", "Event not found."),
    ("packet", "Event packet not found."),
    ("ticket", "Ticket not found."),
];

static LEADING_FIELD_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*validation error on field '[^']+':\s?").ok());
static FIELD_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)validation error on field '[^']+': ?").ok());
static FAILED_TO: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)failed to ").ok());
static JSON_FRAGMENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\{[^{}]*\}").ok());
static FIRST_JSON_FRAGMENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\{.*\}").ok());
static ID_NOT_FOUND: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"ID \d+ not found").ok());

/// Caller-side information the classifier needs beyond the failure itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyContext<'a> {
    default_message: &'a str,
    ticket_creation: bool,
}

impl<'a> ClassifyContext<'a> {
    /// Context with the message to show when the failure carries no usable text.
    #[must_use]
    pub const fn new(default_message: &'a str) -> Self {
        Self {
            default_message,
            ticket_creation: false,
        }
    }

    /// Mark the failing operation as a ticket purchase.
    #[must_use]
    pub const fn for_ticket_creation(mut self) -> Self {
        self.ticket_creation = true;
        self
    }

    fn default_message(&self) -> &'a str {
        if self.default_message.trim().is_empty() {
            FALLBACK_DEFAULT
        } else {
            self.default_message
        }
    }
}

impl Default for ClassifyContext<'_> {
    fn default() -> Self {
        Self::new(FALLBACK_DEFAULT)
    }
}

/// Classify a failed request outcome.
///
/// Never panics and never returns an empty message.
#[must_use]
pub fn classify(raw: &RawFailure, context: &ClassifyContext<'_>) -> ClassifiedError {
    let kind = ErrorKind::from_status(raw.status, raw.network);
    let text = raw.body.as_ref().and_then(ErrorBody::text);
    let text = text.as_deref();

    let message = match kind {
        ErrorKind::NetworkUnreachable => NETWORK_UNREACHABLE.to_string(),
        ErrorKind::Unauthenticated => UNAUTHENTICATED.to_string(),
        ErrorKind::Forbidden => FORBIDDEN.to_string(),
        ErrorKind::Conflict => CONFLICT.to_string(),
        ErrorKind::ServerError => SERVER_ERROR.to_string(),
        ErrorKind::Unavailable => UNAVAILABLE.to_string(),
        ErrorKind::NotFound => text
            .and_then(not_found_message)
            .unwrap_or(NOT_FOUND_GENERIC)
            .to_string(),
        ErrorKind::BadRequest => text
            .and_then(|text| validation_message(text, context))
            .unwrap_or_else(|| INVALID_REQUEST.to_string()),
        ErrorKind::ValidationFailed => text
            .and_then(|text| validation_message(text, context))
            .unwrap_or_else(|| INVALID_DATA.to_string()),
        ErrorKind::Unknown => text
            .map(clean_message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| context.default_message().to_string()),
    };

    ClassifiedError::new(kind, message)
}

impl ServiceError {
    /// Classify this error for display.
    #[must_use]
    pub fn classify(&self, context: &ClassifyContext<'_>) -> ClassifiedError {
        classify(&self.raw(), context)
    }
}

fn not_found_message(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    NOT_FOUND_ENTITIES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, message)| *message)
        .or_else(|| is_match(&ID_NOT_FOUND, text).then_some(NOT_FOUND_BY_ID))
}

fn validation_message(text: &str, context: &ClassifyContext<'_>) -> Option<String> {
    let working = embedded_error(text).unwrap_or_else(|| text.trim().to_string());
    let working = replace_all(&LEADING_FIELD_PREFIX, &working, "");
    let lower = working.to_lowercase();

    if working.contains("ID") && lower.contains("not found") {
        let ticket = context.ticket_creation || text.to_lowercase().contains("ticket");
        return Some(if ticket { TICKET_TARGET_GONE } else { ITEM_GONE }.to_string());
    }

    let fixed = if lower.contains("email") && lower.contains("required") {
        Some(EMAIL_REQUIRED)
    } else if lower.contains("email") && lower.contains("invalid") {
        Some(EMAIL_INVALID)
    } else if lower.contains("password") && lower.contains("required") {
        Some(PASSWORD_REQUIRED)
    } else if lower.contains("already exists") {
        Some(ALREADY_EXISTS)
    } else if !lower.contains("cannot be empty") && lower.contains("validation") {
        Some(CHECK_INPUT)
    } else {
        None
    };

    match fixed {
        Some(message) => Some(message.to_string()),
        None => Some(clean_message(&working)).filter(|message| !message.is_empty()),
    }
}

/// The `error` field of the first `{...}` fragment embedded in `text`.
fn embedded_error(text: &str) -> Option<String> {
    let pattern = FIRST_JSON_FRAGMENT.as_ref()?;
    let fragment = pattern.find(text)?;
    match serde_json::from_str::<Value>(fragment.as_str()) {
        Ok(Value::Object(map)) => map
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Generic cleanup applied when no specific rule matched.
///
/// Returns an empty string when nothing displayable remains.
#[must_use]
pub fn clean_message(message: &str) -> String {
    let cleaned = replace_all(&FIELD_PREFIX, message, "");
    let cleaned = replace_all(&FAILED_TO, &cleaned, "Unable to ");
    let cleaned = strip_json_fragments(&cleaned);
    let cleaned = cleaned.trim();

    let mut chars = cleaned.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut sentence: String = first.to_uppercase().chain(chars).collect();
    if !sentence.ends_with(['.', '!', '?']) {
        sentence.push('.');
    }
    sentence
}

/// Render several messages for a single notice.
///
/// One message is returned unchanged; several become a bullet list.
#[must_use]
pub fn format_error_list<S: AsRef<str>>(errors: &[S]) -> String {
    match errors {
        [] => String::new(),
        [single] => single.as_ref().to_string(),
        many => {
            let lines: Vec<&str> = many.iter().map(AsRef::as_ref).collect();
            format!("• {}", lines.join("\n• "))
        }
    }
}

/// Replace every embedded JSON object by its `message` or `detail` text, or
/// drop it. Brace groups that are not JSON are left alone.
fn strip_json_fragments(text: &str) -> String {
    let Some(pattern) = JSON_FRAGMENT.as_ref() else {
        return text.to_string();
    };
    pattern
        .replace_all(text, |captures: &Captures<'_>| {
            let fragment = captures.get(0).map_or("", |m| m.as_str());
            match serde_json::from_str::<Value>(fragment) {
                Ok(Value::Object(map)) => ["message", "detail"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .unwrap_or_default()
                    .to_string(),
                Ok(_) => String::new(),
                Err(_) => fragment.to_string(),
            }
        })
        .into_owned()
}

fn replace_all(pattern: &LazyLock<Option<Regex>>, text: &str, replacement: &str) -> String {
    match pattern.as_ref() {
        Some(regex) => regex.replace_all(text, replacement).into_owned(),
        None => text.to_string(),
    }
}

fn is_match(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|regex| regex.is_match(text))
}
