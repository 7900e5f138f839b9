//! Error taxonomy
//!
//! Four failure families cover the whole client: snapshot reads, writes,
//! live-stream deliveries, and authentication. Nothing here is fatal to the
//! process; every failure is local to the view that triggered it.

use std::fmt;
use thiserror::Error;

/// A snapshot (read) request failed.
///
/// Carries the underlying transport or server message. The view renders a
/// loading-vs-error distinction; no automatic retry is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch failed: {message}")]
pub struct FetchError {
    /// Underlying transport or server message.
    pub message: String,
}

impl FetchError {
    /// Create a fetch error from the underlying message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A write request failed, possibly for several reasons at once.
///
/// The server may reject a mutation with multiple error entries; all of them
/// are kept and the displayed message joins them with newlines. When no
/// cause is available the generic fallback is shown instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationError {
    causes: Vec<String>,
}

impl MutationError {
    /// Message shown when the server gave no usable error detail.
    pub const FALLBACK_MESSAGE: &'static str = "Oops! Something went wrong!";

    /// Create from the server's error entries, in delivery order.
    pub fn new(causes: Vec<String>) -> Self {
        Self { causes }
    }

    /// Create from a single cause.
    pub fn message(cause: impl Into<String>) -> Self {
        Self {
            causes: vec![cause.into()],
        }
    }

    /// The underlying causes, in delivery order. May be empty.
    pub fn causes(&self) -> &[String] {
        &self.causes
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.causes.is_empty() {
            write!(f, "{}", Self::FALLBACK_MESSAGE)
        } else {
            write!(f, "{}", self.causes.join("\n"))
        }
    }
}

impl std::error::Error for MutationError {}

/// A fault on a live event stream.
///
/// Non-fatal: a faulted delivery is logged and surfaced but never closes the
/// channel it arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// A delivered payload could not be parsed.
    #[error("malformed delivery: {0}")]
    Parse(String),
    /// The stream's transport reported an error.
    #[error("stream transport fault: {0}")]
    Transport(String),
}

/// Authentication failure. Blocks entry to every view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No authenticated user is available.
    #[error("not authenticated")]
    NotAuthenticated,
    /// The auth collaborator could not be reached.
    #[error("auth unavailable: {0}")]
    Unavailable(String),
}

/// Client configuration problems, reported before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field failed validation.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// The configuration file could not be read.
    #[error("could not read config: {0}")]
    Io(String),
    /// The configuration file could not be parsed.
    #[error("could not parse config: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Create a validation error for one field.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
