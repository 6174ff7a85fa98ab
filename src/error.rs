//! Classified network errors.
//!
//! Every failed request ends up as exactly one [`NetworkError`], whose
//! [`ErrorKind`] is drawn from a closed set. The kind drives retry decisions;
//! the message and cause exist for the caller and for diagnostics only.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Shared, thread-safe handle to the failure that produced a [`NetworkError`].
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// The closed classification of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The connection could not be established or broke (DNS, refused, reset, generic I/O).
    Connection,
    /// The transport gave up waiting for a response.
    Timeout,
    /// An HTTP status outside the 4xx/5xx ranges reached the request layer.
    Http {
        /// Response status code.
        status: u16,
        /// Raw response payload, when it could be read.
        body: Option<String>,
    },
    /// The response could not be decoded.
    Parse,
    /// A 5xx response.
    Server {
        /// Response status code.
        status: u16,
    },
    /// A 4xx response.
    Client {
        /// Response status code.
        status: u16,
    },
    /// Anything else, including unsuccessful API envelopes.
    Unknown,
}

impl ErrorKind {
    /// Status code carried by HTTP-derived kinds.
    pub fn status(&self) -> Option<u16> {
        match self {
            ErrorKind::Http { status, .. }
            | ErrorKind::Server { status }
            | ErrorKind::Client { status } => Some(*status),
            _ => None,
        }
    }

    fn default_message(&self) -> Cow<'static, str> {
        match self {
            ErrorKind::Connection => Cow::Borrowed("Connection failed"),
            ErrorKind::Timeout => Cow::Borrowed("Request timeout"),
            ErrorKind::Http { status, .. } => Cow::Owned(format!("HTTP Error {}", status)),
            ErrorKind::Parse => Cow::Borrowed("Failed to parse response"),
            ErrorKind::Server { .. } => Cow::Borrowed("Server error"),
            ErrorKind::Client { .. } => Cow::Borrowed("Client error"),
            ErrorKind::Unknown => Cow::Borrowed("Unknown error occurred"),
        }
    }
}

/// A failure that has been classified into an [`ErrorKind`].
///
/// Equality compares kind and message; the cause is ignored since it only
/// carries diagnostics.
///
/// # Examples
///
/// ```rust
/// use tideline::{ErrorKind, NetworkError};
///
/// let err = NetworkError::new(ErrorKind::Client { status: 404 });
/// assert_eq!(err.message(), "Client error");
/// assert_eq!(err.status(), Some(404));
///
/// let err = err.with_message("Not Found");
/// assert_eq!(err.to_string(), "Not Found");
/// ```
#[derive(Clone)]
pub struct NetworkError {
    kind: ErrorKind,
    message: Option<String>,
    cause: Option<Cause>,
}

impl NetworkError {
    /// Create an error of the given kind with its default message.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            cause: None,
        }
    }

    /// Shorthand for [`ErrorKind::Connection`].
    pub fn connection() -> Self {
        Self::new(ErrorKind::Connection)
    }

    /// Shorthand for [`ErrorKind::Timeout`].
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Shorthand for [`ErrorKind::Http`].
    pub fn http(status: u16, body: Option<String>) -> Self {
        Self::new(ErrorKind::Http { status, body })
    }

    /// Shorthand for [`ErrorKind::Parse`].
    pub fn parse() -> Self {
        Self::new(ErrorKind::Parse)
    }

    /// Shorthand for [`ErrorKind::Server`].
    pub fn server(status: u16) -> Self {
        Self::new(ErrorKind::Server { status })
    }

    /// Shorthand for [`ErrorKind::Client`].
    pub fn client(status: u16) -> Self {
        Self::new(ErrorKind::Client { status })
    }

    /// Shorthand for [`ErrorKind::Unknown`].
    pub fn unknown() -> Self {
        Self::new(ErrorKind::Unknown)
    }

    /// Replace the human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the original failure.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Attach an already shared cause.
    pub fn with_shared_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// The classification.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Status code, for HTTP-derived kinds.
    pub fn status(&self) -> Option<u16> {
        self.kind.status()
    }

    /// The message, falling back to the kind's default.
    pub fn message(&self) -> Cow<'_, str> {
        match &self.message {
            Some(m) => Cow::Borrowed(m.as_str()),
            None => self.kind.default_message(),
        }
    }

    /// The preserved original failure, if any.
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Consume the error, keeping only its kind.
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Debug for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkError")
            .field("kind", &self.kind)
            .field("message", &self.message())
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

impl PartialEq for NetworkError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message() == other.message()
    }
}

impl Eq for NetworkError {}

impl From<ErrorKind> for NetworkError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}
