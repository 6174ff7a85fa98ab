//! Turning raw transport failures into [`NetworkError`]s.
//!
//! Classification is a total function: every [`Failure`] maps to exactly one
//! [`ErrorKind`], with [`ErrorKind::Unknown`] as the fallback. Retry
//! eligibility is a pure predicate over the result.
//!
//! # Examples
//!
//! ```rust
//! use tideline::{classify, is_retryable, ErrorKind, Failure};
//!
//! let err = classify(Failure::status(404));
//! assert_eq!(err.kind(), &ErrorKind::Client { status: 404 });
//! assert!(!is_retryable(&err));
//!
//! let err = classify(Failure::status(503));
//! assert_eq!(err.message(), "Server Error: 503");
//! assert!(is_retryable(&err));
//! ```

use std::io;
use std::sync::Arc;

use crate::error::{Cause, ErrorKind, NetworkError};

/// An HTTP response that the transport treated as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    /// Response status code.
    pub status: u16,
    /// Status message supplied by the transport, if any.
    pub message: Option<String>,
    /// Raw response body, if it could be read.
    pub body: Option<String>,
}

impl HttpFailure {
    /// A failure carrying only a status code.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            message: None,
            body: None,
        }
    }

    /// Set the status message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the response body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A raw failure signal coming out of a request operation.
#[derive(Debug)]
pub enum Failure {
    /// Already classified; passes through unchanged.
    Classified(NetworkError),
    /// A response with an error status.
    Http(HttpFailure),
    /// The transport timed out.
    Timeout(Option<Cause>),
    /// Establishing the connection failed (DNS, refused, reset).
    Connect(Cause),
    /// Any other I/O failure.
    Io(io::Error),
    /// The response body could not be decoded.
    Parse(Cause),
    /// Several failures from concurrent sub-operations; the first one wins.
    Composite(Vec<Failure>),
    /// An unrecognized failure.
    Other(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Failure {
    /// Shorthand for an HTTP failure with only a status code.
    pub fn status(status: u16) -> Self {
        Failure::Http(HttpFailure::new(status))
    }

    /// Wrap an arbitrary error as a connection failure.
    pub fn connect<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Failure::Connect(Arc::new(error))
    }

    /// Wrap an arbitrary error as a parse failure.
    pub fn parse<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Failure::Parse(Arc::new(error))
    }

    /// Wrap an arbitrary error as an unrecognized failure.
    pub fn other<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Failure::Other(error.into())
    }
}

impl From<NetworkError> for Failure {
    fn from(error: NetworkError) -> Self {
        Failure::Classified(error)
    }
}

impl From<HttpFailure> for Failure {
    fn from(failure: HttpFailure) -> Self {
        Failure::Http(failure)
    }
}

impl From<io::Error> for Failure {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::TimedOut => Failure::Timeout(Some(Arc::new(error))),
            // Only failures to open a connection; drops after that stay `Io`.
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable => Failure::Connect(Arc::new(error)),
            _ => Failure::Io(error),
        }
    }
}

impl From<tokio::time::error::Elapsed> for Failure {
    fn from(elapsed: tokio::time::error::Elapsed) -> Self {
        Failure::Timeout(Some(Arc::new(elapsed)))
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Failure {
    fn from(error: serde_json::Error) -> Self {
        if error.is_io() {
            Failure::Io(error.into())
        } else {
            Failure::Parse(Arc::new(error))
        }
    }
}

/// Decides what a failure means and whether it is worth another attempt.
///
/// Implementations must be total: `classify` never panics and always returns
/// a concrete error.
pub trait Classifier: Send + Sync {
    /// Map a raw failure to a classified error.
    fn classify(&self, failure: Failure) -> NetworkError;

    /// Whether an error of this classification may succeed on retry.
    fn is_retryable(&self, error: &NetworkError) -> bool;
}

/// The standard HTTP classification rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultClassifier;

impl Classifier for DefaultClassifier {
    fn classify(&self, failure: Failure) -> NetworkError {
        classify(failure)
    }

    fn is_retryable(&self, error: &NetworkError) -> bool {
        is_retryable(error)
    }
}

/// Classify a raw failure.
///
/// Already classified errors are returned unchanged, so classifying twice is
/// the same as classifying once.
pub fn classify(failure: Failure) -> NetworkError {
    match failure {
        Failure::Classified(error) => error,
        Failure::Http(http) => classify_status(http),
        Failure::Timeout(cause) => {
            let error = NetworkError::timeout().with_message("Request timed out");
            match cause {
                Some(cause) => error.with_shared_cause(cause),
                None => error,
            }
        }
        Failure::Connect(cause) => NetworkError::connection()
            .with_message(format!("Connection failed: {}", cause))
            .with_shared_cause(cause),
        Failure::Io(error) => NetworkError::connection()
            .with_message(format!("Network error: {}", error))
            .with_cause(error),
        Failure::Parse(cause) => NetworkError::parse()
            .with_message(format!("Failed to parse response: {}", cause))
            .with_shared_cause(cause),
        Failure::Composite(failures) => match failures.into_iter().next() {
            Some(first) => classify(first),
            None => NetworkError::unknown().with_message("Composite error occurred"),
        },
        Failure::Other(error) => {
            let message = format!("Unknown error: {}", error);
            NetworkError::unknown()
                .with_message(message)
                .with_shared_cause(Arc::from(error))
        }
    }
}

fn classify_status(http: HttpFailure) -> NetworkError {
    let HttpFailure {
        status,
        message,
        body,
    } = http;

    match status {
        400..=499 => NetworkError::client(status)
            .with_message(message.unwrap_or_else(|| format!("Client Error: {}", status))),
        500..=599 => NetworkError::server(status)
            .with_message(message.unwrap_or_else(|| format!("Server Error: {}", status))),
        _ => NetworkError::http(status, body)
            .with_message(message.unwrap_or_else(|| format!("HTTP Error: {}", status))),
    }
}

/// Whether a classified error may succeed on retry.
///
/// Client errors are never retried; everything else is.
pub fn is_retryable(error: &NetworkError) -> bool {
    match error.kind() {
        ErrorKind::Client { .. } => false,
        // Only non-4xx statuses classify to Http, but a hand-built Http error can still carry one.
        ErrorKind::Http { status, .. } => !(400..=499).contains(status),
        ErrorKind::Connection
        | ErrorKind::Timeout
        | ErrorKind::Parse
        | ErrorKind::Server { .. }
        | ErrorKind::Unknown => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_status_classification() {
        let err = classify(Failure::status(404));
        assert_eq!(err.kind(), &ErrorKind::Client { status: 404 });
        assert_eq!(err.message(), "Client Error: 404");
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_server_status_classification() {
        let err = classify(Failure::status(500));
        assert_eq!(err.kind(), &ErrorKind::Server { status: 500 });
        assert_eq!(err.message(), "Server Error: 500");
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_other_status_keeps_body() {
        let err = classify(Failure::Http(HttpFailure::new(302).with_body("moved")));
        assert_eq!(
            err.kind(),
            &ErrorKind::Http {
                status: 302,
                body: Some("moved".to_string())
            }
        );
        assert_eq!(err.message(), "HTTP Error: 302");
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_body_dropped_for_client_and_server_errors() {
        let err = classify(Failure::Http(HttpFailure::new(422).with_body("{}")));
        assert_eq!(err.kind(), &ErrorKind::Client { status: 422 });
    }

    #[test]
    fn test_supplied_status_message_wins() {
        let err = classify(Failure::Http(
            HttpFailure::new(503).with_message("Service Unavailable"),
        ));
        assert_eq!(err.message(), "Service Unavailable");
    }

    #[test]
    fn test_timeout_classification() {
        let err = classify(Failure::Timeout(None));
        assert_eq!(err.kind(), &ErrorKind::Timeout);
        assert_eq!(err.message(), "Request timed out");
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_io_timeout_becomes_timeout() {
        let failure = Failure::from(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
        let err = classify(failure);
        assert_eq!(err.kind(), &ErrorKind::Timeout);
        assert!(err.cause().is_some());
    }

    #[test]
    fn test_refused_connection_classification() {
        let failure = Failure::from(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let err = classify(failure);
        assert_eq!(err.kind(), &ErrorKind::Connection);
        assert_eq!(err.message(), "Connection failed: connection refused");
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_unreachable_host_is_connection_failure() {
        for kind in [
            io::ErrorKind::HostUnreachable,
            io::ErrorKind::NetworkUnreachable,
            io::ErrorKind::AddrNotAvailable,
        ] {
            let err = classify(Failure::from(io::Error::new(kind, "no route")));
            assert_eq!(err.message(), "Connection failed: no route");
        }
    }

    #[test]
    fn test_dropped_connection_is_network_error() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::NotConnected,
        ] {
            let failure = Failure::from(io::Error::new(kind, "connection lost"));
            assert!(matches!(failure, Failure::Io(_)));
            let err = classify(failure);
            assert_eq!(err.kind(), &ErrorKind::Connection);
            assert_eq!(err.message(), "Network error: connection lost");
            assert!(is_retryable(&err));
        }
    }

    #[test]
    fn test_would_block_is_not_a_timeout() {
        let failure = Failure::from(io::Error::new(io::ErrorKind::WouldBlock, "try again"));
        assert!(matches!(failure, Failure::Io(_)));
        assert_eq!(classify(failure).message(), "Network error: try again");
    }

    #[test]
    fn test_generic_io_classification() {
        let failure = Failure::from(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        let err = classify(failure);
        assert_eq!(err.kind(), &ErrorKind::Connection);
        assert_eq!(err.message(), "Network error: broken pipe");
    }

    #[test]
    fn test_parse_classification() {
        let failure = Failure::parse(io::Error::other("expected value at line 1"));
        let err = classify(failure);
        assert_eq!(err.kind(), &ErrorKind::Parse);
        assert_eq!(
            err.message(),
            "Failed to parse response: expected value at line 1"
        );
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_empty_composite() {
        let err = classify(Failure::Composite(Vec::new()));
        assert_eq!(err.kind(), &ErrorKind::Unknown);
        assert_eq!(err.message(), "Composite error occurred");
    }

    #[test]
    fn test_composite_first_wins() {
        let err = classify(Failure::Composite(vec![
            Failure::status(401),
            Failure::Timeout(None),
        ]));
        assert_eq!(err.kind(), &ErrorKind::Client { status: 401 });
    }

    #[test]
    fn test_nested_composite() {
        let err = classify(Failure::Composite(vec![Failure::Composite(vec![
            Failure::status(502),
        ])]));
        assert_eq!(err.kind(), &ErrorKind::Server { status: 502 });
    }

    #[test]
    fn test_unrecognized_failure() {
        let err = classify(Failure::other("boom"));
        assert_eq!(err.kind(), &ErrorKind::Unknown);
        assert_eq!(err.message(), "Unknown error: boom");
        assert!(err.cause().is_some());
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_classified_passes_through() {
        let original = NetworkError::server(500).with_message("already handled");
        let err = classify(Failure::Classified(original.clone()));
        assert_eq!(err, original);
    }

    #[test]
    fn test_hand_built_http_4xx_not_retryable() {
        assert!(!is_retryable(&NetworkError::http(404, None)));
        assert!(is_retryable(&NetworkError::http(304, None)));
    }

    #[tokio::test]
    async fn test_elapsed_becomes_timeout() {
        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(1),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();

        let err = classify(Failure::from(elapsed));
        assert_eq!(err.kind(), &ErrorKind::Timeout);
    }

    #[test]
    fn test_default_classifier_delegates() {
        let classifier = DefaultClassifier;
        let err = classifier.classify(Failure::status(429));
        assert!(!classifier.is_retryable(&err));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_json_error_is_parse() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = classify(Failure::from(json_err));
        assert_eq!(err.kind(), &ErrorKind::Parse);
    }
}
