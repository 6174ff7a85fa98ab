//! The backend's response envelope.
//!
//! A transport can deliver a perfectly valid response whose envelope still
//! reports failure. [`ApiResponse::into_result`] turns that case into a
//! [`NetworkError`] so it is handled exactly like a transport failure.

use crate::error::NetworkError;

const UNSUCCESSFUL_RESPONSE: &str = "API returned unsuccessful response";

/// Uniform envelope wrapping every backend payload.
///
/// # Examples
///
/// ```rust
/// use tideline::{ApiResponse, ErrorKind};
///
/// let ok = ApiResponse::ok(7);
/// assert_eq!(ok.into_result(), Ok(7));
///
/// let bad = ApiResponse::<u32>::failure("bad state");
/// let err = bad.into_result().unwrap_err();
/// assert_eq!(err.kind(), &ErrorKind::Unknown);
/// assert_eq!(err.message(), "bad state");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ApiResponse<T> {
    /// Whether the call succeeded at the application level.
    pub success: bool,
    /// Application status code.
    pub code: i32,
    /// Description supplied by the backend.
    pub message: Option<String>,
    /// Payload.
    pub data: Option<T>,
    /// Error detail supplied by the backend.
    pub error: Option<String>,
}

impl<T> Default for ApiResponse<T> {
    fn default() -> Self {
        Self {
            success: false,
            code: 0,
            message: None,
            data: None,
            error: None,
        }
    }
}

impl<T> ApiResponse<T> {
    /// A successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            code: 200,
            data: Some(data),
            ..Self::default()
        }
    }

    /// An unsuccessful envelope with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Set the application status code.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    /// Whether this envelope would yield a payload.
    pub fn is_success(&self) -> bool {
        self.success && self.data.is_some()
    }

    /// Extract the payload, or fail with [`ErrorKind::Unknown`](crate::ErrorKind::Unknown).
    ///
    /// A `success` flag without data still counts as a failure.
    pub fn into_result(self) -> Result<T, NetworkError> {
        match self {
            ApiResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            ApiResponse { message, .. } => Err(NetworkError::unknown()
                .with_message(message.unwrap_or_else(|| UNSUCCESSFUL_RESPONSE.to_string()))),
        }
    }
}
