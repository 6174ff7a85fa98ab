//! Account clients running every call through the retry executor.
//!
//! The clients own nothing global: the service implementation and the
//! executor are both handed in at construction. [`AuthClient`] checks its
//! input with [`crate::validation`] before any request goes out.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use tideline::backend::MockBackend;
//! use tideline::client::AuthClient;
//! use tideline::model::{LoginRequest, RegistrationRequest};
//! use tideline::{RetryPolicy, RetryingExecutor};
//!
//! # tokio_test::block_on(async {
//! let backend = Arc::new(MockBackend::new());
//! let auth = AuthClient::new(backend, RetryingExecutor::new(RetryPolicy::no_retry()));
//!
//! auth.register(RegistrationRequest::new("ada@example.com", "Secret1!")).await.unwrap();
//! let user = auth.login(LoginRequest::new("ada@example.com", "Secret1!")).await.unwrap();
//! assert_eq!(user.email, "ada@example.com");
//! # });
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::classify::Failure;
use crate::error::NetworkError;
use crate::model::{LoginRequest, RegistrationRequest, User};
use crate::response::ApiResponse;
use crate::retry::RetryingExecutor;
use crate::validation::{validate_login, validate_registration, ValidationError};

/// Why an authentication call failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// The form broke one or more field rules; nothing was sent.
    #[error("invalid input: {}", join_messages(.0))]
    Invalid(Vec<ValidationError>),
    /// The request was sent and failed after retries.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl AuthError {
    /// The field errors, if the call was rejected before sending.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            AuthError::Invalid(errors) => Some(errors),
            AuthError::Network(_) => None,
        }
    }

    /// The classified network error, if the request was sent.
    pub fn network_error(&self) -> Option<&NetworkError> {
        match self {
            AuthError::Invalid(_) => None,
            AuthError::Network(error) => Some(error),
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Authentication endpoints.
pub trait AuthService: Send + Sync {
    /// `POST auth/register`
    fn register(
        &self,
        request: RegistrationRequest,
    ) -> BoxFuture<'_, Result<ApiResponse<User>, Failure>>;

    /// `POST auth/login`
    fn login(&self, request: LoginRequest) -> BoxFuture<'_, Result<ApiResponse<User>, Failure>>;
}

/// User lookup endpoints.
pub trait UserService: Send + Sync {
    /// `GET users/{id}`
    fn get_user(&self, user_id: String) -> BoxFuture<'_, Result<ApiResponse<User>, Failure>>;

    /// `GET users`
    fn get_all_users(&self) -> BoxFuture<'_, Result<ApiResponse<Vec<User>>, Failure>>;
}

/// Registration and login with retry.
#[derive(Debug)]
pub struct AuthClient<S: ?Sized> {
    service: Arc<S>,
    executor: RetryingExecutor,
}

impl<S: AuthService + ?Sized> AuthClient<S> {
    /// Create a client over `service`.
    pub fn new(service: Arc<S>, executor: RetryingExecutor) -> Self {
        Self { service, executor }
    }

    /// Validate the form, then register a new account.
    pub async fn register(&self, request: RegistrationRequest) -> Result<User, AuthError> {
        if let Err(errors) = validate_registration(&request).into_result() {
            tracing::debug!(email = %request.email, errors = errors.len(), "registration rejected");
            return Err(AuthError::Invalid(errors));
        }

        tracing::debug!(email = %request.email, "register");
        let user = self
            .executor
            .execute_api(|| self.service.register(request.clone()))
            .await?;
        Ok(user)
    }

    /// Validate the form, then log in to an existing account.
    pub async fn login(&self, request: LoginRequest) -> Result<User, AuthError> {
        if let Err(errors) = validate_login(&request).into_result() {
            tracing::debug!(email = %request.email, errors = errors.len(), "login rejected");
            return Err(AuthError::Invalid(errors));
        }

        tracing::debug!(email = %request.email, "login");
        let user = self
            .executor
            .execute_api(|| self.service.login(request.clone()))
            .await?;
        Ok(user)
    }
}

/// User lookups with retry.
#[derive(Debug)]
pub struct UserClient<S: ?Sized> {
    service: Arc<S>,
    executor: RetryingExecutor,
}

impl<S: UserService + ?Sized> UserClient<S> {
    /// Create a client over `service`.
    pub fn new(service: Arc<S>, executor: RetryingExecutor) -> Self {
        Self { service, executor }
    }

    /// Fetch one user by id.
    pub async fn get_user(&self, user_id: &str) -> Result<User, NetworkError> {
        self.executor
            .execute_api(|| self.service.get_user(user_id.to_string()))
            .await
    }

    /// Fetch every user.
    pub async fn get_all_users(&self) -> Result<Vec<User>, NetworkError> {
        self.executor
            .execute_api(|| self.service.get_all_users())
            .await
    }
}
