//! In-memory mock backend.
//!
//! [`UserStore`] holds accounts for the lifetime of the process. [`MockBackend`]
//! serves the [`AuthService`] and [`UserService`] seams on top of it, answering
//! like a real server would: domain errors become HTTP error statuses, and
//! injected [`Fault`]s let callers rehearse transient failures.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{Mutex, RwLock};

use crate::classify::{Failure, HttpFailure};
use crate::client::{AuthService, UserService};
use crate::model::{LoginRequest, RegistrationRequest, User};
use crate::response::ApiResponse;

/// Domain errors raised by the user store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
    /// The email is already registered.
    #[error("User already exists")]
    UserExists,
    /// No account matches the email and password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// No account has this id.
    #[error("User not found: {0}")]
    NotFound(String),
}

impl BackendError {
    /// The HTTP status a server would answer with.
    pub fn status(&self) -> u16 {
        match self {
            BackendError::PasswordMismatch => 400,
            BackendError::InvalidCredentials => 401,
            BackendError::NotFound(_) => 404,
            BackendError::UserExists => 409,
        }
    }
}

impl From<BackendError> for Failure {
    fn from(error: BackendError) -> Self {
        Failure::Http(HttpFailure::new(error.status()).with_message(error.to_string()))
    }
}

/// Process-local account storage with linear lookup.
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account.
    pub async fn register(&self, request: RegistrationRequest) -> Result<User, BackendError> {
        if request.password != request.confirm_password {
            return Err(BackendError::PasswordMismatch);
        }

        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == request.email) {
            return Err(BackendError::UserExists);
        }

        let user = User {
            email: request.email,
            password: request.password,
        };
        users.push(user.clone());
        tracing::debug!(email = %user.email, "registered user");
        Ok(user)
    }

    /// Find the account matching both email and password.
    pub async fn login(&self, request: LoginRequest) -> Result<User, BackendError> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.email == request.email && u.password == request.password)
            .cloned()
            .ok_or(BackendError::InvalidCredentials)
    }

    /// Look up an account by id (its email).
    pub async fn find(&self, user_id: &str) -> Result<User, BackendError> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.email == user_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(user_id.to_string()))
    }

    /// Every account, in registration order.
    pub async fn all(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    /// Number of accounts.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether no account is registered.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

/// A one-shot failure served instead of the next request.
#[derive(Debug)]
pub enum Fault {
    /// Fail at the transport level.
    Transport(Failure),
    /// Answer with an unsuccessful envelope carrying this message.
    Unsuccessful(Option<String>),
}

impl From<Failure> for Fault {
    fn from(failure: Failure) -> Self {
        Fault::Transport(failure)
    }
}

/// Mock server over a [`UserStore`].
#[derive(Debug, Default)]
pub struct MockBackend {
    store: UserStore,
    faults: Mutex<VecDeque<Fault>>,
    latency: Duration,
    timeout: Option<Duration>,
}

impl MockBackend {
    /// A backend with an empty store, no latency and no faults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue faults, served in order before any real handling.
    pub fn with_faults<I, F>(mut self, faults: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fault>,
    {
        self.faults
            .get_mut()
            .extend(faults.into_iter().map(Into::into));
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail any request whose handling takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Queue one more fault.
    pub async fn push_fault(&self, fault: impl Into<Fault>) {
        self.faults.lock().await.push_back(fault.into());
    }

    /// Faults not yet served.
    pub async fn pending_faults(&self) -> usize {
        self.faults.lock().await.len()
    }

    /// The underlying store.
    pub fn store(&self) -> &UserStore {
        &self.store
    }

    async fn respond<T, Fut>(&self, handler: Fut) -> Result<ApiResponse<T>, Failure>
    where
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let fault = self.faults.lock().await.pop_front();
        match fault {
            Some(Fault::Transport(failure)) => return Err(failure),
            Some(Fault::Unsuccessful(message)) => {
                return Ok(ApiResponse {
                    message,
                    ..ApiResponse::default()
                })
            }
            None => {}
        }

        let work = async {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            handler.await
        };

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work).await?,
            None => work.await,
        };

        result.map(ApiResponse::ok).map_err(Failure::from)
    }
}

impl AuthService for MockBackend {
    fn register(
        &self,
        request: RegistrationRequest,
    ) -> BoxFuture<'_, Result<ApiResponse<User>, Failure>> {
        self.respond(self.store.register(request)).boxed()
    }

    fn login(&self, request: LoginRequest) -> BoxFuture<'_, Result<ApiResponse<User>, Failure>> {
        self.respond(self.store.login(request)).boxed()
    }
}

impl UserService for MockBackend {
    fn get_user(&self, user_id: String) -> BoxFuture<'_, Result<ApiResponse<User>, Failure>> {
        async move { self.respond(self.store.find(&user_id)).await }.boxed()
    }

    fn get_all_users(&self) -> BoxFuture<'_, Result<ApiResponse<Vec<User>>, Failure>> {
        self.respond(async { Ok::<_, BackendError>(self.store.all().await) })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_register_and_login() {
        let store = UserStore::new();
        let user = store
            .register(RegistrationRequest::new("ada@example.com", "Secret1!"))
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");

        let logged_in = store
            .login(LoginRequest::new("ada@example.com", "Secret1!"))
            .await
            .unwrap();
        assert_eq!(logged_in, user);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_mismatch() {
        let store = UserStore::new();
        let result = store
            .register(RegistrationRequest::new("a@b.co", "one").with_confirmation("two"))
            .await;
        assert_eq!(result, Err(BackendError::PasswordMismatch));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate() {
        let store = UserStore::new();
        store
            .register(RegistrationRequest::new("a@b.co", "pw"))
            .await
            .unwrap();
        let result = store
            .register(RegistrationRequest::new("a@b.co", "other"))
            .await;
        assert_eq!(result, Err(BackendError::UserExists));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let store = UserStore::new();
        store
            .register(RegistrationRequest::new("a@b.co", "pw"))
            .await
            .unwrap();
        let result = store.login(LoginRequest::new("a@b.co", "nope")).await;
        assert_eq!(result, Err(BackendError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_find_missing_user() {
        let store = UserStore::new();
        assert_eq!(
            store.find("ghost@b.co").await,
            Err(BackendError::NotFound("ghost@b.co".to_string()))
        );
    }

    #[test]
    fn test_backend_errors_become_client_failures() {
        let err = crate::classify::classify(Failure::from(BackendError::UserExists));
        assert_eq!(err.kind(), &ErrorKind::Client { status: 409 });
        assert_eq!(err.message(), "User already exists");
    }

    #[tokio::test]
    async fn test_faults_served_before_handling() {
        let backend = MockBackend::new().with_faults([
            Fault::Transport(Failure::status(503)),
            Fault::Unsuccessful(Some("bad state".to_string())),
        ]);
        assert_eq!(backend.pending_faults().await, 2);

        let first = backend.get_all_users().await;
        assert!(matches!(first, Err(Failure::Http(ref h)) if h.status == 503));

        let second = backend.get_all_users().await.unwrap();
        assert!(!second.is_success());
        assert_eq!(second.message.as_deref(), Some("bad state"));

        let third = backend.get_all_users().await.unwrap();
        assert_eq!(third.into_result(), Ok(Vec::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_beyond_timeout_fails() {
        let backend = MockBackend::new()
            .with_latency(Duration::from_secs(31))
            .with_timeout(Duration::from_secs(30));

        let result = backend.get_all_users().await;
        assert!(matches!(result, Err(Failure::Timeout(Some(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_within_timeout_succeeds() {
        let backend = MockBackend::new()
            .with_latency(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(30));

        assert!(backend.get_all_users().await.is_ok());
    }
}
