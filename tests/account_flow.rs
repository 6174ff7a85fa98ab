//! End-to-end tests of the account clients against the mock backend

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tideline::backend::{Fault, MockBackend};
use tideline::client::{AuthClient, AuthError, UserClient};
use tideline::model::{LoginRequest, RegistrationRequest};
use tideline::prelude::*;
use tideline::{RetryEvent, ValidationError};

fn executor() -> RetryingExecutor {
    RetryingExecutor::new(RetryPolicy::default())
}

fn clients(
    backend: Arc<MockBackend>,
) -> (AuthClient<MockBackend>, UserClient<MockBackend>) {
    (
        AuthClient::new(backend.clone(), executor()),
        UserClient::new(backend, executor()),
    )
}

#[tokio::test(start_paused = true)]
async fn test_register_login_and_lookup() {
    let backend = Arc::new(MockBackend::new());
    let (auth, users) = clients(backend.clone());

    let registered = auth
        .register(RegistrationRequest::new("ada@example.com", "Secret1!"))
        .await
        .unwrap();
    let logged_in = auth
        .login(LoginRequest::new("ada@example.com", "Secret1!"))
        .await
        .unwrap();
    assert_eq!(registered, logged_in);

    assert_eq!(users.get_user("ada@example.com").await.unwrap(), registered);
    assert_eq!(users.get_all_users().await.unwrap(), vec![registered]);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_registration_fails_fast() {
    let backend = Arc::new(MockBackend::new());
    let (auth, _) = clients(backend.clone());
    let request = RegistrationRequest::new("ada@example.com", "Secret1!");

    auth.register(request.clone()).await.unwrap();
    let start = tokio::time::Instant::now();
    let err = match auth.register(request).await {
        Err(AuthError::Network(err)) => err,
        other => panic!("expected a network failure, got {other:?}"),
    };

    assert_eq!(err.kind(), &ErrorKind::Client { status: 409 });
    assert_eq!(err.message(), "User already exists");
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_password_is_unauthorized() {
    let backend = Arc::new(MockBackend::new());
    let (auth, _) = clients(backend);

    auth.register(RegistrationRequest::new("ada@example.com", "Secret1!"))
        .await
        .unwrap();
    let err = auth
        .login(LoginRequest::new("ada@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.network_error().and_then(NetworkError::status), Some(401));
}

#[tokio::test(start_paused = true)]
async fn test_mismatched_confirmation_is_rejected_locally() {
    let backend = Arc::new(MockBackend::new());
    let (auth, _) = clients(backend.clone());
    let start = tokio::time::Instant::now();

    let err = auth
        .register(
            RegistrationRequest::new("ada@example.com", "Secret1!").with_confirmation("Secret2!"),
        )
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::Invalid(vec![ValidationError::PasswordMismatch]));
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(backend.store().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_every_form_error_reported_at_once() {
    let backend = Arc::new(MockBackend::new().with_faults([Failure::status(503)]));
    let (auth, _) = clients(backend.clone());

    let err = auth
        .register(
            RegistrationRequest::new("invalid-email", "weak")
                .with_confirmation("different")
                .with_name("J0hn"),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.validation_errors(),
        Some(
            &[
                ValidationError::EmailInvalid,
                ValidationError::PasswordTooShort,
                ValidationError::PasswordMismatch,
                ValidationError::NameInvalidCharacters,
            ][..]
        )
    );
    // The queued fault was never consumed: nothing was sent.
    assert_eq!(backend.pending_faults().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_faults_are_retried() {
    let backend = Arc::new(MockBackend::new().with_faults([
        Fault::Transport(Failure::status(503)),
        Fault::Transport(Failure::Timeout(None)),
        Fault::Unsuccessful(None),
    ]));
    let (auth, _) = clients(backend.clone());
    let start = tokio::time::Instant::now();

    let user = auth
        .register(RegistrationRequest::new("ada@example.com", "Secret1!"))
        .await
        .unwrap();

    assert_eq!(user.email, "ada@example.com");
    assert_eq!(backend.pending_faults().await, 0);
    // 1s + 2s + 4s before the fourth attempt
    assert_eq!(start.elapsed(), Duration::from_millis(7000));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_user_is_not_retried() {
    let backend = Arc::new(MockBackend::new());
    let failures = Arc::new(AtomicU32::new(0));
    let executor = executor().with_hook({
        let failures = failures.clone();
        move |_: &RetryEvent<'_, NetworkError>| {
            failures.fetch_add(1, Ordering::SeqCst);
        }
    });
    let users = UserClient::new(backend, executor);

    let err = users.get_user("ghost@example.com").await.unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::Client { status: 404 });
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_backend_times_out_after_retries() {
    let backend = Arc::new(
        MockBackend::new()
            .with_latency(Duration::from_secs(60))
            .with_timeout(Duration::from_secs(30)),
    );
    let (_, users) = clients(backend);

    let err = users.get_all_users().await.unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::Timeout);
    assert_eq!(err.message(), "Request timed out");
}

#[tokio::test(start_paused = true)]
async fn test_faults_pushed_at_runtime() {
    let backend = Arc::new(MockBackend::new());
    backend.push_fault(Failure::status(500)).await;
    let (_, users) = clients(backend.clone());

    assert!(users.get_all_users().await.unwrap().is_empty());
    assert_eq!(backend.pending_faults().await, 0);
}
