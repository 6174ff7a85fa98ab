//! Client-side field validation.
//!
//! Each `validate_*` field check reports the first rule the value breaks.
//! [`validate_registration`] and [`validate_login`] run every field check and
//! accumulate all failures in a [`Validation`], so a form can show every
//! problem at once instead of one per submit.
//!
//! Lengths count characters, not bytes.
//!
//! # Examples
//!
//! ```rust
//! use tideline::model::RegistrationRequest;
//! use tideline::validation::{validate_registration, Validation, ValidationError};
//!
//! let request = RegistrationRequest::new("not-an-email", "short").with_confirmation("other");
//!
//! assert_eq!(
//!     validate_registration(&request),
//!     Validation::Failure(vec![
//!         ValidationError::EmailInvalid,
//!         ValidationError::PasswordTooShort,
//!         ValidationError::PasswordMismatch,
//!     ])
//! );
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{LoginRequest, RegistrationRequest};

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;
/// Longest accepted password.
pub const MAX_PASSWORD_LEN: usize = 128;
/// Shortest accepted name, ignoring surrounding whitespace.
pub const MIN_NAME_LEN: usize = 2;
/// Longest accepted name.
pub const MAX_NAME_LEN: usize = 100;
/// Longest accepted email address.
pub const MAX_EMAIL_LEN: usize = 254;

const STRONG_PASSWORD_LEN: usize = 12;
const MIN_PASSWORD_STRENGTH: u8 = 3;
const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:'\",.<>/?`~";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("invalid regex")
});

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s\-']+$").expect("invalid regex"));

/// A rule broken by a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ValidationError {
    /// Email is blank.
    #[error("Email address is required")]
    EmailEmpty,
    /// Email does not look like `local@domain.tld`.
    #[error("Please enter a valid email address")]
    EmailInvalid,
    /// Email is longer than [`MAX_EMAIL_LEN`].
    #[error("Email address is too long")]
    EmailTooLong,
    /// Password is empty.
    #[error("Password is required")]
    PasswordEmpty,
    /// Password is shorter than [`MIN_PASSWORD_LEN`].
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
    /// Password is longer than [`MAX_PASSWORD_LEN`].
    #[error("Password must be less than 128 characters")]
    PasswordTooLong,
    /// No ASCII uppercase letter.
    #[error("Password must contain at least one uppercase letter")]
    PasswordMissingUppercase,
    /// No ASCII lowercase letter.
    #[error("Password must contain at least one lowercase letter")]
    PasswordMissingLowercase,
    /// No ASCII digit.
    #[error("Password must contain at least one number")]
    PasswordMissingNumber,
    /// None of the accepted punctuation characters.
    #[error("Password must contain at least one special character")]
    PasswordMissingSpecialCharacter,
    /// [`password_strength`] is below the accepted minimum.
    #[error("Password is too weak. Please choose a stronger password")]
    PasswordWeak,
    /// Name is blank.
    #[error("Name is required")]
    NameEmpty,
    /// Name is shorter than [`MIN_NAME_LEN`].
    #[error("Name must be at least 2 characters long")]
    NameTooShort,
    /// Name is longer than [`MAX_NAME_LEN`].
    #[error("Name must be less than 100 characters")]
    NameTooLong,
    /// Name has characters other than letters, spaces, hyphens and apostrophes.
    #[error("Name contains invalid characters")]
    NameInvalidCharacters,
    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
}

impl ValidationError {
    /// Stable numeric code, grouped by field: 1xxx email, 2xxx password,
    /// 3xxx name, 4xxx confirmation.
    pub fn code(&self) -> u16 {
        match self {
            ValidationError::EmailEmpty => 1001,
            ValidationError::EmailInvalid => 1002,
            ValidationError::EmailTooLong => 1003,
            ValidationError::PasswordEmpty => 2001,
            ValidationError::PasswordTooShort => 2002,
            ValidationError::PasswordTooLong => 2003,
            ValidationError::PasswordMissingUppercase => 2004,
            ValidationError::PasswordMissingLowercase => 2005,
            ValidationError::PasswordMissingNumber => 2006,
            ValidationError::PasswordMissingSpecialCharacter => 2007,
            ValidationError::PasswordWeak => 2008,
            ValidationError::NameEmpty => 3001,
            ValidationError::NameTooShort => 3002,
            ValidationError::NameTooLong => 3003,
            ValidationError::NameInvalidCharacters => 3004,
            ValidationError::PasswordMismatch => 4001,
        }
    }
}

/// A validation that either succeeds with a value or fails with accumulated errors.
///
/// Unlike `Result`, combining two failed validations keeps the errors of both.
///
/// ```rust
/// use tideline::validation::Validation;
///
/// let v1 = Validation::<i32, _>::failure(vec!["error1"]);
/// let v2 = Validation::<i32, _>::failure(vec!["error2"]);
///
/// assert_eq!(v1.and(v2), Validation::Failure(vec!["error1", "error2"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation<T, E> {
    /// Successful validation with a value
    Success(T),
    /// Failed validation with accumulated errors
    Failure(E),
}

impl<T, E> Validation<T, E> {
    /// Create a successful validation
    #[inline]
    pub fn success(value: T) -> Self {
        Validation::Success(value)
    }

    /// Create a failed validation
    #[inline]
    pub fn failure(error: E) -> Self {
        Validation::Failure(error)
    }

    /// Create a validation from a Result
    #[inline]
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Validation::Success(value),
            Err(error) => Validation::Failure(error),
        }
    }

    /// Convert this validation to a Result
    #[inline]
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Validation::Success(value) => Ok(value),
            Validation::Failure(error) => Err(error),
        }
    }

    /// Check if this validation is successful
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Validation::Success(_))
    }

    /// Check if this validation failed
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Validation::Failure(_))
    }

    /// Transform the success value if present
    #[inline]
    pub fn map<U, F>(self, f: F) -> Validation<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Validation::Success(value) => Validation::Success(f(value)),
            Validation::Failure(error) => Validation::Failure(error),
        }
    }
}

impl<T, E> Validation<T, Vec<E>> {
    /// Combine two validations, keeping the errors of both.
    pub fn and<U>(self, other: Validation<U, Vec<E>>) -> Validation<(T, U), Vec<E>> {
        match (self, other) {
            (Validation::Success(a), Validation::Success(b)) => Validation::Success((a, b)),
            (Validation::Failure(e), Validation::Success(_))
            | (Validation::Success(_), Validation::Failure(e)) => Validation::Failure(e),
            (Validation::Failure(mut e1), Validation::Failure(e2)) => {
                e1.extend(e2);
                Validation::Failure(e1)
            }
        }
    }

    /// Combine any number of validations, keeping every error in order.
    pub fn all_vec(validations: Vec<Validation<T, Vec<E>>>) -> Validation<Vec<T>, Vec<E>> {
        let mut values = Vec::with_capacity(validations.len());
        let mut errors = Vec::new();

        for validation in validations {
            match validation {
                Validation::Success(value) => values.push(value),
                Validation::Failure(e) => errors.extend(e),
            }
        }

        if errors.is_empty() {
            Validation::Success(values)
        } else {
            Validation::Failure(errors)
        }
    }
}

fn field(result: Result<(), ValidationError>) -> Validation<(), Vec<ValidationError>> {
    Validation::from_result(result.map_err(|e| vec![e]))
}

/// Check an email address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        Err(ValidationError::EmailEmpty)
    } else if email.chars().count() > MAX_EMAIL_LEN {
        Err(ValidationError::EmailTooLong)
    } else if !EMAIL_PATTERN.is_match(email) {
        Err(ValidationError::EmailInvalid)
    } else {
        Ok(())
    }
}

/// Check a new password against the length and character-class rules.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if password.is_empty() {
        Err(ValidationError::PasswordEmpty)
    } else if len < MIN_PASSWORD_LEN {
        Err(ValidationError::PasswordTooShort)
    } else if len > MAX_PASSWORD_LEN {
        Err(ValidationError::PasswordTooLong)
    } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
        Err(ValidationError::PasswordMissingUppercase)
    } else if !password.chars().any(|c| c.is_ascii_lowercase()) {
        Err(ValidationError::PasswordMissingLowercase)
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Err(ValidationError::PasswordMissingNumber)
    } else if !password.chars().any(is_special) {
        Err(ValidationError::PasswordMissingSpecialCharacter)
    } else if password_strength(password) < MIN_PASSWORD_STRENGTH {
        Err(ValidationError::PasswordWeak)
    } else {
        Ok(())
    }
}

/// Score a password from 0 to 5.
///
/// One point each for reaching [`MIN_PASSWORD_LEN`], reaching 12 characters,
/// and containing an uppercase letter, a lowercase letter, a digit and a
/// special character, capped at 5.
pub fn password_strength(password: &str) -> u8 {
    let len = password.chars().count();
    let checks = [
        len >= MIN_PASSWORD_LEN,
        len >= STRONG_PASSWORD_LEN,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(is_special),
    ];
    checks.iter().filter(|&&passed| passed).count().min(5) as u8
}

fn is_special(c: char) -> bool {
    SPECIAL_CHARACTERS.contains(c)
}

/// Check a display name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(ValidationError::NameEmpty)
    } else if trimmed.chars().count() < MIN_NAME_LEN {
        Err(ValidationError::NameTooShort)
    } else if name.chars().count() > MAX_NAME_LEN {
        Err(ValidationError::NameTooLong)
    } else if !NAME_PATTERN.is_match(name) {
        Err(ValidationError::NameInvalidCharacters)
    } else {
        Ok(())
    }
}

/// Check that the confirmation repeats the password exactly.
pub fn validate_password_confirmation(
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if password == confirm_password {
        Ok(())
    } else {
        Err(ValidationError::PasswordMismatch)
    }
}

/// Check every field of a registration form.
///
/// Errors come in field order: email, password, confirmation, then name when
/// one is given.
pub fn validate_registration(request: &RegistrationRequest) -> Validation<(), Vec<ValidationError>> {
    let mut checks = vec![
        field(validate_email(&request.email)),
        field(validate_password(&request.password)),
        field(validate_password_confirmation(
            &request.password,
            &request.confirm_password,
        )),
    ];
    if let Some(name) = &request.full_name {
        checks.push(field(validate_name(name)));
    }
    Validation::all_vec(checks).map(|_| ())
}

/// Check a login form.
///
/// Only presence is required of the password; strength rules apply at
/// registration.
pub fn validate_login(request: &LoginRequest) -> Validation<(), Vec<ValidationError>> {
    let password = if request.password.is_empty() {
        Err(ValidationError::PasswordEmpty)
    } else {
        Ok(())
    };
    field(validate_email(&request.email))
        .and(field(password))
        .map(|_| ())
}
