//! Account data exchanged with the backend.

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    /// Login identifier; also used as the user id.
    pub email: String,
    /// Plain-text password. The backend is a demo store.
    pub password: String,
}

/// Body of a registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RegistrationRequest {
    /// Requested login.
    pub email: String,
    /// Requested password.
    pub password: String,
    /// Must match `password`.
    pub confirm_password: String,
    /// Display name, checked only when present.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub full_name: Option<String>,
}

impl RegistrationRequest {
    /// Build a request whose confirmation matches the password.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            email: email.into(),
            confirm_password: password.clone(),
            password,
            full_name: None,
        }
    }

    /// Override the confirmation field.
    pub fn with_confirmation(mut self, confirm_password: impl Into<String>) -> Self {
        self.confirm_password = confirm_password.into();
        self
    }

    /// Attach a display name.
    pub fn with_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }
}

/// Body of a login call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoginRequest {
    /// Login.
    pub email: String,
    /// Password.
    pub password: String,
}

impl LoginRequest {
    /// Build a login request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_registration_uses_camel_case() {
        let json = serde_json::to_value(RegistrationRequest::new("a@b.co", "pw")).unwrap();
        assert_eq!(json["confirmPassword"], "pw");
        assert!(json.get("fullName").is_none());

        let named = RegistrationRequest::new("a@b.co", "pw").with_name("Ada");
        let json = serde_json::to_value(&named).unwrap();
        assert_eq!(json["fullName"], "Ada");
        let back: RegistrationRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, named);
    }
}
