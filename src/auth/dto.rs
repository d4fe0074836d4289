use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::{ApiError, FieldError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Field checks for registration: name 2-100 chars, email well-formed
    /// and at most 100 chars, password at least 6 chars. All failures are
    /// collected so the client sees every problem at once.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        let name_len = self.name.trim().chars().count();
        if !(2..=100).contains(&name_len) {
            errors.push(FieldError::new(
                "name",
                "Name must be between 2 and 100 characters",
            ));
        }
        if self.email.chars().count() > 100 || !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email"));
        }
        if self.password.chars().count() < 6 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email"));
        }
        if self.password.chars().count() < 6 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public part of the user returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Token payload returned by register, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: PublicUser,
}

impl AuthResponse {
    pub fn new(access_token: String, refresh_token: String, expires_in: u64, user: User) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer",
            expires_in,
            user: user.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn fields(err: ApiError) -> Vec<&'static str> {
        match err {
            ApiError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register("Ann", "ann@x.com", "secret1").validate().is_ok());
    }

    #[test]
    fn register_rejects_short_name() {
        let err = register("A", "ann@x.com", "secret1").validate().unwrap_err();
        assert_eq!(fields(err), vec!["name"]);
    }

    #[test]
    fn register_rejects_overlong_name() {
        let name = "a".repeat(101);
        let err = register(&name, "ann@x.com", "secret1").validate().unwrap_err();
        assert_eq!(fields(err), vec!["name"]);
    }

    #[test]
    fn register_rejects_malformed_email() {
        for email in ["not-an-email", "a@b", "a b@x.com", ""] {
            let err = register("Ann", email, "secret1").validate().unwrap_err();
            assert_eq!(fields(err), vec!["email"], "email: {email:?}");
        }
    }

    #[test]
    fn register_rejects_overlong_email() {
        let email = format!("{}@x.com", "a".repeat(100));
        let err = register("Ann", &email, "secret1").validate().unwrap_err();
        assert_eq!(fields(err), vec!["email"]);
    }

    #[test]
    fn register_rejects_short_password() {
        let err = register("Ann", "ann@x.com", "12345").validate().unwrap_err();
        assert_eq!(fields(err), vec!["password"]);
    }

    #[test]
    fn register_collects_every_failure() {
        let err = register("", "nope", "123").validate().unwrap_err();
        assert_eq!(fields(err), vec!["name", "email", "password"]);
    }

    #[test]
    fn login_requires_well_formed_credentials() {
        let ok = LoginRequest {
            email: "ann@x.com".into(),
            password: "secret1".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: "nope".into(),
            password: "123".into(),
        };
        assert_eq!(fields(bad.validate().unwrap_err()), vec!["email", "password"]);
    }

    #[test]
    fn auth_response_shape() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            email: "ann@x.com".into(),
            password_hash: "hash".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let response = AuthResponse::new("acc".into(), "ref".into(), 3600, user);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["expires_in"], 3600);
        assert_eq!(json["user"]["email"], "ann@x.com");
        assert!(json["user"].get("password_hash").is_none());
    }
}
