//! Login and signup forms and their validation.
//!
//! Validation runs before any database access. Messages are attached to the field that caused
//! them so the form can be re-rendered with inline errors. Usernames are taken as typed:
//! surrounding whitespace is part of the name and counts towards its length.

use serde::Deserialize;

pub const USERNAME_REQUIRED: &str = "Username is required";
pub const USERNAME_TOO_LONG: &str = "Username can't be longer than 50 characters";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
pub const PASSWORD_TOO_LONG: &str = "Password can't be longer than 50 characters";
pub const PASSWORDS_DONT_MATCH: &str = "Passwords don't match";
pub const USER_ALREADY_EXISTS: &str = "User already exists";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

const USERNAME_MAX_LENGTH: usize = 50;
const PASSWORD_MIN_LENGTH: usize = 6;
const PASSWORD_MAX_LENGTH: usize = 50;

// No Debug derives: the forms carry plain text passwords.

#[derive(Deserialize, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Default)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "confirmPassword")]
    pub confirm_password: String,
}

/// Credentials that passed validation.
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub username: Option<&'static str>,
    pub password: Option<&'static str>,
    pub confirm_password: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.confirm_password.is_none()
    }
}

/// What a re-rendered auth form shows. Passwords are never echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthFormState {
    pub username: String,
    pub errors: FieldErrors,
    /// Form-level error, such as rejected credentials.
    pub error: Option<&'static str>,
}

impl AuthFormState {
    /// A form with a form-level error and no field errors.
    pub fn with_error(username: String, error: &'static str) -> Self {
        Self {
            username,
            errors: FieldErrors::default(),
            error: Some(error),
        }
    }
}

fn validate_username(username: &str) -> Option<&'static str> {
    let length = username.chars().count();
    if length == 0 {
        Some(USERNAME_REQUIRED)
    } else if length > USERNAME_MAX_LENGTH {
        Some(USERNAME_TOO_LONG)
    } else {
        None
    }
}

fn validate_password(password: &str) -> Option<&'static str> {
    let length = password.chars().count();
    if length < PASSWORD_MIN_LENGTH {
        Some(PASSWORD_TOO_SHORT)
    } else if length > PASSWORD_MAX_LENGTH {
        Some(PASSWORD_TOO_LONG)
    } else {
        None
    }
}

impl LoginForm {
    pub fn validate(self) -> Result<Credentials, AuthFormState> {
        let username = self.username;
        let errors = FieldErrors {
            username: validate_username(&username),
            password: validate_password(&self.password),
            confirm_password: None,
        };

        if !errors.is_empty() {
            return Err(AuthFormState {
                username,
                errors,
                error: None,
            });
        }
        Ok(Credentials {
            username,
            password: self.password,
        })
    }
}

impl SignupForm {
    pub fn validate(self) -> Result<Credentials, AuthFormState> {
        let username = self.username;
        let mut errors = FieldErrors {
            username: validate_username(&username),
            password: validate_password(&self.password),
            confirm_password: validate_password(&self.confirm_password),
        };

        // Only compare once each field is valid on its own.
        if errors.is_empty() && self.password != self.confirm_password {
            errors.confirm_password = Some(PASSWORDS_DONT_MATCH);
        }

        if !errors.is_empty() {
            return Err(AuthFormState {
                username,
                errors,
                error: None,
            });
        }
        Ok(Credentials {
            username,
            password: self.password,
        })
    }
}
