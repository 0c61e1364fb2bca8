use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_MIN_PASSWORD_LEN: usize = 5;

/// Per-field messages shown next to the login and signup inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }

    fn into_result(self) -> crate::CoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::CoreError::ValidationError(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [&self.name, &self.email, &self.password]
            .into_iter()
            .filter_map(|m| m.as_deref())
            .collect();
        write!(f, "{}", messages.join(" "))
    }
}

/// Problems with the free-text contact fields on the booking form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("Please enter both name and email.")]
    Missing,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

impl ContactError {
    pub fn title(&self) -> &'static str {
        match self {
            ContactError::Missing => "Missing Information",
            ContactError::InvalidEmail => "Invalid Email",
        }
    }
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn email_error(email: &str) -> Option<String> {
    if email.is_empty() {
        return Some("Email cannot be empty.".to_string());
    }
    if !is_valid_email(email) {
        return Some("Ooops! We need a valid email address.".to_string());
    }
    None
}

pub fn password_error(password: &str, min_len: usize) -> Option<String> {
    if password.is_empty() {
        return Some("Password cannot be empty.".to_string());
    }
    if password.chars().count() < min_len {
        return Some(format!(
            "Password must be at least {} characters long.",
            min_len
        ));
    }
    None
}

pub fn name_error(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return Some("Name cannot be empty.".to_string());
    }
    None
}

pub fn validate_login(email: &str, password: &str, min_password_len: usize) -> crate::CoreResult<()> {
    FieldErrors {
        name: None,
        email: email_error(email),
        password: password_error(password, min_password_len),
    }
    .into_result()
}

pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
    min_password_len: usize,
) -> crate::CoreResult<()> {
    FieldErrors {
        name: name_error(name),
        email: email_error(email),
        password: password_error(password, min_password_len),
    }
    .into_result()
}

pub fn validate_contact(name: &str, email: &str) -> Result<(), ContactError> {
    if name.is_empty() || email.is_empty() {
        return Err(ContactError::Missing);
    }
    if !is_valid_email(email) {
        return Err(ContactError::InvalidEmail);
    }
    Ok(())
}
