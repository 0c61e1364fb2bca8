use std::fmt;

use airflight_core::{ContactError, CoreError, FieldErrors, SessionError, StoreError};
use tracing::error;

/// A user-dismissible notice: what every flow outcome, good or bad, ends in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{}: {}", self.title, self.message)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    #[error(transparent)]
    Contact(#[from] ContactError),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already in use")]
    EmailTaken,
    #[error("Departure and destination cannot be the same.")]
    SameRoute,
    #[error("User not logged in.")]
    NotLoggedIn,
    #[error("{0}")]
    NotFound(String),
    #[error("{context}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("Session storage failed: {0}")]
    Session(#[from] SessionError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlowError {
    /// Collapse a store failure into the flow's generic message, logging the cause.
    pub fn store(context: &'static str, source: StoreError) -> Self {
        error!("{} ({})", context, source);
        FlowError::Store { context, source }
    }

    pub fn alert(&self) -> Alert {
        match self {
            FlowError::Validation(fields) => Alert::new("Invalid input", fields.to_string()),
            FlowError::Contact(e) => Alert::new(e.title(), e.to_string()),
            FlowError::InvalidCredentials => Alert::new("Invalid email or password", ""),
            FlowError::EmailTaken => Alert::new("Email already in use", ""),
            FlowError::SameRoute => Alert::new("Invalid selection", self.to_string()),
            FlowError::NotLoggedIn => Alert::new("Error", self.to_string()),
            FlowError::NotFound(what) => Alert::new("Not found", what.clone()),
            FlowError::Store { context, .. } => Alert::new("Error", *context),
            FlowError::Session(_) | FlowError::Internal(_) => {
                Alert::new("Error", "Something went wrong. Please try again.")
            }
        }
    }
}

impl From<CoreError> for FlowError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(fields) => FlowError::Validation(fields),
            CoreError::ContactError(e) => FlowError::Contact(e),
            CoreError::SameRoute => FlowError::SameRoute,
            CoreError::PasswordHash(msg) => {
                error!("Password hashing failed: {}", msg);
                FlowError::Internal(msg)
            }
        }
    }
}
