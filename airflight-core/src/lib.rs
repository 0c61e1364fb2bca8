pub mod assets;
pub mod keys;
pub mod models;
pub mod password;
pub mod repository;
pub mod search;
pub mod session;
pub mod validation;

pub use keys::StorePath;
pub use repository::{RemoteStore, SessionError, SessionStore, StoreError, StoreResult};
pub use session::Session;
pub use validation::{ContactError, FieldErrors};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(FieldErrors),
    #[error(transparent)]
    ContactError(#[from] ContactError),
    #[error("Departure and destination cannot be the same.")]
    SameRoute,
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
