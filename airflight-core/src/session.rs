use crate::keys::{booking_owner_key, StorePath};

/// Session-store key holding the signed-in email.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// The signed-in user. The email doubles as the only credential for booking reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    email: String,
}

impl Session {
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into() }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn bookings_path(&self) -> StorePath {
        StorePath::bookings().child(booking_owner_key(&self.email))
    }

    pub fn booking_path(&self, booking_key: &str) -> StorePath {
        self.bookings_path().child(booking_key)
    }
}
