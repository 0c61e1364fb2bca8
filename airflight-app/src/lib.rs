pub mod auth;
pub mod bookings;
pub mod cli;
pub mod error;
pub mod home;
pub mod my_bookings;
pub mod search;
pub mod state;

pub use error::{Alert, FlowError};
pub use state::{AppState, AuthSettings, SessionManager};

/// Where the front end should go after a flow finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Login,
    Home,
    Search,
}
