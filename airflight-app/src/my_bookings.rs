use airflight_core::models::{decode_bookings, BookingEntry};
use airflight_core::Session;
use tracing::info;

use crate::error::{Alert, FlowError};
use crate::state::AppState;

/// Fetch every booking in the session's collection. No session means an empty list.
pub async fn list_bookings(
    state: &AppState,
    session: Option<&Session>,
) -> Result<Vec<BookingEntry>, FlowError> {
    let Some(session) = session else {
        return Ok(Vec::new());
    };
    let snapshot = state
        .store
        .read(&session.bookings_path())
        .await
        .map_err(|e| FlowError::store("Failed to load bookings.", e))?;
    Ok(decode_bookings(snapshot))
}

/// A cancellation waiting for the user's yes/no.
#[derive(Debug, Clone)]
pub struct PendingCancellation {
    key: String,
}

#[derive(Debug)]
pub struct CancellationOutcome {
    pub bookings: Vec<BookingEntry>,
    pub alert: Alert,
}

pub fn prepare_cancellation(booking_key: &str) -> PendingCancellation {
    PendingCancellation {
        key: booking_key.to_string(),
    }
}

impl PendingCancellation {
    pub fn prompt(&self) -> Alert {
        Alert::new("Cancel Booking", "Are you sure you want to cancel this booking?")
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Delete the booking, then refetch the whole list.
    pub async fn commit(
        self,
        state: &AppState,
        session: Option<&Session>,
    ) -> Result<CancellationOutcome, FlowError> {
        let session = session.ok_or(FlowError::NotLoggedIn)?;

        state
            .store
            .remove(&session.booking_path(&self.key))
            .await
            .map_err(|e| FlowError::store("Failed to cancel booking.", e))?;
        info!("Booking {} canceled", self.key);

        let bookings = list_bookings(state, Some(session)).await?;
        Ok(CancellationOutcome {
            bookings,
            alert: Alert::new("Booking canceled successfully", ""),
        })
    }
}
