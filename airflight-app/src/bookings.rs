use airflight_core::models::{BookingRecord, FlightView, Itinerary};
use airflight_core::validation::validate_contact;
use airflight_core::Session;
use chrono::Utc;
use tracing::info;

use crate::error::{Alert, FlowError};
use crate::state::AppState;
use crate::Screen;

#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    pub name: String,
    pub email: String,
}

/// A validated booking waiting for the user's yes/no. Dropping it is declining.
#[derive(Debug, Clone)]
pub struct PendingBooking {
    name: String,
    email: String,
    itinerary: Itinerary,
}

#[derive(Debug)]
pub struct BookingOutcome {
    pub key: String,
    pub alert: Alert,
    pub next: Screen,
}

impl PendingBooking {
    pub fn prompt(&self) -> Alert {
        Alert::new("Confirm Booking", "Do you want to book this flight?")
    }

    pub fn itinerary(&self) -> &Itinerary {
        &self.itinerary
    }

    /// Append the booking under the session's collection.
    ///
    /// The stored `name`/`email` are the form values; the session only picks the path.
    pub async fn commit(
        self,
        state: &AppState,
        session: Option<&Session>,
    ) -> Result<BookingOutcome, FlowError> {
        let session = session.ok_or(FlowError::NotLoggedIn)?;

        let record = BookingRecord::new(&self.name, &self.email, self.itinerary, Utc::now());
        let value = serde_json::to_value(&record).map_err(|e| FlowError::Internal(e.to_string()))?;
        let path = session.bookings_path();

        let key = state
            .store
            .push(&path, value)
            .await
            .map_err(|e| FlowError::store("Failed to book flight.", e))?;

        info!("Booking {} stored under {}", key, path);
        Ok(BookingOutcome {
            key,
            alert: Alert::new("Booking Confirmed", "Your flight has been booked successfully."),
            next: Screen::Search,
        })
    }
}

/// Validate the contact fields for booking `view`. No store access happens here.
pub fn prepare_booking(view: &FlightView, form: &BookingForm) -> Result<PendingBooking, FlowError> {
    validate_contact(&form.name, &form.email)?;
    Ok(PendingBooking {
        name: form.name.clone(),
        email: form.email.clone(),
        itinerary: view.itinerary().clone(),
    })
}
