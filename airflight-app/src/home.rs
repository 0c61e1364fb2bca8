use airflight_core::assets::destination_image;
use airflight_core::models::{decode_users, Flight, FlightView};
use airflight_core::{Session, StorePath};
use chrono::Local;

use crate::error::FlowError;
use crate::search::fetch_flights;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct HomeScreen {
    pub greeting: String,
    pub email: Option<String>,
    pub flights: Vec<Flight>,
}

pub async fn load_home(state: &AppState, session: Option<&Session>) -> Result<HomeScreen, FlowError> {
    let greeting = match session {
        Some(session) => {
            let snapshot = state
                .store
                .read(&StorePath::users())
                .await
                .map_err(|e| FlowError::store("Failed to load profile.", e))?;
            decode_users(snapshot)
                .into_iter()
                .find(|u| u.email == session.email())
                .map(|u| u.name)
                .filter(|name| !name.is_empty())
        }
        None => None,
    };

    Ok(HomeScreen {
        greeting: greeting.unwrap_or_else(|| "Welcome".to_string()),
        email: session.map(|s| s.email().to_string()),
        flights: fetch_flights(state).await?,
    })
}

pub fn find_flight<'a>(flights: &'a [Flight], flight_id: &str) -> Option<&'a Flight> {
    flights.iter().find(|f| f.itinerary.flight_id == flight_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingInfo {
    pub name: String,
    pub email: String,
    pub booked_at: String,
}

/// Everything the details screen prints for a flight or a booked flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightDetails {
    pub image: &'static str,
    pub title: String,
    pub route: String,
    pub schedule: String,
    pub price: Option<String>,
    pub booking: Option<BookingInfo>,
    pub action_label: &'static str,
}

impl FlightDetails {
    pub fn from_view(view: &FlightView) -> Self {
        let it = view.itinerary();
        let booking = view.booking().map(|b| BookingInfo {
            name: b.record.name.clone(),
            email: b.record.email.clone(),
            booked_at: b
                .record
                .booked_at()
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| b.record.booked_at.clone()),
        });

        Self {
            image: destination_image(&it.to),
            title: format!("{} - {}", it.airline, it.flight_id),
            route: format!("{} → {}", it.from, it.to),
            schedule: format!("{} at {}", it.date, it.time),
            price: view.price().map(|p| format!("${}", p)),
            booking,
            action_label: view.action_label(),
        }
    }
}
