use airflight_core::models::{decode_flights, Flight};
use airflight_core::search::{self, RouteOptions, SearchOutcome, SearchQuery};
use airflight_core::StorePath;
use tracing::info;

use crate::error::{Alert, FlowError};
use crate::state::AppState;

/// Flights fetched once when the search screen opens, with the pickers derived from them.
#[derive(Debug, Clone)]
pub struct SearchScreen {
    flights: Vec<Flight>,
    options: RouteOptions,
}

impl SearchScreen {
    pub async fn load(state: &AppState) -> Result<Self, FlowError> {
        let flights = fetch_flights(state).await?;
        Ok(Self::from_flights(flights))
    }

    pub fn from_flights(flights: Vec<Flight>) -> Self {
        let options = RouteOptions::from_flights(&flights);
        Self { flights, options }
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn search(&self, query: &SearchQuery) -> Result<SearchOutcome, FlowError> {
        let outcome = search::search(&self.flights, query)?;
        info!(
            "Search {} -> {} on {}: {} result(s)",
            query.from,
            query.to,
            search::format_date(query.date),
            outcome.results().len()
        );
        Ok(outcome)
    }
}

/// The notice that accompanies an empty result list, if any.
pub fn outcome_alert(outcome: &SearchOutcome) -> Option<Alert> {
    match outcome {
        SearchOutcome::Found(_) => None,
        SearchOutcome::NoFlightsOnDate { .. } => Some(Alert::new(
            "No Flights on Selected Date",
            "Try a different day within the same month.",
        )),
        SearchOutcome::NoFlightsInMonth => {
            Some(Alert::new("No Flights Found", "There is no flight in this month."))
        }
    }
}

pub(crate) async fn fetch_flights(state: &AppState) -> Result<Vec<Flight>, FlowError> {
    let snapshot = state
        .store
        .read(&StorePath::flights())
        .await
        .map_err(|e| FlowError::store("Failed to load flights.", e))?;
    Ok(decode_flights(snapshot))
}
