use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::Flight;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub from: String,
    pub to: String,
    pub date: NaiveDate, // local calendar date picked by the user
}

/// Distinct departure and destination names, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteOptions {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
}

impl RouteOptions {
    pub fn from_flights(flights: &[Flight]) -> Self {
        let mut options = RouteOptions::default();
        for flight in flights {
            push_unique(&mut options.origins, &flight.itinerary.from);
            push_unique(&mut options.destinations, &flight.itinerary.to);
        }
        options
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Flights on the exact day.
    Found(Vec<Flight>),
    /// The route flies this month but not on the chosen day. Nothing is listed;
    /// `other_days` names the days in that month that do have flights.
    NoFlightsOnDate { other_days: Vec<NaiveDate> },
    /// The route has no flights in the chosen month.
    NoFlightsInMonth,
}

impl SearchOutcome {
    /// The result list shown to the user.
    pub fn results(&self) -> &[Flight] {
        match self {
            SearchOutcome::Found(flights) => flights,
            SearchOutcome::NoFlightsOnDate { .. } | SearchOutcome::NoFlightsInMonth => &[],
        }
    }
}

/// Zero-padded `YYYY-MM-DD`, the format flight dates are stored in.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Narrow `flights` to the route in the chosen month, then to the exact day.
pub fn search(flights: &[Flight], query: &SearchQuery) -> CoreResult<SearchOutcome> {
    if query.from == query.to {
        return Err(CoreError::SameRoute);
    }

    let month_matches: Vec<&Flight> = flights
        .iter()
        .filter(|f| f.itinerary.from == query.from && f.itinerary.to == query.to)
        .filter(|f| {
            parse_date(&f.itinerary.date)
                .map(|d| d.year() == query.date.year() && d.month() == query.date.month())
                .unwrap_or(false)
        })
        .collect();

    if month_matches.is_empty() {
        return Ok(SearchOutcome::NoFlightsInMonth);
    }

    let wanted = format_date(query.date);
    let same_day: Vec<Flight> = month_matches
        .iter()
        .filter(|f| f.itinerary.date == wanted)
        .map(|f| (*f).clone())
        .collect();

    if same_day.is_empty() {
        let mut other_days: Vec<NaiveDate> = month_matches
            .iter()
            .filter_map(|f| parse_date(&f.itinerary.date))
            .collect();
        other_days.sort();
        other_days.dedup();
        return Ok(SearchOutcome::NoFlightsOnDate { other_days });
    }

    Ok(SearchOutcome::Found(same_day))
}
