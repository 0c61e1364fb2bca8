use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use airflight_shared::Masked;

// ============================================================================
// Records as stored in the remote tree
// ============================================================================

/// Fields every flight-like record carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(default, deserialize_with = "string_or_number")]
    pub flight_id: String,
    #[serde(default)]
    pub airline: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub date: String, // YYYY-MM-DD
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    #[serde(flatten)]
    pub itinerary: Itinerary,
    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub itinerary: Itinerary,
    #[serde(default)]
    pub booked_at: String, // RFC 3339, UTC
}

impl BookingRecord {
    pub fn new(name: &str, email: &str, itinerary: Itinerary, booked_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            itinerary,
            booked_at: booked_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn booked_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.booked_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Account record. `password` only exists on legacy plaintext records and is never compared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<Masked<String>>,
}

impl UserRecord {
    pub fn is_legacy(&self) -> bool {
        self.password_hash.is_none()
    }
}

// ============================================================================
// Display models
// ============================================================================

/// A booking as listed on the my-bookings screen, with its store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookedFlight {
    pub key: String,
    #[serde(flatten)]
    pub record: BookingRecord,
}

/// A child of the booking collection. Non-object values become `Invalid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEntry {
    Booked(BookedFlight),
    Invalid { key: String },
}

impl BookingEntry {
    pub fn from_child(key: String, value: Value) -> Self {
        if !value.is_object() {
            return BookingEntry::Invalid { key };
        }
        match serde_json::from_value::<BookingRecord>(value) {
            Ok(record) => BookingEntry::Booked(BookedFlight { key, record }),
            Err(e) => {
                warn!("Booking {} could not be decoded: {}", key, e);
                BookingEntry::Invalid { key }
            }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            BookingEntry::Booked(b) => &b.key,
            BookingEntry::Invalid { key } => key,
        }
    }

    pub fn booked(&self) -> Option<&BookedFlight> {
        match self {
            BookingEntry::Booked(b) => Some(b),
            BookingEntry::Invalid { .. } => None,
        }
    }
}

/// What the details screen shows: a bare flight or one the user already booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightView {
    Flight(Flight),
    Booked(BookedFlight),
}

impl FlightView {
    pub fn itinerary(&self) -> &Itinerary {
        match self {
            FlightView::Flight(f) => &f.itinerary,
            FlightView::Booked(b) => &b.record.itinerary,
        }
    }

    pub fn price(&self) -> Option<&str> {
        match self {
            FlightView::Flight(f) => f.price.as_deref(),
            FlightView::Booked(_) => None,
        }
    }

    pub fn booking(&self) -> Option<&BookedFlight> {
        match self {
            FlightView::Flight(_) => None,
            FlightView::Booked(b) => Some(b),
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            FlightView::Flight(_) => "Book Now",
            FlightView::Booked(_) => "Book More",
        }
    }
}

// ============================================================================
// Collection decoding
// ============================================================================

/// Children of a collection snapshot, in key order.
///
/// The database hands back dense integer-keyed collections as arrays, so both
/// shapes are accepted. Null slots and a null snapshot yield nothing.
pub fn children(snapshot: Value) -> Vec<(String, Value)> {
    match snapshot {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn decode_flights(snapshot: Value) -> Vec<Flight> {
    decode_objects(snapshot, "flight")
}

pub fn decode_users(snapshot: Value) -> Vec<UserRecord> {
    decode_objects(snapshot, "user")
}

pub fn decode_bookings(snapshot: Value) -> Vec<BookingEntry> {
    children(snapshot)
        .into_iter()
        .map(|(key, value)| BookingEntry::from_child(key, value))
        .collect()
}

fn decode_objects<T: for<'de> Deserialize<'de>>(snapshot: Value, kind: &str) -> Vec<T> {
    children(snapshot)
        .into_iter()
        .filter_map(|(key, value)| {
            if !value.is_object() {
                warn!("Skipping non-object {} record {}", kind, key);
                return None;
            }
            serde_json::from_value(value)
                .map_err(|e| warn!("Skipping malformed {} record {}: {}", kind, key, e))
                .ok()
        })
        .collect()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string_or_number(deserializer)?.unwrap_or_default())
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
