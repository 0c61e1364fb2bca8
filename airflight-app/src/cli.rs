//! Terminal front end: one subcommand per screen action.

use std::io::{self, Write};
use std::process::ExitCode;

use airflight_core::models::{BookingEntry, Flight, FlightView, Itinerary};
use airflight_core::search::{format_date, SearchOutcome, SearchQuery};
use airflight_shared::Masked;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::auth::{self, LoginForm, SignupForm};
use crate::bookings::{prepare_booking, BookingForm};
use crate::error::{Alert, FlowError};
use crate::home::{self, FlightDetails};
use crate::my_bookings::{self, prepare_cancellation};
use crate::search::{outcome_alert, SearchScreen};
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "airflight", version, about = "Search, book and cancel flights")]
pub struct Cli {
    /// Use the in-memory store instead of the configured backend.
    #[arg(long, global = true)]
    pub memory: bool,

    /// Answer yes to every confirmation.
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Profile greeting and every flight.
    Home,
    /// Departure and destination choices.
    Routes,
    /// Show a flight, or one of your bookings with --booking.
    Details {
        #[arg(required_unless_present = "booking")]
        flight_id: Option<String>,
        #[arg(long, conflicts_with = "flight_id")]
        booking: Option<String>,
    },
    /// Find flights on a route for a day (defaults to today).
    Search {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "AIRFLIGHT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "AIRFLIGHT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Book a flight, or book again from one of your bookings with --booking.
    Book {
        #[arg(required_unless_present = "booking")]
        flight_id: Option<String>,
        #[arg(long, conflicts_with = "flight_id")]
        booking: Option<String>,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// List your bookings.
    Bookings,
    /// Cancel one of your bookings by key.
    Cancel { key: String },
}

/// Run one command. Failures print their alert and turn into a non-zero exit code.
pub async fn run(cli: Cli, state: &AppState) -> ExitCode {
    match dispatch(cli, state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(FlowError::Validation(fields)) => {
            for message in [&fields.name, &fields.email, &fields.password]
                .into_iter()
                .flatten()
            {
                eprintln!("{}", message);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", e.alert());
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli, state: &AppState) -> Result<(), FlowError> {
    match cli.command {
        Command::Home => {
            let session = state.sessions.current().await?;
            let screen = home::load_home(state, session.as_ref()).await?;
            println!("{}", screen.greeting);
            if let Some(email) = &screen.email {
                println!("{}", email);
            }
            println!();
            print_flights(&screen.flights);
        }
        Command::Routes => {
            let screen = SearchScreen::load(state).await?;
            println!("From: {}", screen.options().origins.join(", "));
            println!("To:   {}", screen.options().destinations.join(", "));
        }
        Command::Details { flight_id, booking } => {
            let view = resolve_view(state, flight_id, booking).await?;
            print_details(&FlightDetails::from_view(&view));
        }
        Command::Search { from, to, date } => {
            let screen = SearchScreen::load(state).await?;
            let query = SearchQuery {
                from,
                to,
                date: date.unwrap_or_else(|| Local::now().date_naive()),
            };
            let outcome = screen.search(&query)?;
            if let Some(alert) = outcome_alert(&outcome) {
                println!("{}", alert);
            }
            if let SearchOutcome::NoFlightsOnDate { other_days } = &outcome {
                let days: Vec<String> = other_days.iter().map(|d| format_date(*d)).collect();
                println!("Flights this month: {}", days.join(", "));
            }
            print_flights(outcome.results());
        }
        Command::Signup { name, email, password } => {
            let form = SignupForm {
                name,
                email,
                password: Masked(password),
            };
            let outcome = auth::signup(state, &form).await?;
            println!("{}", outcome.alert);
        }
        Command::Login { email, password } => {
            let form = LoginForm {
                email,
                password: Masked(password),
            };
            let outcome = auth::login(state, &form).await?;
            println!("{} ({})", outcome.alert, outcome.session.email());
        }
        Command::Logout => {
            auth::logout(state).await?;
            println!("Signed out");
        }
        Command::Book {
            flight_id,
            booking,
            name,
            email,
        } => {
            let view = resolve_view(state, flight_id, booking).await?;
            let pending = prepare_booking(&view, &BookingForm { name, email })?;
            println!("{}", flight_line(pending.itinerary()));
            if !confirm(&pending.prompt(), cli.yes)? {
                return Ok(());
            }
            let session = state.sessions.current().await?;
            let outcome = pending.commit(state, session.as_ref()).await?;
            println!("{}", outcome.alert);
            println!("Booking key: {}", outcome.key);
        }
        Command::Bookings => {
            let session = state.sessions.current().await?;
            let bookings = my_bookings::list_bookings(state, session.as_ref()).await?;
            print_bookings(&bookings);
        }
        Command::Cancel { key } => {
            let pending = prepare_cancellation(&key);
            println!("Booking {}", pending.key());
            if !confirm(&pending.prompt(), cli.yes)? {
                return Ok(());
            }
            let session = state.sessions.current().await?;
            let outcome = pending.commit(state, session.as_ref()).await?;
            println!("{}", outcome.alert);
            print_bookings(&outcome.bookings);
        }
    }
    Ok(())
}

async fn resolve_view(
    state: &AppState,
    flight_id: Option<String>,
    booking: Option<String>,
) -> Result<FlightView, FlowError> {
    if let Some(key) = booking {
        let session = state.sessions.current().await?.ok_or(FlowError::NotLoggedIn)?;
        let bookings = my_bookings::list_bookings(state, Some(&session)).await?;
        return bookings
            .into_iter()
            .find_map(|entry| match entry {
                BookingEntry::Booked(b) if b.key == key => Some(FlightView::Booked(b)),
                _ => None,
            })
            .ok_or_else(|| FlowError::NotFound(format!("No booking with key {}", key)));
    }

    let flight_id = flight_id.unwrap_or_default();
    let screen = SearchScreen::load(state).await?;
    home::find_flight(screen.flights(), &flight_id)
        .cloned()
        .map(FlightView::Flight)
        .ok_or_else(|| FlowError::NotFound(format!("No flight with id {}", flight_id)))
}

fn confirm(prompt: &Alert, assume_yes: bool) -> Result<bool, FlowError> {
    if assume_yes {
        return Ok(true);
    }
    let ask = || -> io::Result<bool> {
        print!("{} [y/N] ", prompt);
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
    };
    ask().map_err(|e| FlowError::Internal(e.to_string()))
}

fn print_flights(flights: &[Flight]) {
    for f in flights {
        let price = f.price.as_deref().map(|p| format!("  ${}", p)).unwrap_or_default();
        println!("{}{}", flight_line(&f.itinerary), price);
    }
}

fn flight_line(it: &Itinerary) -> String {
    format!(
        "{} - {}  {} → {}  {} | {}",
        it.airline, it.flight_id, it.from, it.to, it.date, it.time
    )
}

fn print_details(details: &FlightDetails) {
    println!("[{}]", details.image);
    println!("{}", details.title);
    println!("{}", details.route);
    println!("{}", details.schedule);
    if let Some(price) = &details.price {
        println!("Price: {}", price);
    }
    if let Some(info) = &details.booking {
        println!();
        println!("Booking Info");
        println!("Name: {}", info.name);
        println!("Email: {}", info.email);
        println!("Booked at: {}", info.booked_at);
    }
    println!();
    println!("> {}", details.action_label);
}

fn print_bookings(bookings: &[BookingEntry]) {
    if bookings.is_empty() {
        println!("You have no bookings yet.");
        return;
    }
    for entry in bookings {
        match entry {
            BookingEntry::Booked(b) => {
                let it = &b.record.itinerary;
                println!("[{}] {} - {}", b.key, it.airline, it.flight_id);
                println!("    {} → {}  {} | {}", it.from, it.to, it.date, it.time);
                println!("    Booked by: {} ({})", b.record.name, b.record.email);
            }
            BookingEntry::Invalid { key } => println!("[{}] (unreadable booking)", key),
        }
    }
}
