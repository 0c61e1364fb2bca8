use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use airflight_app::auth::{self, LoginForm, SignupForm};
use airflight_app::cli::{self, Cli};
use airflight_app::bookings::{prepare_booking, BookingForm};
use airflight_app::home;
use airflight_app::my_bookings::{list_bookings, prepare_cancellation};
use airflight_app::search::{outcome_alert, SearchScreen};
use airflight_app::{AppState, AuthSettings, FlowError, Screen};
use airflight_core::models::{BookingEntry, Flight, FlightView};
use airflight_core::search::{SearchOutcome, SearchQuery};
use airflight_core::{RemoteStore, Session, StoreError, StorePath, StoreResult};
use airflight_shared::Masked;
use airflight_store::{FileSessionStore, MemorySessionStore, MemoryStore};
use async_trait::async_trait;
use chrono::NaiveDate;
use clap::Parser;
use serde_json::{json, Value};

/// Memory store that counts calls and can be told to fail deletes.
struct RecordingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    fail_removes: AtomicBool,
}

impl RecordingStore {
    fn new(data: Value) -> Self {
        Self {
            inner: MemoryStore::with_data(data),
            calls: AtomicUsize::new(0),
            fail_removes: AtomicBool::new(false),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for RecordingStore {
    async fn read(&self, path: &StorePath) -> StoreResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.read(path).await
    }

    async fn push(&self, path: &StorePath, record: Value) -> StoreResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.push(path, record).await
    }

    async fn create(&self, path: &StorePath, record: Value) -> StoreResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create(path, record).await
    }

    async fn remove(&self, path: &StorePath) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        self.inner.remove(path).await
    }
}

fn seed() -> Value {
    json!({
        "flights": {
            "f1": {"flight_id": "TG201", "airline": "Thai Airways", "from": "BKK", "to": "HKT", "date": "2024-06-10", "time": "08:15", "price": 1890},
            "f2": {"flight_id": "FD3021", "airline": "Thai AirAsia", "from": "BKK", "to": "CNX", "date": "2024-06-12", "time": "13:40", "price": 1290}
        }
    })
}

fn app(data: Value) -> (AppState, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::new(data));
    let state = AppState::new(
        store.clone(),
        Arc::new(MemorySessionStore::new()),
        AuthSettings {
            min_password_length: 5,
        },
    );
    (state, store)
}

fn signup_form(name: &str, email: &str, password: &str) -> SignupForm {
    SignupForm {
        name: name.to_string(),
        email: email.to_string(),
        password: Masked::from(password),
    }
}

fn login_form(email: &str, password: &str) -> LoginForm {
    LoginForm {
        email: email.to_string(),
        password: Masked::from(password),
    }
}

async fn first_flight(state: &AppState) -> Flight {
    let screen = SearchScreen::load(state).await.unwrap();
    home::find_flight(screen.flights(), "TG201").cloned().unwrap()
}

async fn book(state: &AppState, session: &Session, name: &str) -> String {
    let view = FlightView::Flight(first_flight(state).await);
    let form = BookingForm {
        name: name.to_string(),
        email: "contact@example.com".to_string(),
    };
    prepare_booking(&view, &form)
        .unwrap()
        .commit(state, Some(session))
        .await
        .unwrap()
        .key
}

#[tokio::test]
async fn test_signup_then_login() {
    let (state, store) = app(seed());

    let outcome = auth::signup(&state, &signup_form("Jane", "Jane.Doe@Example.com", "secret1"))
        .await
        .unwrap();
    assert_eq!(outcome.next, Screen::Login);

    let users = store.inner.read(&StorePath::users()).await.unwrap();
    let record = &users["jane,doe@example,com"];
    assert_eq!(record["email"], "jane.doe@example.com");
    assert!(record.get("password").is_none());
    assert!(record["password_hash"].as_str().unwrap().starts_with("$argon2"));

    let login = auth::login(&state, &login_form("JANE.DOE@example.com", "secret1"))
        .await
        .unwrap();
    assert_eq!(login.next, Screen::Home);
    assert_eq!(login.session.email(), "jane.doe@example.com");
    assert_eq!(state.sessions.current().await.unwrap(), Some(login.session));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (state, _) = app(seed());
    auth::signup(&state, &signup_form("Jane", "jane@example.com", "secret1"))
        .await
        .unwrap();

    let wrong_password = auth::login(&state, &login_form("jane@example.com", "secret2"))
        .await
        .unwrap_err();
    let wrong_email = auth::login(&state, &login_form("john@example.com", "secret1"))
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, FlowError::InvalidCredentials));
    assert_eq!(wrong_password.alert(), wrong_email.alert());
    assert!(state.sessions.current().await.unwrap().is_none());
}

#[tokio::test]
async fn test_short_password_rejected_before_any_store_call() {
    let (state, store) = app(seed());

    let err = auth::login(&state, &login_form("jane@example.com", "1234"))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Validation(ref f) if f.password.is_some()));

    let err = auth::signup(&state, &signup_form("Jane", "jane@example", "1234"))
        .await
        .unwrap_err();
    match err {
        FlowError::Validation(fields) => {
            assert!(fields.email.is_some());
            assert!(fields.password.is_some());
            assert!(fields.name.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_duplicate_email_rejected_case_insensitively() {
    let (state, _) = app(seed());
    auth::signup(&state, &signup_form("Jane", "jane@example.com", "secret1"))
        .await
        .unwrap();

    let err = auth::signup(&state, &signup_form("Other", "JANE@EXAMPLE.COM", "secret9"))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::EmailTaken));
}

#[tokio::test]
async fn test_concurrent_signups_create_one_account() {
    let (state, store) = app(seed());
    let a = signup_form("Jane", "jane@example.com", "secret1");
    let b = signup_form("Jane Again", "jane@example.com", "secret2");

    let (first, second) = tokio::join!(auth::signup(&state, &a), auth::signup(&state, &b));
    assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);

    let users = store.inner.read(&StorePath::users()).await.unwrap();
    assert_eq!(users.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_legacy_plaintext_user_cannot_login() {
    let mut data = seed();
    data["users"] = json!({
        "-Legacy1": {"name": "Old", "email": "old@example.com", "password": "secret1"}
    });
    let (state, _) = app(data);

    let err = auth::login(&state, &login_form("old@example.com", "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::InvalidCredentials));

    // and the address still counts as taken
    let err = auth::signup(&state, &signup_form("Old", "old@example.com", "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::EmailTaken));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (state, _) = app(seed());
    state.sessions.begin("jane@example.com").await.unwrap();

    assert_eq!(auth::logout(&state).await.unwrap(), Screen::Welcome);
    assert!(state.sessions.current().await.unwrap().is_none());
}

#[tokio::test]
async fn test_search_through_store() {
    let (state, _) = app(seed());
    let screen = SearchScreen::load(&state).await.unwrap();
    assert_eq!(screen.options().origins, vec!["BKK"]);
    assert_eq!(screen.options().destinations, vec!["HKT", "CNX"]);

    let query = |date: &str| SearchQuery {
        from: "BKK".to_string(),
        to: "HKT".to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
    };

    let hit = screen.search(&query("2024-06-10")).unwrap();
    assert_eq!(hit.results().len(), 1);
    assert!(outcome_alert(&hit).is_none());

    // same-month flight exists but only exact-day results are listed
    let miss = screen.search(&query("2024-06-15")).unwrap();
    assert!(miss.results().is_empty());
    assert!(matches!(miss, SearchOutcome::NoFlightsOnDate { .. }));
    assert_eq!(outcome_alert(&miss).unwrap().title, "No Flights on Selected Date");

    let none = screen.search(&query("2024-07-01")).unwrap();
    assert_eq!(none, SearchOutcome::NoFlightsInMonth);
    assert_eq!(outcome_alert(&none).unwrap().message, "There is no flight in this month.");

    let same = SearchQuery {
        from: "BKK".to_string(),
        to: "BKK".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
    };
    assert!(matches!(screen.search(&same), Err(FlowError::SameRoute)));
}

#[tokio::test]
async fn test_booking_stored_under_sanitized_session_email() {
    let (state, store) = app(seed());
    let session = Session::new("a.b@x.com");

    let key = book(&state, &session, "Jane").await;

    let stored = store
        .inner
        .read(&StorePath::bookings().child("a_b@x_com").child(key.clone()))
        .await
        .unwrap();
    assert_eq!(stored["name"], "Jane");
    assert_eq!(stored["email"], "contact@example.com");
    assert_eq!(stored["flight_id"], "TG201");
    assert_eq!(stored["from"], "BKK");
    assert!(stored["booked_at"].as_str().unwrap().ends_with('Z'));
    assert!(stored.get("price").is_none());
}

#[tokio::test]
async fn test_booking_requires_session_and_valid_contact() {
    let (state, store) = app(seed());
    let view = FlightView::Flight(first_flight(&state).await);
    let calls_before = store.calls();

    let missing = prepare_booking(&view, &BookingForm::default()).unwrap_err();
    assert_eq!(missing.alert().title, "Missing Information");

    let bad_email = prepare_booking(
        &view,
        &BookingForm {
            name: "Jane".into(),
            email: "jane@nowhere".into(),
        },
    )
    .unwrap_err();
    assert_eq!(bad_email.alert().message, "Please enter a valid email address.");
    assert_eq!(store.calls(), calls_before);

    let pending = prepare_booking(
        &view,
        &BookingForm {
            name: "Jane".into(),
            email: "jane@example.com".into(),
        },
    )
    .unwrap();
    assert_eq!(pending.itinerary().flight_id, "TG201");
    let err = pending.commit(&state, None).await.unwrap_err();
    assert!(matches!(err, FlowError::NotLoggedIn));
    assert_eq!(store.inner.read(&StorePath::bookings()).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_book_more_from_booked_flight() {
    let (state, _) = app(seed());
    let session = Session::new("jane@example.com");
    book(&state, &session, "Jane").await;

    let entries = list_bookings(&state, Some(&session)).await.unwrap();
    let booked = entries[0].booked().cloned().unwrap();
    let view = FlightView::Booked(booked);
    assert_eq!(view.action_label(), "Book More");

    prepare_booking(
        &view,
        &BookingForm {
            name: "Jane".into(),
            email: "jane@example.com".into(),
        },
    )
    .unwrap()
    .commit(&state, Some(&session))
    .await
    .unwrap();

    let entries = list_bookings(&state, Some(&session)).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[1].booked().unwrap().record.itinerary.flight_id,
        "TG201"
    );
}

#[tokio::test]
async fn test_cancel_removes_only_that_booking() {
    let (state, store) = app(seed());
    let jane = Session::new("jane@example.com");
    let john = Session::new("john@example.com");

    let keep = book(&state, &jane, "Jane").await;
    let doomed = book(&state, &jane, "Jane").await;
    let other = book(&state, &john, "John").await;

    let pending = prepare_cancellation(&doomed);
    assert_eq!(pending.prompt().title, "Cancel Booking");
    assert_eq!(pending.key(), doomed);
    let outcome = pending.commit(&state, Some(&jane)).await.unwrap();

    let remaining: Vec<&str> = outcome.bookings.iter().map(BookingEntry::key).collect();
    assert_eq!(remaining, vec![keep.as_str()]);
    assert_eq!(outcome.alert.title, "Booking canceled successfully");

    let johns = list_bookings(&state, Some(&john)).await.unwrap();
    assert_eq!(johns.len(), 1);
    assert_eq!(johns[0].key(), other);
    assert!(!store
        .inner
        .read(&john.bookings_path())
        .await
        .unwrap()
        .is_null());
}

#[tokio::test]
async fn test_failed_cancel_leaves_bookings_unchanged() {
    let (state, store) = app(seed());
    let jane = Session::new("jane@example.com");
    book(&state, &jane, "Jane").await;
    let target = book(&state, &jane, "Jane").await;

    let before = list_bookings(&state, Some(&jane)).await.unwrap();
    store.fail_removes.store(true, Ordering::SeqCst);

    let err = prepare_cancellation(&target)
        .commit(&state, Some(&jane))
        .await
        .unwrap_err();
    assert_eq!(err.alert().message, "Failed to cancel booking.");

    let after = list_bookings(&state, Some(&jane)).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_bookings_listing() {
    let mut data = seed();
    data["bookings"] = json!({
        "jane@example_com": {
            "-N1": {"name": "Jane", "email": "jane@example.com", "flight_id": "TG201"},
            "-N2": "garbage"
        }
    });
    let (state, store) = app(data);

    let none = list_bookings(&state, None).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(store.calls(), 0);

    let entries = list_bookings(&state, Some(&Session::new("jane@example.com")))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].booked().is_some());
    assert_eq!(entries[1], BookingEntry::Invalid { key: "-N2".to_string() });
}

#[tokio::test]
async fn test_home_greets_signed_in_user() {
    let (state, _) = app(seed());
    auth::signup(&state, &signup_form("Jane", "jane@example.com", "secret1"))
        .await
        .unwrap();
    let session = auth::login(&state, &login_form("jane@example.com", "secret1"))
        .await
        .unwrap()
        .session;

    let screen = home::load_home(&state, Some(&session)).await.unwrap();
    assert_eq!(screen.greeting, "Jane");
    assert_eq!(screen.email.as_deref(), Some("jane@example.com"));
    assert_eq!(screen.flights.len(), 2);

    let anonymous = home::load_home(&state, None).await.unwrap();
    assert_eq!(anonymous.greeting, "Welcome");
    assert!(anonymous.email.is_none());
}

#[tokio::test]
async fn test_emails_with_reserved_characters_can_sign_up() {
    let (state, store) = app(seed());

    for email in ["a#b@example.com", "a$b@example.com", "a/b@example.com", "[a]@example.com"] {
        auth::signup(&state, &signup_form("Jane", email, "secret1"))
            .await
            .unwrap();
        let login = auth::login(&state, &login_form(email, "secret1"))
            .await
            .unwrap();
        assert_eq!(login.session.email(), email);

        let err = auth::signup(&state, &signup_form("Jane", email, "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::EmailTaken));
    }

    let users = store.inner.read(&StorePath::users()).await.unwrap();
    assert_eq!(users["a%23b@example,com"]["email"], "a#b@example.com");
}

#[tokio::test]
async fn test_booking_under_email_with_reserved_characters() {
    let (state, store) = app(seed());
    let session = Session::new("a#b@x.com");

    let key = book(&state, &session, "Jane").await;

    let stored = store
        .inner
        .read(&StorePath::bookings().child("a%23b@x_com").child(key))
        .await
        .unwrap();
    assert_eq!(stored["name"], "Jane");
}

#[tokio::test]
async fn test_corrupt_session_file_does_not_lock_user_out() {
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let store = Arc::new(RecordingStore::new(seed()));
    let state = AppState::new(
        store,
        Arc::new(FileSessionStore::new(&session_path)),
        AuthSettings {
            min_password_length: 5,
        },
    );
    auth::signup(&state, &signup_form("Jane", "jane@example.com", "secret1"))
        .await
        .unwrap();

    std::fs::write(&session_path, "{not json").unwrap();
    assert!(state.sessions.current().await.unwrap().is_none());
    let bookings = list_bookings(&state, state.sessions.current().await.unwrap().as_ref())
        .await
        .unwrap();
    assert!(bookings.is_empty());

    cli::run(Cli::parse_from(["airflight", "logout"]), &state).await;
    assert!(!session_path.exists());

    std::fs::write(&session_path, "{not json").unwrap();
    cli::run(
        Cli::parse_from([
            "airflight",
            "login",
            "--email",
            "jane@example.com",
            "--password",
            "secret1",
        ]),
        &state,
    )
    .await;
    let session = state.sessions.current().await.unwrap().unwrap();
    assert_eq!(session.email(), "jane@example.com");
    assert!(std::fs::read_to_string(&session_path)
        .unwrap()
        .contains("jane@example.com"));
}
