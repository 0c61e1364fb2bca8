use airflight_core::keys::user_key;
use airflight_core::models::{decode_users, UserRecord};
use airflight_core::validation::{validate_login, validate_signup};
use airflight_core::{password, Session, StorePath};
use airflight_shared::Masked;
use tracing::{info, warn};

use crate::error::{Alert, FlowError};
use crate::state::AppState;
use crate::Screen;

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: Masked<String>,
}

#[derive(Debug, Clone)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: Masked<String>,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub session: Session,
    pub alert: Alert,
    pub next: Screen,
}

#[derive(Debug)]
pub struct SignupOutcome {
    pub alert: Alert,
    pub next: Screen,
}

/// Check credentials against every stored user and start a session on the first match.
pub async fn login(state: &AppState, form: &LoginForm) -> Result<LoginOutcome, FlowError> {
    validate_login(&form.email, form.password.expose(), state.auth.min_password_length)?;

    let snapshot = state
        .store
        .read(&StorePath::users())
        .await
        .map_err(|e| FlowError::store("Failed to sign in.", e))?;

    let input_email = form.email.to_lowercase();
    let candidates: Vec<UserRecord> = decode_users(snapshot)
        .into_iter()
        .filter(|u| u.email.to_lowercase() == input_email)
        .collect();

    for user in candidates {
        let Some(hash) = user.password_hash.clone() else {
            warn!("Ignoring legacy plaintext record for {}", input_email);
            continue;
        };
        if verify(form.password.clone(), hash).await? {
            let session = state.sessions.begin(&input_email).await?;
            return Ok(LoginOutcome {
                session,
                alert: Alert::new("Login successful", ""),
                next: Screen::Home,
            });
        }
    }

    Err(FlowError::InvalidCredentials)
}

/// Create an account unless the email is already registered.
pub async fn signup(state: &AppState, form: &SignupForm) -> Result<SignupOutcome, FlowError> {
    validate_signup(
        &form.name,
        &form.email,
        form.password.expose(),
        state.auth.min_password_length,
    )?;

    let lower_email = form.email.to_lowercase();
    let snapshot = state
        .store
        .read(&StorePath::users())
        .await
        .map_err(|e| FlowError::store("Failed to sign up.", e))?;
    if decode_users(snapshot)
        .iter()
        .any(|u| u.email.to_lowercase() == lower_email)
    {
        return Err(FlowError::EmailTaken);
    }

    let password_hash = hash(form.password.clone()).await?;
    let record = UserRecord {
        name: form.name.clone(),
        email: lower_email.clone(),
        password_hash: Some(password_hash),
        password: None,
    };
    let value = serde_json::to_value(&record).map_err(|e| FlowError::Internal(e.to_string()))?;

    // keyed by email, so a concurrent signup for the same address loses here
    let created = state
        .store
        .create(&StorePath::users().child(user_key(&lower_email)), value)
        .await
        .map_err(|e| FlowError::store("Failed to sign up.", e))?;
    if !created {
        return Err(FlowError::EmailTaken);
    }

    info!("Account created for {}", lower_email);
    Ok(SignupOutcome {
        alert: Alert::new("Signup successful", ""),
        next: Screen::Login,
    })
}

pub async fn logout(state: &AppState) -> Result<Screen, FlowError> {
    state.sessions.end().await?;
    Ok(Screen::Welcome)
}

// Argon2 runs on the blocking pool.
async fn hash(password: Masked<String>) -> Result<String, FlowError> {
    tokio::task::spawn_blocking(move || password::hash_password(password.expose()))
        .await
        .map_err(|e| FlowError::Internal(format!("Password hashing worker failed: {}", e)))?
        .map_err(FlowError::from)
}

async fn verify(password: Masked<String>, hash: String) -> Result<bool, FlowError> {
    tokio::task::spawn_blocking(move || password::verify_password(password.expose(), &hash))
        .await
        .map_err(|e| FlowError::Internal(format!("Password verification worker failed: {}", e)))
}
