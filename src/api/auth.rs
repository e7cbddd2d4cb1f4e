use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::SignedCookieJar;
use chrono::Utc;

use crate::api::views::{render, ForgotPage, LoginPage, RegisterPage, ResetPage};
use crate::auth::token::{ResetTokens, TokenError};
use crate::auth::{password, session};
use crate::db::is_unique_violation;
use crate::error::AppError;
use crate::mail::reset_email;
use crate::models::{CredentialsForm, ForgotForm, ResetForm};
use crate::state::AppState;

const MAX_USERNAME_LEN: usize = 254;
const MAX_PASSWORD_LEN: usize = 1024;

/// GET /login
pub async fn login_page() -> Result<Html<String>, AppError> {
    render(&LoginPage::default())
}

/// POST /login - verify credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();

    let valid = match state.db.find_user(username).await? {
        Some(user) => {
            let plain = form.password.clone();
            tokio::task::spawn_blocking(move || {
                password::verify_password(&plain, &user.password_hash)
            })
            .await
            .map_err(anyhow::Error::from)?
        }
        None => false,
    };

    if !valid {
        tracing::info!("Failed login for '{username}'");
        let page = render(&LoginPage {
            error: Some("Invalid credentials".to_string()),
        })?;
        return Ok(page.into_response());
    }

    tracing::info!("User '{username}' logged in");
    let jar = session::start(jar, username);
    Ok((jar, Redirect::to("/dashboard")).into_response())
}

/// GET /register
pub async fn register_page() -> Result<Html<String>, AppError> {
    render(&RegisterPage)
}

/// POST /register - create the account, then send the user to log in
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, AppError> {
    let username = form.username.trim();
    validate_credentials(username, &form.password)?;

    let hash = hash_off_thread(form.password).await?;
    match state.db.create_user(username, &hash).await {
        Ok(_) => {
            tracing::info!("Registered user '{username}'");
            Ok(Redirect::to("/login"))
        }
        Err(e) if is_unique_violation(&e) => Err(AppError::UsernameTaken),
        Err(e) => Err(e.into()),
    }
}

/// GET /forgot
pub async fn forgot_page() -> Result<Html<String>, AppError> {
    render(&ForgotPage)
}

/// POST /forgot - email a signed reset link if the account exists
pub async fn forgot(
    State(state): State<AppState>,
    Form(form): Form<ForgotForm>,
) -> Result<&'static str, AppError> {
    let email = form.email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    let Some(user) = state.db.find_user(email).await? else {
        return Ok("No user found with that email.");
    };

    let token = state
        .reset_tokens
        .issue(&user.username, &user.password_hash, Utc::now().timestamp());
    let link = format!("{}/reset/{token}", state.config.public_base_url());

    state
        .mailer
        .send(reset_email(email, &link))
        .await
        .map_err(AppError::Upstream)?;

    tracing::info!("Sent password reset link to '{email}'");
    Ok("Reset link sent to your email.")
}

/// GET /reset/{token}
pub async fn reset_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Html<String>, AppError> {
    verify_reset_token(&state, &token).await?;
    render(&ResetPage { token })
}

/// POST /reset/{token} - set the new password
pub async fn reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<ResetForm>,
) -> Result<Redirect, AppError> {
    let username = verify_reset_token(&state, &token).await?;
    validate_password(&form.password)?;

    let hash = hash_off_thread(form.password).await?;
    if !state.db.update_password(&username, &hash).await? {
        // Account deleted since verification
        return Err(AppError::InvalidResetToken);
    }

    tracing::info!("Password reset for '{username}'");
    Ok(Redirect::to("/login"))
}

/// GET /logout
pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    if let Some(user) = session::current_user(&jar) {
        tracing::info!("User '{user}' logged out");
    }
    (session::end(jar), Redirect::to("/login"))
}

// ─── Helper functions ────────────────────────────────────

async fn hash_off_thread(plain: String) -> Result<String, AppError> {
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(anyhow::Error::from)??;
    Ok(hash)
}

/// Check a reset token against the account's current password hash, so a
/// link that has already been used no longer verifies.
async fn verify_reset_token(state: &AppState, token: &str) -> Result<String, AppError> {
    let reject = |e: TokenError| {
        tracing::info!("Rejected reset token: {e}");
        AppError::InvalidResetToken
    };

    let claimed = ResetTokens::claimed_user(token).map_err(reject)?;
    let Some(user) = state.db.find_user(&claimed).await? else {
        tracing::info!("Rejected reset token: no such account");
        return Err(AppError::InvalidResetToken);
    };

    state
        .reset_tokens
        .verify(token, &user.password_hash, Utc::now().timestamp())
        .map_err(reject)
}

fn validate_credentials(username: &str, password: &str) -> Result<(), AppError> {
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".to_string()));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AppError::BadRequest("Username is too long".to_string()));
    }
    validate_password(password)
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::BadRequest("Password is too long".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("alice@example.com", "pw").is_ok());
        assert!(matches!(
            validate_credentials("", "pw"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_credentials("alice", ""),
            Err(AppError::BadRequest(_))
        ));
        let long_name = "a".repeat(MAX_USERNAME_LEN + 1);
        assert!(validate_credentials(&long_name, "pw").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN)).is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }
}
