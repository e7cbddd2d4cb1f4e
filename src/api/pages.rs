use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::api::views::{render, ChatPage, DashboardPage, HistoryPage};
use crate::auth::session;
use crate::error::AppError;
use crate::state::AppState;

/// GET /
pub async fn index() -> Redirect {
    Redirect::to("/login")
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// GET /dashboard
pub async fn dashboard(jar: SignedCookieJar) -> Result<Response, AppError> {
    let Some(username) = session::current_user(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };
    Ok(render(&DashboardPage { username })?.into_response())
}

/// GET /chat
pub async fn chat_page(jar: SignedCookieJar) -> Result<Response, AppError> {
    if session::current_user(&jar).is_none() {
        return Ok(Redirect::to("/login").into_response());
    }
    Ok(render(&ChatPage)?.into_response())
}

/// GET /history - the current user's past questions, newest first
pub async fn history(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let Some(username) = session::current_user(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };
    let history = state.db.history_for(&username).await?;
    Ok(render(&HistoryPage { history })?.into_response())
}
