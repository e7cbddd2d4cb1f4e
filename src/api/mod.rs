//! Axum routes.
//!
//! | Method   | Path             | Handler |
//! |----------|------------------|---------|
//! | GET      | `/`              | redirect to `/login` |
//! | GET/POST | `/login`         | [`auth::login_page`], [`auth::login`] |
//! | GET/POST | `/register`      | [`auth::register_page`], [`auth::register`] |
//! | GET/POST | `/forgot`        | [`auth::forgot_page`], [`auth::forgot`] |
//! | GET/POST | `/reset/{token}` | [`auth::reset_page`], [`auth::reset`] |
//! | GET      | `/logout`        | [`auth::logout`] |
//! | GET      | `/dashboard`     | [`pages::dashboard`] |
//! | GET      | `/chat`          | [`pages::chat_page`] |
//! | GET      | `/history`       | [`pages::history`] |
//! | POST     | `/get`           | [`ask::ask`] |
//! | GET      | `/health`        | [`pages::health`] |

pub mod ask;
pub mod auth;
pub mod pages;
pub mod views;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/forgot", get(auth::forgot_page).post(auth::forgot))
        .route("/reset/{token}", get(auth::reset_page).post(auth::reset))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(pages::dashboard))
        .route("/chat", get(pages::chat_page))
        .route("/history", get(pages::history))
        .route("/get", post(ask::ask))
        .route("/health", get(pages::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
