use askama::Template;
use axum::response::Html;

use crate::error::AppError;
use crate::models::ChatRecord;

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage;

#[derive(Template)]
#[template(path = "forgot.html")]
pub struct ForgotPage;

#[derive(Template)]
#[template(path = "reset.html")]
pub struct ResetPage {
    pub token: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub username: String,
}

#[derive(Template)]
#[template(path = "chat.html")]
pub struct ChatPage;

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryPage {
    pub history: Vec<ChatRecord>,
}

pub fn render<T: Template>(page: &T) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}
