//! Credentials, session cookies, and password-reset tokens.

pub mod password;
pub mod session;
pub mod token;
