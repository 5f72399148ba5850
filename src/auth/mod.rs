use crate::state::AppState;
use axum::Router;

pub mod cookies;
mod dto;
pub mod handlers;
pub mod oauth;
pub mod services;

pub use dto::{Profile, SessionKeys};
pub use services::SessionUser;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
