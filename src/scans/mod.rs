pub mod dto;
pub mod handlers;
pub mod ml_client;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use ml_client::{MlClient, MlServiceError};
pub use repo_types::{NutritionFacts, ScanDocument, ScanImage, ScanListRow};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
