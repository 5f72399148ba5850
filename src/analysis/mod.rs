pub mod classifier;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod nutrition;
pub mod pipeline;
pub mod recipes;

use crate::state::MlState;
use axum::Router;

pub use dto::{AnalysisResult, NutritionSummary};
pub use error::{AnalysisError, NutritionApiError};
pub use pipeline::Pipeline;

pub fn router() -> Router<MlState> {
    handlers::analyze_routes()
}
