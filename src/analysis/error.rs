use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Image not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("could not decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("model inference failed: {0}")]
    Inference(String),

    #[error("classifier task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Any failure talking to the external nutrition API.
#[derive(Debug, thiserror::Error)]
pub enum NutritionApiError {
    #[error("FOOD_API_URL or FOOD_API_KEY not set in environment variables; please check .env")]
    NotConfigured,

    #[error("Nutrition API call failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Nutrition API returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Nutrition API returned invalid JSON")]
    InvalidJson,

    /// Used by test doubles and alternate lookups that fail for their own reasons.
    #[error("{0}")]
    Other(String),
}
