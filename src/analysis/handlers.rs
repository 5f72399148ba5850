use std::io::Write;
use std::path::Path;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use tempfile::NamedTempFile;
use tracing::{error, instrument, warn};

use super::{dto::AnalyzeError, error::AnalysisError};
use crate::state::MlState;

pub fn analyze_routes() -> Router<MlState> {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /analyze (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn analyze(State(state): State<MlState>, mut mp: Multipart) -> Response {
    let mut upload = None;
    loop {
        let field = match mp.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read multipart body");
                return failure(e.status(), format!("Invalid upload: {}", e.body_text()));
            }
        };
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            break;
        }
        match field.bytes().await {
            Ok(data) => upload = Some((filename, data)),
            Err(e) => {
                warn!(error = %e, "failed to read image field");
                return failure(e.status(), format!("Invalid upload: {}", e.body_text()));
            }
        }
        break;
    }

    let Some((filename, data)) = upload else {
        return failure(StatusCode::BAD_REQUEST, "Image file missing");
    };

    let staged = match stage_upload(&filename, data).await {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "failed to stage upload");
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Pipeline failed: {}", e),
            );
        }
    };

    // `staged` removes the file when dropped, including on client disconnect.
    let result = state.pipeline.analyze_drink_image(staged.path()).await;
    drop(staged);

    match result {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(AnalysisError::NotFound(_)) => {
            failure(StatusCode::BAD_REQUEST, "Image could not be processed")
        }
        Err(e) => {
            error!(error = %e, "pipeline failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Pipeline failed: {}", e),
            )
        }
    }
}

fn failure(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(AnalyzeError::new(msg))).into_response()
}

/// Writes the upload to a named temp file keeping its (sanitized) extension.
async fn stage_upload(filename: &str, data: Bytes) -> std::io::Result<NamedTempFile> {
    let ext = upload_extension(filename).unwrap_or_else(|| "jpg".into());
    tokio::task::spawn_blocking(move || {
        let mut file = tempfile::Builder::new()
            .prefix("nutribob-upload-")
            .suffix(&format!(".{}", ext))
            .tempfile()?;
        file.write_all(&data)?;
        file.flush()?;
        Ok::<_, std::io::Error>(file)
    })
    .await
    .map_err(std::io::Error::other)?
}

fn upload_extension(filename: &str) -> Option<String> {
    lazy_static! {
        static ref UNSAFE_RE: Regex = Regex::new(r"[^A-Za-z0-9]").unwrap();
    }
    let ext = Path::new(filename).extension()?.to_str()?;
    let clean = UNSAFE_RE.replace_all(ext, "").to_lowercase();
    (!clean.is_empty()).then_some(clean)
}
