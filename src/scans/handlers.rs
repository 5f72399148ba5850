use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use tracing::{instrument, warn};

use super::{
    dto::HistoryItem,
    services::{process_upload, Upload, MAX_IMAGE_SIZE_BYTES},
};
use crate::{
    auth::{cookies::Flash, handlers::with_flash_cleared, SessionUser},
    error::AppError,
    state::AppState,
    views::{self, ResultView},
};

const HISTORY_LIMIT: i64 = 50;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/scan", get(scan_page))
        .route("/history", get(history))
        .route("/image/:scan_id", get(image))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/scan", post(scan_upload))
        // legacy form target
        .route("/result", post(scan_upload))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE_BYTES + 4 * 1024 * 1024))
}

pub async fn scan_page(user: SessionUser, headers: HeaderMap) -> Response {
    let flash = Flash::from_headers(&headers);
    with_flash_cleared(flash, views::scan_page(&user, flash))
}

/// POST /scan (multipart: `image1`, falling back to `image2`)
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn scan_upload(
    State(state): State<AppState>,
    user: SessionUser,
    mut mp: Multipart,
) -> Result<Response, AppError> {
    let mut image1: Option<Upload> = None;
    let mut image2: Option<Upload> = None;

    loop {
        let field = match mp.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => return upload_error(e),
        };
        let slot = match field.name() {
            Some("image1") => &mut image1,
            Some("image2") => &mut image2,
            _ => continue,
        };
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = match field.bytes().await {
            Ok(b) => b,
            Err(e) => return upload_error(e),
        };
        *slot = Some(Upload {
            filename,
            content_type,
            body,
        });
    }

    let Some(upload) = image1.or(image2) else {
        return Ok(flash_redirect(Flash::MissingImage));
    };
    if upload.body.is_empty() {
        return Ok(flash_redirect(Flash::EmptyImage));
    }
    if upload.body.len() > MAX_IMAGE_SIZE_BYTES {
        return Ok(flash_redirect(Flash::ImageTooLarge));
    }

    let outcome = process_upload(&state, &user, upload).await;

    let analysis = outcome.analysis.as_ref();
    let field = |name: &str| analysis.and_then(|a| a.get(name)).and_then(Value::as_str);
    let failed = analysis
        .and_then(|a| a.get("success"))
        .and_then(Value::as_bool)
        == Some(false);

    let page = views::result_page(
        &user,
        &ResultView {
            nutrition: &outcome.nutrition,
            label: field("label"),
            recipe: field("recipe"),
            analysis_error: if failed { field("error") } else { None },
            scan_id: outcome.scan_id.as_deref(),
            ml_unavailable: outcome.ml_unavailable,
        },
    );
    Ok(page.into_response())
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn history(State(state): State<AppState>, user: SessionUser) -> Html<String> {
    let mut scans = Vec::new();
    if let Some(store) = &state.scans {
        match store.recent_for_user(&user.id, HISTORY_LIMIT).await {
            Ok(rows) => scans = rows.into_iter().map(HistoryItem::from).collect(),
            Err(e) => warn!(error = %e, "history lookup failed"),
        }
    }
    views::history_page(&user, &scans)
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn image(
    State(state): State<AppState>,
    user: SessionUser,
    Path(scan_id): Path<String>,
) -> Result<Response, AppError> {
    let Some(store) = &state.scans else {
        return Err(AppError::ServiceUnavailable("scan storage"));
    };

    let found = match store.image_for_user(&user.id, &scan_id).await {
        Ok(found) => found,
        Err(e) => {
            warn!(error = %e, "image lookup failed");
            None
        }
    };
    let Some(img) = found else {
        return Err(AppError::NotFound("scan image"));
    };

    let filename: String = img
        .image_filename
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && *c != '"' && *c != '\\')
        .collect();
    Ok((
        [
            (CONTENT_TYPE, img.image_content_type),
            (CONTENT_DISPOSITION, format!("inline; filename=\"{}\"", filename)),
        ],
        img.image_data,
    )
        .into_response())
}

fn flash_redirect(flash: Flash) -> Response {
    (
        AppendHeaders([(SET_COOKIE, flash.cookie())]),
        Redirect::to("/scan"),
    )
        .into_response()
}

fn upload_error(e: MultipartError) -> Result<Response, AppError> {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("upload exceeded body limit");
        return Ok(flash_redirect(Flash::ImageTooLarge));
    }
    Err(AppError::Internal(anyhow::anyhow!("read upload: {}", e)))
}
