use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Raised when the analysis service cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum MlServiceError {
    #[error("Request to ML service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ML service returned invalid JSON.")]
    InvalidJson,

    #[error("ML service error: {0}")]
    Service(String),
}

/// HTTP client for the analysis service's `POST /analyze`.
#[derive(Clone)]
pub struct MlClient {
    http: reqwest::Client,
    base_url: String,
}

impl MlClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, MlServiceError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/analyze", self.base_url)
    }

    /// Sends the image and returns the service's JSON payload untouched.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn analyze(
        &self,
        image: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<Value, MlServiceError> {
        let part = Part::stream(image)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("image", part);

        let resp = self.http.post(self.endpoint()).multipart(form).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let payload: Value =
            serde_json::from_str(&text).map_err(|_| MlServiceError::InvalidJson)?;

        if status.is_client_error() || status.is_server_error() {
            let message = match &payload {
                Value::Object(map) => match map.get("error") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => text,
                },
                _ => text,
            };
            return Err(MlServiceError::Service(message));
        }

        debug!(%status, "ml service responded");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Multipart, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
    };
    use serde_json::json;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn posts_image_field_to_analyze() {
        let app = Router::new().route(
            "/analyze",
            post(|mut mp: Multipart| async move {
                let field = mp.next_field().await.unwrap().unwrap();
                let name = field.name().unwrap().to_string();
                let file = field.file_name().unwrap().to_string();
                let ct = field.content_type().unwrap().to_string();
                let data = field.bytes().await.unwrap();
                Json(json!({
                    "success": true,
                    "label": "milk-tea",
                    "field": name,
                    "file": file,
                    "ct": ct,
                    "len": data.len(),
                }))
            }),
        );
        let base = spawn(app).await;
        let client = MlClient::new(base).unwrap();
        assert!(client.endpoint().ends_with("/analyze"));
        assert!(!client.endpoint().contains("//analyze"));

        let payload = client
            .analyze(Bytes::from_static(b"img"), "scan.jpg", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(payload["success"], true);
        assert_eq!(payload["field"], "image");
        assert_eq!(payload["file"], "scan.jpg");
        assert_eq!(payload["ct"], "image/jpeg");
        assert_eq!(payload["len"], 3);
    }

    #[tokio::test]
    async fn http_error_carries_service_message() {
        let app = Router::new().route(
            "/analyze",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"success": false, "error": "boom"})),
                )
                    .into_response()
            }),
        );
        let client = MlClient::new(spawn(app).await).unwrap();
        let err = client
            .analyze(Bytes::from_static(b"img"), "scan.jpg", "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(&err, MlServiceError::Service(m) if m == "boom"));
    }

    #[tokio::test]
    async fn non_object_error_body_falls_back_to_text() {
        let app = Router::new().route(
            "/analyze",
            post(|| async { (StatusCode::BAD_GATEWAY, Json(json!(["upstream", "down"]))) }),
        );
        let client = MlClient::new(spawn(app).await).unwrap();
        let err = client
            .analyze(Bytes::from_static(b"img"), "scan.jpg", "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(&err, MlServiceError::Service(m) if m == r#"["upstream","down"]"#));
    }

    #[tokio::test]
    async fn invalid_json_is_an_error() {
        let app = Router::new().route("/analyze", post(|| async { "definitely not json" }));
        let client = MlClient::new(spawn(app).await).unwrap();
        let err = client
            .analyze(Bytes::from_static(b"img"), "scan.jpg", "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, MlServiceError::InvalidJson));
    }
}
