use std::time::Duration;

use axum::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::NutritionApiError;
use crate::config::NutritionApiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait NutritionLookup: Send + Sync {
    /// Looks up nutrition facts for a free-text ingredient description.
    async fn lookup(&self, query: &str) -> Result<Value, NutritionApiError>;
}

#[derive(Clone)]
pub struct NutritionClient {
    http: reqwest::Client,
    config: NutritionApiConfig,
}

impl NutritionClient {
    pub fn new(config: NutritionApiConfig) -> Result<Self, NutritionApiError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl NutritionLookup for NutritionClient {
    #[instrument(skip(self))]
    async fn lookup(&self, query: &str) -> Result<Value, NutritionApiError> {
        let (Some(url), Some(key)) = (&self.config.url, &self.config.key) else {
            warn!("nutrition api not configured");
            return Err(NutritionApiError::NotConfigured);
        };

        let resp = self
            .http
            .get(url)
            .header("X-Api-Key", key)
            .query(&[("query", query)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "nutrition api rejected request");
            return Err(NutritionApiError::Status(status));
        }

        let body = resp.bytes().await?;
        let data: Value =
            serde_json::from_slice(&body).map_err(|_| NutritionApiError::InvalidJson)?;
        debug!(bytes = body.len(), "nutrition api responded");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::HeaderMap, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/nutrition", addr)
    }

    fn client(url: Option<String>, key: Option<&str>) -> NutritionClient {
        NutritionClient::new(NutritionApiConfig {
            url,
            key: key.map(str::to_string),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sends_key_and_query() {
        let app = Router::new().route(
            "/v1/nutrition",
            get(
                |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({
                        "key": headers.get("x-api-key").and_then(|v| v.to_str().ok()),
                        "query": q.get("query"),
                        "items": [],
                    }))
                },
            ),
        );
        let url = spawn(app).await;

        let data = client(Some(url), Some("secret"))
            .lookup("whole milk, sugar syrup")
            .await
            .unwrap();
        assert_eq!(data["key"], "secret");
        assert_eq!(data["query"], "whole milk, sugar syrup");
    }

    #[tokio::test]
    async fn missing_config_is_an_error() {
        let err = client(None, Some("k")).lookup("milk tea").await.unwrap_err();
        assert!(matches!(err, NutritionApiError::NotConfigured));
        assert!(err.to_string().contains("FOOD_API_URL"));
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let app = Router::new().route(
            "/v1/nutrition",
            get(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let url = spawn(app).await;
        let err = client(Some(url), Some("k")).lookup("milk tea").await.unwrap_err();
        assert!(matches!(err, NutritionApiError::Status(s) if s.as_u16() == 429));
    }

    #[tokio::test]
    async fn non_json_body_is_an_error() {
        let app = Router::new().route("/v1/nutrition", get(|| async { "<html>nope</html>" }));
        let url = spawn(app).await;
        let err = client(Some(url), Some("k")).lookup("milk tea").await.unwrap_err();
        assert!(matches!(err, NutritionApiError::InvalidJson));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let err = client(Some("http://127.0.0.1:9/none".into()), Some("k"))
            .lookup("milk tea")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Nutrition API call failed"));
    }
}
