use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

const DEFAULT_SECRET_KEY: &str = "change-me-later";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Absolute URL Google sends the user back to after consent.
    pub redirect_url: String,
}

/// Settings for the web front end.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_addr: SocketAddr,
    pub mongodb_uri: Option<String>,
    pub ml_service_url: Option<String>,
    pub session: SessionConfig,
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NutritionApiConfig {
    pub url: Option<String>,
    pub key: Option<String>,
}

/// Settings for the analysis service.
#[derive(Debug, Clone)]
pub struct MlConfig {
    pub bind_addr: SocketAddr,
    pub model_dir: PathBuf,
    pub nutrition: NutritionApiConfig,
}

impl WebConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = bind_addr("APP_HOST", "APP_PORT", "5000")?;

        let secret = std::env::var("SECRET_KEY")
            .or_else(|_| std::env::var("FLASK_SECRET_KEY"))
            .unwrap_or_else(|_| {
                warn!("SECRET_KEY not set, sessions are signed with the development key");
                DEFAULT_SECRET_KEY.into()
            });
        let session = SessionConfig {
            secret,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "nutribob".into()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "nutribob-web".into()),
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };

        let base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000".into());
        let google = GoogleConfig {
            client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_url: format!("{}/auth/callback", base_url.trim_end_matches('/')),
        };

        Ok(Self {
            bind_addr,
            mongodb_uri: non_empty_var("MONGODB_URI"),
            ml_service_url: non_empty_var("ML_SERVICE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            session,
            google,
        })
    }
}

impl MlConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: bind_addr("ML_SERVICE_HOST", "ML_SERVICE_PORT", "8000")?,
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./models")),
            nutrition: NutritionApiConfig::from_env(),
        })
    }
}

impl NutritionApiConfig {
    pub fn from_env() -> Self {
        Self {
            url: non_empty_var("FOOD_API_URL"),
            key: non_empty_var("FOOD_API_KEY"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn bind_addr(host_key: &str, port_key: &str, default_port: &str) -> Result<SocketAddr, ConfigError> {
    let host = std::env::var(host_key).unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var(port_key).unwrap_or_else(|_| default_port.into());
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue(format!("{}/{}", host_key, port_key), e.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_garbage_port() {
        std::env::set_var("NB_TEST_HOST", "127.0.0.1");
        std::env::set_var("NB_TEST_PORT", "not-a-port");
        let err = bind_addr("NB_TEST_HOST", "NB_TEST_PORT", "8000").unwrap_err();
        assert!(err.to_string().contains("NB_TEST_HOST/NB_TEST_PORT"));
    }

    #[test]
    fn bind_addr_uses_default_port() {
        std::env::set_var("NB_TEST_HOST2", "127.0.0.1");
        let addr = bind_addr("NB_TEST_HOST2", "NB_TEST_PORT2_UNSET", "8000").unwrap();
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn blank_vars_count_as_missing() {
        std::env::set_var("NB_TEST_BLANK", "   ");
        assert_eq!(non_empty_var("NB_TEST_BLANK"), None);
    }
}
