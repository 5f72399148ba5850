use anyhow::Context;
use axum::async_trait;
use reqwest::Url;
use tracing::{debug, instrument};

use super::dto::{Profile, TokenResponse};
use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const SCOPE: &str = "openid email profile";

/// External sign-in provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start sign-in.
    fn authorize_url(&self, state: &str) -> anyhow::Result<String>;
    /// Trades the callback `code` for the user's profile.
    async fn exchange(&self, code: &str) -> anyhow::Result<Profile>;
}

pub struct GoogleProvider {
    http: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("build oauth http client")?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> anyhow::Result<String> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPE),
                ("state", state),
            ],
        )?;
        Ok(url.into())
    }

    #[instrument(skip_all)]
    async fn exchange(&self, code: &str) -> anyhow::Result<Profile> {
        let token: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("token request")?
            .error_for_status()
            .context("token endpoint status")?
            .json()
            .await
            .context("token response body")?;

        let profile: Profile = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("userinfo request")?
            .error_for_status()
            .context("userinfo status")?
            .json()
            .await
            .context("userinfo body")?;

        debug!(user_id = %profile.sub, "google profile fetched");
        Ok(profile)
    }
}
