pub(crate) use crate::auth::dto::{Profile, SessionClaims, SessionKeys};
use crate::auth::cookies::{self, SESSION_COOKIE};
use crate::config::SessionConfig;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::new(&state.config.session)
    }
}

impl SessionKeys {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn sign(&self, profile: &Profile) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = SessionClaims {
            sub: profile.sub.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            picture: profile.picture.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %profile.sub, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    pub fn cookie_max_age(&self) -> i64 {
        self.ttl.as_secs() as i64
    }
}

/// Random value for the OAuth `state` parameter.
pub fn oauth_state_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Signed-in user taken from the session cookie.
///
/// Anonymous requests are redirected to `/login`.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

impl From<SessionClaims> for SessionUser {
    fn from(c: SessionClaims) -> Self {
        Self {
            id: c.sub,
            name: c.name,
            email: c.email,
            picture: c.picture,
        }
    }
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("friend")
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let token = cookies::get(&parts.headers, SESSION_COOKIE)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Redirect::to("/login"))?;

        match keys.verify(token) {
            Ok(claims) => Ok(SessionUser::from(claims)),
            Err(e) => {
                warn!(error = %e, "invalid or expired session");
                Err(Redirect::to("/login"))
            }
        }
    }
}
