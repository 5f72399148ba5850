#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::async_trait;
use axum::{body::Body, http::Response};
use mongodb::bson::oid::ObjectId;
use nutribob::{
    auth::{oauth::IdentityProvider, Profile, SessionKeys},
    config::{GoogleConfig, SessionConfig, WebConfig},
    scans::{ScanDocument, ScanImage, ScanListRow},
    state::AppState,
    storage::ScanStore,
};

pub const BOUNDARY: &str = "nutribob-test-boundary";

pub fn web_config() -> WebConfig {
    WebConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        mongodb_uri: None,
        ml_service_url: None,
        session: SessionConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
        },
        google: GoogleConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_url: "http://localhost/auth/callback".into(),
        },
    }
}

/// Keeps scans in memory, scoped by owner like the real collection.
#[derive(Default)]
pub struct MemoryScanStore {
    pub docs: Mutex<Vec<ScanDocument>>,
}

#[async_trait]
impl ScanStore for MemoryScanStore {
    async fn insert(&self, mut scan: ScanDocument) -> anyhow::Result<String> {
        let id = ObjectId::new();
        scan.id = Some(id);
        self.docs.lock().unwrap().push(scan);
        Ok(id.to_hex())
    }

    async fn recent_for_user(&self, user_id: &str, limit: i64) -> anyhow::Result<Vec<ScanListRow>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .rev()
            .filter(|d| d.user_id == user_id)
            .take(limit as usize)
            .map(|d| ScanListRow {
                id: d.id.unwrap(),
                drink_name: d.drink_name.clone(),
                nutrition: Some(d.nutrition.clone()),
                created_at: Some(d.created_at),
            })
            .collect())
    }

    async fn image_for_user(&self, user_id: &str, scan_id: &str) -> anyhow::Result<Option<ScanImage>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .find(|d| d.user_id == user_id && d.id.map(|i| i.to_hex()).as_deref() == Some(scan_id))
            .map(ScanImage::from))
    }
}

pub struct FakeIdentity {
    pub profile: Option<Profile>,
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorize_url(&self, state: &str) -> anyhow::Result<String> {
        Ok(format!("https://accounts.example/auth?state={}", state))
    }

    async fn exchange(&self, code: &str) -> anyhow::Result<Profile> {
        match (&self.profile, code) {
            (Some(p), "good-code") => Ok(p.clone()),
            _ => anyhow::bail!("exchange rejected"),
        }
    }
}

pub fn profile() -> Profile {
    Profile {
        sub: "google-42".into(),
        name: Some("Bob".into()),
        email: Some("bob@example.com".into()),
        picture: None,
    }
}

pub fn state(scans: Option<Arc<dyn ScanStore>>) -> AppState {
    AppState::from_parts(
        Arc::new(web_config()),
        scans,
        None,
        Arc::new(FakeIdentity {
            profile: Some(profile()),
        }),
    )
}

pub fn session_cookie_for(profile: &Profile) -> String {
    let keys = SessionKeys::new(&web_config().session);
    format!("nutribob_session={}", keys.sign(profile).unwrap())
}

pub fn session_cookie() -> String {
    session_cookie_for(&profile())
}

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {ct}\r\n\r\n",
            b = BOUNDARY,
            field = field,
            filename = filename,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub async fn body_string(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn set_cookies(res: &Response<Body>) -> Vec<String> {
    res.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

pub fn location(res: &Response<Body>) -> &str {
    res.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
