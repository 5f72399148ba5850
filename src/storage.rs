use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::ClientOptions,
    Client, Collection, Database,
};
use tracing::{info, warn};

use crate::scans::repo_types::{ScanDocument, ScanImage, ScanListRow};

pub const DATABASE_NAME: &str = "nutribob";
pub const SCANS_COLLECTION: &str = "scans";

#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Persists a scan and returns its id as a hex string.
    async fn insert(&self, scan: ScanDocument) -> anyhow::Result<String>;
    /// Newest first.
    async fn recent_for_user(&self, user_id: &str, limit: i64) -> anyhow::Result<Vec<ScanListRow>>;
    /// `None` when the id is malformed, unknown, or owned by someone else.
    async fn image_for_user(&self, user_id: &str, scan_id: &str)
        -> anyhow::Result<Option<ScanImage>>;
}

#[derive(Clone)]
pub struct MongoScanStore {
    scans: Collection<ScanDocument>,
}

impl MongoScanStore {
    pub async fn connect(uri: &str) -> anyhow::Result<Self> {
        let mut opts = ClientOptions::parse(uri).await.context("parse MONGODB_URI")?;
        opts.server_selection_timeout = Some(Duration::from_secs(5));
        opts.app_name = Some("nutribob-web".into());
        let client = Client::with_options(opts).context("build mongodb client")?;
        let db = client.database(DATABASE_NAME);

        match db.run_command(doc! { "ping": 1 }).await {
            Ok(_) => info!("connected to mongodb"),
            Err(e) => warn!(error = %e, "mongodb ping failed; scans will be retried per request"),
        }

        Ok(Self::from_database(&db))
    }

    pub fn from_database(db: &Database) -> Self {
        Self {
            scans: db.collection(SCANS_COLLECTION),
        }
    }
}

#[async_trait]
impl ScanStore for MongoScanStore {
    async fn insert(&self, scan: ScanDocument) -> anyhow::Result<String> {
        let res = self.scans.insert_one(scan).await.context("insert scan")?;
        Ok(res
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .unwrap_or_else(|| res.inserted_id.to_string()))
    }

    async fn recent_for_user(&self, user_id: &str, limit: i64) -> anyhow::Result<Vec<ScanListRow>> {
        let cursor = self
            .scans
            .clone_with_type::<ScanListRow>()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .projection(doc! { "drink_name": 1, "nutrition": 1, "created_at": 1 })
            .await
            .context("find scans")?;
        let rows = cursor.try_collect().await.context("read scans cursor")?;
        Ok(rows)
    }

    async fn image_for_user(
        &self,
        user_id: &str,
        scan_id: &str,
    ) -> anyhow::Result<Option<ScanImage>> {
        let Ok(oid) = ObjectId::parse_str(scan_id) else {
            return Ok(None);
        };
        let image = self
            .scans
            .clone_with_type::<ScanImage>()
            .find_one(doc! { "_id": oid, "user_id": user_id })
            .projection(doc! { "image_data": 1, "image_content_type": 1, "image_filename": 1 })
            .await
            .with_context(|| format!("find scan {}", scan_id))?;
        Ok(image)
    }
}
