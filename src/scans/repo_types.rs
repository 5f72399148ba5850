use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Calories, sugar and fat shown for one scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionFacts {
    pub calories: i64,
    pub sugar_grams: f64,
    pub fat_grams: f64,
}

/// One persisted upload in the `scans` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub user_email: Option<String>,
    pub image_filename: String,
    pub image_content_type: String,
    #[serde(with = "serde_bytes")]
    pub image_data: Vec<u8>,
    pub drink_name: String,
    pub nutrition: NutritionFacts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_result: Option<serde_json::Value>,
    pub created_at: DateTime,
}

/// History projection of a scan, without the image bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanListRow {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default = "default_drink_name")]
    pub drink_name: String,
    #[serde(default)]
    pub nutrition: Option<NutritionFacts>,
    #[serde(default)]
    pub created_at: Option<DateTime>,
}

/// Image projection of a scan.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanImage {
    #[serde(with = "serde_bytes")]
    pub image_data: Vec<u8>,
    #[serde(default = "default_content_type")]
    pub image_content_type: String,
    #[serde(default = "default_filename")]
    pub image_filename: String,
}

pub const DEFAULT_DRINK_NAME: &str = "Milk tea";

fn default_drink_name() -> String {
    DEFAULT_DRINK_NAME.into()
}

fn default_content_type() -> String {
    "image/jpeg".into()
}

fn default_filename() -> String {
    "scan.jpg".into()
}

impl From<&ScanDocument> for ScanImage {
    fn from(doc: &ScanDocument) -> Self {
        Self {
            image_data: doc.image_data.clone(),
            image_content_type: doc.image_content_type.clone(),
            image_filename: doc.image_filename.clone(),
        }
    }
}
