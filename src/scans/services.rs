use bytes::Bytes;
use mongodb::bson::DateTime;
use serde_json::Value;
use tracing::{error, info, warn};

use super::repo_types::{NutritionFacts, ScanDocument, DEFAULT_DRINK_NAME};
use crate::{analysis::dto::sum_field, auth::services::SessionUser, state::AppState};

pub const MAX_IMAGE_SIZE_BYTES: usize = 16 * 1024 * 1024;

/// Sample values shown when no analysis is available.
pub fn placeholder_nutrition(_image: &[u8]) -> NutritionFacts {
    NutritionFacts {
        calories: 380,
        sugar_grams: 38.0,
        fat_grams: 8.0,
    }
}

/// Overlays analysis service figures onto `fallback`.
///
/// Only successful analyses are merged; malformed parts are skipped.
pub fn merge_nutrition(fallback: &NutritionFacts, analysis: Option<&Value>) -> NutritionFacts {
    let mut merged = fallback.clone();
    let Some(analysis) = analysis else {
        return merged;
    };
    if analysis.get("success").and_then(Value::as_bool) != Some(true) {
        return merged;
    }

    if let Some(calories) = analysis
        .get("summary")
        .and_then(Value::as_object)
        .and_then(|s| s.get("total_calories"))
        .and_then(Value::as_f64)
    {
        merged.calories = calories.round() as i64;
    }

    let items = analysis
        .get("nutrition_raw")
        .and_then(Value::as_object)
        .and_then(|raw| raw.get("items"))
        .and_then(Value::as_array)
        .filter(|items| items.iter().any(Value::is_object));

    if let Some(items) = items {
        merged.sugar_grams = round1(sum_field(items, "sugar_g"));
        merged.fat_grams = round1(sum_field(items, "fat_total_g"));
    }

    merged
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub body: Bytes,
}

/// What the result page needs after an upload.
pub struct ScanOutcome {
    pub nutrition: NutritionFacts,
    pub analysis: Option<Value>,
    pub scan_id: Option<String>,
    pub ml_unavailable: bool,
}

/// Runs analysis (if configured), merges nutrition and persists the scan.
///
/// Neither an unreachable analysis service nor a failed insert fails the upload.
pub async fn process_upload(st: &AppState, user: &SessionUser, upload: Upload) -> ScanOutcome {
    let mut nutrition = placeholder_nutrition(&upload.body);
    let mut analysis = None;
    let mut ml_unavailable = false;

    if let Some(ml) = &st.ml {
        match ml
            .analyze(upload.body.clone(), &upload.filename, &upload.content_type)
            .await
        {
            Ok(payload) => {
                nutrition = merge_nutrition(&nutrition, Some(&payload));
                analysis = Some(payload);
            }
            Err(e) => {
                warn!(error = %e, "ml service request failed");
                ml_unavailable = true;
            }
        }
    }

    let mut scan_id = None;
    if let Some(store) = &st.scans {
        let drink_name = analysis
            .as_ref()
            .and_then(|a| a.get("label"))
            .and_then(Value::as_str)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_DRINK_NAME)
            .to_string();
        let doc = ScanDocument {
            id: None,
            user_id: user.id.clone(),
            user_email: user.email.clone(),
            image_filename: upload.filename,
            image_content_type: upload.content_type,
            image_data: upload.body.to_vec(),
            drink_name,
            nutrition: nutrition.clone(),
            analysis_result: analysis.clone(),
            created_at: DateTime::now(),
        };
        match store.insert(doc).await {
            Ok(id) => {
                info!(scan_id = %id, user_id = %user.id, "scan stored");
                scan_id = Some(id);
            }
            Err(e) => error!(error = %e, "scan insert failed"),
        }
    }

    ScanOutcome {
        nutrition,
        analysis,
        scan_id,
        ml_unavailable,
    }
}
