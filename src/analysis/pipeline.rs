use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{
    classifier::DrinkClassifier,
    dto::{AnalysisResult, NutritionSummary},
    error::AnalysisError,
    nutrition::NutritionLookup,
    recipes::recipe_for_label,
};

/// classify → recipe → nutrition lookup → summary.
#[derive(Clone)]
pub struct Pipeline {
    classifier: Arc<dyn DrinkClassifier>,
    nutrition: Arc<dyn NutritionLookup>,
}

impl Pipeline {
    pub fn new(classifier: Arc<dyn DrinkClassifier>, nutrition: Arc<dyn NutritionLookup>) -> Self {
        Self {
            classifier,
            nutrition,
        }
    }

    /// A failed nutrition lookup still yields a result carrying the label and
    /// recipe, with `success = false`.
    #[instrument(skip(self), fields(path = %image_path.display()))]
    pub async fn analyze_drink_image(
        &self,
        image_path: &Path,
    ) -> Result<AnalysisResult, AnalysisError> {
        if !tokio::fs::try_exists(image_path).await.unwrap_or(false) {
            return Err(AnalysisError::NotFound(image_path.to_path_buf()));
        }

        let classifier = Arc::clone(&self.classifier);
        let owned = image_path.to_path_buf();
        let label = tokio::task::spawn_blocking(move || classifier.classify(&owned)).await??;
        let recipe = recipe_for_label(&label);

        let nutrition = match self.nutrition.lookup(recipe).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, %label, "nutrition lookup failed");
                return Ok(AnalysisResult {
                    success: false,
                    label,
                    recipe: recipe.to_string(),
                    nutrition_raw: None,
                    summary: None,
                    error: Some(e.to_string()),
                });
            }
        };

        let summary = NutritionSummary::from_payload(&nutrition);
        info!(%label, items = summary.as_ref().map(|s| s.items_count), "drink analyzed");
        Ok(AnalysisResult {
            success: true,
            label,
            recipe: recipe.to_string(),
            nutrition_raw: Some(nutrition),
            summary,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{error::NutritionApiError, recipes::DEFAULT_RECIPE};
    use axum::async_trait;
    use serde_json::{json, Value};
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    struct FixedLabel(&'static str);

    impl DrinkClassifier for FixedLabel {
        fn classify(&self, image: &Path) -> Result<String, AnalysisError> {
            assert!(image.exists());
            Ok(self.0.to_string())
        }
    }

    struct CannedNutrition {
        reply: Result<Value, String>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NutritionLookup for CannedNutrition {
        async fn lookup(&self, query: &str) -> Result<Value, NutritionApiError> {
            self.seen.lock().unwrap().push(query.to_string());
            self.reply.clone().map_err(NutritionApiError::Other)
        }
    }

    fn pipeline(label: &'static str, reply: Result<Value, String>) -> (Pipeline, Arc<CannedNutrition>) {
        let nutrition = Arc::new(CannedNutrition {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        let p = Pipeline::new(Arc::new(FixedLabel(label)), nutrition.clone());
        (p, nutrition)
    }

    fn dummy_image() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"fake image data").unwrap();
        file
    }

    #[tokio::test]
    async fn missing_image_is_not_found() {
        let (p, _) = pipeline("matcha_milk_tea", Ok(json!({})));
        let err = p
            .analyze_drink_image(Path::new("/tmp/non_existent_image.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NotFound(_)));
    }

    #[tokio::test]
    async fn successful_analysis_builds_summary() {
        let (p, nutrition) = pipeline(
            "matcha_milk_tea",
            Ok(json!({"items": [
                {"name": "milk", "calories": 100},
                {"name": "tea", "calories": 10},
                {"name": "sugar", "calories": 50},
            ]})),
        );
        let img = dummy_image();
        let result = p.analyze_drink_image(img.path()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.label, "matcha_milk_tea");
        assert_eq!(result.recipe, "matcha powder, whole milk, sugar syrup");
        assert!(result.nutrition_raw.is_some());
        let summary = result.summary.unwrap();
        assert_eq!(summary.total_calories, 160.0);
        assert_eq!(summary.items_count, 3);
        assert_eq!(
            nutrition.seen.lock().unwrap().as_slice(),
            ["matcha powder, whole milk, sugar syrup"]
        );
    }

    #[tokio::test]
    async fn empty_items_omit_summary() {
        let (p, _) = pipeline("fruit_tea", Ok(json!({"items": []})));
        let img = dummy_image();
        let result = p.analyze_drink_image(img.path()).await.unwrap();
        assert!(result.success);
        assert!(result.summary.is_none());
    }

    #[tokio::test]
    async fn nutrition_failure_returns_partial_result() {
        let (p, _) = pipeline("taro_milk_tea", Err("API quota exceeded".into()));
        let img = dummy_image();
        let result = p.analyze_drink_image(img.path()).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.label, "taro_milk_tea");
        assert!(!result.recipe.is_empty());
        assert!(result.error.unwrap().contains("API quota exceeded"));
    }

    #[tokio::test]
    async fn unknown_label_queries_default_recipe() {
        let (p, nutrition) = pipeline("mystery_drink", Ok(json!({"items": []})));
        let img = dummy_image();
        let result = p.analyze_drink_image(img.path()).await.unwrap();
        assert_eq!(result.recipe, DEFAULT_RECIPE);
        assert_eq!(nutrition.seen.lock().unwrap().as_slice(), [DEFAULT_RECIPE]);
    }
}
