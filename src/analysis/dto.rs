use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response body of `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub success: bool,
    pub label: String,
    pub recipe: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition_raw: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<NutritionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionSummary {
    pub total_calories: f64,
    pub total_sugar_g: f64,
    pub total_fat_g: f64,
    pub items_count: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeError {
    pub success: bool,
    pub error: String,
}

impl AnalyzeError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl NutritionSummary {
    /// Totals the `items` of a nutrition payload. `None` when there are no items.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let items = payload.get("items")?.as_array()?;
        if items.is_empty() {
            return None;
        }
        Some(Self {
            total_calories: sum_field(items, "calories"),
            total_sugar_g: sum_field(items, "sugar_g"),
            total_fat_g: sum_field(items, "fat_total_g"),
            items_count: items.len(),
        })
    }
}

/// Missing, non-numeric and negative values count as zero.
pub(crate) fn sum_field(items: &[Value], field: &str) -> f64 {
    items
        .iter()
        .filter_map(|item| item.get(field).and_then(Value::as_f64))
        .filter(|v| v.is_finite() && *v > 0.0)
        .sum()
}
