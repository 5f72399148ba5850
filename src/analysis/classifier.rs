//! Drink image classifier.
//!
//! The exported model and its label list are loaded on first use and shared
//! for the life of the process. Missing files (or a build without the `onnx`
//! feature) degrade to [`FALLBACK_LABEL`] so the rest of the pipeline keeps
//! working.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::{imageops::FilterType, RgbImage};
use tracing::{debug, error, info, warn};

use super::error::AnalysisError;
use super::recipes::known_labels;

pub const FALLBACK_LABEL: &str = "unknown";
pub const IMG_SIZE: u32 = 224;
pub const MODEL_FILE: &str = "nutribob_model.onnx";
pub const LABELS_FILE: &str = "labels.txt";

pub trait DrinkClassifier: Send + Sync {
    /// Returns the drink label for the image at `image`.
    fn classify(&self, image: &Path) -> Result<String, AnalysisError>;
}

struct LoadedModel {
    labels: Vec<String>,
    #[cfg(feature = "onnx")]
    plan: backend::Plan,
}

pub struct ModelClassifier {
    model_path: PathBuf,
    labels_path: PathBuf,
    model: OnceLock<Option<LoadedModel>>,
}

impl ModelClassifier {
    pub fn new(model_dir: impl AsRef<Path>) -> Self {
        let dir = model_dir.as_ref();
        Self {
            model_path: dir.join(MODEL_FILE),
            labels_path: dir.join(LABELS_FILE),
            model: OnceLock::new(),
        }
    }

    fn loaded(&self) -> Option<&LoadedModel> {
        self.model.get_or_init(|| self.load()).as_ref()
    }

    fn load(&self) -> Option<LoadedModel> {
        if !self.model_path.exists() || !self.labels_path.exists() {
            warn!(
                model = %self.model_path.display(),
                labels = %self.labels_path.display(),
                "model or labels file missing; classifier will return the fallback label"
            );
            return None;
        }

        let labels = match load_labels(&self.labels_path) {
            Ok(labels) => labels,
            Err(e) => {
                error!(error = %e, "failed to read labels file");
                return None;
            }
        };

        for label in labels.iter().filter(|l| !known_labels().any(|k| k == l.as_str())) {
            warn!(%label, "label has no recipe; the default ingredient string will be used");
        }

        self.load_backend(labels)
    }

    #[cfg(feature = "onnx")]
    fn load_backend(&self, labels: Vec<String>) -> Option<LoadedModel> {
        info!(model = %self.model_path.display(), "loading model");
        match backend::load(&self.model_path) {
            Ok(plan) => {
                info!(?labels, "model loaded");
                Some(LoadedModel { labels, plan })
            }
            Err(e) => {
                error!(error = %e, "failed to load model; using fallback label");
                None
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    fn load_backend(&self, labels: Vec<String>) -> Option<LoadedModel> {
        info!(
            count = labels.len(),
            "built without the onnx feature; classifier will return the fallback label"
        );
        None
    }
}

impl DrinkClassifier for ModelClassifier {
    fn classify(&self, image: &Path) -> Result<String, AnalysisError> {
        if !image.exists() {
            return Err(AnalysisError::NotFound(image.to_path_buf()));
        }

        let Some(model) = self.loaded() else {
            return Ok(FALLBACK_LABEL.to_string());
        };

        let rgb = preprocess(image)?;
        let scores = model.predict(&rgb)?;
        let class_id = argmax(&scores);
        let label = label_at(&model.labels, class_id);
        debug!(?class_id, %label, ?scores, "prediction");
        Ok(label)
    }
}

impl LoadedModel {
    #[cfg(feature = "onnx")]
    fn predict(&self, rgb: &RgbImage) -> Result<Vec<f32>, AnalysisError> {
        backend::predict(&self.plan, rgb).map_err(|e| AnalysisError::Inference(e.to_string()))
    }

    #[cfg(not(feature = "onnx"))]
    fn predict(&self, _rgb: &RgbImage) -> Result<Vec<f32>, AnalysisError> {
        Err(AnalysisError::Inference("no inference backend compiled in".into()))
    }
}

/// Reads one label per line, skipping blank lines.
pub fn load_labels(path: &Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Decodes the image as RGB and stretches it to the model's input frame.
pub fn preprocess(path: &Path) -> Result<RgbImage, AnalysisError> {
    let img = image::open(path)?;
    Ok(img
        .resize_exact(IMG_SIZE, IMG_SIZE, FilterType::CatmullRom)
        .to_rgb8())
}

pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

fn label_at(labels: &[String], class_id: Option<usize>) -> String {
    class_id
        .and_then(|i| labels.get(i))
        .cloned()
        .unwrap_or_else(|| FALLBACK_LABEL.to_string())
}

#[cfg(feature = "onnx")]
mod backend {
    use std::path::Path;

    use image::RgbImage;
    use tract_onnx::prelude::*;

    use super::IMG_SIZE;

    pub(super) type Plan = TypedRunnableModel<TypedModel>;

    pub(super) fn load(path: &Path) -> TractResult<Plan> {
        let side = IMG_SIZE as usize;
        tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, f32::fact([1, side, side, 3]).into())?
            .into_optimized()?
            .into_runnable()
    }

    /// Raw 0-255 values in NHWC order; the exported model rescales itself.
    pub(super) fn predict(plan: &Plan, rgb: &RgbImage) -> TractResult<Vec<f32>> {
        let side = IMG_SIZE as usize;
        let input: Tensor =
            tract_ndarray::Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
                rgb.get_pixel(x as u32, y as u32).0[c] as f32
            })
            .into();
        let outputs = plan.run(tvec!(input.into()))?;
        let scores = outputs[0].to_array_view::<f32>()?;
        Ok(scores.iter().copied().collect())
    }
}
