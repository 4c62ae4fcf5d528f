pub mod aggregate;
pub mod filter;
pub mod remap;
pub mod replay;

use std::sync::Arc;

use anyhow::Result;
use image::DynamicImage;

use crate::error::{FusionError, FusionResult};
use crate::models::{BoundingBox, Detection, RawDetection};

pub use aggregate::{ResultAggregator, aggregate};
pub use filter::{AllowedClasses, KeptDetection, filter_detections};
pub use remap::OutputIdMap;
pub use replay::ReplayDetector;

/// Decoded input image together with its file name.
pub struct Frame<'a> {
    pub image: &'a DynamicImage,
    /// Base file name of the input, e.g. `street.jpg`
    pub name: &'a str,
}

impl Frame<'_> {
    /// File name without extension.
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(self.name)
    }
}

/// An already-loaded object detection model.
///
/// Implementations block until detections are available. When `threshold`
/// is `Some`, the model may drop detections below it itself.
pub trait Detector: Send + Sync {
    fn infer(&self, frame: &Frame<'_>, threshold: Option<f32>) -> Result<Vec<RawDetection>>;

    /// Human-readable name for this model (used in logs and errors)
    fn name(&self) -> &str;
}

/// One model pass: the detector plus its allow-list and threshold.
#[derive(Clone)]
pub struct ModelSpec {
    detector: Arc<dyn Detector>,
    allowed: AllowedClasses,
    threshold: f32,
    forward_threshold: bool,
}

impl std::fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSpec")
            .field("detector", &self.detector.name())
            .field("allowed", &self.allowed)
            .field("threshold", &self.threshold)
            .field("forward_threshold", &self.forward_threshold)
            .finish()
    }
}

impl ModelSpec {
    pub fn new(
        detector: Arc<dyn Detector>,
        allowed: AllowedClasses,
        threshold: f32,
    ) -> FusionResult<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(FusionError::Config(format!(
                "confidence threshold {threshold} for '{}' is outside [0, 1]",
                detector.name()
            )));
        }
        if allowed.is_empty() {
            return Err(FusionError::Config(format!(
                "model '{}' has an empty class allow-list",
                detector.name()
            )));
        }
        Ok(Self {
            detector,
            allowed,
            threshold,
            forward_threshold: false,
        })
    }

    /// Also hand the threshold to the detector so it can prune early.
    pub fn with_inference_threshold(mut self, forward: bool) -> Self {
        self.forward_threshold = forward;
        self
    }

    pub fn name(&self) -> &str {
        self.detector.name()
    }

    pub fn allowed(&self) -> &AllowedClasses {
        &self.allowed
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Run the detector once. Non-finite confidences count as malformed output.
    pub fn infer(&self, frame: &Frame<'_>) -> FusionResult<Vec<RawDetection>> {
        let threshold = self.forward_threshold.then_some(self.threshold);
        let raw = self
            .detector
            .infer(frame, threshold)
            .map_err(|e| FusionError::inference(self.name(), e))?;

        if let Some(bad) = raw.iter().find(|d| !d.confidence.is_finite()) {
            return Err(FusionError::inference(
                self.name(),
                anyhow::anyhow!("non-finite confidence for class {}", bad.class_id),
            ));
        }
        Ok(raw)
    }

    /// Filter raw output and assign labels and output class ids.
    pub fn select(&self, raw: &[RawDetection], output_ids: &OutputIdMap) -> Vec<Detection> {
        filter_detections(raw, &self.allowed, self.threshold)
            .into_iter()
            .map(|kept| Detection {
                label: kept.label.to_string(),
                class_id: output_ids.remap(kept.label, kept.raw.class_id),
                bbox: BoundingBox::from_xyxy(kept.raw.bbox),
                confidence: kept.raw.confidence,
            })
            .collect()
    }
}
