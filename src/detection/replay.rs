use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{Detector, Frame};
use crate::models::RawDetection;

/// Detector that replays detections an external model wrote to JSON.
///
/// The file holds an array of `{"bbox": [..], "confidence": .., "class_id": ..}`.
/// A `{stem}` placeholder in the path is replaced with the input file stem,
/// so one detector can serve a batch of images.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    name: String,
    path_template: String,
}

impl ReplayDetector {
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            path_template: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    pub fn path_for(&self, frame: &Frame<'_>) -> PathBuf {
        PathBuf::from(self.path_template.replace("{stem}", frame.stem()))
    }
}

impl Detector for ReplayDetector {
    fn infer(&self, frame: &Frame<'_>, threshold: Option<f32>) -> Result<Vec<RawDetection>> {
        let path = self.path_for(frame);
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read detections from {}", path.display()))?;
        let mut detections: Vec<RawDetection> = serde_json::from_str(&json)
            .with_context(|| format!("malformed detections in {}", path.display()))?;

        if let Some(threshold) = threshold {
            detections.retain(|d| d.confidence >= threshold);
        }
        Ok(detections)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
