use std::path::PathBuf;
use thiserror::Error;

/// Result type for fusion operations.
pub type FusionResult<T> = Result<T, FusionError>;

/// Errors raised while fusing detections for one image.
#[derive(Debug, Error)]
pub enum FusionError {
    /// Input image could not be read. The image is skipped, nothing is written.
    #[error("failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("model pass '{model}' failed: {source}")]
    Inference {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to write {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FusionError {
    pub(crate) fn inference(model: &str, source: anyhow::Error) -> Self {
        FusionError::Inference {
            model: model.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn persistence(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        FusionError::Persistence {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether a batch run may skip this image and carry on.
    pub fn is_skippable(&self) -> bool {
        matches!(self, FusionError::ImageDecode { .. })
    }
}
