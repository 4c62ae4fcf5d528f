use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};
use tempfile::NamedTempFile;

use crate::error::{FusionError, FusionResult};
use crate::models::ResultSet;

/// Where and under which names results are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    pub output_dir: PathBuf,
    /// JSON file name; `{stem}` is replaced with the input file stem
    pub json_template: String,
    /// Prefix prepended to the input file name for the annotated image
    pub image_prefix: String,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            json_template: "{stem}_predicted_result.json".to_string(),
            image_prefix: "vis_".to_string(),
        }
    }
}

impl OutputNaming {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn json_path(&self, image_name: &str) -> PathBuf {
        let stem = Path::new(image_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| image_name.to_string());
        self.output_dir
            .join(self.json_template.replace("{stem}", &stem))
    }

    pub fn image_path(&self, image_name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{}", self.image_prefix, image_name))
    }
}

/// Serialize the result set and write it atomically.
pub fn write_json(results: &ResultSet, path: &Path) -> FusionResult<()> {
    let json = results
        .to_record()
        .to_json()
        .map_err(|e| FusionError::persistence(path, e))?;
    write_atomic(path, json.as_bytes())
}

/// Encode the canvas in the format implied by `path` and write it atomically.
pub fn write_image(canvas: &RgbImage, path: &Path) -> FusionResult<()> {
    let encoded = encode_image(canvas, path)?;
    write_atomic(path, &encoded)
}

/// Encode the canvas in memory in the format implied by `path`.
pub fn encode_image(canvas: &RgbImage, path: &Path) -> FusionResult<Vec<u8>> {
    let format = ImageFormat::from_path(path).map_err(|e| FusionError::persistence(path, e))?;
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(canvas.clone())
        .write_to(&mut encoded, format)
        .map_err(|e| FusionError::persistence(path, e))?;
    Ok(encoded.into_inner())
}

/// Atomically write already-encoded bytes.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> FusionResult<()> {
    write_atomic(path, bytes)
}

/// Write to a temp file next to `path`, then rename over it.
fn write_atomic(path: &Path, bytes: &[u8]) -> FusionResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| FusionError::persistence(path, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| FusionError::persistence(path, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| FusionError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| FusionError::persistence(path, e.error))?;
    Ok(())
}
