#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use detfusion::{AllowedClasses, Detector, Frame, ModelSpec, RawDetection};
use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};

/// Detector returning the same detections for every image.
pub struct FixedDetector {
    pub name: String,
    pub detections: Vec<RawDetection>,
    pub delay: Option<Duration>,
    /// Thresholds passed to `infer`, in call order
    pub seen_thresholds: Mutex<Vec<Option<f32>>>,
}

impl FixedDetector {
    pub fn new(name: &str, detections: Vec<RawDetection>) -> Self {
        Self {
            name: name.to_string(),
            detections,
            delay: None,
            seen_thresholds: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Detector for FixedDetector {
    fn infer(&self, _frame: &Frame<'_>, threshold: Option<f32>) -> anyhow::Result<Vec<RawDetection>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.seen_thresholds.lock().unwrap().push(threshold);
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Detector that always fails.
pub struct FailingDetector;

impl Detector for FailingDetector {
    fn infer(&self, _frame: &Frame<'_>, _threshold: Option<f32>) -> anyhow::Result<Vec<RawDetection>> {
        anyhow::bail!("model crashed")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn raw(bbox: [f32; 4], confidence: f32, class_id: u32) -> RawDetection {
    RawDetection {
        bbox,
        confidence,
        class_id,
    }
}

pub fn allowed(entries: &[(u32, &str)]) -> AllowedClasses {
    AllowedClasses::new(entries.iter().map(|(id, label)| (*id, *label)))
        .expect("valid allow-list")
}

pub fn spec(detector: impl Detector + 'static, entries: &[(u32, &str)], threshold: f32) -> ModelSpec {
    ModelSpec::new(Arc::new(detector), allowed(entries), threshold).expect("valid model spec")
}

/// Solid gray 200x150 image.
pub fn gray_image() -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(200, 150, |_, _| Rgb([128u8, 128u8, 128u8])))
}

/// Writes `gray_image` as PNG into `dir` and returns its path.
pub fn write_test_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    gray_image().save(&path).expect("Failed to save test image");
    path
}

/// Looks for a TrueType font installed on the machine.
pub fn system_font() -> Option<ab_glyph::FontArc> {
    const CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    CANDIDATES
        .iter()
        .filter_map(|p| std::fs::read(p).ok())
        .find_map(|data| ab_glyph::FontArc::try_from_vec(data).ok())
}

pub fn count_pixels(img: &RgbImage, color: Rgb<u8>) -> usize {
    img.pixels().filter(|p| **p == color).count()
}
