//! TOML configuration for a fusion run.
//!
//! ```toml
//! [[models]]
//! name = "people"
//! detections = "detections/people/{stem}.json"
//! confidence_threshold = 0.9
//! classes = { 0 = "People", 1 = "Bike" }
//!
//! [output_ids]
//! Light = 2
//!
//! [colors.box]
//! People = [0, 255, 0]
//!
//! [style]
//! font = "fonts/DejaVuSans.ttf"
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::detection::{AllowedClasses, ModelSpec, OutputIdMap, ReplayDetector};
use crate::error::{FusionError, FusionResult};
use crate::models::Color;
use crate::persist::OutputNaming;
use crate::pipeline::FusionPipeline;
use crate::render::{ColorTable, LabelStyle, Renderer};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FusionConfig {
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub output_ids: BTreeMap<String, u32>,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub name: String,
    /// JSON file with this model's raw detections, may contain `{stem}`
    pub detections: PathBuf,
    pub confidence_threshold: f32,
    /// Raw class id (as a string key) → label
    pub classes: BTreeMap<String, String>,
    #[serde(default)]
    pub forward_threshold: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorConfig {
    #[serde(default = "default_box_color")]
    pub default_box: Color,
    #[serde(default = "default_text_color")]
    pub default_text: Color,
    #[serde(default, rename = "box")]
    pub box_colors: BTreeMap<String, Color>,
    #[serde(default, rename = "text")]
    pub text_colors: BTreeMap<String, Color>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            default_box: default_box_color(),
            default_text: default_text_color(),
            box_colors: BTreeMap::new(),
            text_colors: BTreeMap::new(),
        }
    }
}

fn default_box_color() -> Color {
    Color::GREEN
}

fn default_text_color() -> Color {
    Color::BLACK
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleConfig {
    pub font: Option<PathBuf>,
    #[serde(default = "default_font_px")]
    pub font_px: f32,
    #[serde(default = "default_thickness")]
    pub thickness: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_px: default_font_px(),
            thickness: default_thickness(),
        }
    }
}

fn default_font_px() -> f32 {
    18.0
}

fn default_thickness() -> u32 {
    2
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
    pub json_name: Option<String>,
    pub image_prefix: Option<String>,
}

impl FusionConfig {
    pub fn from_toml_str(s: &str) -> FusionResult<Self> {
        toml::from_str(s).map_err(|e| FusionError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> FusionResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FusionError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build a validated pipeline, resolving relative paths against `base_dir`.
    pub fn into_pipeline(self, base_dir: &Path) -> FusionResult<FusionPipeline> {
        let mut pipeline = FusionPipeline::new().with_parallel_inference(self.parallel);

        for model in self.models {
            let classes = model
                .classes
                .into_iter()
                .map(|(id, label)| {
                    id.trim().parse::<u32>().map(|id| (id, label)).map_err(|_| {
                        FusionError::Config(format!(
                            "model '{}': class id '{id}' is not a non-negative integer",
                            model.name
                        ))
                    })
                })
                .collect::<FusionResult<Vec<_>>>()?;
            let detector = ReplayDetector::new(&model.name, resolve(base_dir, &model.detections));
            let spec = ModelSpec::new(
                Arc::new(detector),
                AllowedClasses::new(classes)?,
                model.confidence_threshold,
            )?
            .with_inference_threshold(model.forward_threshold);
            pipeline = pipeline.add_model(spec);
        }

        let box_colors = self
            .colors
            .box_colors
            .into_iter()
            .fold(ColorTable::new(self.colors.default_box), |t, (l, c)| t.with(l, c));
        let text_colors = self
            .colors
            .text_colors
            .into_iter()
            .fold(ColorTable::new(self.colors.default_text), |t, (l, c)| t.with(l, c));

        if !(self.style.font_px > 0.0) {
            return Err(FusionError::Config(format!(
                "font_px must be positive, got {}",
                self.style.font_px
            )));
        }
        let mut style = LabelStyle {
            font: None,
            font_px: self.style.font_px,
            thickness: self.style.thickness,
        };
        if let Some(font) = &self.style.font {
            style = style.with_font_file(resolve(base_dir, font))?;
        }

        let mut naming = OutputNaming::default();
        if let Some(dir) = self.output.dir {
            naming.output_dir = resolve(base_dir, &dir);
        }
        if let Some(json_name) = self.output.json_name {
            naming.json_template = json_name;
        }
        if let Some(prefix) = self.output.image_prefix {
            naming.image_prefix = prefix;
        }

        pipeline
            .with_output_ids(OutputIdMap::new(self.output_ids)?)
            .with_renderer(Renderer {
                box_colors,
                text_colors,
                style,
            })
            .with_naming(naming)
            .build()
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
