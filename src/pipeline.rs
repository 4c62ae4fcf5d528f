use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use image::{DynamicImage, ImageError, ImageReader, RgbImage};
use tracing::{debug, info, warn};

use crate::detection::{Frame, ModelSpec, OutputIdMap, ResultAggregator};
use crate::error::{FusionError, FusionResult};
use crate::models::{RawDetection, ResultSet};
use crate::persist::{self, OutputNaming};
use crate::render::Renderer;

/// Processing stages for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Loaded,
    ModelPass(usize),
    Rendered,
    Persisted,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::Loaded => write!(f, "loaded"),
            Stage::ModelPass(i) => write!(f, "model pass {}", i + 1),
            Stage::Rendered => write!(f, "rendered"),
            Stage::Persisted => write!(f, "persisted"),
            Stage::Done => write!(f, "done"),
        }
    }
}

/// What was written for one image.
#[derive(Debug, Clone)]
pub struct FusionOutcome {
    pub results: ResultSet,
    pub json_path: PathBuf,
    pub image_path: PathBuf,
}

/// Result of processing several images.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<FusionOutcome>,
    /// Images that could not be decoded, with the reason
    pub skipped: Vec<(PathBuf, FusionError)>,
}

/// Runs every model pass over an image and fuses the results.
///
/// Passes are applied in the order they were added. That order fixes both the
/// order of `objects` in the output and which annotations are drawn on top.
#[derive(Debug, Default)]
pub struct FusionPipeline {
    models: Vec<ModelSpec>,
    output_ids: OutputIdMap,
    renderer: Renderer,
    naming: OutputNaming,
    parallel: bool,
}

impl FusionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a model pass.
    pub fn add_model(mut self, spec: ModelSpec) -> Self {
        self.models.push(spec);
        self
    }

    pub fn with_output_ids(mut self, output_ids: OutputIdMap) -> Self {
        self.output_ids = output_ids;
        self
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_naming(mut self, naming: OutputNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Run detectors on separate threads. Results are still applied in pass order.
    pub fn with_parallel_inference(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check that every lookup table refers to labels some model can emit.
    pub fn build(self) -> FusionResult<Self> {
        if self.models.is_empty() {
            return Err(FusionError::Config("no model passes configured".to_string()));
        }

        let known: BTreeSet<&str> = self
            .models
            .iter()
            .flat_map(|m| m.allowed().labels())
            .collect();

        let tables = [
            ("output id map", self.output_ids.labels().collect::<Vec<_>>()),
            ("box colors", self.renderer.box_colors.labels().collect()),
            ("text colors", self.renderer.text_colors.labels().collect()),
        ];
        for (table, labels) in tables {
            if let Some(unknown) = labels.into_iter().find(|l| !known.contains(l)) {
                return Err(FusionError::Config(format!(
                    "{table} refers to unknown label '{unknown}'"
                )));
            }
        }

        if self.renderer.style.font.is_none() {
            warn!("no font configured, labels will not be drawn");
        }
        Ok(self)
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    pub fn naming(&self) -> &OutputNaming {
        &self.naming
    }

    /// Fuse detections for an already decoded image without touching the filesystem.
    pub fn fuse(&self, image: &DynamicImage, image_name: &str) -> FusionResult<(ResultSet, RgbImage)> {
        let frame = Frame { image, name: image_name };
        let raw_passes = if self.parallel {
            self.infer_parallel(&frame)?
        } else {
            self.models
                .iter()
                .map(|spec| spec.infer(&frame))
                .collect::<FusionResult<Vec<_>>>()?
        };

        let mut canvas = image.to_rgb8();
        let mut aggregator = ResultAggregator::new(image_name);

        for (index, (spec, raw)) in self.models.iter().zip(raw_passes).enumerate() {
            let kept = spec.select(&raw, &self.output_ids);
            debug!(
                image = image_name,
                stage = %Stage::ModelPass(index),
                model = spec.name(),
                raw = raw.len(),
                kept = kept.len(),
                "model pass finished"
            );
            self.renderer.render_all(&mut canvas, &kept);
            aggregator.push_pass(kept);
        }

        debug!(image = image_name, stage = %Stage::Rendered, objects = aggregator.len());
        Ok((aggregator.finish(), canvas))
    }

    /// Decode `path`, fuse, and write the JSON record and annotated image.
    pub fn process(&self, path: impl AsRef<Path>) -> FusionResult<FusionOutcome> {
        let path = path.as_ref();
        let image_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!(path = %path.display(), stage = %Stage::Idle, "processing image");

        let image = match decode(path) {
            Ok(image) => image,
            Err(e) => {
                warn!(path = %path.display(), "cannot read image: {e}");
                return Err(e);
            }
        };
        debug!(image = %image_name, stage = %Stage::Loaded, width = image.width(), height = image.height());

        let (results, canvas) = self.fuse(&image, &image_name)?;

        // Encode first so an unsupported output format leaves nothing behind
        let image_path = self.naming.image_path(&image_name);
        let encoded = persist::encode_image(&canvas, &image_path)?;

        let json_path = self.naming.json_path(&image_name);
        persist::write_json(&results, &json_path)?;
        info!("saved fused detections: {}", json_path.display());

        persist::write_bytes(&image_path, &encoded)?;
        info!("saved annotated image: {}", image_path.display());

        debug!(image = %image_name, stage = %Stage::Persisted);
        info!(image = %image_name, stage = %Stage::Done, objects = results.objects.len(), "finished image");
        Ok(FusionOutcome {
            results,
            json_path,
            image_path,
        })
    }

    /// Process images one after another, skipping the ones that fail to decode.
    pub fn process_batch<P: AsRef<Path>>(
        &self,
        paths: impl IntoIterator<Item = P>,
    ) -> FusionResult<BatchReport> {
        let mut report = BatchReport::default();
        for path in paths {
            let path = path.as_ref();
            match self.process(path) {
                Ok(outcome) => report.processed.push(outcome),
                Err(e) if e.is_skippable() => report.skipped.push((path.to_path_buf(), e)),
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    fn infer_parallel(&self, frame: &Frame<'_>) -> FusionResult<Vec<Vec<RawDetection>>> {
        let (sender, receiver) = mpsc::channel();
        std::thread::scope(|scope| {
            for (index, spec) in self.models.iter().enumerate() {
                let sender = sender.clone();
                scope.spawn(move || {
                    // receiver outlives the scope, send cannot fail
                    let _ = sender.send((index, spec.infer(frame)));
                });
            }
        });
        drop(sender);

        let mut slots: Vec<Option<FusionResult<Vec<RawDetection>>>> =
            (0..self.models.len()).map(|_| None).collect();
        for (index, result) in receiver {
            slots[index] = Some(result);
        }

        // Report the first failing pass in pass order, not completion order
        slots
            .into_iter()
            .zip(&self.models)
            .map(|(slot, spec)| {
                slot.unwrap_or_else(|| {
                    Err(FusionError::inference(
                        spec.name(),
                        anyhow::anyhow!("model pass produced no result"),
                    ))
                })
            })
            .collect()
    }
}

fn decode(path: &Path) -> FusionResult<DynamicImage> {
    // Content wins over the extension, so mislabeled files still decode
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::IoError)
        .and_then(|reader| reader.decode())
        .map_err(|source| FusionError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })
}
