pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod persist;
pub mod pipeline;
pub mod render;

pub use config::FusionConfig;
pub use detection::{AllowedClasses, Detector, Frame, ModelSpec, OutputIdMap, ReplayDetector};
pub use error::{FusionError, FusionResult};
pub use models::{BoundingBox, Color, Detection, RawDetection, ResultRecord, ResultSet};
pub use persist::OutputNaming;
pub use pipeline::{BatchReport, FusionOutcome, FusionPipeline, Stage};
pub use render::{ColorTable, LabelStyle, Renderer};
