mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from detfusion for tests
pub use detfusion::{
    AllowedClasses, BoundingBox, Color, ColorTable, Detection, Detector, Frame, FusionError,
    FusionPipeline, LabelStyle, ModelSpec, OutputIdMap, OutputNaming, RawDetection, Renderer,
    ResultRecord, ResultSet,
};
