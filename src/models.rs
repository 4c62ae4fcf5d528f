use image::Rgb;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates, serialized as `[xmin, ymin, xmax, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BoundingBox {
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Truncate float model coordinates toward zero.
    pub fn from_xyxy(xyxy: [f32; 4]) -> Self {
        Self {
            xmin: xyxy[0] as i32,
            ymin: xyxy[1] as i32,
            xmax: xyxy[2] as i32,
            ymax: xyxy[3] as i32,
        }
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from(v: [i32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.xmin, b.ymin, b.xmax, b.ymax]
    }
}

/// One detection as returned by a model, before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// `[xmin, ymin, xmax, ymax]` in input image pixels
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: u32,
}

/// A detection that survived filtering, labeled and remapped.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub class_id: u32,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl Detection {
    /// Text drawn above the box.
    pub fn caption(&self) -> String {
        format!("{} {:.2}", self.label, self.confidence)
    }
}

/// Fused detections for one image, in aggregation order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub image_name: String,
    pub objects: Vec<Detection>,
}

impl ResultSet {
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            objects: Vec::new(),
        }
    }

    pub fn to_record(&self) -> ResultRecord {
        ResultRecord {
            image_name: self.image_name.clone(),
            objects: self
                .objects
                .iter()
                .map(|d| ObjectRecord {
                    label: d.label.clone(),
                    class_id: d.class_id,
                    bbox: d.bbox,
                })
                .collect(),
        }
    }
}

/// Persisted form of a [`ResultSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultRecord {
    pub image_name: String,
    pub objects: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectRecord {
    pub label: String,
    pub class_id: u32,
    pub bbox: BoundingBox,
}

impl ResultRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// RGB color, written as `[r, g, b]` in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Color {
    fn from(v: [u8; 3]) -> Self {
        Color::new(v[0], v[1], v[2])
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

impl From<Color> for Rgb<u8> {
    fn from(c: Color) -> Self {
        Rgb([c.r, c.g, c.b])
    }
}
