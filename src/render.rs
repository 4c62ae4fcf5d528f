use std::collections::BTreeMap;
use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::{FusionError, FusionResult};
use crate::models::{BoundingBox, Color, Detection};

/// Vertical padding added to the text height for the label background.
pub const LABEL_PADDING: u32 = 8;
/// Distance from the box's top edge to the text baseline.
pub const BASELINE_OFFSET: i32 = 4;

/// Per-label colors with an explicit fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    default: Color,
    colors: BTreeMap<String, Color>,
}

impl ColorTable {
    pub fn new(default: Color) -> Self {
        Self {
            default,
            colors: BTreeMap::new(),
        }
    }

    pub fn with(mut self, label: impl Into<String>, color: Color) -> Self {
        self.colors.insert(label.into(), color);
        self
    }

    pub fn get(&self, label: &str) -> Color {
        self.colors.get(label).copied().unwrap_or(self.default)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.colors.keys().map(String::as_str)
    }
}

/// Font and stroke settings for annotations.
#[derive(Clone)]
pub struct LabelStyle {
    /// Without a font only the box outlines are drawn.
    pub font: Option<FontArc>,
    /// Glyph height in pixels
    pub font_px: f32,
    /// Box outline stroke width in pixels
    pub thickness: u32,
}

impl std::fmt::Debug for LabelStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelStyle")
            .field("font", &self.font.is_some())
            .field("font_px", &self.font_px)
            .field("thickness", &self.thickness)
            .finish()
    }
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font: None,
            font_px: 18.0,
            thickness: 2,
        }
    }
}

impl LabelStyle {
    pub fn with_font_file(mut self, path: impl AsRef<Path>) -> FusionResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            FusionError::Config(format!("cannot read font {}: {e}", path.display()))
        })?;
        let font = FontArc::try_from_vec(data).map_err(|e| {
            FusionError::Config(format!("invalid font {}: {e}", path.display()))
        })?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn scale(&self) -> PxScale {
        PxScale::from(self.font_px)
    }
}

/// Draws kept detections onto the shared canvas.
#[derive(Debug, Clone)]
pub struct Renderer {
    pub box_colors: ColorTable,
    pub text_colors: ColorTable,
    pub style: LabelStyle,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            box_colors: ColorTable::new(Color::GREEN),
            text_colors: ColorTable::new(Color::BLACK),
            style: LabelStyle::default(),
        }
    }
}

impl Renderer {
    pub fn render(&self, canvas: &mut RgbImage, detection: &Detection) {
        draw_detection(
            canvas,
            detection,
            self.box_colors.get(&detection.label),
            self.text_colors.get(&detection.label),
            self.style.font.as_ref(),
            self.style.scale(),
            self.style.thickness,
        );
    }

    pub fn render_all<'a>(
        &self,
        canvas: &mut RgbImage,
        detections: impl IntoIterator<Item = &'a Detection>,
    ) {
        for detection in detections {
            self.render(canvas, detection);
        }
    }
}

/// Draw one detection: box outline, filled label background and caption.
pub fn draw_detection(
    canvas: &mut RgbImage,
    detection: &Detection,
    box_color: Color,
    text_color: Color,
    font: Option<&FontArc>,
    scale: PxScale,
    thickness: u32,
) {
    let box_rgb: Rgb<u8> = box_color.into();
    draw_box_outline(canvas, &detection.bbox, box_rgb, thickness);

    let Some(font) = font else {
        return;
    };

    let caption = detection.caption();
    let (text_w, text_h) = text_size(scale, font, &caption);
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);
    let x = detection.bbox.xmin as i64;
    let top = detection.bbox.ymin as i64;
    let label_top = top - (text_h + LABEL_PADDING) as i64;

    // Label entirely off-canvas; past this point every coordinate fits in i32
    if x >= width || x + (text_w as i64) < 0 || label_top >= height || top < 0 {
        return;
    }
    let (x, top) = (x as i32, top as i32);

    let background = Rect::at(x, label_top as i32)
        .of_size(text_w + 1, text_h + LABEL_PADDING + 1);
    draw_filled_rect_mut(canvas, background, box_rgb);

    // draw_text_mut positions the ascent line at y
    let ascent = font.as_scaled(scale).ascent().round() as i32;
    draw_text_mut(
        canvas,
        text_color.into(),
        x,
        top - BASELINE_OFFSET - ascent,
        scale,
        font,
        &caption,
    );
}

/// Outline around the box edges, `thickness` pixels wide.
///
/// Edges are clamped to one pixel outside the canvas, so boxes with extreme
/// coordinates are clipped rather than overflowing.
fn draw_box_outline(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>, thickness: u32) {
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);
    let thickness = thickness.max(1) as i64;
    let inner = thickness / 2;
    for offset in -inner..thickness - inner {
        let left = (bbox.xmin as i64 - offset).clamp(-1, width);
        let top = (bbox.ymin as i64 - offset).clamp(-1, height);
        let right = (bbox.xmax as i64 + offset).clamp(-1, width);
        let bottom = (bbox.ymax as i64 + offset).clamp(-1, height);
        if right < left || bottom < top {
            continue;
        }
        let rect = Rect::at(left as i32, top as i32)
            .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
