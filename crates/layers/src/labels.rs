//! Text label sprites: styled text rasterized into a bitmap and shown as a
//! camera-facing quad.

use foundation::color::Rgba;
use foundation::math::Vec3;
use scene::World;
use scene::components::{Sprite, SpriteTexture, Transform};
use scene::entity::EntityId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// On-screen extent of every label, in scene units. Independent of the text
/// length, so long strings are squeezed horizontally.
pub const LABEL_SCALE: [f64; 3] = [4.0, 2.0, 1.0];

/// Text is always drawn in opaque black.
pub const LABEL_TEXT_COLOR: Rgba = Rgba::BLACK;

/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

/// Largest label bitmap edge. WebGL2 guarantees 2D textures up to 2048 px.
pub const MAX_LABEL_TEXTURE_SIZE: u32 = 2048;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("label raster failed: {0}")]
    Raster(String),
    #[error("label bitmap has {actual} bytes, expected {expected}")]
    PixelCount { expected: usize, actual: usize },
    #[error("label bitmap {width}x{height} exceeds {max}px")]
    TooLarge { width: u32, height: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelStyle {
    pub fontface: String,
    /// Font size in pixels.
    pub fontsize: f64,
    pub border_thickness: f64,
    pub border_color: Rgba,
    pub background_color: Rgba,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            fontface: "Arial".to_string(),
            fontsize: 24.0,
            border_thickness: 4.0,
            border_color: Rgba::BLACK,
            background_color: Rgba::WHITE,
        }
    }
}

impl LabelStyle {
    /// CSS font shorthand, e.g. `32px Arial`.
    pub fn font(&self) -> String {
        format!("{}px {}", self.fontsize, self.fontface)
    }

    /// Rejects styles whose single-glyph label would not fit in a texture.
    /// A glyph is assumed to be at most one font size wide.
    pub fn check_fits_texture(&self) -> Result<(), LabelError> {
        LabelLayout::compute(self.fontsize, self).check_fits_texture()
    }
}

/// Style used for the X/Y/Z axis labels.
pub fn axis_label_style() -> LabelStyle {
    LabelStyle {
        fontsize: 32.0,
        border_thickness: 2.0,
        background_color: Rgba::new(255, 255, 255, 0.8),
        ..LabelStyle::default()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Pixel geometry of one label bitmap.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelLayout {
    pub width: u32,
    pub height: u32,
    /// Background fill and border stroke.
    pub frame: Rect,
    /// Alphabetic baseline origin of the text.
    pub text_origin: [f64; 2],
}

impl LabelLayout {
    pub fn compute(text_width: f64, style: &LabelStyle) -> Self {
        let bt = style.border_thickness.max(0.0);
        let text_width = text_width.max(0.0);
        let line = style.fontsize * LINE_HEIGHT;
        Self {
            width: ((text_width + 2.0 * bt).ceil() as u32).max(1),
            height: ((line + 2.0 * bt).ceil() as u32).max(1),
            frame: Rect {
                x: bt / 2.0,
                y: bt / 2.0,
                width: text_width + bt,
                height: line + bt,
            },
            text_origin: [bt, style.fontsize + bt],
        }
    }

    pub fn check_fits_texture(&self) -> Result<(), LabelError> {
        if self.width > MAX_LABEL_TEXTURE_SIZE || self.height > MAX_LABEL_TEXTURE_SIZE {
            return Err(LabelError::TooLarge {
                width: self.width,
                height: self.height,
                max: MAX_LABEL_TEXTURE_SIZE,
            });
        }
        Ok(())
    }
}

/// 2D drawing surface a label is rasterized on.
///
/// Resizing may reset drawing state (the browser canvas does), so the font is
/// set again after every resize.
pub trait LabelRaster {
    fn set_font(&mut self, font: &str) -> Result<(), LabelError>;
    fn measure_text_width(&mut self, text: &str) -> Result<f64, LabelError>;
    fn resize(&mut self, width: u32, height: u32) -> Result<(), LabelError>;
    fn fill_rect(&mut self, rect: Rect, color: Rgba) -> Result<(), LabelError>;
    fn stroke_rect(&mut self, rect: Rect, color: Rgba, line_width: f64) -> Result<(), LabelError>;
    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba) -> Result<(), LabelError>;
    /// RGBA8, row-major, `width * height * 4` bytes.
    fn read_pixels(&mut self) -> Result<Vec<u8>, LabelError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelSprite {
    pub text: String,
    pub bitmap: LabelBitmap,
    pub scale: [f64; 3],
    pub position: Vec3,
}

impl LabelSprite {
    /// Adds the bitmap as a texture and a sprite entity at the label position.
    pub fn spawn_into(self, world: &mut World) -> EntityId {
        let texture = world.add_texture(SpriteTexture::new(
            self.bitmap.width,
            self.bitmap.height,
            self.bitmap.pixels,
        ));
        let entity = world.spawn();
        world.set_transform(entity, Transform::translate(self.position));
        world.set_sprite(entity, Sprite::new(texture, self.scale));
        entity
    }
}

pub fn rasterize_label<R: LabelRaster + ?Sized>(
    raster: &mut R,
    text: &str,
    style: &LabelStyle,
) -> Result<LabelBitmap, LabelError> {
    let font = style.font();
    raster.set_font(&font)?;
    let text_width = raster.measure_text_width(text)?;
    let layout = LabelLayout::compute(text_width, style);
    layout.check_fits_texture()?;

    raster.resize(layout.width, layout.height)?;
    raster.set_font(&font)?;
    raster.fill_rect(layout.frame, style.background_color)?;
    if style.border_thickness > 0.0 {
        raster.stroke_rect(layout.frame, style.border_color, style.border_thickness)?;
    }
    raster.fill_text(text, layout.text_origin[0], layout.text_origin[1], LABEL_TEXT_COLOR)?;

    let pixels = raster.read_pixels()?;
    let expected = layout.width as usize * layout.height as usize * 4;
    if pixels.len() != expected {
        return Err(LabelError::PixelCount {
            expected,
            actual: pixels.len(),
        });
    }
    debug!(text, width = layout.width, height = layout.height, "label rasterized");
    Ok(LabelBitmap {
        width: layout.width,
        height: layout.height,
        pixels,
    })
}

pub fn create_label_sprite<R: LabelRaster + ?Sized>(
    raster: &mut R,
    text: &str,
    style: &LabelStyle,
    position: Vec3,
) -> Result<LabelSprite, LabelError> {
    let bitmap = rasterize_label(raster, text, style)?;
    Ok(LabelSprite {
        text: text.to_string(),
        bitmap,
        scale: LABEL_SCALE,
        position,
    })
}

/// "X", "Y" and "Z" labels at the tips of axes of length `axis_length`.
pub fn axis_label_sprites<R: LabelRaster + ?Sized>(
    raster: &mut R,
    axis_length: f64,
    style: &LabelStyle,
) -> Result<[LabelSprite; 3], LabelError> {
    let l = axis_length;
    Ok([
        create_label_sprite(raster, "X", style, Vec3::new(l, 0.0, 0.0))?,
        create_label_sprite(raster, "Y", style, Vec3::new(0.0, l, 0.0))?,
        create_label_sprite(raster, "Z", style, Vec3::new(0.0, 0.0, l))?,
    ])
}
