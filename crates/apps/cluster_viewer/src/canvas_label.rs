//! Off-screen canvas used to rasterize label bitmaps.

use foundation::color::Rgba;
use layers::{LabelError, LabelRaster, Rect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::error::ViewerError;

pub struct CanvasLabelRaster {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasLabelRaster {
    /// Creates a detached canvas; it is never added to the page.
    pub fn new(document: &Document) -> Result<Self, ViewerError> {
        let canvas = document
            .create_element("canvas")
            .map_err(ViewerError::host)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| ViewerError::Host("created element is not a canvas".to_string()))?;
        let ctx = canvas
            .get_context("2d")
            .map_err(ViewerError::host)?
            .ok_or_else(|| ViewerError::Host("2d canvas context unavailable".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ViewerError::Host("unexpected 2d context type".to_string()))?;
        Ok(Self { canvas, ctx })
    }

    fn set_style(&self, property: &str, color: Rgba) -> Result<(), LabelError> {
        js_sys::Reflect::set(
            self.ctx.as_ref(),
            &JsValue::from_str(property),
            &JsValue::from_str(&color.to_css()),
        )
        .map(|_| ())
        .map_err(raster_err)
    }
}

fn raster_err(value: JsValue) -> LabelError {
    LabelError::Raster(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

impl LabelRaster for CanvasLabelRaster {
    fn set_font(&mut self, font: &str) -> Result<(), LabelError> {
        self.ctx.set_font(font);
        Ok(())
    }

    fn measure_text_width(&mut self, text: &str) -> Result<f64, LabelError> {
        Ok(self.ctx.measure_text(text).map_err(raster_err)?.width())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), LabelError> {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) -> Result<(), LabelError> {
        self.set_style("fillStyle", color)?;
        self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba, line_width: f64) -> Result<(), LabelError> {
        self.set_style("strokeStyle", color)?;
        self.ctx.set_line_width(line_width);
        self.ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba) -> Result<(), LabelError> {
        self.set_style("fillStyle", color)?;
        self.ctx.set_text_baseline("alphabetic");
        self.ctx.fill_text(text, x, y).map_err(raster_err)
    }

    fn read_pixels(&mut self) -> Result<Vec<u8>, LabelError> {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        let image = self
            .ctx
            .get_image_data(0.0, 0.0, w as f64, h as f64)
            .map_err(raster_err)?;
        Ok(image.data().0)
    }
}
