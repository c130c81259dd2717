//! Browser viewer for clustered 3D point data.
//!
//! A page embeds the points as JSON on a mount element
//! (`<div id="cluster-plot" data-plot="[...]">`). On load the viewer
//! decodes them, builds one colored point cloud per cluster plus axes and
//! labels, and draws the scene with orbit controls into a canvas sized to
//! a fraction of the window.

use std::sync::atomic::{AtomicBool, Ordering};

use wasm_bindgen::prelude::*;

pub mod assembler;
mod browser;
pub mod canvas_label;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod orbit_controls;
pub mod resize;
pub mod wgpu;

pub use assembler::assemble_scene;
pub use config::ViewerConfig;
pub use context::{RenderSurface, Viewer, ViewerContext};
pub use error::ViewerError;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Module init can run twice under hot reload.
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    console_error_panic_hook::set_once();
    browser::mount_when_ready().map_err(JsValue::from)
}

/// Mounts a viewer into the element with `element_id`. Resolves to `false`
/// when the element is missing or already hosts a viewer.
#[wasm_bindgen]
pub fn mount(element_id: &str) -> Result<bool, JsValue> {
    browser::mount_element(element_id).map_err(JsValue::from)
}
