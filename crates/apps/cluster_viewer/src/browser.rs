//! DOM wiring: mount point lookup, canvas, listeners and the
//! `requestAnimationFrame` loop.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use formats::ClusterDataset;
use tracing::{debug, error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{AddEventListenerOptions, Document, Element, HtmlCanvasElement, Window};

use crate::canvas_label::CanvasLabelRaster;
use crate::config::{CONFIG_ATTRIBUTE, DEFAULT_MOUNT_ID, ViewerConfig};
use crate::context::{Viewer, ViewerContext};
use crate::error::ViewerError;
use crate::logging::init_logging;
use crate::orbit_controls::DragButton;
use crate::resize::{SurfaceSize, WindowSize};
use crate::wgpu::{WgpuSurface, init_wgpu};

type SharedViewer = Rc<RefCell<Viewer<WgpuSurface>>>;

thread_local! {
    static MOUNTED: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

fn window() -> Result<Window, ViewerError> {
    web_sys::window().ok_or_else(|| ViewerError::Host("window missing".to_string()))
}

fn document(window: &Window) -> Result<Document, ViewerError> {
    window
        .document()
        .ok_or_else(|| ViewerError::Host("document missing".to_string()))
}

fn window_size(window: &Window) -> Result<WindowSize, ViewerError> {
    let width = window.inner_width().map_err(ViewerError::host)?;
    let height = window.inner_height().map_err(ViewerError::host)?;
    Ok(WindowSize::new(
        width.as_f64().unwrap_or(0.0),
        height.as_f64().unwrap_or(0.0),
    ))
}

/// Inline style for the viewer canvas. `touch-action: none` keeps touch
/// drags as pointer events instead of page scrolls, which would cancel them.
pub(crate) fn canvas_style_properties(size: SurfaceSize) -> [(&'static str, String); 3] {
    [
        ("width", format!("{}px", size.width)),
        ("height", format!("{}px", size.height)),
        ("touch-action", "none".to_string()),
    ]
}

fn size_canvas(canvas: &HtmlCanvasElement, size: SurfaceSize) {
    canvas.set_width(size.width);
    canvas.set_height(size.height);
    let style = canvas.style();
    for (property, value) in canvas_style_properties(size) {
        let _ = style.set_property(property, &value);
    }
}

/// Mounts into the default element once the DOM has been parsed.
pub fn mount_when_ready() -> Result<(), ViewerError> {
    let window = window()?;
    let document = document(&window)?;
    if document.ready_state() != "loading" {
        auto_mount();
        return Ok(());
    }

    let on_ready = Closure::once_into_js(auto_mount);
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    document
        .add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            on_ready.unchecked_ref(),
            &options,
        )
        .map_err(ViewerError::host)
}

fn auto_mount() {
    // Failures are logged where they happen.
    if let Err(err) = mount_element(DEFAULT_MOUNT_ID) {
        debug!("automatic mount failed: {err}");
    }
}

/// Returns `Ok(false)` when there is nothing to do: the element does not
/// exist or already hosts a viewer.
pub fn mount_element(element_id: &str) -> Result<bool, ViewerError> {
    let window = window()?;
    let document = document(&window)?;
    let Some(element) = document.get_element_by_id(element_id) else {
        init_logging(&ViewerConfig::default());
        debug!(element_id, "mount element not found, skipping");
        return Ok(false);
    };
    if MOUNTED.with(|m| m.borrow().contains(element_id)) {
        debug!(element_id, "viewer already mounted");
        return Ok(false);
    }

    let (config, config_err) =
        ViewerConfig::resolve(element.get_attribute(CONFIG_ATTRIBUTE).as_deref());
    init_logging(&config);
    if let Some(err) = config_err {
        warn!("ignoring {CONFIG_ATTRIBUTE}: {err}");
    }
    info!(element_id, "mounting cluster viewer");

    let (viewer, canvas) = match build_viewer(&window, &document, &element, config) {
        Ok(built) => built,
        Err(err) => {
            error!(element_id, "{err}");
            return Err(err);
        }
    };
    MOUNTED.with(|m| m.borrow_mut().insert(element_id.to_string()));

    viewer.borrow_mut().start()?;
    request_frames(viewer.clone())?;
    attach_gpu(viewer, canvas);
    Ok(true)
}

fn build_viewer(
    window: &Window,
    document: &Document,
    element: &Element,
    config: ViewerConfig,
) -> Result<(SharedViewer, HtmlCanvasElement), ViewerError> {
    let payload = element
        .get_attribute(&config.payload_attribute())
        .unwrap_or_default();
    let dataset = ClusterDataset::from_json_str(&payload)?;
    let summary = dataset.summary();
    info!(
        clusters = summary.clusters,
        points = summary.points,
        empty_clusters = summary.empty_clusters,
        bounds = ?summary.bounds,
        "dataset decoded"
    );

    let mut raster = CanvasLabelRaster::new(document)?;
    let context =
        ViewerContext::<WgpuSurface>::new(&dataset, config, window_size(window)?, &mut raster)?;

    let canvas = document
        .create_element("canvas")
        .map_err(ViewerError::host)?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| ViewerError::Host("created element is not a canvas".to_string()))?;
    size_canvas(&canvas, context.surface_size());
    element.append_child(&canvas).map_err(ViewerError::host)?;

    let viewer = Rc::new(RefCell::new(Viewer::new(context)));
    install_resize_listener(window, &canvas, viewer.clone())?;
    install_pointer_listeners(&canvas, viewer.clone())?;
    Ok((viewer, canvas))
}

/// GPU setup is async; frames before it completes draw nothing.
fn attach_gpu(viewer: SharedViewer, canvas: HtmlCanvasElement) {
    spawn_local(async move {
        let surface = match init_wgpu(&canvas).await {
            Ok(surface) => surface,
            Err(err) => {
                error!("wgpu init failed: {err}");
                return;
            }
        };
        if let Err(err) = viewer.borrow_mut().context.attach_surface(surface) {
            error!("scene upload failed: {err}");
        }
    });
}

fn install_resize_listener(
    window: &Window,
    canvas: &HtmlCanvasElement,
    viewer: SharedViewer,
) -> Result<(), ViewerError> {
    let canvas = canvas.clone();
    let on_resize = Closure::wrap(Box::new(move || {
        let Ok(size) = web_sys::window()
            .ok_or_else(|| ViewerError::Host("window missing".to_string()))
            .and_then(|w| window_size(&w))
        else {
            return;
        };
        let surface = viewer.borrow_mut().context.on_resize(size);
        size_canvas(&canvas, surface);
    }) as Box<dyn FnMut()>);
    window
        .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
        .map_err(ViewerError::host)?;
    on_resize.forget();
    Ok(())
}

fn install_pointer_listeners(
    canvas: &HtmlCanvasElement,
    viewer: SharedViewer,
) -> Result<(), ViewerError> {
    let listen = |event: &str, callback: &JsValue, options: Option<&AddEventListenerOptions>| {
        let result = match options {
            Some(options) => canvas.add_event_listener_with_callback_and_add_event_listener_options(
                event,
                callback.unchecked_ref(),
                options,
            ),
            None => canvas.add_event_listener_with_callback(event, callback.unchecked_ref()),
        };
        result.map_err(ViewerError::host)
    };

    let down = {
        let viewer = viewer.clone();
        let canvas = canvas.clone();
        Closure::wrap(Box::new(move |ev: web_sys::PointerEvent| {
            let _ = canvas.set_pointer_capture(ev.pointer_id());
            viewer.borrow_mut().context.controls.on_pointer_down(
                [f64::from(ev.offset_x()), f64::from(ev.offset_y())],
                DragButton::from_dom(ev.button()),
            );
        }) as Box<dyn FnMut(_)>)
    };
    listen("pointerdown", down.as_ref(), None)?;
    down.forget();

    let moved = {
        let viewer = viewer.clone();
        Closure::wrap(Box::new(move |ev: web_sys::PointerEvent| {
            viewer
                .borrow_mut()
                .context
                .on_pointer_move([f64::from(ev.offset_x()), f64::from(ev.offset_y())]);
        }) as Box<dyn FnMut(_)>)
    };
    listen("pointermove", moved.as_ref(), None)?;
    moved.forget();

    let up = {
        let viewer = viewer.clone();
        Closure::wrap(Box::new(move |_ev: web_sys::PointerEvent| {
            viewer.borrow_mut().context.controls.on_pointer_up();
        }) as Box<dyn FnMut(_)>)
    };
    listen("pointerup", up.as_ref(), None)?;
    listen("pointercancel", up.as_ref(), None)?;
    up.forget();

    // Non-passive so the page does not scroll while zooming.
    let wheel_options = AddEventListenerOptions::new();
    wheel_options.set_passive(false);
    let wheel = Closure::wrap(Box::new(move |ev: web_sys::WheelEvent| {
        ev.prevent_default();
        viewer.borrow_mut().context.controls.on_wheel(ev.delta_y());
    }) as Box<dyn FnMut(_)>);
    listen("wheel", wheel.as_ref(), Some(&wheel_options))?;
    wheel.forget();

    // Right-drag pans.
    let context_menu = Closure::wrap(Box::new(move |ev: web_sys::Event| {
        ev.prevent_default();
    }) as Box<dyn FnMut(_)>);
    listen("contextmenu", context_menu.as_ref(), None)?;
    context_menu.forget();

    Ok(())
}

fn request_animation_frame(callback: &Closure<dyn FnMut(f64)>) -> Result<i32, ViewerError> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(ViewerError::host)
}

/// Each callback runs one frame (update, render) and then schedules the
/// next one. The closure slot refers to itself, so it lives for the page.
fn request_frames(viewer: SharedViewer) -> Result<(), ViewerError> {
    let slot: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = slot.clone();

    *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp_ms: f64| {
        if let Err(err) = viewer.borrow_mut().frame(timestamp_ms) {
            error!("frame skipped: {err}");
            return;
        }
        if let Some(callback) = next.borrow().as_ref() {
            if let Err(err) = request_animation_frame(callback) {
                error!("could not schedule next frame: {err}");
            }
        }
    }) as Box<dyn FnMut(f64)>));

    match slot.borrow().as_ref() {
        Some(callback) => request_animation_frame(callback).map(|_| ()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canvas_style_sizes_and_disables_touch_panning() {
        let props = canvas_style_properties(SurfaceSize::new(800, 400));
        assert_eq!(
            props,
            [
                ("width", "800px".to_string()),
                ("height", "400px".to_string()),
                ("touch-action", "none".to_string()),
            ]
        );
    }
}
