//! Viewer state shared by the frame callback and the window listeners.

use formats::ClusterDataset;
use foundation::math::Vec3;
use gpu::{PerspectiveCamera, RenderFrame, Renderer};
use layers::LabelRaster;
use runtime::{Frame, FrameTarget, LoopError, RenderLoop};
use scene::World;
use tracing::{debug, info};

use crate::assembler::{populate_scene, prepare_world};
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::orbit_controls::OrbitControls;
use crate::resize::{SurfaceSize, WindowSize, aspect_for_window, surface_size_for_window};

/// Where frames end up. Implemented by the wgpu backend.
pub trait RenderSurface {
    fn resize(&mut self, size: SurfaceSize);

    /// Uploads the static scene. Called once, before the first `render`.
    fn upload(&mut self, world: &World) -> Result<(), ViewerError>;

    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), ViewerError>;
}

pub struct ViewerContext<S> {
    pub config: ViewerConfig,
    pub world: World,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    surface_size: SurfaceSize,
    surface: Option<S>,
}

impl<S: RenderSurface> ViewerContext<S> {
    /// Background, camera, surface size, then scene content.
    pub fn new<R: LabelRaster + ?Sized>(
        dataset: &ClusterDataset,
        config: ViewerConfig,
        window: WindowSize,
        raster: &mut R,
    ) -> Result<Self, ViewerError> {
        let mut world = prepare_world(&config);

        let mut camera = PerspectiveCamera::new(
            config.fov_y_deg,
            aspect_for_window(window),
            config.near,
            config.far,
        );
        camera.look_at(config.camera_position(), Vec3::ZERO);

        let surface_size = surface_size_for_window(window, config.surface_fraction);

        populate_scene(&mut world, dataset, &config, raster)?;

        let controls = OrbitControls::new(Vec3::ZERO, config.damping_factor, surface_size);
        Ok(Self {
            config,
            world,
            camera,
            controls,
            surface_size,
            surface: None,
        })
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.surface_size
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Hands over the GPU surface once it exists and uploads the scene.
    pub fn attach_surface(&mut self, mut surface: S) -> Result<(), ViewerError> {
        surface.resize(self.surface_size);
        surface.upload(&self.world)?;
        self.surface = Some(surface);
        Ok(())
    }

    /// Pan direction depends on the current camera, so moves go through here.
    pub fn on_pointer_move(&mut self, pos_px: [f64; 2]) {
        self.controls.on_pointer_move(pos_px, &self.camera);
    }

    /// New aspect from the full window, surface from the configured fraction.
    /// The projection stays dirty until the next render.
    pub fn on_resize(&mut self, window: WindowSize) -> SurfaceSize {
        self.camera.set_aspect(aspect_for_window(window));
        self.surface_size = surface_size_for_window(window, self.config.surface_fraction);
        self.controls.set_viewport(self.surface_size);
        if let Some(surface) = &mut self.surface {
            surface.resize(self.surface_size);
        }
        debug!(
            width = self.surface_size.width,
            height = self.surface_size.height,
            aspect = self.camera.aspect(),
            "viewport resized"
        );
        self.surface_size
    }
}

impl<S: RenderSurface> FrameTarget for ViewerContext<S> {
    type Error = ViewerError;

    fn update(&mut self, _frame: Frame) {
        self.controls.update(&mut self.camera);
    }

    /// Without a surface (GPU still initializing) there is nothing to draw.
    fn render(&mut self, _frame: Frame) -> Result<(), ViewerError> {
        if self.camera.is_projection_dirty() {
            self.camera.update_projection_matrix();
        }
        let Some(surface) = &mut self.surface else {
            return Ok(());
        };
        let frame = Renderer::collect(&self.world, &self.camera);
        surface.render(&frame)
    }
}

/// Render loop plus the context it drives.
pub struct Viewer<S> {
    pub render_loop: RenderLoop,
    pub context: ViewerContext<S>,
}

impl<S: RenderSurface> Viewer<S> {
    pub fn new(context: ViewerContext<S>) -> Self {
        Self {
            render_loop: RenderLoop::new(),
            context,
        }
    }

    pub fn start(&mut self) -> Result<(), LoopError> {
        self.render_loop.start()?;
        info!("render loop started");
        Ok(())
    }

    pub fn frame(&mut self, timestamp_ms: f64) -> Result<Frame, LoopError> {
        self.render_loop.tick(timestamp_ms, &mut self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::tests::{BlankRaster, two_clusters};
    use foundation::math::mat4_perspective_rh_z0;
    use gpu::RenderCommand;
    use runtime::LoopState;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Resize(SurfaceSize),
        Upload(usize),
        Render { commands: usize, position: Vec3 },
    }

    #[derive(Default, Clone)]
    struct RecordingSurface {
        events: Rc<RefCell<Vec<Event>>>,
        fail_render: bool,
    }

    impl RenderSurface for RecordingSurface {
        fn resize(&mut self, size: SurfaceSize) {
            self.events.borrow_mut().push(Event::Resize(size));
        }

        fn upload(&mut self, world: &World) -> Result<(), ViewerError> {
            self.events.borrow_mut().push(Event::Upload(world.entity_count()));
            Ok(())
        }

        fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), ViewerError> {
            if self.fail_render {
                return Err(ViewerError::Gpu("surface lost".to_string()));
            }
            let position = frame
                .commands
                .iter()
                .find_map(|c| match c {
                    RenderCommand::Sprite { position, .. } => Some(*position),
                    _ => None,
                })
                .unwrap_or(Vec3::ZERO);
            self.events.borrow_mut().push(Event::Render {
                commands: frame.commands.len(),
                position,
            });
            Ok(())
        }
    }

    fn context() -> ViewerContext<RecordingSurface> {
        ViewerContext::new(
            &two_clusters(),
            ViewerConfig::default(),
            WindowSize::new(1000.0, 500.0),
            &mut BlankRaster::default(),
        )
        .unwrap()
    }

    #[test]
    fn new_sets_up_camera_and_surface() {
        let ctx = context();
        assert_eq!(ctx.camera.aspect(), 2.0);
        assert_eq!(ctx.camera.fov_y_deg, 75.0);
        assert_eq!(ctx.camera.position, Vec3::splat(15.0));
        assert_eq!(ctx.camera.target, Vec3::ZERO);
        assert_eq!(ctx.surface_size(), SurfaceSize::new(800, 400));
        assert!(!ctx.has_surface());
    }

    #[test]
    fn resize_updates_aspect_surface_and_dirties_projection() {
        let mut ctx = context();
        let surface = RecordingSurface::default();
        let events = surface.events.clone();
        ctx.attach_surface(surface).unwrap();

        let size = ctx.on_resize(WindowSize::new(600.0, 600.0));
        assert_eq!(size, SurfaceSize::new(480, 480));
        assert_eq!(ctx.camera.aspect(), 1.0);
        assert!(ctx.camera.is_projection_dirty());
        assert_eq!(events.borrow().last(), Some(&Event::Resize(size)));

        ctx.render(Frame::new(0, 0.016, foundation::time::Time(0.0)))
            .unwrap();
        assert!(!ctx.camera.is_projection_dirty());
        assert_eq!(
            ctx.camera.projection(),
            mat4_perspective_rh_z0(75f64.to_radians(), 1.0, 0.1, 1000.0)
        );
    }

    #[test]
    fn resize_is_idempotent() {
        let mut ctx = context();
        let a = ctx.on_resize(WindowSize::new(1280.0, 720.0));
        let camera = ctx.camera.clone();
        let b = ctx.on_resize(WindowSize::new(1280.0, 720.0));
        assert_eq!(a, b);
        assert_eq!(ctx.camera, camera);
    }

    #[test]
    fn attach_resizes_then_uploads() {
        let mut ctx = context();
        let surface = RecordingSurface::default();
        let events = surface.events.clone();
        ctx.attach_surface(surface).unwrap();
        assert_eq!(
            *events.borrow(),
            vec![
                Event::Resize(SurfaceSize::new(800, 400)),
                Event::Upload(ctx.world.entity_count()),
            ]
        );
    }

    #[test]
    fn frames_render_after_start_only() {
        let mut viewer = Viewer::new(context());
        assert_eq!(viewer.frame(0.0), Err(LoopError::NotRunning));

        let surface = RecordingSurface::default();
        let events = surface.events.clone();
        viewer.context.attach_surface(surface).unwrap();
        viewer.start().unwrap();
        assert_eq!(viewer.start(), Err(LoopError::AlreadyRunning));
        assert_eq!(viewer.render_loop.state(), LoopState::Running);

        viewer.frame(16.0).unwrap();
        viewer.frame(32.0).unwrap();
        let renders = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Render { .. }))
            .count();
        assert_eq!(renders, 2);
        // 2 clouds + axes + 3 labels
        assert!(events.borrow().contains(&Event::Render {
            commands: 6,
            position: Vec3::new(10.0, 0.0, 0.0),
        }));
    }

    #[test]
    fn frame_applies_controls_before_drawing() {
        let mut viewer = Viewer::new(context());
        viewer.start().unwrap();
        viewer.context.controls.rotate_by_pixels(40.0, 0.0);
        let before = viewer.context.camera.position;
        viewer.frame(0.0).unwrap();
        assert_ne!(viewer.context.camera.position, before);
    }

    #[test]
    fn render_failure_keeps_loop_running() {
        let mut viewer = Viewer::new(context());
        viewer
            .context
            .attach_surface(RecordingSurface {
                fail_render: true,
                ..RecordingSurface::default()
            })
            .unwrap();
        viewer.start().unwrap();
        viewer.frame(0.0).unwrap();
        viewer.frame(16.0).unwrap();
        assert_eq!(viewer.render_loop.render_failures(), 2);
        assert_eq!(viewer.render_loop.frames_ticked(), 2);
    }
}
