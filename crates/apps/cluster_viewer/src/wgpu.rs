//! wgpu backend: billboarded point quads, axis lines and label sprites.
//!
//! Vertex packing is plain data and lives at module level; the device and
//! surface only exist on wasm32.

use foundation::color::Rgb;
use foundation::math::Vec3;
use gpu::RenderFrame;
use scene::components::{AxisSegment, PointCloud};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
}

/// One screen-aligned square per point, `size` scene units wide.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteInstance {
    pub position: [f32; 3],
    pub scale: [f32; 2],
    pub _pad: [f32; 3],
}

/// Antialiasing sample count, matching a WebGL context created with
/// `antialias: true`.
pub const MSAA_SAMPLES: u32 = 4;

/// `MSAA_SAMPLES` when the surface format can be multisampled that way,
/// otherwise single-sampled.
pub fn choose_sample_count(supported: impl Fn(u32) -> bool) -> u32 {
    if supported(MSAA_SAMPLES) { MSAA_SAMPLES } else { 1 }
}

/// sRGB transfer function, inverse.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Colors are authored in sRGB; an sRGB target expects linear values.
pub fn output_color(rgb: Rgb, srgb_target: bool) -> [f32; 3] {
    if srgb_target {
        [
            srgb_to_linear(rgb.r),
            srgb_to_linear(rgb.g),
            srgb_to_linear(rgb.b),
        ]
    } else {
        rgb.to_array()
    }
}

pub fn globals_for(frame: &RenderFrame<'_>) -> Globals {
    let r = frame.camera_right.to_f32();
    let u = frame.camera_up.to_f32();
    Globals {
        view_proj: frame.view_proj,
        camera_right: [r[0], r[1], r[2], 0.0],
        camera_up: [u[0], u[1], u[2], 0.0],
    }
}

pub fn point_instances(origin: Vec3, cloud: &PointCloud, srgb_target: bool) -> Vec<PointInstance> {
    let [r, g, b] = output_color(cloud.color, srgb_target);
    let o = origin.to_f32();
    cloud
        .points()
        .map(|p| PointInstance {
            position: [p[0] + o[0], p[1] + o[1], p[2] + o[2]],
            size: cloud.point_size,
            color: [r, g, b, 1.0],
        })
        .collect()
}

pub fn axis_vertices(origin: Vec3, segments: &[AxisSegment], srgb_target: bool) -> Vec<LineVertex> {
    let mut out = Vec::with_capacity(segments.len() * 2);
    for segment in segments {
        let color = output_color(segment.color, srgb_target);
        out.push(LineVertex {
            position: (origin + segment.start).to_f32(),
            color,
        });
        out.push(LineVertex {
            position: (origin + segment.end).to_f32(),
            color,
        });
    }
    out
}

pub fn sprite_instance(position: Vec3, scale: [f64; 3]) -> SpriteInstance {
    SpriteInstance {
        position: position.to_f32(),
        scale: [scale[0] as f32, scale[1] as f32],
        _pad: [0.0; 3],
    }
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use std::borrow::Cow;
    use std::collections::HashMap;
    use std::ops::Range;

    use gpu::{RenderCommand, RenderFrame};
    use scene::World;
    use scene::components::TextureId;
    use scene::entity::EntityId;
    use tracing::{debug, info};

    use super::{
        Globals, LineVertex, PointInstance, SpriteInstance, axis_vertices, choose_sample_count,
        globals_for, output_color, point_instances, sprite_instance,
    };
    use crate::context::RenderSurface;
    use crate::error::ViewerError;
    use crate::resize::SurfaceSize;

    const DEPTH_FORMAT: ::wgpu::TextureFormat = ::wgpu::TextureFormat::Depth24Plus;

    const GLOBALS_WGSL: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

fn quad_corner(vid: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    return corners[vid];
}

fn billboard(center: vec3<f32>, offset: vec2<f32>) -> vec4<f32> {
    let world = center
        + globals.camera_right.xyz * offset.x
        + globals.camera_up.xyz * offset.y;
    return globals.view_proj * vec4<f32>(world, 1.0);
}
"#;

    const POINTS_WGSL: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vid: u32,
    @location(0) center: vec3<f32>,
    @location(1) size: f32,
    @location(2) color: vec4<f32>,
) -> VsOut {
    return VsOut(billboard(center, quad_corner(vid) * size), color);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

    const AXES_WGSL: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VsOut {
    return VsOut(globals.view_proj * vec4<f32>(position, 1.0), color);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

    const SPRITES_WGSL: &str = r#"
@group(1) @binding(0)
var label_texture: texture_2d<f32>;
@group(1) @binding(1)
var label_sampler: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vid: u32,
    @location(0) center: vec3<f32>,
    @location(1) scale: vec2<f32>,
) -> VsOut {
    let corner = quad_corner(vid);
    let uv = vec2<f32>(corner.x + 0.5, 0.5 - corner.y);
    return VsOut(billboard(center, corner * scale), uv);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let c = textureSample(label_texture, label_sampler, in.uv);
    if (c.a < 0.01) {
        discard;
    }
    return c;
}
"#;

    pub struct WgpuSurface {
        _instance: &'static ::wgpu::Instance,
        surface: ::wgpu::Surface<'static>,
        device: ::wgpu::Device,
        queue: ::wgpu::Queue,
        config: ::wgpu::SurfaceConfiguration,
        srgb_target: bool,
        sample_count: u32,
        /// Multisampled color target, resolved into the surface texture.
        /// `None` when running single-sampled.
        msaa_view: Option<::wgpu::TextureView>,
        depth_view: ::wgpu::TextureView,
        globals_buffer: ::wgpu::Buffer,
        globals_bind_group: ::wgpu::BindGroup,
        texture_bgl: ::wgpu::BindGroupLayout,
        sampler: ::wgpu::Sampler,
        points_pipeline: ::wgpu::RenderPipeline,
        axes_pipeline: ::wgpu::RenderPipeline,
        sprites_pipeline: ::wgpu::RenderPipeline,
        scene: Option<SceneBuffers>,
    }

    struct SceneBuffers {
        points: Option<::wgpu::Buffer>,
        point_ranges: HashMap<EntityId, Range<u32>>,
        axes: Option<::wgpu::Buffer>,
        axes_ranges: HashMap<EntityId, Range<u32>>,
        sprite_instances: ::wgpu::Buffer,
        sprite_capacity: usize,
        textures: HashMap<TextureId, ::wgpu::BindGroup>,
    }

    fn create_attachment(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
        label: &str,
        format: ::wgpu::TextureFormat,
        sample_count: u32,
    ) -> ::wgpu::TextureView {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some(label),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: ::wgpu::TextureDimension::D2,
            format,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    /// Depth and (when multisampling) color targets sized to the surface.
    fn create_targets(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> (Option<::wgpu::TextureView>, ::wgpu::TextureView) {
        let msaa = (sample_count > 1).then(|| {
            create_attachment(device, config, "cluster-msaa-color", config.format, sample_count)
        });
        let depth = create_attachment(device, config, "cluster-depth", DEPTH_FORMAT, sample_count);
        (msaa, depth)
    }

    struct PipelineSpec<'a> {
        label: &'a str,
        layout: &'a ::wgpu::PipelineLayout,
        module: &'a ::wgpu::ShaderModule,
        buffers: &'a [::wgpu::VertexBufferLayout<'a>],
        topology: ::wgpu::PrimitiveTopology,
        blend: ::wgpu::BlendState,
        depth_write: bool,
        sample_count: u32,
    }

    fn create_pipeline(
        device: &::wgpu::Device,
        format: ::wgpu::TextureFormat,
        spec: PipelineSpec<'_>,
    ) -> ::wgpu::RenderPipeline {
        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some(spec.label),
            layout: Some(spec.layout),
            vertex: ::wgpu::VertexState {
                module: spec.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: spec.buffers,
            },
            fragment: Some(::wgpu::FragmentState {
                module: spec.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format,
                    blend: Some(spec.blend),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: spec.topology,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                // Billboards face the camera by construction.
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: spec.depth_write,
                depth_compare: ::wgpu::CompareFunction::LessEqual,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState {
                count: spec.sample_count,
                ..Default::default()
            },
            multiview_mask: None,
            cache: None,
        })
    }

    fn shader(device: &::wgpu::Device, label: &str, body: &str) -> ::wgpu::ShaderModule {
        device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Owned(format!("{GLOBALS_WGSL}\n{body}"))),
        })
    }

    pub async fn init_wgpu(canvas: &web_sys::HtmlCanvasElement) -> Result<WgpuSurface, ViewerError> {
        let width = canvas.width();
        let height = canvas.height();

        // `wgpu::Surface` must not outlive its `wgpu::Instance`, so the
        // instance lives for the rest of the page.
        let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
            &::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            },
        )));

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| ViewerError::Gpu(format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ViewerError::Gpu(format!("adapter error: {e}")))?;
        let adapter_info = adapter.get_info();
        info!(
            backend = ?adapter_info.backend,
            adapter = %adapter_info.name,
            "gpu adapter ready"
        );

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("cluster-wgpu-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| ViewerError::Gpu(format!("device error: {e}")))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| ViewerError::Gpu("surface reports no formats".to_string()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let format_features = adapter.get_texture_format_features(format);
        let sample_count =
            choose_sample_count(|count| format_features.flags.sample_count_supported(count));
        let (msaa_view, depth_view) = create_targets(&device, &config, sample_count);
        info!(sample_count, ?format, "surface configured");

        // Uniform rather than storage: WebGL2 has no storage buffers.
        let globals_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("cluster-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bgl = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("cluster-globals-bgl"),
            entries: &[::wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: ::wgpu::BindingType::Buffer {
                    ty: ::wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let globals_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("cluster-globals-bg"),
            layout: &globals_bgl,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let texture_bgl = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("cluster-label-bgl"),
            entries: &[
                ::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Texture {
                        sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: ::wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                ::wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
            label: Some("cluster-label-sampler"),
            mag_filter: ::wgpu::FilterMode::Linear,
            min_filter: ::wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let globals_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("cluster-globals-layout"),
            bind_group_layouts: &[&globals_bgl],
            immediate_size: 0,
        });
        let sprites_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("cluster-sprites-layout"),
            bind_group_layouts: &[&globals_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let points_shader = shader(&device, "cluster-points-shader", POINTS_WGSL);
        let axes_shader = shader(&device, "cluster-axes-shader", AXES_WGSL);
        let sprites_shader = shader(&device, "cluster-sprites-shader", SPRITES_WGSL);

        let points_pipeline = create_pipeline(
            &device,
            format,
            PipelineSpec {
                label: "cluster-points-pipeline",
                layout: &globals_layout,
                module: &points_shader,
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointInstance>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Instance,
                    attributes: &::wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32,
                        2 => Float32x4,
                    ],
                }],
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                blend: ::wgpu::BlendState::REPLACE,
                depth_write: true,
                sample_count,
            },
        );
        let axes_pipeline = create_pipeline(
            &device,
            format,
            PipelineSpec {
                label: "cluster-axes-pipeline",
                layout: &globals_layout,
                module: &axes_shader,
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
                }],
                topology: ::wgpu::PrimitiveTopology::LineList,
                blend: ::wgpu::BlendState::REPLACE,
                depth_write: true,
                sample_count,
            },
        );
        let sprites_pipeline = create_pipeline(
            &device,
            format,
            PipelineSpec {
                label: "cluster-sprites-pipeline",
                layout: &sprites_layout,
                module: &sprites_shader,
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SpriteInstance>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Instance,
                    attributes: &::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                blend: ::wgpu::BlendState::ALPHA_BLENDING,
                depth_write: false,
                sample_count,
            },
        );

        Ok(WgpuSurface {
            _instance: instance,
            surface,
            device,
            queue,
            srgb_target: format.is_srgb(),
            sample_count,
            config,
            msaa_view,
            depth_view,
            globals_buffer,
            globals_bind_group,
            texture_bgl,
            sampler,
            points_pipeline,
            axes_pipeline,
            sprites_pipeline,
            scene: None,
        })
    }

    impl WgpuSurface {
        fn vertex_buffer(&self, label: &str, contents: &[u8]) -> Option<::wgpu::Buffer> {
            if contents.is_empty() {
                return None;
            }
            Some(
                self.device
                    .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                        label: Some(label),
                        contents,
                        usage: ::wgpu::BufferUsages::VERTEX,
                    }),
            )
        }

        fn sprite_buffer(&self, capacity: usize) -> ::wgpu::Buffer {
            self.device.create_buffer(&::wgpu::BufferDescriptor {
                label: Some("cluster-sprite-instances"),
                size: (capacity.max(1) * std::mem::size_of::<SpriteInstance>()) as u64,
                usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        }

        fn label_texture(&self, width: u32, height: u32, rgba: &[u8]) -> ::wgpu::BindGroup {
            let size = ::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            };
            let texture = self.device.create_texture(&::wgpu::TextureDescriptor {
                label: Some("cluster-label-texture"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: ::wgpu::TextureDimension::D2,
                format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            self.queue.write_texture(
                ::wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: ::wgpu::Origin3d::ZERO,
                    aspect: ::wgpu::TextureAspect::All,
                },
                rgba,
                ::wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                size,
            );
            let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
            self.device.create_bind_group(&::wgpu::BindGroupDescriptor {
                label: Some("cluster-label-bg"),
                layout: &self.texture_bgl,
                entries: &[
                    ::wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ::wgpu::BindingResource::TextureView(&view),
                    },
                    ::wgpu::BindGroupEntry {
                        binding: 1,
                        resource: ::wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            })
        }
    }

    impl RenderSurface for WgpuSurface {
        fn resize(&mut self, size: SurfaceSize) {
            self.config.width = size.width.max(1);
            self.config.height = size.height.max(1);
            self.surface.configure(&self.device, &self.config);
            let (msaa_view, depth_view) =
                create_targets(&self.device, &self.config, self.sample_count);
            self.msaa_view = msaa_view;
            self.depth_view = depth_view;
        }

        fn upload(&mut self, world: &World) -> Result<(), ViewerError> {
            let mut points = Vec::new();
            let mut point_ranges = HashMap::new();
            for (entity, transform, cloud) in world.point_clouds() {
                let start = points.len() as u32;
                points.extend(point_instances(transform.position, cloud, self.srgb_target));
                point_ranges.insert(entity, start..points.len() as u32);
            }

            let mut lines = Vec::new();
            let mut axes_ranges = HashMap::new();
            for (entity, transform, axes) in world.axes() {
                let start = lines.len() as u32;
                lines.extend(axis_vertices(transform.position, &axes.segments(), self.srgb_target));
                axes_ranges.insert(entity, start..lines.len() as u32);
            }

            let mut textures = HashMap::new();
            for (id, texture) in world.textures() {
                if texture.width == 0 || texture.height == 0 {
                    continue;
                }
                textures.insert(id, self.label_texture(texture.width, texture.height, &texture.rgba));
            }

            let sprite_capacity = world.sprites().len();
            debug!(
                points = points.len(),
                line_vertices = lines.len(),
                textures = textures.len(),
                "scene uploaded"
            );
            self.scene = Some(SceneBuffers {
                points: self.vertex_buffer("cluster-point-instances", bytemuck::cast_slice(&points)),
                point_ranges,
                axes: self.vertex_buffer("cluster-axes-vertices", bytemuck::cast_slice(&lines)),
                axes_ranges,
                sprite_instances: self.sprite_buffer(sprite_capacity),
                sprite_capacity,
                textures,
            });
            Ok(())
        }

        fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), ViewerError> {
            let sprites: Vec<(SpriteInstance, TextureId)> = frame
                .commands
                .iter()
                .filter_map(|c| match c {
                    RenderCommand::Sprite {
                        position,
                        scale,
                        texture,
                        ..
                    } => Some((sprite_instance(*position, *scale), *texture)),
                    _ => None,
                })
                .collect();

            let needs_grow = self
                .scene
                .as_ref()
                .is_some_and(|scene| sprites.len() > scene.sprite_capacity);
            if needs_grow {
                let buffer = self.sprite_buffer(sprites.len());
                if let Some(scene) = &mut self.scene {
                    scene.sprite_instances = buffer;
                    scene.sprite_capacity = sprites.len();
                }
            }
            let Some(scene) = &self.scene else {
                return Err(ViewerError::Gpu("render before scene upload".to_string()));
            };

            let output = match self.surface.get_current_texture() {
                Ok(output) => output,
                Err(err @ (::wgpu::SurfaceError::Lost | ::wgpu::SurfaceError::Outdated)) => {
                    self.surface.configure(&self.device, &self.config);
                    return Err(ViewerError::Gpu(format!("surface acquire failed: {err}")));
                }
                Err(err) => return Err(ViewerError::Gpu(format!("surface acquire failed: {err}"))),
            };
            let view = output
                .texture
                .create_view(&::wgpu::TextureViewDescriptor::default());

            self.queue.write_buffer(
                &self.globals_buffer,
                0,
                bytemuck::bytes_of(&globals_for(frame)),
            );
            if !sprites.is_empty() {
                let instances: Vec<SpriteInstance> = sprites.iter().map(|(i, _)| *i).collect();
                self.queue.write_buffer(
                    &scene.sprite_instances,
                    0,
                    bytemuck::cast_slice(&instances),
                );
            }

            // Multisampled frames resolve into the surface texture; the
            // samples themselves are not needed afterwards.
            let (color_view, resolve_target, color_store) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(&view), ::wgpu::StoreOp::Discard),
                None => (&view, None, ::wgpu::StoreOp::Store),
            };

            let [r, g, b] = output_color(frame.clear_color, self.srgb_target);
            let mut encoder = self
                .device
                .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                    label: Some("cluster-frame-encoder"),
                });
            {
                let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                    label: Some("cluster-scene-pass"),
                    color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                        view: color_view,
                        resolve_target,
                        depth_slice: None,
                        ops: ::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(::wgpu::Color {
                                r: r as f64,
                                g: g as f64,
                                b: b as f64,
                                a: 1.0,
                            }),
                            store: color_store,
                        },
                    })],
                    depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth_view,
                        depth_ops: Some(::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(1.0),
                            store: ::wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                    multiview_mask: None,
                });
                rpass.set_bind_group(0, &self.globals_bind_group, &[]);

                let mut sprite_index = 0u32;
                for command in &frame.commands {
                    match command {
                        RenderCommand::Points { entity, .. } => {
                            let (Some(buffer), Some(range)) =
                                (&scene.points, scene.point_ranges.get(entity))
                            else {
                                continue;
                            };
                            if range.is_empty() {
                                continue;
                            }
                            rpass.set_pipeline(&self.points_pipeline);
                            rpass.set_vertex_buffer(0, buffer.slice(..));
                            rpass.draw(0..6, range.clone());
                        }
                        RenderCommand::Axes { entity, .. } => {
                            let (Some(buffer), Some(range)) =
                                (&scene.axes, scene.axes_ranges.get(entity))
                            else {
                                continue;
                            };
                            rpass.set_pipeline(&self.axes_pipeline);
                            rpass.set_vertex_buffer(0, buffer.slice(..));
                            rpass.draw(range.clone(), 0..1);
                        }
                        RenderCommand::Sprite { texture, .. } => {
                            let i = sprite_index;
                            sprite_index += 1;
                            let Some(bind_group) = scene.textures.get(texture) else {
                                continue;
                            };
                            rpass.set_pipeline(&self.sprites_pipeline);
                            rpass.set_bind_group(1, bind_group, &[]);
                            rpass.set_vertex_buffer(0, scene.sprite_instances.slice(..));
                            rpass.draw(0..6, i..i + 1);
                        }
                    }
                }
            }

            self.queue.submit(std::iter::once(encoder.finish()));
            output.present();
            Ok(())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use gpu::RenderFrame;
    use scene::World;

    use crate::context::RenderSurface;
    use crate::error::ViewerError;
    use crate::resize::SurfaceSize;

    #[derive(Debug, Default)]
    pub struct WgpuSurface;

    pub async fn init_wgpu(_canvas: &web_sys::HtmlCanvasElement) -> Result<WgpuSurface, ViewerError> {
        Err(ViewerError::Gpu(
            "wgpu initialization is only available on wasm32 targets".to_string(),
        ))
    }

    impl RenderSurface for WgpuSurface {
        fn resize(&mut self, _size: SurfaceSize) {}

        fn upload(&mut self, _world: &World) -> Result<(), ViewerError> {
            Ok(())
        }

        fn render(&mut self, _frame: &RenderFrame<'_>) -> Result<(), ViewerError> {
            Err(ViewerError::Gpu(
                "wgpu rendering is only available on wasm32 targets".to_string(),
            ))
        }
    }
}

pub use imp::{WgpuSurface, init_wgpu};
