use foundation::color::Rgb;
use foundation::math::{Mat4, Vec3};
use scene::components::{AxisSegment, PointCloud, TextureId};
use scene::entity::EntityId;
use scene::world::World;

use crate::camera::PerspectiveCamera;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand<'w> {
    Points {
        entity: EntityId,
        origin: Vec3,
        cloud: &'w PointCloud,
    },
    Axes {
        entity: EntityId,
        origin: Vec3,
        segments: [AxisSegment; 3],
    },
    Sprite {
        entity: EntityId,
        position: Vec3,
        scale: [f64; 3],
        texture: TextureId,
    },
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame<'w> {
    pub clear_color: Rgb,
    pub view_proj: Mat4,
    /// Camera basis, used to orient billboards.
    pub camera_right: Vec3,
    pub camera_up: Vec3,
    pub commands: Vec<RenderCommand<'w>>,
}

impl RenderFrame<'_> {
    pub fn point_count(&self) -> usize {
        self.commands
            .iter()
            .map(|c| match c {
                RenderCommand::Points { cloud, .. } => cloud.point_count(),
                _ => 0,
            })
            .sum()
    }
}

pub struct Renderer;

impl Renderer {
    /// Opaque geometry first (point clouds, then axes), translucent sprites
    /// last.
    pub fn collect<'w>(world: &'w World, camera: &PerspectiveCamera) -> RenderFrame<'w> {
        let mut commands = Vec::new();
        for (entity, transform, cloud) in world.point_clouds() {
            commands.push(RenderCommand::Points {
                entity,
                origin: transform.position,
                cloud,
            });
        }
        for (entity, transform, axes) in world.axes() {
            commands.push(RenderCommand::Axes {
                entity,
                origin: transform.position,
                segments: axes.segments(),
            });
        }
        for (entity, transform, sprite) in world.sprites() {
            commands.push(RenderCommand::Sprite {
                entity,
                position: transform.position,
                scale: sprite.scale,
                texture: sprite.texture,
            });
        }

        RenderFrame {
            clear_color: world.background(),
            view_proj: camera.view_proj(),
            camera_right: camera.right(),
            camera_up: camera.screen_up(),
            commands,
        }
    }
}
