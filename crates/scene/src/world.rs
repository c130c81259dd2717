use foundation::color::Rgb;

use crate::components::{AxesMarker, PointCloud, Sprite, SpriteTexture, TextureId, Transform};
use crate::entity::EntityId;

/// Scene graph: a background color plus entities carrying components.
///
/// Entities are only ever added. Once assembled the world is handed to the
/// renderer by shared reference.
#[derive(Debug, Default)]
pub struct World {
    background: Rgb,
    next_index: u32,
    transforms: Vec<Option<Transform>>,
    point_clouds: Vec<Option<PointCloud>>,
    axes: Vec<Option<AxesMarker>>,
    sprites: Vec<Option<Sprite>>,
    textures: Vec<SpriteTexture>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_background(&mut self, color: Rgb) {
        self.background = color;
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn entity_count(&self) -> usize {
        self.next_index as usize
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_index);
        self.next_index += 1;
        self.ensure_capacity(id.index() as usize);
        id
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        self.ensure_capacity(entity.index() as usize);
        self.transforms[entity.index() as usize] = Some(transform);
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.transforms
            .get(entity.index() as usize)
            .and_then(|t| *t)
    }

    pub fn set_point_cloud(&mut self, entity: EntityId, cloud: PointCloud) {
        self.ensure_capacity(entity.index() as usize);
        self.point_clouds[entity.index() as usize] = Some(cloud);
    }

    pub fn set_axes(&mut self, entity: EntityId, axes: AxesMarker) {
        self.ensure_capacity(entity.index() as usize);
        self.axes[entity.index() as usize] = Some(axes);
    }

    pub fn set_sprite(&mut self, entity: EntityId, sprite: Sprite) {
        self.ensure_capacity(entity.index() as usize);
        self.sprites[entity.index() as usize] = Some(sprite);
    }

    pub fn add_texture(&mut self, texture: SpriteTexture) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(texture);
        id
    }

    pub fn texture(&self, id: TextureId) -> Option<&SpriteTexture> {
        self.textures.get(id.0 as usize)
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureId, &SpriteTexture)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(idx, t)| (TextureId(idx as u32), t))
    }

    pub fn point_clouds(&self) -> Vec<(EntityId, Transform, &PointCloud)> {
        self.collect(&self.point_clouds)
    }

    pub fn axes(&self) -> Vec<(EntityId, Transform, &AxesMarker)> {
        self.collect(&self.axes)
    }

    pub fn sprites(&self) -> Vec<(EntityId, Transform, &Sprite)> {
        self.collect(&self.sprites)
    }

    /// Components in spawn order, paired with their transform. Entities
    /// without a transform are not placed in the scene and are skipped.
    fn collect<'a, T>(&'a self, components: &'a [Option<T>]) -> Vec<(EntityId, Transform, &'a T)> {
        let mut out = Vec::new();
        for (idx, component) in components.iter().enumerate() {
            let Some(component) = component else { continue };
            let Some(transform) = self.transforms.get(idx).and_then(|t| *t) else {
                continue;
            };
            out.push((EntityId(idx as u32), transform, component));
        }
        out
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.transforms.len() <= idx {
            let new_len = idx + 1;
            self.transforms.resize(new_len, None);
            self.point_clouds.resize(new_len, None);
            self.axes.resize(new_len, None);
            self.sprites.resize(new_len, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::components::{PointCloud, Sprite, SpriteTexture, Transform};
    use foundation::color::Rgb;
    use foundation::math::Vec3;

    #[test]
    fn spawn_and_collect_point_clouds_in_order() {
        let mut world = World::new();
        for i in 0..3 {
            let entity = world.spawn();
            world.set_transform(entity, Transform::identity());
            world.set_point_cloud(
                entity,
                PointCloud::new(vec![i as f32, 0.0, 0.0], Rgb::default(), 0.3),
            );
        }

        let clouds = world.point_clouds();
        assert_eq!(clouds.len(), 3);
        assert_eq!(clouds[2].2.positions[0], 2.0);
        assert!(clouds.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn entities_without_transform_are_skipped() {
        let mut world = World::new();
        let entity = world.spawn();
        world.set_point_cloud(entity, PointCloud::new(Vec::new(), Rgb::default(), 0.3));
        assert!(world.point_clouds().is_empty());
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn sprites_reference_stored_textures() {
        let mut world = World::new();
        let tex = world.add_texture(SpriteTexture::new(1, 1, vec![255, 0, 0, 255]));
        let entity = world.spawn();
        world.set_transform(entity, Transform::translate(Vec3::new(10.0, 0.0, 0.0)));
        world.set_sprite(entity, Sprite::new(tex, [4.0, 2.0, 1.0]));

        let sprites = world.sprites();
        assert_eq!(sprites.len(), 1);
        assert_eq!(sprites[0].1.position, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(world.texture(sprites[0].2.texture).unwrap().width, 1);
        assert_eq!(world.textures().count(), 1);
    }

    #[test]
    fn background_defaults_to_black() {
        let mut world = World::new();
        assert_eq!(world.background(), Rgb::new(0.0, 0.0, 0.0));
        world.set_background(Rgb::from_hex(0x121212));
        assert_eq!(world.background(), Rgb::from_hex(0x121212));
    }
}
