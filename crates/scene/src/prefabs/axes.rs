use crate::World;
use crate::components::{AxesMarker, Transform};
use crate::entity::EntityId;

pub fn spawn_axes(world: &mut World, length: f64) -> EntityId {
    let entity = world.spawn();
    world.set_transform(entity, Transform::identity());
    world.set_axes(entity, AxesMarker::new(length));
    entity
}
