//! Builds the static scene: background, one point cloud per cluster, the
//! axes marker and the three axis labels.

use formats::ClusterDataset;
use layers::{LabelRaster, axis_label_sprites, build_point_clouds};
use scene::World;
use scene::components::Transform;
use scene::prefabs::spawn_axes;
use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::error::ViewerError;

/// First assembly step: an empty world with the configured background.
pub fn prepare_world(config: &ViewerConfig) -> World {
    let mut world = World::new();
    world.set_background(config.background_color());
    world
}

/// Adds clusters, axes and axis labels, in that order.
pub fn populate_scene<R: LabelRaster + ?Sized>(
    world: &mut World,
    dataset: &ClusterDataset,
    config: &ViewerConfig,
    raster: &mut R,
) -> Result<(), ViewerError> {
    for cloud in build_point_clouds(dataset, config.point_size) {
        let entity = world.spawn();
        debug!(entity = entity.index(), points = cloud.point_count(), "cluster cloud");
        world.set_transform(entity, Transform::identity());
        world.set_point_cloud(entity, cloud);
    }

    spawn_axes(world, config.axis_length);

    for label in axis_label_sprites(raster, config.axis_length, &config.axis_label_style)? {
        label.spawn_into(world);
    }

    info!(
        clusters = dataset.len(),
        entities = world.entity_count(),
        textures = world.textures().count(),
        "scene assembled"
    );
    Ok(())
}

pub fn assemble_scene<R: LabelRaster + ?Sized>(
    dataset: &ClusterDataset,
    config: &ViewerConfig,
    raster: &mut R,
) -> Result<World, ViewerError> {
    let mut world = prepare_world(config);
    populate_scene(&mut world, dataset, config, raster)?;
    Ok(world)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use foundation::color::{Hsl, Rgb, Rgba};
    use foundation::math::Vec3;
    use layers::{LABEL_SCALE, LabelError, Rect};
    use pretty_assertions::assert_eq;

    /// Raster with a fixed 16px glyph advance that returns blank pixels.
    #[derive(Default)]
    pub(crate) struct BlankRaster {
        size: (u32, u32),
        pub texts: Vec<String>,
    }

    impl LabelRaster for BlankRaster {
        fn set_font(&mut self, _font: &str) -> Result<(), LabelError> {
            Ok(())
        }

        fn measure_text_width(&mut self, text: &str) -> Result<f64, LabelError> {
            Ok(16.0 * text.chars().count() as f64)
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<(), LabelError> {
            self.size = (width, height);
            Ok(())
        }

        fn fill_rect(&mut self, _rect: Rect, _color: Rgba) -> Result<(), LabelError> {
            Ok(())
        }

        fn stroke_rect(&mut self, _rect: Rect, _color: Rgba, _w: f64) -> Result<(), LabelError> {
            Ok(())
        }

        fn fill_text(&mut self, text: &str, _x: f64, _y: f64, _c: Rgba) -> Result<(), LabelError> {
            self.texts.push(text.to_string());
            Ok(())
        }

        fn read_pixels(&mut self) -> Result<Vec<u8>, LabelError> {
            Ok(vec![0; self.size.0 as usize * self.size.1 as usize * 4])
        }
    }

    /// Raster whose canvas is gone.
    pub(crate) struct BrokenRaster;

    impl LabelRaster for BrokenRaster {
        fn set_font(&mut self, _font: &str) -> Result<(), LabelError> {
            Err(LabelError::Raster("no 2d context".to_string()))
        }

        fn measure_text_width(&mut self, _text: &str) -> Result<f64, LabelError> {
            unreachable!()
        }

        fn resize(&mut self, _width: u32, _height: u32) -> Result<(), LabelError> {
            unreachable!()
        }

        fn fill_rect(&mut self, _rect: Rect, _color: Rgba) -> Result<(), LabelError> {
            unreachable!()
        }

        fn stroke_rect(&mut self, _rect: Rect, _color: Rgba, _w: f64) -> Result<(), LabelError> {
            unreachable!()
        }

        fn fill_text(&mut self, _text: &str, _x: f64, _y: f64, _c: Rgba) -> Result<(), LabelError> {
            unreachable!()
        }

        fn read_pixels(&mut self) -> Result<Vec<u8>, LabelError> {
            unreachable!()
        }
    }

    pub(crate) fn two_clusters() -> ClusterDataset {
        ClusterDataset::from_json_str(
            r#"[{"x":[0,1],"y":[0,1],"z":[0,1]},{"x":[2],"y":[2],"z":[2]}]"#,
        )
        .unwrap()
    }

    #[test]
    fn assembles_clusters_axes_and_labels() {
        let mut raster = BlankRaster::default();
        let world = assemble_scene(&two_clusters(), &ViewerConfig::default(), &mut raster).unwrap();

        assert_eq!(world.background(), Rgb::from_hex(0x121212));

        let clouds = world.point_clouds();
        assert_eq!(clouds.len(), 2);
        assert_eq!(clouds[0].2.positions, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(clouds[1].2.positions, vec![2.0, 2.0, 2.0]);
        assert_eq!(clouds[1].2.color, Hsl::new(180.0, 0.7, 0.5).to_rgb());

        let axes = world.axes();
        assert_eq!(axes.len(), 1);
        assert_eq!(axes[0].2.length, 10.0);

        let sprites = world.sprites();
        let positions: Vec<Vec3> = sprites.iter().map(|(_, t, _)| t.position).collect();
        assert_eq!(
            positions,
            vec![
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(0.0, 10.0, 0.0),
                Vec3::new(0.0, 0.0, 10.0),
            ]
        );
        assert!(sprites.iter().all(|(_, _, s)| s.scale == LABEL_SCALE));
        assert_eq!(raster.texts, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn clusters_precede_axes_and_labels() {
        let mut raster = BlankRaster::default();
        let world = assemble_scene(&two_clusters(), &ViewerConfig::default(), &mut raster).unwrap();
        let last_cloud = world.point_clouds().last().map(|c| c.0).unwrap();
        let axes = world.axes()[0].0;
        let first_label = world.sprites()[0].0;
        assert!(last_cloud < axes && axes < first_label);
    }

    #[test]
    fn empty_dataset_still_has_axes_and_labels() {
        let mut raster = BlankRaster::default();
        let dataset = ClusterDataset::from_json_str("[]").unwrap();
        let world = assemble_scene(&dataset, &ViewerConfig::default(), &mut raster).unwrap();
        assert!(world.point_clouds().is_empty());
        assert_eq!(world.axes().len(), 1);
        assert_eq!(world.sprites().len(), 3);
    }

    #[test]
    fn raster_failure_is_reported() {
        let err = assemble_scene(&two_clusters(), &ViewerConfig::default(), &mut BrokenRaster)
            .unwrap_err();
        assert!(matches!(err, ViewerError::Label(LabelError::Raster(_))));
    }
}
