use foundation::color::Rgb;

/// Independently rendered points sharing one color and size.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    /// Interleaved `x, y, z` triples.
    pub positions: Vec<f32>,
    pub color: Rgb,
    /// Point size in scene units.
    pub point_size: f32,
}

impl PointCloud {
    pub fn new(positions: Vec<f32>, color: Rgb, point_size: f32) -> Self {
        debug_assert!(positions.len() % 3 == 0);
        Self {
            positions,
            color,
            point_size,
        }
    }

    pub fn point_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }
}
