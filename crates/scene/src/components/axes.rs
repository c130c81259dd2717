use foundation::color::Rgb;
use foundation::math::Vec3;

/// Three colored segments from the origin along +X (red), +Y (green) and
/// +Z (blue).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxesMarker {
    pub length: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxisSegment {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Rgb,
}

impl AxesMarker {
    pub fn new(length: f64) -> Self {
        Self { length }
    }

    pub fn segments(&self) -> [AxisSegment; 3] {
        let l = self.length;
        [
            AxisSegment {
                start: Vec3::ZERO,
                end: Vec3::new(l, 0.0, 0.0),
                color: Rgb::new(1.0, 0.0, 0.0),
            },
            AxisSegment {
                start: Vec3::ZERO,
                end: Vec3::new(0.0, l, 0.0),
                color: Rgb::new(0.0, 1.0, 0.0),
            },
            AxisSegment {
                start: Vec3::ZERO,
                end: Vec3::new(0.0, 0.0, l),
                color: Rgb::new(0.0, 0.0, 1.0),
            },
        ]
    }
}
