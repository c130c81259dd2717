//! Color model: HSL/RGB conversion and the per-cluster hue policy.

use serde::{Deserialize, Serialize};

/// Saturation used for every cluster color.
pub const CLUSTER_SATURATION: f64 = 0.70;
/// Lightness used for every cluster color.
pub const CLUSTER_LIGHTNESS: f64 = 0.50;

/// sRGB-encoded color with channels in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB` packed color.
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xff) as f32 / 255.0;
        let g = ((hex >> 8) & 0xff) as f32 / 255.0;
        let b = (hex & 0xff) as f32 / 255.0;
        Self::new(r, g, b)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// HSL color. Hue in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);

        if s == 0.0 {
            let v = l as f32;
            return Rgb::new(v, v, v);
        }

        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Rgb::new(
            hue_to_channel(p, q, h + 1.0 / 3.0) as f32,
            hue_to_channel(p, q, h) as f32,
            hue_to_channel(p, q, h - 1.0 / 3.0) as f32,
        )
    }
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Hue for cluster `index` out of `count`, evenly spaced around the wheel.
///
/// Returns 0 when `count == 0`; there is nothing to color in that case.
pub fn cluster_hue_degrees(index: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    index as f64 * 360.0 / count as f64
}

pub fn cluster_color(index: usize, count: usize) -> Hsl {
    Hsl::new(
        cluster_hue_degrees(index, count),
        CLUSTER_SATURATION,
        CLUSTER_LIGHTNESS,
    )
}

/// RGBA with 0-255 color channels and a `[0, 1]` alpha, matching CSS `rgba()`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Rgba {
    pub const BLACK: Self = Self::new(0, 0, 0, 1.0);
    pub const WHITE: Self = Self::new(255, 255, 255, 1.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_css(self) -> String {
        let a = self.a.clamp(0.0, 1.0);
        format!("rgba({}, {}, {}, {a})", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-6 && (a.g - b.g).abs() < 1e-6 && (a.b - b.b).abs() < 1e-6
    }

    #[test]
    fn hue_is_evenly_spaced() {
        assert_eq!(cluster_hue_degrees(0, 2), 0.0);
        assert_eq!(cluster_hue_degrees(1, 2), 180.0);
        assert_eq!(cluster_hue_degrees(3, 4), 270.0);
        assert_eq!(cluster_hue_degrees(0, 0), 0.0);
    }

    #[test]
    fn hues_are_pairwise_distinct_up_to_360() {
        for n in [1usize, 2, 7, 15, 100, 360] {
            let mut hues: Vec<f64> = (0..n).map(|i| cluster_hue_degrees(i, n)).collect();
            hues.sort_by(|a, b| a.total_cmp(b));
            hues.dedup();
            assert_eq!(hues.len(), n, "n = {n}");
        }
    }

    #[test]
    fn cluster_color_is_deterministic() {
        assert_eq!(cluster_color(3, 15), cluster_color(3, 15));
        assert_ne!(cluster_color(3, 15), cluster_color(4, 15));
        let c = cluster_color(1, 4);
        assert_eq!(c.s, CLUSTER_SATURATION);
        assert_eq!(c.l, CLUSTER_LIGHTNESS);
    }

    #[test]
    fn hsl_primary_hues() {
        assert!(close(Hsl::new(0.0, 1.0, 0.5).to_rgb(), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(Hsl::new(120.0, 1.0, 0.5).to_rgb(), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(Hsl::new(240.0, 1.0, 0.5).to_rgb(), Rgb::new(0.0, 0.0, 1.0)));
        assert!(close(Hsl::new(42.0, 0.0, 0.25).to_rgb(), Rgb::new(0.25, 0.25, 0.25)));
    }

    #[test]
    fn cluster_zero_is_red_at_seventy_percent_saturation() {
        // hsl(0, 70%, 50%) == rgb(0.85, 0.15, 0.15)
        assert!(close(cluster_color(0, 2).to_rgb(), Rgb::new(0.85, 0.15, 0.15)));
        // hsl(180, 70%, 50%) == rgb(0.15, 0.85, 0.85)
        assert!(close(cluster_color(1, 2).to_rgb(), Rgb::new(0.15, 0.85, 0.85)));
    }

    #[test]
    fn hex_and_css() {
        let bg = Rgb::from_hex(0x121212);
        assert!((bg.r - 18.0 / 255.0).abs() < 1e-6);
        assert_eq!(Rgba::new(255, 255, 255, 0.8).to_css(), "rgba(255, 255, 255, 0.8)");
        assert_eq!(Rgba::BLACK.to_css(), "rgba(0, 0, 0, 1)");
    }
}
