/// Host window inner size in CSS pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WindowSize {
    pub width: f64,
    pub height: f64,
}

impl WindowSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Output surface size in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// `fraction` of the window, rounded to whole pixels, never below 1x1.
pub fn surface_size_for_window(window: WindowSize, fraction: f64) -> SurfaceSize {
    let scale = |v: f64| {
        let px = (v * fraction).round();
        if px.is_finite() && px >= 1.0 {
            px.min(u32::MAX as f64) as u32
        } else {
            1
        }
    };
    SurfaceSize::new(scale(window.width), scale(window.height))
}

/// Window aspect ratio; 1.0 for a degenerate window.
pub fn aspect_for_window(window: WindowSize) -> f64 {
    if window.height <= 0.0 || !window.width.is_finite() || !window.height.is_finite() {
        return 1.0;
    }
    (window.width / window.height).max(1e-6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_is_eighty_percent_of_window() {
        let size = surface_size_for_window(WindowSize::new(1280.0, 720.0), 0.8);
        assert_eq!(size, SurfaceSize::new(1024, 576));

        let odd = surface_size_for_window(WindowSize::new(1001.0, 333.0), 0.8);
        assert_eq!(odd, SurfaceSize::new(801, 266));
    }

    #[test]
    fn degenerate_windows_clamp_to_one_pixel() {
        assert_eq!(
            surface_size_for_window(WindowSize::new(0.0, -5.0), 0.8),
            SurfaceSize::new(1, 1)
        );
        assert_eq!(
            surface_size_for_window(WindowSize::new(f64::NAN, 100.0), 0.8),
            SurfaceSize::new(1, 80)
        );
    }

    #[test]
    fn aspect_uses_full_window() {
        assert_eq!(aspect_for_window(WindowSize::new(1600.0, 800.0)), 2.0);
        assert_eq!(aspect_for_window(WindowSize::new(1600.0, 0.0)), 1.0);
    }
}
