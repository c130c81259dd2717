//! Damped orbit controller.
//!
//! Pointer input accumulates into pending rotation and pan deltas. Each
//! `update` applies `damping_factor` of what is pending and keeps the rest,
//! so a single drag keeps easing out over the following frames.

use std::f64::consts::{PI, TAU};

use foundation::math::Vec3;
use gpu::PerspectiveCamera;

use crate::resize::SurfaceSize;

/// Keeps the camera off the poles, where the view basis degenerates.
const POLAR_EPSILON: f64 = 1e-6;

/// Wheel delta to dolly exponent.
const WHEEL_ZOOM_RATE: f64 = 0.002;

/// Pending motion below this is treated as settled.
const SETTLE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragButton {
    #[default]
    None,
    Left,
    Right,
    Middle,
}

impl DragButton {
    /// `MouseEvent.button`: 0 left, 1 middle, 2 right.
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => Self::Middle,
            2 => Self::Right,
            _ => Self::Left,
        }
    }
}

/// Radius, azimuth around +Y measured from +Z, polar angle from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f64,
    theta: f64,
    phi: f64,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub damping_factor: f64,
    pub rotate_speed: f64,
    pub pan_speed: f64,
    pub min_distance: f64,
    pub max_distance: f64,

    pending_theta: f64,
    pending_phi: f64,
    pending_pan: Vec3,
    pending_scale: f64,

    drag: DragButton,
    last_pos_px: [f64; 2],
    viewport: SurfaceSize,
}

impl OrbitControls {
    pub fn new(target: Vec3, damping_factor: f64, viewport: SurfaceSize) -> Self {
        Self {
            target,
            damping_factor: damping_factor.clamp(0.0, 1.0),
            rotate_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 1.0,
            max_distance: 500.0,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_pan: Vec3::ZERO,
            pending_scale: 1.0,
            drag: DragButton::None,
            last_pos_px: [0.0, 0.0],
            viewport,
        }
    }

    pub fn set_viewport(&mut self, viewport: SurfaceSize) {
        self.viewport = viewport;
    }

    pub fn on_pointer_down(&mut self, pos_px: [f64; 2], button: DragButton) {
        self.drag = button;
        self.last_pos_px = pos_px;
    }

    /// Pan needs the current camera to find screen-right and screen-up.
    pub fn on_pointer_move(&mut self, pos_px: [f64; 2], camera: &PerspectiveCamera) {
        let dx = pos_px[0] - self.last_pos_px[0];
        let dy = pos_px[1] - self.last_pos_px[1];
        self.last_pos_px = pos_px;

        match self.drag {
            DragButton::None => {}
            DragButton::Left => self.rotate_by_pixels(dx, dy),
            DragButton::Right | DragButton::Middle => self.pan_by_pixels(dx, dy, camera),
        }
    }

    pub fn on_pointer_up(&mut self) {
        self.drag = DragButton::None;
    }

    /// Positive `delta_y` (wheel down) moves away from the target.
    pub fn on_wheel(&mut self, delta_y: f64) {
        self.pending_scale *= (delta_y * WHEEL_ZOOM_RATE).exp();
    }

    /// A full viewport-height drag turns the camera once around.
    pub fn rotate_by_pixels(&mut self, dx: f64, dy: f64) {
        let h = self.viewport.height.max(1) as f64;
        self.pending_theta -= TAU * dx / h * self.rotate_speed;
        self.pending_phi -= TAU * dy / h * self.rotate_speed;
    }

    /// Moves the target so the point under the cursor follows it.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64, camera: &PerspectiveCamera) {
        let h = self.viewport.height.max(1) as f64;
        let distance = (camera.position - self.target).length();
        let visible_half_height = distance * (camera.fov_y_deg.to_radians() * 0.5).tan();
        let per_px = 2.0 * visible_half_height / h * self.pan_speed;
        self.pending_pan +=
            camera.right() * (-dx * per_px) + camera.screen_up() * (dy * per_px);
    }

    /// Applies one damped step to `camera`. Returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let d = self.damping_factor;
        let old_position = camera.position;
        let old_target = self.target;

        let mut s = Spherical::from_offset(camera.position - self.target);
        s.theta += self.pending_theta * d;
        s.phi = (s.phi + self.pending_phi * d).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        s.radius = (s.radius * self.pending_scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pending_pan * d;
        camera.look_at(self.target + s.to_offset(), self.target);

        self.pending_theta *= 1.0 - d;
        self.pending_phi *= 1.0 - d;
        self.pending_pan = self.pending_pan * (1.0 - d);
        self.pending_scale = 1.0;
        if self.pending_theta.abs() < SETTLE_EPSILON {
            self.pending_theta = 0.0;
        }
        if self.pending_phi.abs() < SETTLE_EPSILON {
            self.pending_phi = 0.0;
        }
        if self.pending_pan.length() < SETTLE_EPSILON {
            self.pending_pan = Vec3::ZERO;
        }

        (camera.position - old_position).length() > SETTLE_EPSILON
            || (self.target - old_target).length() > SETTLE_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (OrbitControls, PerspectiveCamera) {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.look_at(Vec3::splat(15.0), Vec3::ZERO);
        let controls = OrbitControls::new(Vec3::ZERO, 0.1, SurfaceSize::new(800, 600));
        (controls, camera)
    }

    #[test]
    fn idle_update_keeps_camera_still() {
        let (mut controls, mut camera) = setup();
        let before = camera.position;
        assert!(!controls.update(&mut camera));
        assert!((camera.position - before).length() < 1e-9);
    }

    #[test]
    fn rotation_eases_out_and_preserves_distance() {
        let (mut controls, mut camera) = setup();
        let radius = camera.position.length();

        controls.on_pointer_down([100.0, 100.0], DragButton::Left);
        controls.on_pointer_move([160.0, 100.0], &camera);
        controls.on_pointer_up();

        let mut steps = Vec::new();
        for _ in 0..5 {
            let before = camera.position;
            assert!(controls.update(&mut camera));
            steps.push((camera.position - before).length());
            assert!((camera.position.length() - radius).abs() < 1e-9);
        }
        assert!(steps.windows(2).all(|w| w[1] < w[0]), "{steps:?}");
    }

    #[test]
    fn damped_steps_sum_to_requested_rotation() {
        let (mut controls, mut camera) = setup();
        let theta0 = Spherical::from_offset(camera.position).theta;
        controls.rotate_by_pixels(-60.0, 0.0);
        let expected = TAU * 60.0 / 600.0;
        for _ in 0..400 {
            controls.update(&mut camera);
        }
        let theta1 = Spherical::from_offset(camera.position).theta;
        assert!((theta1 - theta0 - expected).abs() < 1e-6);
    }

    #[test]
    fn polar_angle_stays_off_the_pole() {
        let (mut controls, mut camera) = setup();
        controls.rotate_by_pixels(0.0, 100_000.0);
        for _ in 0..50 {
            controls.update(&mut camera);
        }
        let s = Spherical::from_offset(camera.position);
        assert!(s.phi >= POLAR_EPSILON * 0.5);
        assert!(camera.right().length() > 0.5);
    }

    #[test]
    fn wheel_dollies_within_limits() {
        let (mut controls, mut camera) = setup();
        let radius = camera.position.length();

        controls.on_wheel(100.0);
        controls.update(&mut camera);
        assert!(camera.position.length() > radius);

        controls.on_wheel(-100_000.0);
        controls.update(&mut camera);
        assert!((camera.position.length() - controls.min_distance).abs() < 1e-9);

        controls.on_wheel(100_000.0);
        controls.update(&mut camera);
        assert!((camera.position.length() - controls.max_distance).abs() < 1e-6);
    }

    #[test]
    fn right_drag_pans_target_and_camera_together() {
        let (mut controls, mut camera) = setup();
        let offset = camera.position - controls.target;

        controls.on_pointer_down([0.0, 0.0], DragButton::from_dom(2));
        controls.on_pointer_move([50.0, 0.0], &camera);
        for _ in 0..10 {
            controls.update(&mut camera);
        }
        assert!(controls.target.length() > 0.0);
        assert!(((camera.position - controls.target) - offset).length() < 1e-9);
        assert_eq!(camera.target, controls.target);
        // Dragging right moves the scene right, so the target goes left.
        assert!(controls.target.dot(camera.right()) < 0.0);
    }
}
