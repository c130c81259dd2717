//! Viewer settings. Every field has a default; the host page may override
//! any subset with a JSON object in the mount element's
//! `data-viewer-config` attribute.

use foundation::color::Rgb;
use foundation::math::Vec3;
use layers::{LabelStyle, POINT_SIZE, axis_label_style};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::ViewerError;

pub const DEFAULT_MOUNT_ID: &str = "cluster-plot";
pub const CONFIG_ATTRIBUTE: &str = "data-viewer-config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Payload attribute name without the `data-` prefix.
    pub data_attribute: String,
    /// `0xRRGGBB`.
    pub background: u32,
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    pub camera_position: [f64; 3],
    /// Output surface size as a fraction of the window size.
    pub surface_fraction: f64,
    pub axis_length: f64,
    pub point_size: f32,
    pub damping_factor: f64,
    pub axis_label_style: LabelStyle,
    /// `tracing` filter directive, e.g. `info` or `layers=debug,warn`.
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_attribute: "plot".to_string(),
            background: 0x121212,
            fov_y_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_position: [15.0, 15.0, 15.0],
            surface_fraction: 0.8,
            axis_length: 10.0,
            point_size: POINT_SIZE,
            damping_factor: 0.1,
            axis_label_style: axis_label_style(),
            log_level: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parses and validates an override; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ViewerError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would give a degenerate projection, an empty
    /// surface, a frozen controller or an unrenderable label texture.
    pub fn validate(&self) -> Result<(), ViewerError> {
        fn out_of_range(field: &'static str, reason: impl Into<String>) -> ViewerError {
            ViewerError::ConfigRange {
                field,
                reason: reason.into(),
            }
        }

        if !(self.fov_y_deg > 0.0 && self.fov_y_deg < 180.0) {
            return Err(out_of_range("fovYDeg", "must be in (0, 180)"));
        }
        if !(self.near.is_finite() && self.near > 0.0) {
            return Err(out_of_range("near", "must be finite and > 0"));
        }
        if !(self.far.is_finite() && self.far > self.near) {
            return Err(out_of_range("far", "must be finite and > near"));
        }
        if !(self.surface_fraction > 0.0 && self.surface_fraction <= 1.0) {
            return Err(out_of_range("surfaceFraction", "must be in (0, 1]"));
        }
        let camera = self.camera_position();
        if !camera.to_array().iter().all(|c| c.is_finite()) || camera.length() == 0.0 {
            return Err(out_of_range("cameraPosition", "must be finite and away from the origin"));
        }
        if !(self.axis_length.is_finite() && self.axis_length > 0.0) {
            return Err(out_of_range("axisLength", "must be finite and > 0"));
        }
        if !(self.point_size.is_finite() && self.point_size > 0.0) {
            return Err(out_of_range("pointSize", "must be finite and > 0"));
        }
        if !(self.damping_factor > 0.0 && self.damping_factor <= 1.0) {
            return Err(out_of_range("dampingFactor", "must be in (0, 1]"));
        }
        let style = &self.axis_label_style;
        if !(style.fontsize.is_finite() && style.fontsize > 0.0) {
            return Err(out_of_range("axisLabelStyle.fontsize", "must be finite and > 0"));
        }
        if !(style.border_thickness.is_finite() && style.border_thickness >= 0.0) {
            return Err(out_of_range(
                "axisLabelStyle.borderThickness",
                "must be finite and >= 0",
            ));
        }
        style
            .check_fits_texture()
            .map_err(|err| out_of_range("axisLabelStyle", err.to_string()))
    }

    /// Applies an optional override. A broken or out-of-range override yields the defaults
    /// together with the parse error so the caller can report it once
    /// logging is up.
    pub fn resolve(override_json: Option<&str>) -> (Self, Option<ViewerError>) {
        match override_json.map(str::trim).filter(|s| !s.is_empty()) {
            None => (Self::default(), None),
            Some(json) => match Self::from_json_str(json) {
                Ok(config) => (config, None),
                Err(err) => (Self::default(), Some(err)),
            },
        }
    }

    /// Attribute holding the cluster payload, e.g. `data-plot`.
    pub fn payload_attribute(&self) -> String {
        format!("data-{}", self.data_attribute)
    }

    pub fn background_color(&self) -> Rgb {
        Rgb::from_hex(self.background)
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::from(self.camera_position)
    }

    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_page_setup() {
        let config = ViewerConfig::default();
        assert_eq!(config.payload_attribute(), "data-plot");
        assert_eq!(config.background_color(), Rgb::from_hex(0x121212));
        assert_eq!(config.camera_position(), Vec3::splat(15.0));
        assert_eq!(config.axis_label_style.fontsize, 32.0);
        assert_eq!(config.surface_fraction, 0.8);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config =
            ViewerConfig::from_json_str(r#"{"fovYDeg": 60, "axisLabelStyle": {"fontsize": 18}}"#)
                .unwrap();
        assert_eq!(config.fov_y_deg, 60.0);
        assert_eq!(config.axis_label_style.fontsize, 18.0);
        // Nested style falls back to plain label defaults, not the axis style.
        assert_eq!(config.axis_label_style.border_thickness, 4.0);
        assert_eq!(config.near, 0.1);
        assert_eq!(config.payload_attribute(), "data-plot");
    }

    #[test]
    fn broken_override_falls_back_to_defaults() {
        let (config, err) = ViewerConfig::resolve(Some("{not json"));
        assert_eq!(config, ViewerConfig::default());
        assert!(matches!(err, Some(ViewerError::Config(_))));

        let (config, err) = ViewerConfig::resolve(Some("   "));
        assert_eq!(config, ViewerConfig::default());
        assert!(err.is_none());
    }

    fn rejected_field(json: &str) -> &'static str {
        match ViewerConfig::from_json_str(json) {
            Err(ViewerError::ConfigRange { field, .. }) => field,
            other => panic!("expected a range error for {json}, got {other:?}"),
        }
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(ViewerConfig::default().validate().is_ok());
    }

    #[test]
    fn degenerate_projection_is_rejected() {
        assert_eq!(rejected_field(r#"{"near": 5, "far": 5}"#), "far");
        assert_eq!(rejected_field(r#"{"near": 0}"#), "near");
        assert_eq!(rejected_field(r#"{"near": -1}"#), "near");
        assert_eq!(rejected_field(r#"{"fovYDeg": 0}"#), "fovYDeg");
        assert_eq!(rejected_field(r#"{"fovYDeg": 180}"#), "fovYDeg");
        assert_eq!(rejected_field(r#"{"cameraPosition": [0, 0, 0]}"#), "cameraPosition");
    }

    #[test]
    fn empty_surface_and_frozen_controls_are_rejected() {
        assert_eq!(rejected_field(r#"{"surfaceFraction": 0}"#), "surfaceFraction");
        assert_eq!(rejected_field(r#"{"surfaceFraction": 1.5}"#), "surfaceFraction");
        assert_eq!(rejected_field(r#"{"dampingFactor": 0}"#), "dampingFactor");
        assert_eq!(rejected_field(r#"{"axisLength": -10}"#), "axisLength");
        assert_eq!(rejected_field(r#"{"pointSize": 0}"#), "pointSize");
    }

    #[test]
    fn oversized_label_style_is_rejected() {
        assert_eq!(
            rejected_field(r#"{"axisLabelStyle": {"fontsize": 5000}}"#),
            "axisLabelStyle"
        );
        assert_eq!(
            rejected_field(r#"{"axisLabelStyle": {"fontsize": 0}}"#),
            "axisLabelStyle.fontsize"
        );
        assert_eq!(
            rejected_field(r#"{"axisLabelStyle": {"borderThickness": -2}}"#),
            "axisLabelStyle.borderThickness"
        );
    }

    #[test]
    fn out_of_range_override_falls_back_to_defaults() {
        let (config, err) =
            ViewerConfig::resolve(Some(r#"{"near": 5, "far": 5, "surfaceFraction": 0}"#));
        assert_eq!(config, ViewerConfig::default());
        assert!(matches!(err, Some(ViewerError::ConfigRange { .. })));
    }
}
