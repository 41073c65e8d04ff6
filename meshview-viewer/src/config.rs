//! Viewer options

use serde::{Deserialize, Serialize};

use crate::camera::CameraOverrides;
use crate::scene::{rgb_hex, Rgb};
use crate::toggles::ToggleState;

/// Everything a host supplies when creating a viewer
///
/// Colors are `0xRRGGBB` integers. Missing fields take their defaults, so a
/// partial TOML table is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    pub width: u32,
    pub height: u32,
    pub background_color: u32,
    pub model_color: u32,
    pub camera_x: Option<f32>,
    pub camera_y: Option<f32>,
    pub camera_z: Option<f32>,
    pub shaded: bool,
    pub wireframe: bool,
    pub measurement_overlay: bool,
    pub info_panel: bool,
    pub ground_plane: bool,
}

impl ViewerOptions {
    pub fn camera_overrides(&self) -> CameraOverrides {
        CameraOverrides {
            x: self.camera_x,
            y: self.camera_y,
            z: self.camera_z,
        }
    }

    /// Initial toggle flags, `loaded` cleared
    pub fn initial_toggles(&self) -> ToggleState {
        ToggleState {
            shaded: self.shaded,
            wireframe: self.wireframe,
            measurement_overlay: self.measurement_overlay,
            info_panel: self.info_panel,
            ground_plane: self.ground_plane,
            loaded: false,
        }
    }

    pub fn model_rgb(&self) -> Rgb {
        rgb_hex(self.model_color)
    }

    pub fn background_rgb(&self) -> Rgb {
        rgb_hex(self.background_color)
    }
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            background_color: 0x000000,
            model_color: 0x8f8f8f,
            camera_x: None,
            camera_y: None,
            camera_z: None,
            shaded: true,
            wireframe: false,
            measurement_overlay: false,
            info_panel: false,
            ground_plane: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_fill_defaults() {
        let options: ViewerOptions =
            serde_json::from_str(r#"{"wireframe": true, "camera_z": 0.0}"#).unwrap();
        assert!(options.wireframe);
        assert!(options.shaded);
        assert_eq!(options.camera_overrides().z, Some(0.0));
        assert_eq!(options.camera_overrides().x, None);
        assert_eq!(options.width, 600);
    }

    #[test]
    fn test_initial_toggles_not_loaded() {
        let toggles = ViewerOptions::default().initial_toggles();
        assert!(!toggles.loaded);
        assert!(toggles.shaded && toggles.ground_plane);
    }
}
