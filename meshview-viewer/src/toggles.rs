//! Independent boolean view toggles

use serde::{Deserialize, Serialize};

use crate::scene::LayerKind;

/// A user-facing switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Toggle {
    Shaded,
    Wireframe,
    MeasurementOverlay,
    InfoPanel,
    GroundPlane,
}

impl Toggle {
    /// Scene layer driven by this toggle; the info panel has none
    pub fn layer(self) -> Option<LayerKind> {
        match self {
            Toggle::Shaded => Some(LayerKind::ShadedMesh),
            Toggle::Wireframe => Some(LayerKind::WireframeMesh),
            Toggle::MeasurementOverlay => Some(LayerKind::MeasurementOverlay),
            Toggle::GroundPlane => Some(LayerKind::GroundPlane),
            Toggle::InfoPanel => None,
        }
    }

    pub fn for_layer(kind: LayerKind) -> Toggle {
        match kind {
            LayerKind::ShadedMesh => Toggle::Shaded,
            LayerKind::WireframeMesh => Toggle::Wireframe,
            LayerKind::MeasurementOverlay => Toggle::MeasurementOverlay,
            LayerKind::GroundPlane => Toggle::GroundPlane,
        }
    }
}

/// Current flags plus the once-per-load `loaded` latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleState {
    pub shaded: bool,
    pub wireframe: bool,
    pub measurement_overlay: bool,
    pub info_panel: bool,
    pub ground_plane: bool,
    pub loaded: bool,
}

impl ToggleState {
    pub fn get(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Shaded => self.shaded,
            Toggle::Wireframe => self.wireframe,
            Toggle::MeasurementOverlay => self.measurement_overlay,
            Toggle::InfoPanel => self.info_panel,
            Toggle::GroundPlane => self.ground_plane,
        }
    }

    /// Set a flag; returns whether it changed
    pub fn set(&mut self, toggle: Toggle, value: bool) -> bool {
        let slot = match toggle {
            Toggle::Shaded => &mut self.shaded,
            Toggle::Wireframe => &mut self.wireframe,
            Toggle::MeasurementOverlay => &mut self.measurement_overlay,
            Toggle::InfoPanel => &mut self.info_panel,
            Toggle::GroundPlane => &mut self.ground_plane,
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }

    /// Whether the flag for `kind` asks for the layer
    pub fn wants_layer(&self, kind: LayerKind) -> bool {
        self.get(Toggle::for_layer(kind))
    }
}

impl Default for ToggleState {
    fn default() -> Self {
        Self {
            shaded: true,
            wireframe: false,
            measurement_overlay: false,
            info_panel: false,
            ground_plane: true,
            loaded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let mut state = ToggleState::default();
        assert!(!state.set(Toggle::Shaded, true));
        assert!(state.set(Toggle::Wireframe, true));
        assert!(state.wireframe);
        assert!(!state.set(Toggle::Wireframe, true));
    }

    #[test]
    fn test_toggle_layer_mapping() {
        for kind in LayerKind::ALL {
            assert_eq!(Toggle::for_layer(kind).layer(), Some(kind));
        }
        assert_eq!(Toggle::InfoPanel.layer(), None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_string(&ToggleState::default()).unwrap();
        assert!(json.contains("\"measurementOverlay\":false"));
        assert!(json.contains("\"groundPlane\":true"));
    }
}
